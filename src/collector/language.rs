//! Language Tags
//!
//! Static extension → fence-language mapping used when rendering collected
//! files. Unknown extensions fall back to [`FALLBACK_TAG`].

use std::path::Path;

pub const FALLBACK_TAG: &str = "text";

struct LanguageEntry {
    tag: &'static str,
    extensions: &'static [&'static str],
    file_names: &'static [&'static str],
}

macro_rules! lang {
    ($tag:literal, [$($ext:literal),*]) => {
        LanguageEntry { tag: $tag, extensions: &[$($ext),*], file_names: &[] }
    };
    ($tag:literal, [$($ext:literal),*], names: [$($name:literal),*]) => {
        LanguageEntry { tag: $tag, extensions: &[$($ext),*], file_names: &[$($name),*] }
    };
}

const LANGUAGES: &[LanguageEntry] = &[
    // Systems
    lang!("rust", ["rs"]),
    lang!("go", ["go"]),
    lang!("c", ["c", "h"]),
    lang!("cpp", ["cpp", "cc", "cxx", "hpp", "hh", "hxx"]),
    lang!("zig", ["zig"]),
    // JVM / .NET / mobile
    lang!("java", ["java"]),
    lang!("kotlin", ["kt", "kts"]),
    lang!("scala", ["scala", "sc"]),
    lang!("csharp", ["cs"]),
    lang!("swift", ["swift"]),
    lang!("dart", ["dart"]),
    lang!("objectivec", ["mm"]),
    lang!("matlab", ["m"]),
    // Web
    lang!("typescript", ["ts", "mts", "cts"]),
    lang!("javascript", ["js", "mjs", "cjs"]),
    lang!("tsx", ["tsx"]),
    lang!("jsx", ["jsx"]),
    lang!("html", ["html", "htm"]),
    lang!("css", ["css"]),
    lang!("scss", ["scss"]),
    lang!("sass", ["sass"]),
    lang!("less", ["less"]),
    lang!("vue", ["vue"]),
    lang!("svelte", ["svelte"]),
    // Scripting
    lang!("python", ["py", "pyi", "pyw"]),
    lang!("ruby", ["rb", "rake", "gemspec"], names: ["Gemfile", "Rakefile"]),
    lang!("php", ["php"]),
    lang!("perl", ["pl", "pm"]),
    lang!("lua", ["lua"]),
    lang!("r", ["r"]),
    lang!("elixir", ["ex", "exs"]),
    lang!("haskell", ["hs"]),
    // Shell
    lang!("bash", ["sh", "bash", "zsh"]),
    lang!("batch", ["bat", "cmd"]),
    lang!("powershell", ["ps1", "psm1"]),
    // Data / config
    lang!("sql", ["sql"]),
    lang!("json", ["json", "jsonc"]),
    lang!("yaml", ["yml", "yaml"]),
    lang!("toml", ["toml"], names: ["Cargo.lock"]),
    lang!("xml", ["xml", "xsd", "xsl"]),
    lang!("ini", ["ini", "cfg"]),
    lang!("conf", ["conf"]),
    lang!("markdown", ["md", "markdown"]),
    lang!("protobuf", ["proto"]),
    lang!("graphql", ["graphql", "gql"]),
    // Build
    lang!("makefile", ["mk"], names: ["Makefile", "GNUmakefile"]),
    lang!("dockerfile", [], names: ["Dockerfile", "Containerfile"]),
];

/// Fence language for `path`, matched on file name first, then extension
pub fn language_tag(path: &Path) -> &'static str {
    if let Some(name) = path.file_name().and_then(|n| n.to_str())
        && let Some(entry) = LANGUAGES.iter().find(|e| e.file_names.contains(&name))
    {
        return entry.tag;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| {
            LANGUAGES
                .iter()
                .find(|e| e.extensions.contains(&ext.as_str()))
        })
        .map(|e| e.tag)
        .unwrap_or(FALLBACK_TAG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(language_tag(Path::new("src/main.rs")), "rust");
        assert_eq!(language_tag(Path::new("a.py")), "python");
        assert_eq!(language_tag(Path::new("web/App.tsx")), "tsx");
        assert_eq!(language_tag(Path::new("deploy.yml")), "yaml");
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(language_tag(Path::new("README.MD")), "markdown");
    }

    #[test]
    fn test_file_names() {
        assert_eq!(language_tag(Path::new("Dockerfile")), "dockerfile");
        assert_eq!(language_tag(Path::new("tools/Makefile")), "makefile");
    }

    #[test]
    fn test_unknown_falls_back_to_text() {
        assert_eq!(language_tag(Path::new("data.xyz")), FALLBACK_TAG);
        assert_eq!(language_tag(Path::new("LICENSE")), FALLBACK_TAG);
    }

    #[test]
    fn test_extensions_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for entry in LANGUAGES {
            for ext in entry.extensions {
                assert!(seen.insert(*ext), "duplicate extension {}", ext);
            }
        }
    }
}
