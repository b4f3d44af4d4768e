use std::path::Path;

use console::style;

/// Styled terminal messages for command results
///
/// Status lines go to stdout, errors to stderr. A quiet `Output` only
/// prints errors and the primary payload (`plain`).
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✓").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn section(&self, message: &str) {
        if !self.quiet {
            println!("\n{}", style(message).bold());
            println!("{}", "─".repeat(40));
        }
    }

    /// Indented `label: value` line under a section
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        if !self.quiet {
            println!("  {:<12} {}", style(format!("{}:", label)).dim(), value);
        }
    }

    pub fn artifact(&self, path: &Path) {
        if !self.quiet {
            println!("  {} {}", style("→").cyan(), path.display());
        }
    }

    /// Unstyled payload, printed even when quiet
    pub fn plain(&self, text: &str) {
        println!("{}", text);
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(false)
    }
}
