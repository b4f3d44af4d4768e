//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Token estimation constants
pub mod tokens {
    /// UTF-8 bytes counted as one token by the estimator.
    ///
    /// Real BPE tokenizers (cl100k, o200k, Claude, Gemini) average roughly
    /// 3.5-4.5 bytes per token on English prose and source code. Dividing by
    /// 3 and rounding up keeps the estimate above the real count for
    /// realistic inputs, so a document that passes validation does not get
    /// rejected or truncated at the provider boundary.
    pub const BYTES_PER_TOKEN: usize = 3;
}

/// File collection constants
pub mod collection {
    /// Name of the project-specific ignore-rule file
    pub const IGNORE_FILE_NAME: &str = ".neuroloraignore";

    /// Directory (under the project root) holding generated artifacts
    pub const OUTPUT_DIR_NAME: &str = ".neurolora";

    /// Maximum file size to collect (1MB)
    pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

    /// Bytes inspected when sniffing for binary content
    pub const BINARY_SNIFF_LEN: usize = 8000;

    /// Non-empty lines above which a file is flagged as complex
    pub const COMPLEX_FILE_LINES: usize = 300;

    /// Fixed name of the project structure report
    pub const TREE_REPORT_FILE: &str = "FULL_TREE_PROJECT_FILES.md";
}

/// Progress estimation constants
pub mod progress {
    /// Interval between progress snapshots (milliseconds)
    pub const TICK_MS: u64 = 500;

    /// Minimum estimated duration for any remote call (seconds)
    pub const BASE_SECS: f64 = 10.0;

    /// Seconds added per natural-log unit of content size
    pub const SCALE_SECS: f64 = 20.0;

    /// Characters forming one size unit for the estimate
    pub const CHARS_PER_UNIT: f64 = 4000.0;

    /// Fraction of the estimate during which progress is linear
    pub const LINEAR_UNTIL: f64 = 0.9;

    /// Upper bound the reported fraction approaches but never reaches
    pub const CEILING: f64 = 0.99;

    /// Slope multiplier applied when leaving the linear segment
    pub const ACCELERATION: f64 = 1.5;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Default cap on generated tokens for backends that require one
    pub const DEFAULT_MAX_OUTPUT_TOKENS: usize = 4096;
}
