//! CLI configuration
//!
//! Loaded from environment variables with defaults. Command-line flags take
//! precedence over anything set here.

use emd_core::{PrintableText, MIN_GROUP_SIZE};

/// Environment-derived defaults for the CLI
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Largest group size tried by `search` and tabulated by `info` (default: 20)
    pub search_max_n: usize,
    /// Printable share required by `search` (default: 0.90)
    pub printable_ratio: f64,
    /// Suffix appended to the cover's file stem for stego output (default: _EMD)
    pub output_suffix: String,
    /// Tracing filter directive; overrides -v when set
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_max_n: 20,
            printable_ratio: PrintableText::DEFAULT_RATIO,
            output_suffix: "_EMD".to_string(),
            log_filter: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; invalid values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let search_max_n = lookup("EMD_SEARCH_MAX_N")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n >= MIN_GROUP_SIZE)
            .unwrap_or(defaults.search_max_n);

        let printable_ratio = lookup("EMD_PRINTABLE_RATIO")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|r| (0.0..=1.0).contains(r))
            .unwrap_or(defaults.printable_ratio);

        let output_suffix = lookup("EMD_OUTPUT_SUFFIX")
            .filter(|s| !s.is_empty() && !s.contains(['/', '\\']))
            .unwrap_or(defaults.output_suffix);

        let log_filter = lookup("EMD_LOG").filter(|s| !s.trim().is_empty());

        Self {
            search_max_n,
            printable_ratio,
            output_suffix,
            log_filter,
        }
    }
}
