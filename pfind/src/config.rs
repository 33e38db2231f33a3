use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// Settings for one search run.
///
/// # Configuration Locations
///
/// Files are layered in this order, later ones overriding earlier ones:
/// 1. Global `$CONFIG_DIR/pfind/config.yaml`
/// 2. Local `.pfind.yaml` in the current directory
/// 3. Custom config file specified via `--config` (must exist)
///
/// Command-line values are applied last, see [`SearchConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Directory to start from
/// root_path: "/var/log"
///
/// # Substring every reported file name must contain
/// search_term: ".log"
///
/// # Entries to skip (glob syntax, matched against full path or name)
/// ignore_patterns:
///   - ".git"
///   - "*.tmp"
///
/// # Print only the final count
/// stats_only: false
///
/// # Worker threads (default: CPU cores)
/// thread_count: 4
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Root directory to start search from
    pub root_path: String,

    /// Substring to look for in file names (case-sensitive)
    pub search_term: String,

    /// Number of worker threads
    pub thread_count: NonZeroUsize,

    /// Patterns to ignore (supports glob syntax)
    pub ignore_patterns: Vec<String>,

    /// Whether to suppress per-match lines and print only the summary
    pub stats_only: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_root_path() -> String {
    ".".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            search_term: String::new(),
            thread_count: default_thread_count(),
            ignore_patterns: Vec::new(),
            stats_only: false,
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Starts a config for `term` under `root` with everything else defaulted.
    pub fn new(root: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            root_path: root.into(),
            search_term: term.into(),
            ..Self::default()
        }
    }

    pub fn with_threads(mut self, threads: NonZeroUsize) -> Self {
        self.thread_count = threads;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Loads configuration from the default locations
    pub fn load() -> SearchResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus an explicit file
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("pfind/config.yaml")),
            Some(PathBuf::from(".pfind.yaml")),
        ];
        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(SearchError::config_error(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges CLI arguments with configuration file values.
    ///
    /// An empty `log_level` in `cli_config` means the flag was not given, so
    /// the file's level stays.
    pub fn merge_with_cli(mut self, cli_config: SearchConfig) -> Self {
        // Positional arguments are always given on the command line.
        self.root_path = cli_config.root_path;
        self.search_term = cli_config.search_term;
        self.thread_count = cli_config.thread_count;

        if !cli_config.ignore_patterns.is_empty() {
            self.ignore_patterns = cli_config.ignore_patterns;
        }
        if cli_config.stats_only {
            self.stats_only = true;
        }
        if !cli_config.log_level.is_empty() {
            self.log_level = cli_config.log_level;
        }
        self
    }
}

/// Normalizes a root directory so that it ends with exactly one `/`.
///
/// An empty root is rejected. Trailing separators are collapsed, so `"dir"`,
/// `"dir/"` and `"dir//"` all become `"dir/"`, and `"/"` stays `"/"`.
pub fn normalize_root(root: &str) -> SearchResult<String> {
    if root.is_empty() {
        return Err(SearchError::EmptyRoot);
    }
    let mut normalized = root.trim_end_matches('/').to_string();
    normalized.push('/');
    Ok(normalized)
}

/// Parses a thread count given as text. Zero, negative and non-numeric
/// values are rejected with the given text in the error.
pub fn parse_thread_count(value: &str) -> SearchResult<NonZeroUsize> {
    value
        .parse::<NonZeroUsize>()
        .map_err(|_| SearchError::invalid_thread_count(value))
}
