//! Run configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. Command-line flags
//! 2. YAML file passed with `--config`
//! 3. Built-in defaults
//!
//! ```yaml
//! catalog:
//!   base_url: https://api.jujucharms.com/charmstore/v5
//!   timeout_seconds: 30
//! report:
//!   output_dir: /var/www/charms
//!   prefix: cs-whats-new
//!   row_width: 4
//! lookup_concurrency: 1
//! log_file: cs-whats-new.log
//! log_level: info
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default charm store API root
pub const DEFAULT_BASE_URL: &str = "https://api.jujucharms.com/charmstore/v5";

/// Default cells per grid row
pub const DEFAULT_ROW_WIDTH: usize = 4;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Default report file prefix
pub const DEFAULT_PREFIX: &str = "cs-whats-new";

/// Default append-only log file
pub const DEFAULT_LOG_FILE: &str = "cs-whats-new.log";

/// Catalog client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for each HTTP request in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Report output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory receiving reports and the `new.html` pointer
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Report file name prefix, `<prefix>-<date>.html`
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_row_width")]
    pub row_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            prefix: default_prefix(),
            row_width: default_row_width(),
        }
    }
}

/// Everything a report run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub report: ReportConfig,

    /// Promulgation lookups in flight at once; 1 keeps lookups sequential
    #[serde(default = "default_concurrency")]
    pub lookup_concurrency: usize,

    /// Append-only log file; `None` logs to stderr only
    #[serde(default = "default_log_file")]
    pub log_file: Option<PathBuf>,

    /// `EnvFilter` directive for the run's diagnostics
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            report: ReportConfig::default(),
            lookup_concurrency: default_concurrency(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl RunConfig {
    /// Load configuration from a YAML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: RunConfig =
            serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.catalog.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "base_url must start with http:// or https://, got '{url}'"
            )));
        }

        if self.report.row_width == 0 {
            return Err(ConfigError::Invalid(
                "row_width must be at least 1".to_string(),
            ));
        }

        if self.lookup_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "lookup_concurrency must be at least 1".to_string(),
            ));
        }

        if self.catalog.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "timeout_seconds must be at least 1".to_string(),
            ));
        }

        let prefix = &self.report.prefix;
        if prefix.is_empty() || prefix.contains('/') || prefix.contains('\\') {
            return Err(ConfigError::Invalid(format!(
                "prefix must be a non-empty file name, got '{prefix}'"
            )));
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_row_width() -> usize {
    DEFAULT_ROW_WIDTH
}

fn default_concurrency() -> usize {
    1
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_LOG_FILE))
}

fn default_log_level() -> String {
    "info".to_string()
}
