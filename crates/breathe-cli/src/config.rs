//! Configuration file management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use breathe_core::client::normalize_base_url;
use breathe_core::{FetchScope, RetryConfig, SyncConfig, WidgetHostConfig};

/// Shortest accepted refresh interval.
pub const MIN_REFRESH_SECS: u64 = 10;
/// Longest accepted refresh interval.
pub const MAX_REFRESH_SECS: u64 = 3600;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Air-quality service URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Database path (platform data directory when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,

    /// Sync engine settings
    #[serde(default)]
    pub sync: SyncSection,

    /// Widget host settings
    #[serde(default)]
    pub widget: WidgetSection,
}

/// `[sync]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSection {
    /// Background refresh interval in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Which zones to fetch readings for
    #[serde(default)]
    pub fetch_scope: FetchScope,

    /// Maximum reading fetches in flight
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_fetches: usize,

    /// Retries for retryable fetch failures (0 disables retry)
    #[serde(default)]
    pub retries: u32,
}

/// `[widget]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSection {
    /// Regular widget refresh interval in seconds
    #[serde(default = "default_widget_interval")]
    pub refresh_interval_secs: u64,

    /// How often to check for forced refreshes, in seconds
    #[serde(default = "default_signal_poll")]
    pub signal_poll_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_max_concurrent() -> usize {
    16
}

fn default_widget_interval() -> u64 {
    30 * 60
}

fn default_signal_poll() -> u64 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            database: None,
            request_timeout_secs: default_request_timeout(),
            no_color: false,
            sync: SyncSection::default(),
            widget: WidgetSection::default(),
        }
    }
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            fetch_scope: FetchScope::default(),
            max_concurrent_fetches: default_max_concurrent(),
            retries: 0,
        }
    }
}

impl Default for WidgetSection {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_widget_interval(),
            signal_poll_secs: default_signal_poll(),
        }
    }
}

impl Config {
    /// Default config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("breathe")
            .join("config.toml")
    }

    /// Load from `path`, or the defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = normalize_base_url(&self.api_url) {
            errors.push(ValidationError {
                field: "api_url".to_string(),
                message: e.to_string(),
            });
        }

        if self.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "request_timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        errors.extend(self.sync.validate());
        errors.extend(self.widget.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Database path, falling back to the platform default.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(breathe_store::default_db_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Engine configuration from the `[sync]` table.
    pub fn sync_config(&self) -> SyncConfig {
        let retry = if self.sync.retries == 0 {
            RetryConfig::none()
        } else {
            RetryConfig::new(self.sync.retries)
        };
        SyncConfig {
            refresh_interval: Duration::from_secs(self.sync.refresh_interval_secs),
            fetch_scope: self.sync.fetch_scope,
            max_concurrent_fetches: self.sync.max_concurrent_fetches,
            retry,
            ..Default::default()
        }
    }

    /// Widget host configuration from the `[widget]` table.
    pub fn widget_host_config(&self) -> WidgetHostConfig {
        WidgetHostConfig {
            refresh_interval: Duration::from_secs(self.widget.refresh_interval_secs),
            signal_poll_interval: Duration::from_secs(self.widget.signal_poll_secs),
        }
    }
}

impl SyncSection {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(MIN_REFRESH_SECS..=MAX_REFRESH_SECS).contains(&self.refresh_interval_secs) {
            errors.push(ValidationError {
                field: "sync.refresh_interval_secs".to_string(),
                message: format!(
                    "must be between {} and {} seconds, got {}",
                    MIN_REFRESH_SECS, MAX_REFRESH_SECS, self.refresh_interval_secs
                ),
            });
        }

        if self.max_concurrent_fetches == 0 {
            errors.push(ValidationError {
                field: "sync.max_concurrent_fetches".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        errors
    }
}

impl WidgetSection {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.refresh_interval_secs == 0 {
            errors.push(ValidationError {
                field: "widget.refresh_interval_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.signal_poll_secs == 0 {
            errors.push(ValidationError {
                field: "widget.signal_poll_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path (e.g., `sync.refresh_interval_secs`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
