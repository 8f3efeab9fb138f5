//! Export configuration.
//!
//! Settings come in three layers, later layers winning:
//!
//! 1. stock defaults,
//! 2. an optional TOML file (`--config <path>`, or `wp2hugo.toml` in the
//!    working directory when present),
//! 3. command line flags.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output-directory = "build"  # Root of the generated Hugo tree
//! skip-downloads = false      # Create the tree but fetch no media
//! skip-comments = false       # Do not write comments.yaml files
//! log-level = "info"          # trace, debug, info, warn, error
//!
//! [downloads]
//! timeout-secs = 30           # Per-request timeout
//! user-agent = "wp2hugo/x.y.z"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "wp2hugo.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything that shapes an export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExportConfig {
    /// Root of the generated tree; content lands in `<dir>/content`.
    pub output_directory: PathBuf,
    /// Build the directory structure without fetching any media.
    pub skip_downloads: bool,
    /// Do not write `comments.yaml` side files.
    pub skip_comments: bool,
    /// Diagnostic verbosity. Never changes the generated content.
    pub log_level: String,
    /// Remote file retrieval settings.
    pub downloads: DownloadsConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("build"),
            skip_downloads: false,
            skip_comments: false,
            log_level: "info".to_string(),
            downloads: DownloadsConfig::default(),
        }
    }
}

/// Remote file retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct DownloadsConfig {
    /// Timeout for a single download, in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("wp2hugo/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ExportConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "output-directory must not be empty".into(),
            ));
        }
        if self.downloads.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "downloads.timeout-secs must be greater than 0".into(),
            ));
        }
        normalize_log_level(&self.log_level)?;
        Ok(())
    }

    /// The log level as a `tracing` filter directive.
    pub fn filter_directive(&self) -> Result<&'static str, ConfigError> {
        normalize_log_level(&self.log_level)
    }
}

/// Map a log level name to its `tracing` directive.
///
/// Accepts the `tracing` names case-insensitively plus the legacy names
/// `warning`, `notice` and `critical`.
pub fn normalize_log_level(level: &str) -> Result<&'static str, ConfigError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" | "notice" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" | "critical" => Ok("error"),
        other => Err(ConfigError::Validation(format!(
            "unknown log-level {other:?} (expected trace, debug, info, warn or error)"
        ))),
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Overrides taken from the command line. `None` / `false` leaves the
/// lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_directory: Option<PathBuf>,
    pub skip_downloads: bool,
    pub skip_comments: bool,
    pub log_level: Option<String>,
}

impl CliOverrides {
    fn to_value(&self) -> toml::Value {
        let mut table = toml::map::Map::new();
        if let Some(dir) = &self.output_directory {
            table.insert(
                "output-directory".into(),
                toml::Value::String(dir.to_string_lossy().into_owned()),
            );
        }
        if self.skip_downloads {
            table.insert("skip-downloads".into(), toml::Value::Boolean(true));
        }
        if self.skip_comments {
            table.insert("skip-comments".into(), toml::Value::Boolean(true));
        }
        if let Some(level) = &self.log_level {
            table.insert("log-level".into(), toml::Value::String(level.clone()));
        }
        toml::Value::Table(table)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ExportConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. `Ok(None)` if it doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge the layers, then deserialize and validate.
pub fn resolve_config(layers: Vec<toml::Value>) -> Result<ExportConfig, ConfigError> {
    let merged = layers
        .into_iter()
        .fold(stock_defaults_value(), merge_toml);
    let config: ExportConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// An explicit `config_path` must exist; without one, `wp2hugo.toml` in
/// `working_dir` is used when present.
pub fn load_config(
    config_path: Option<&Path>,
    working_dir: &Path,
    cli: &CliOverrides,
) -> Result<ExportConfig, ConfigError> {
    let file_layer = match config_path {
        Some(path) => Some(load_raw_config(path)?.ok_or_else(|| {
            ConfigError::Validation(format!("config file not found: {}", path.display()))
        })?),
        None => load_raw_config(&working_dir.join(DEFAULT_CONFIG_FILE))?,
    };

    let mut layers = Vec::new();
    layers.extend(file_layer);
    layers.push(cli.to_value());
    resolve_config(layers)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> String {
    format!(
        r##"# wp2hugo Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command line flags override them.
# Unknown keys will cause an error.

# Root of the generated Hugo tree. Content is written to <dir>/content.
output-directory = "build"

# Create the directory structure and front matter without fetching media.
skip-downloads = false

# Do not write comments.yaml next to each exported item.
skip-comments = false

# Diagnostic verbosity: trace, debug, info, warn, error.
log-level = "info"

# ---------------------------------------------------------------------------
# Media downloads
# ---------------------------------------------------------------------------
[downloads]
# Timeout for a single download, in seconds.
timeout-secs = 30

# User-Agent header sent with every request.
user-agent = "{user_agent}"
"##,
        user_agent = DownloadsConfig::default().user_agent
    )
}
