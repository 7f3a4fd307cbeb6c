// Configuration loading and parsing (config/onball.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use onball_core::percentile::PCT_SUFFIX;
use onball_core::FilterSpec;
use onball_core::presentation::DEFAULT_SORT_PREFERENCE;

const CONFIG_FILE: &str = "onball.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Filters applied at startup. Omitted means show everything.
    #[serde(default)]
    pub filters: FilterSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_sort_preference")]
    pub sort_preference: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            sort_preference: default_sort_preference(),
            page_size: default_page_size(),
        }
    }
}

fn default_sort_preference() -> Vec<String> {
    DEFAULT_SORT_PREFERENCE.iter().map(|s| s.to_string()).collect()
}

fn default_page_size() -> usize {
    20
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportConfig {
    pub dir: Option<String>,
}

impl ExportConfig {
    /// Configured directory, else the user's download directory, else
    /// `./exports`.
    pub fn resolve_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return PathBuf::from(dir);
        }
        directories::UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("exports"))
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/onball.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()`.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path)
        .map_err(|_| ConfigError::FileNotFound { path: path.clone() })?;
    let config = parse_config(&text).map_err(|e| ConfigError::ParseError { path, source: e })?;
    validate(&config)?;
    Ok(config)
}

fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

/// Copy `defaults/onball.toml` to `config/onball.toml` if the latter is
/// missing. Returns the copied path, if any.
pub fn ensure_config_files(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let config_dir = base_dir.join("config");
    let target = config_dir.join(CONFIG_FILE);

    if target.exists() {
        return Ok(None);
    }
    if !source.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/{CONFIG_FILE} nor config/{CONFIG_FILE} found in {}; \
                 run from the project root or ensure defaults/ is present",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {}: {e}", source.display()),
    })?;
    Ok(Some(target))
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures the default config file is copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.data.path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.display.page_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "display.page_size".into(),
            message: "must be > 0".into(),
        });
    }

    // A sort key can only ever match a percentile field.
    for field in &config.display.sort_preference {
        if !field.ends_with(PCT_SUFFIX) {
            return Err(ConfigError::ValidationError {
                field: "display.sort_preference".into(),
                message: format!("`{field}` is not a percentile field (expected `*{PCT_SUFFIX}`)"),
            });
        }
    }

    if let Some(dir) = &config.export.dir {
        if dir.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "export.dir".into(),
                message: "must not be empty when set".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
