//! Rule configuration loading and validation.
//!
//! Configs are TOML files deserialized into [`RuleConfig`]. Missing fields
//! take their defaults; a missing file is only an error when the caller
//! named it explicitly.

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use hygiene_types::{RegionRole, RuleConfig};

pub const CONFIG_DIR_NAME: &str = "hygiene-monitor";
pub const CONFIG_FILE_NAME: &str = "rules.toml";

/// Errors that can occur while loading, saving or validating a config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Serialize error for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("Invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_secs(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(invalid(field, format!("must be a finite number, got {value}")));
    }
    if value < 0.0 {
        return Err(invalid(field, format!("must not be negative, got {value}")));
    }
    Ok(())
}

/// Check a config once at startup. An engine built from a config that passes
/// cannot fail at runtime.
pub fn validate(config: &RuleConfig) -> Result<(), ConfigError> {
    check_secs("min_dwell.stand_secs", config.min_dwell.stand_secs)?;
    check_secs("min_dwell.sink_secs", config.min_dwell.sink_secs)?;
    check_secs("min_dwell.dryer_secs", config.min_dwell.dryer_secs)?;
    check_secs("cooldown_secs", config.cooldown_secs)?;

    check_secs("track_idle_timeout_secs", config.track_idle_timeout_secs)?;

    if config.handwash_min_consecutive_frames == 0 {
        return Err(invalid("handwash_min_consecutive_frames", "must be at least 1"));
    }

    let mut seen: HashMap<&str, RegionRole> = HashMap::new();
    for role in RegionRole::ALL {
        let name = config.regions.name(role);
        if name.trim().is_empty() {
            return Err(invalid("regions", format!("{} region name is empty", role.as_str())));
        }
        if let Some(other) = seen.insert(name, role) {
            return Err(invalid(
                "regions",
                format!(
                    "{} and {} share the region name {name:?}",
                    other.as_str(),
                    role.as_str()
                ),
            ));
        }
    }

    Ok(())
}

/// Load and validate a single TOML config file
pub fn load_file(path: &Path) -> Result<RuleConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: RuleConfig = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate(&config)?;
    Ok(config)
}

/// Save a config to a TOML file, creating parent directories as needed
pub fn save_file(path: &Path, config: &RuleConfig) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(path, contents).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Default config location: `<user config dir>/hygiene-monitor/rules.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load an explicitly named config, or the default location if it exists,
/// or fall back to built-in defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<RuleConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_file(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::info!(path = %path.display(), "Loading rule config");
            load_file(&path)
        }
        _ => {
            tracing::info!("No rule config found, using defaults");
            Ok(RuleConfig::default())
        }
    }
}
