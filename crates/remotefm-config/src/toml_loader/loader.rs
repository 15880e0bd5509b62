//! Core TOML config loading: read from path or platform default.

use crate::schema::RemoteFmConfig;
use crate::validation;
use remotefm_common::ConfigError;
use std::path::Path;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};

/// Load config from a specific TOML file path.
///
/// Missing fields take serde defaults. Validation problems are logged and
/// the parsed config is returned as-is; callers that must not run with bad
/// values call [`validation::validate`] themselves.
pub fn load_from_path(path: &Path) -> Result<RemoteFmConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };

    let config: RemoteFmConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/remotefm/config.toml`
/// On Linux: `~/.config/remotefm/config.toml`
///
/// If the file does not exist, creates a default config file and returns defaults.
pub fn load_default() -> Result<RemoteFmConfig, ConfigError> {
    let path = default_config_path()?;
    load_or_create(&path)
}

/// Load `path`, writing the documented template there first if it is missing.
pub fn load_or_create(path: &Path) -> Result<RemoteFmConfig, ConfigError> {
    match load_from_path(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(path)?;
            Ok(RemoteFmConfig::default())
        }
        Err(e) => Err(e),
    }
}
