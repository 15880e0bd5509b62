//! Persisted device identity.
//!
//! The identifier is generated on first run and stored as a single line in
//! `<data_dir>/remotefm/device_id`. It is never regenerated while that file
//! exists.

use std::path::{Path, PathBuf};

use remotefm_common::{ConfigError, DeviceId};
use tracing::info;

use crate::toml_loader::default_data_dir;

const DEVICE_ID_FILE: &str = "device_id";

/// Path of the device id file inside `dir`.
pub fn device_id_path(dir: &Path) -> PathBuf {
    dir.join(DEVICE_ID_FILE)
}

/// Load the device id from the platform data directory, creating it if needed.
pub fn load_or_create_device_id() -> Result<DeviceId, ConfigError> {
    let dir = default_data_dir()?;
    load_or_create_device_id_in(&dir)
}

/// Load the device id stored in `dir`, creating and persisting a new one if
/// the file is missing or empty.
pub fn load_or_create_device_id_in(dir: &Path) -> Result<DeviceId, ConfigError> {
    let path = device_id_path(dir);

    match std::fs::read_to_string(&path) {
        Ok(raw) => {
            if let Some(id) = DeviceId::parse(&raw) {
                return Ok(id);
            }
            info!(path = %path.display(), "device id file is empty, regenerating");
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(ConfigError::IdentityError(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    }

    let id = DeviceId::generate();
    std::fs::create_dir_all(dir).map_err(|e| {
        ConfigError::IdentityError(format!("failed to create {}: {e}", dir.display()))
    })?;
    std::fs::write(&path, format!("{id}\n")).map_err(|e| {
        ConfigError::IdentityError(format!("failed to write {}: {e}", path.display()))
    })?;

    info!(device_id = %id, path = %path.display(), "generated new device id");
    Ok(id)
}
