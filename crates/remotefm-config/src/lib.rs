//! remotefm configuration system.
//!
//! Provides TOML-based settings for the device agent and the admin console,
//! validation, and the persisted device identity. All config sections use
//! defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use remotefm_config::{load_config, load_or_create_device_id};
//!
//! let config = load_config(None).expect("failed to load config");
//! let device_id = load_or_create_device_id().expect("failed to load device id");
//! println!("{device_id} -> {}", config.server.url);
//! ```

pub mod identity;
pub mod schema;
pub mod toml_loader;
pub mod toml_writer;
pub mod validation;

pub use identity::{load_or_create_device_id, load_or_create_device_id_in};
pub use schema::{
    AdminConfig, DeviceConfig, LogLevel, LoggingConfig, RemoteFmConfig, ServerConfig,
    TransferConfig,
};
pub use toml_loader::default_config_path;
pub use toml_writer::save_config_to_path;
pub use validation::validate;

use std::path::Path;

use remotefm_common::ConfigError;

/// Load config from `path`, or from the platform default path when `None`.
///
/// A missing file is created from the documented template and defaults are
/// returned.
pub fn load_config(path: Option<&Path>) -> Result<RemoteFmConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_or_create(path),
        None => toml_loader::load_default(),
    }
}
