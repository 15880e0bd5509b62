//! Configuration validation.
//!
//! Checks every section and collects all problems into a single
//! `ConfigError`.

mod helpers;

#[cfg(test)]
mod tests;

use crate::schema::RemoteFmConfig;
use remotefm_common::ConfigError;

use helpers::{validate_range, validate_ws_url};

/// Largest accepted chunk size.
pub const MAX_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Smallest accepted chunk size.
pub const MIN_CHUNK_SIZE: usize = 1024;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &RemoteFmConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_ws_url(&mut errors, "server.url", &config.server.url);
    validate_range(
        &mut errors,
        "server.reconnect_delay_secs",
        config.server.reconnect_delay_secs,
        1,
        3600,
    );
    validate_range(
        &mut errors,
        "server.ping_interval_secs",
        config.server.ping_interval_secs,
        5,
        3600,
    );
    validate_range(
        &mut errors,
        "server.connect_timeout_secs",
        config.server.connect_timeout_secs,
        1,
        600,
    );

    validate_range(
        &mut errors,
        "transfer.chunk_size",
        config.transfer.chunk_size as u64,
        MIN_CHUNK_SIZE as u64,
        MAX_CHUNK_SIZE as u64,
    );
    validate_range(&mut errors, "transfer.pacing_ms", config.transfer.pacing_ms, 0, 1000);

    validate_ws_url(&mut errors, "admin.url", &config.admin.url);
    validate_range(
        &mut errors,
        "admin.response_timeout_secs",
        config.admin.response_timeout_secs,
        1,
        3600,
    );

    if config.device.name.trim().is_empty() {
        errors.push("device.name must not be empty".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
