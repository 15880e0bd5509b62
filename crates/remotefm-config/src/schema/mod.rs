//! Configuration schema types for remotefm.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with each section's `Default`.

mod admin;
mod device;
mod logging;
mod server;
mod transfer;

pub use admin::*;
pub use device::*;
pub use logging::*;
pub use server::*;
pub use transfer::*;

use serde::{Deserialize, Serialize};

/// Root configuration shared by the device agent and the admin console.
///
/// Each binary reads only the sections it needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteFmConfig {
    pub server: ServerConfig,
    pub device: DeviceConfig,
    pub transfer: TransferConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}
