//! Records carried inside envelopes.

use serde::{Deserialize, Serialize};

/// One entry of a directory listing. Produced fresh for every `list_files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEntry {
    pub name: String,
    /// Absolute path on the device.
    pub path: String,
    pub is_directory: bool,
    /// Size in bytes; always 0 for directories.
    pub size: u64,
    /// Last modification, milliseconds since the Unix epoch.
    pub modified_time: i64,
}

/// Whether the relay currently holds a live connection for a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    #[default]
    Offline,
}

/// A device as listed in `connections_update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionInfo {
    pub id: String,
    pub device_name: String,
    pub ip: String,
    pub android_version: String,
    /// Local time of the last registration, `YYYY-MM-DD HH:MM:SS`.
    pub connected_at: String,
    pub status: DeviceStatus,
}
