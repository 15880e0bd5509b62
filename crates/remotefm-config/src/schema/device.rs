use serde::{Deserialize, Serialize};

/// Metadata the agent reports in its registration envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub name: String,
    pub platform_version: String,
    pub api_level: u32,
    /// Shared placeholder credential sent on registration. Not a real secret.
    pub credential: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            platform_version: std::env::consts::OS.to_string(),
            api_level: 0,
            credential: "default_key".into(),
        }
    }
}

fn default_device_name() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| "remotefm device".into())
}
