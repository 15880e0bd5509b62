//! The identity this agent registers with and reports on request.

use remotefm_common::DeviceId;
use remotefm_config::DeviceConfig;
use remotefm_protocol::{Envelope, Message};

/// Identity and metadata this agent presents to the relay.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub device_id: DeviceId,
    pub device_name: String,
    pub platform_version: String,
    pub api_level: u32,
    pub credential: String,
}

impl DeviceProfile {
    pub fn from_config(device_id: DeviceId, config: &DeviceConfig) -> Self {
        Self {
            device_id,
            device_name: config.name.clone(),
            platform_version: config.platform_version.clone(),
            api_level: config.api_level,
            credential: config.credential.clone(),
        }
    }

    /// The `device_register` envelope sent on every new connection.
    pub fn registration(&self) -> Envelope {
        Envelope::new(Message::DeviceRegister {
            device_id: self.device_id.to_string(),
            device_name: self.device_name.clone(),
            platform_version: self.platform_version.clone(),
            api_level: self.api_level,
            credential: self.credential.clone(),
        })
    }

    pub fn info(&self) -> Message {
        Message::DeviceInfo {
            device_id: self.device_id.to_string(),
            device_name: self.device_name.clone(),
            platform_version: self.platform_version.clone(),
            api_level: self.api_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> DeviceProfile {
        let config = DeviceConfig {
            name: "Pixel 8".into(),
            platform_version: "14".into(),
            api_level: 34,
            credential: "default_key".into(),
        };
        DeviceProfile::from_config(DeviceId::parse("dev-42").unwrap(), &config)
    }

    #[test]
    fn registration_carries_identity_and_credential() {
        let envelope = profile().registration();
        assert_eq!(envelope.device_id, None);
        assert_eq!(
            envelope.message,
            Message::DeviceRegister {
                device_id: "dev-42".into(),
                device_name: "Pixel 8".into(),
                platform_version: "14".into(),
                api_level: 34,
                credential: "default_key".into(),
            }
        );
    }

    #[test]
    fn info_omits_credential() {
        let Message::DeviceInfo {
            device_id,
            api_level,
            ..
        } = profile().info()
        else {
            panic!("expected device_info");
        };
        assert_eq!(device_id, "dev-42");
        assert_eq!(api_level, 34);
    }
}
