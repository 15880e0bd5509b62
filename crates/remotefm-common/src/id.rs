use serde::{Deserialize, Serialize};
use std::fmt;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Stable identifier of a device agent installation.
///
/// Generated once on first run and persisted; the relay and the admin
/// console treat it as an opaque key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn generate() -> Self {
        Self(new_id())
    }

    /// Wrap an identifier read back from storage. Surrounding whitespace is
    /// stripped; an empty string is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_valid_uuid() {
        let id = new_id();
        let parsed = uuid::Uuid::parse_str(&id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn generated_device_ids_are_unique() {
        assert_ne!(DeviceId::generate(), DeviceId::generate());
    }

    #[test]
    fn parse_trims_whitespace() {
        let id = DeviceId::parse("  abc-123\n").unwrap();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(DeviceId::parse("").is_none());
        assert!(DeviceId::parse(" \n\t").is_none());
    }

    #[test]
    fn device_id_display() {
        let id = DeviceId::generate();
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn device_id_serializes_as_plain_string() {
        let id = DeviceId::parse("dev-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"dev-1\"");
        let back: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
