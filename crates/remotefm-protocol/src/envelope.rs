//! Envelope codec: one JSON object per WebSocket text frame.
//!
//! The discriminant travels in the `type` field. Decoding is lenient about
//! missing fields (they take their defaults) and accepts kinds it does not
//! know, so a newer peer cannot crash an older one. Deciding what to do with
//! an unknown kind is left to the router.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ConnectionInfo, FileEntry};

/// The typed payload of an envelope. The variant is the envelope's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    // --- lifecycle -------------------------------------------------------
    DeviceRegister {
        #[serde(default)]
        device_id: String,
        #[serde(default)]
        device_name: String,
        #[serde(default)]
        platform_version: String,
        #[serde(default)]
        api_level: u32,
        #[serde(default)]
        credential: String,
    },
    Registered {
        #[serde(default)]
        device_id: String,
    },
    ConnectionsUpdate {
        #[serde(default)]
        connections: Vec<ConnectionInfo>,
    },

    // --- operations (admin -> device) -------------------------------------
    ListFiles {
        #[serde(default)]
        path: String,
    },
    DownloadFile {
        #[serde(default)]
        path: String,
    },
    UploadFile {
        #[serde(default)]
        path: String,
        #[serde(default)]
        data: String,
        #[serde(default)]
        offset: u64,
        #[serde(default)]
        is_last: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_size: Option<u64>,
    },
    Delete {
        #[serde(default)]
        path: String,
        #[serde(default)]
        recursive: bool,
    },
    CreateDir {
        #[serde(default)]
        path: String,
    },
    Move {
        #[serde(default)]
        old_path: String,
        #[serde(default)]
        new_path: String,
    },
    Compress {
        #[serde(default)]
        path: String,
    },
    GetDeviceInfo {},

    // --- responses (device -> admin) --------------------------------------
    FilesList {
        #[serde(default)]
        path: String,
        #[serde(default)]
        files: Vec<FileEntry>,
    },
    FileChunk {
        #[serde(default)]
        file_name: String,
        #[serde(default)]
        offset: u64,
        #[serde(default)]
        data: String,
        #[serde(default)]
        is_last: bool,
        #[serde(default)]
        total_size: u64,
    },
    DeleteResponse {
        #[serde(default)]
        success: bool,
        #[serde(default)]
        message: String,
    },
    CreateDirResponse {
        #[serde(default)]
        success: bool,
        #[serde(default)]
        message: String,
    },
    MoveResponse {
        #[serde(default)]
        success: bool,
        #[serde(default)]
        message: String,
    },
    DeviceInfo {
        #[serde(default)]
        device_id: String,
        #[serde(default)]
        device_name: String,
        #[serde(default)]
        platform_version: String,
        #[serde(default)]
        api_level: u32,
    },
    Error {
        #[serde(default)]
        message: String,
    },

    /// A kind this build does not know. Never produced by serde; the codec
    /// builds it by hand.
    #[serde(skip)]
    Unknown { kind: String },
}

impl Message {
    /// Every wire kind this build understands.
    pub const KNOWN_KINDS: &'static [&'static str] = &[
        "device_register",
        "registered",
        "connections_update",
        "list_files",
        "download_file",
        "upload_file",
        "delete",
        "create_dir",
        "move",
        "compress",
        "get_device_info",
        "files_list",
        "file_chunk",
        "delete_response",
        "create_dir_response",
        "move_response",
        "device_info",
        "error",
    ];

    /// The wire name of this message's kind.
    pub fn kind(&self) -> &str {
        match self {
            Message::DeviceRegister { .. } => "device_register",
            Message::Registered { .. } => "registered",
            Message::ConnectionsUpdate { .. } => "connections_update",
            Message::ListFiles { .. } => "list_files",
            Message::DownloadFile { .. } => "download_file",
            Message::UploadFile { .. } => "upload_file",
            Message::Delete { .. } => "delete",
            Message::CreateDir { .. } => "create_dir",
            Message::Move { .. } => "move",
            Message::Compress { .. } => "compress",
            Message::GetDeviceInfo {} => "get_device_info",
            Message::FilesList { .. } => "files_list",
            Message::FileChunk { .. } => "file_chunk",
            Message::DeleteResponse { .. } => "delete_response",
            Message::CreateDirResponse { .. } => "create_dir_response",
            Message::MoveResponse { .. } => "move_response",
            Message::DeviceInfo { .. } => "device_info",
            Message::Error { .. } => "error",
            Message::Unknown { kind } => kind,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Message::Error {
            message: message.into(),
        }
    }

    pub fn is_known_kind(kind: &str) -> bool {
        Self::KNOWN_KINDS.contains(&kind)
    }
}

/// One unit of wire communication.
///
/// `device_id` addresses a device on admin → relay → device hops and names
/// the sender on device → relay → admin hops. Kinds that carry their own
/// `device_id` field (`device_register`, `registered`, `device_info`) keep
/// it; the envelope-level value is only written when the payload has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub device_id: Option<String>,
    pub message: Message,
}

impl Envelope {
    pub fn new(message: Message) -> Self {
        Self {
            device_id: None,
            message,
        }
    }

    /// An envelope addressed to `device_id` through the relay.
    pub fn to_device(device_id: impl Into<String>, message: Message) -> Self {
        Self {
            device_id: Some(device_id.into()),
            message,
        }
    }

    pub fn kind(&self) -> &str {
        self.message.kind()
    }
}

impl From<Message> for Envelope {
    fn from(message: Message) -> Self {
        Self::new(message)
    }
}

/// Why a frame could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("envelope is not a JSON object")]
    NotAnObject,

    #[error("envelope has no string `type` field")]
    MissingKind,

    #[error("invalid `{kind}` payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why an envelope could not be serialized.
#[derive(Debug, thiserror::Error)]
#[error("failed to encode `{kind}` envelope: {source}")]
pub struct EncodeError {
    pub kind: String,
    #[source]
    pub source: serde_json::Error,
}

/// Serialize an envelope to its wire text.
pub fn encode(envelope: &Envelope) -> Result<String, EncodeError> {
    let mut value = match &envelope.message {
        Message::Unknown { kind } => serde_json::json!({ "type": kind }),
        message => serde_json::to_value(message).map_err(|source| EncodeError {
            kind: message.kind().to_string(),
            source,
        })?,
    };

    if let (Some(device_id), Value::Object(map)) = (&envelope.device_id, &mut value) {
        map.entry("device_id")
            .or_insert_with(|| Value::String(device_id.clone()));
    }

    Ok(value.to_string())
}

/// Parse wire text into an envelope.
pub fn decode(text: &str) -> Result<Envelope, DecodeError> {
    let value: Value = serde_json::from_str(text).map_err(DecodeError::Malformed)?;
    let Value::Object(map) = &value else {
        return Err(DecodeError::NotAnObject);
    };

    let kind = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingKind)?
        .to_string();
    let device_id = map
        .get("device_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let message = if Message::is_known_kind(&kind) {
        serde_json::from_value(value)
            .map_err(|source| DecodeError::InvalidPayload { kind, source })?
    } else {
        Message::Unknown { kind }
    };

    Ok(Envelope { device_id, message })
}
