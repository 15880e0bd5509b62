pub mod errors;
pub mod id;

pub use errors::{ConfigError, RemoteFmError};
pub use id::{new_id, DeviceId};

pub type Result<T> = std::result::Result<T, RemoteFmError>;
