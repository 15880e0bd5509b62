//! remotefm device agent.
//!
//! Registers this machine with the relay and serves the file operations an
//! admin sends it: listing, chunked download and upload, delete, mkdir,
//! move, and directory compression.

pub mod archive;
pub mod device;
pub mod download;
pub mod fs_ops;
pub mod router;
pub mod upload;

pub use device::DeviceProfile;
pub use download::{SendError, TransferSettings};
pub use router::AgentRouter;
