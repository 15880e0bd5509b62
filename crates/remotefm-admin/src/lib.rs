//! remotefm admin console.
//!
//! Talks to devices through the relay's admin endpoint: lists connected
//! devices, browses and edits their filesystems, and moves files in both
//! directions with the chunked transfer protocol.

pub mod client;
pub mod console;
pub mod download;
pub mod error;
pub mod upload;

pub use client::AdminClient;
pub use console::{AdminDispatcher, AdminEvent};
pub use download::{DownloadAssembler, DownloadError, SavedFile};
pub use error::AdminError;
