pub mod classifier;
pub mod framer;
pub mod transport;

pub use classifier::{classify, LineEvent};
pub use framer::LineFramer;
pub use transport::{ByteStream, SystemTransport, Transport};

use serde::{Deserialize, Serialize};

/// Snapshot of an enumerated serial port. Produced fresh on every
/// enumeration; the OS may reassign paths between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDescriptor {
    pub path: String,
    /// Empty when the port carries no manufacturer metadata.
    pub manufacturer: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Port enumeration failed: {0}")]
    EnumerationFailed(String),

    #[error("Failed to open port: {0}")]
    OpenFailed(String),
}

pub type Result<T> = std::result::Result<T, SerialError>;
