pub mod manager;

pub use manager::ConnectionManager;

use crate::serial::LineEvent;

pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Parameters for opening a serial connection. Validated by the transport at
/// open time; an invalid path or baud rate fails the open, not construction.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub path: String,
    pub baud_rate: u32,
}

impl ConnectionConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// State of the single logical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
}

/// Result of a close request. `NoPort` means no open was ever attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    NoPort,
}

impl CloseOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseOutcome::Closed => "closed",
            CloseOutcome::NoPort => "no-port",
        }
    }
}

/// Connection-level state change, delivered asynchronously and independent of
/// any call's return value. `Closed` looks the same whether the close was
/// requested or spontaneous.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Errored(String),
    Closed,
}

/// The single tagged stream delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Line(LineEvent),
    Lifecycle(LifecycleEvent),
}
