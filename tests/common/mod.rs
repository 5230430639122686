#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, DuplexStream, ReadBuf};
use tokio::sync::broadcast;
use tokio::time::timeout;

use serialscope_lib::connection::{ConnectionConfig, ConnectionEvent};
use serialscope_lib::serial::transport::{ByteStream, Transport};
use serialscope_lib::serial::{PortDescriptor, Result, SerialError};

/// In-memory transport. Every successful open hands the manager one half of
/// a duplex pipe and queues the other half for the test to write into;
/// dropping the test half ends the stream like an unplugged device.
pub struct FakeTransport {
    ports: Vec<PortDescriptor>,
    fail_enumeration: Option<String>,
    fail_open: Option<String>,
    fail_reads: bool,
    flaky_payload: Option<Vec<u8>>,
    writers: Mutex<VecDeque<DuplexStream>>,
}

impl FakeTransport {
    pub fn new(ports: Vec<PortDescriptor>) -> Self {
        Self {
            ports,
            fail_enumeration: None,
            fail_open: None,
            fail_reads: false,
            flaky_payload: None,
            writers: Mutex::new(VecDeque::new()),
        }
    }

    pub fn single(path: &str, manufacturer: &str) -> Self {
        Self::new(vec![PortDescriptor {
            path: path.to_string(),
            manufacturer: manufacturer.to_string(),
        }])
    }

    pub fn failing_enumeration(message: &str) -> Self {
        let mut transport = Self::new(Vec::new());
        transport.fail_enumeration = Some(message.to_string());
        transport
    }

    pub fn failing_open(message: &str) -> Self {
        let mut transport = Self::new(Vec::new());
        transport.fail_open = Some(message.to_string());
        transport
    }

    /// Every opened stream fails its first read.
    pub fn failing_reads(path: &str, manufacturer: &str) -> Self {
        let mut transport = Self::single(path, manufacturer);
        transport.fail_reads = true;
        transport
    }

    /// Every opened stream interrupts its first read, then serves `payload`.
    pub fn flaky_reads(path: &str, manufacturer: &str, payload: &[u8]) -> Self {
        let mut transport = Self::single(path, manufacturer);
        transport.flaky_payload = Some(payload.to_vec());
        transport
    }

    /// Write half of the earliest opened stream not yet taken.
    pub fn take_writer(&self) -> DuplexStream {
        self.writers
            .lock()
            .unwrap()
            .pop_front()
            .expect("no stream has been opened")
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn list_ports(&self) -> Result<Vec<PortDescriptor>> {
        if let Some(message) = &self.fail_enumeration {
            return Err(SerialError::EnumerationFailed(message.clone()));
        }
        Ok(self.ports.clone())
    }

    async fn open(&self, config: &ConnectionConfig) -> Result<ByteStream> {
        if let Some(message) = &self.fail_open {
            return Err(SerialError::OpenFailed(message.clone()));
        }
        if !self.ports.iter().any(|p| p.path == config.path) {
            return Err(SerialError::OpenFailed(format!(
                "{}: no such port",
                config.path
            )));
        }
        if self.fail_reads {
            return Ok(Box::new(FailingStream::new("device fault")));
        }
        if let Some(payload) = &self.flaky_payload {
            return Ok(Box::new(FlakyStream::new(payload.clone())));
        }

        let (manager_half, test_half) = tokio::io::duplex(256);
        self.writers.lock().unwrap().push_back(test_half);
        Ok(Box::new(manager_half))
    }
}

/// Stream whose reads fail immediately, standing in for a faulted device.
pub struct FailingStream {
    message: String,
}

impl FailingStream {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl AsyncRead for FailingStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::Other,
            self.message.clone(),
        )))
    }
}

/// Stream that interrupts its first read, then serves a fixed payload, then
/// sits idle like a quiet device.
pub struct FlakyStream {
    payload: Option<Vec<u8>>,
    interrupted: bool,
}

impl FlakyStream {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            interrupted: false,
        }
    }
}

impl AsyncRead for FlakyStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if !self.interrupted {
            self.interrupted = true;
            return Poll::Ready(Err(io::Error::from(io::ErrorKind::Interrupted)));
        }
        match self.payload.take() {
            Some(payload) => {
                buf.put_slice(&payload);
                Poll::Ready(Ok(()))
            }
            // Idle, not closed; the reader's stop signal wakes the task.
            None => Poll::Pending,
        }
    }
}

/// Receive the next event or panic after one second.
pub async fn next_event(events: &mut broadcast::Receiver<ConnectionEvent>) -> ConnectionEvent {
    timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Assert that no event arrives within a short window.
pub async fn assert_no_event(events: &mut broadcast::Receiver<ConnectionEvent>) {
    match timeout(Duration::from_millis(100), events.recv()).await {
        Err(_) => {}
        Ok(Ok(event)) => panic!("unexpected event: {:?}", event),
        Ok(Err(_)) => {}
    }
}
