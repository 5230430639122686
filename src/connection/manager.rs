use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::timeout;

use crate::serial::transport::{ByteStream, Transport};
use crate::serial::{classify, LineFramer, PortDescriptor, Result};
use super::{CloseOutcome, ConnectionConfig, ConnectionEvent, ConnectionState, LifecycleEvent};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const READ_BUFFER_SIZE: usize = 512;

/// Owns the single active serial connection and its event pipeline.
///
/// All state transitions run through the slot mutex, so open and close
/// requests are serialized and the latest completed open owns the
/// connection. Subscribers receive line and lifecycle events over a
/// broadcast channel in publish order.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    slot: Mutex<ConnectionSlot>,
    events_tx: broadcast::Sender<ConnectionEvent>,
}

#[derive(Default)]
struct ConnectionSlot {
    active: Option<ActiveConnection>,
    /// Set on the first open attempt and never cleared; close() answers
    /// `NoPort` only while this is false.
    ever_opened: bool,
}

/// One generation of the connection: the reader task plus its controls.
struct ActiveConnection {
    path: String,
    /// Channel to signal stop
    stop_tx: mpsc::Sender<()>,
    /// Handle of the reader task
    task: tokio::task::JoinHandle<()>,
    /// Set by the reader task right before it publishes `Closed`.
    closed: Arc<AtomicBool>,
}

impl ActiveConnection {
    /// Signal the reader task to stop and wait for it to finish. The task
    /// publishes the final `Closed` event on its way out.
    async fn shutdown(self) {
        let _ = self.stop_tx.send(()).await;

        // Wait for the task to complete gracefully (with timeout)
        let _ = timeout(Duration::from_secs(2), self.task).await;
    }
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            slot: Mutex::new(ConnectionSlot::default()),
            events_tx,
        }
    }

    /// Subscribe to line and lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events_tx.subscribe()
    }

    /// List currently attached serial ports.
    ///
    /// Enumeration failure is never fatal: it is recovered as an empty list,
    /// with the message published as an `Errored` event.
    pub fn list_ports(&self) -> Vec<PortDescriptor> {
        match self.transport.list_ports() {
            Ok(ports) => ports,
            Err(e) => {
                log::warn!("Port enumeration failed: {}", e);
                let _ = self.events_tx.send(ConnectionEvent::Lifecycle(
                    LifecycleEvent::Errored(e.to_string()),
                ));
                Vec::new()
            }
        }
    }

    /// Open a connection with the given config.
    ///
    /// Any existing connection is torn down first; errors during that
    /// implicit teardown are discarded. On failure the state remains Closed
    /// and the error carries the transport's message.
    pub async fn open(&self, config: ConnectionConfig) -> Result<()> {
        let mut slot = self.slot.lock().await;
        slot.ever_opened = true;

        if let Some(previous) = slot.active.take() {
            log::info!("Closing {} before opening {}", previous.path, config.path);
            previous.shutdown().await;
        }

        let stream = self.transport.open(&config).await?;

        let (stop_tx, stop_rx) = mpsc::channel(1);
        let closed = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(reader_task(
            stream,
            self.events_tx.clone(),
            stop_rx,
            Arc::clone(&closed),
        ));

        slot.active = Some(ActiveConnection {
            path: config.path.clone(),
            stop_tx,
            task,
            closed,
        });

        log::info!("Opened {} at {} baud", config.path, config.baud_rate);
        Ok(())
    }

    /// Close the active connection.
    ///
    /// Resolves `NoPort` only if no open was ever attempted. Otherwise the
    /// reader is stopped before the transport goes down, so no further line
    /// events are produced, and the call resolves `Closed` once teardown
    /// completes. Idempotent: a second close resolves `Closed` again without
    /// publishing a second `Closed` event.
    pub async fn close(&self) -> CloseOutcome {
        let active = {
            let mut slot = self.slot.lock().await;
            if !slot.ever_opened {
                return CloseOutcome::NoPort;
            }
            slot.active.take()
        };

        if let Some(active) = active {
            log::info!("Closing {}", active.path);
            active.shutdown().await;
        }

        CloseOutcome::Closed
    }

    /// Current state of the connection state machine. A connection whose
    /// reader has already announced `Closed` reports `Closed` even before a
    /// close() call reaps it.
    pub async fn state(&self) -> ConnectionState {
        let slot = self.slot.lock().await;
        match &slot.active {
            Some(conn) if !conn.closed.load(Ordering::SeqCst) => ConnectionState::Open,
            _ => ConnectionState::Closed,
        }
    }

    /// Path of the currently open connection, if any.
    pub async fn active_path(&self) -> Option<String> {
        let slot = self.slot.lock().await;
        slot.active
            .as_ref()
            .filter(|conn| !conn.closed.load(Ordering::SeqCst))
            .map(|conn| conn.path.clone())
    }
}

/// Pumps the byte stream through the framer and classifier, publishing one
/// event per non-empty line. Runs until stopped, end of stream, or a hard
/// read error; the final action is always publishing exactly one `Closed`,
/// so no line event of this generation can follow it.
async fn reader_task(
    mut stream: ByteStream,
    events_tx: broadcast::Sender<ConnectionEvent>,
    mut stop_rx: mpsc::Receiver<()>,
    closed: Arc<AtomicBool>,
) {
    let mut framer = LineFramer::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        tokio::select! {
            // Stop wins over pending data: a requested close must not flush
            // further lines from the stream.
            biased;

            _ = stop_rx.recv() => {
                log::debug!("Reader received stop signal");
                break;
            }

            read = stream.read(&mut buf) => match read {
                Ok(0) => {
                    log::info!("Serial stream ended");
                    break;
                }
                Ok(n) => {
                    for line in framer.feed(&buf[..n]) {
                        if let Some(event) = classify(&line) {
                            let _ = events_tx.send(ConnectionEvent::Line(event));
                        }
                    }
                }
                Err(e) if matches!(
                    e.kind(),
                    std::io::ErrorKind::Interrupted | std::io::ErrorKind::TimedOut
                ) => {}
                Err(e) => {
                    log::warn!("Serial read failed: {}", e);
                    let _ = events_tx.send(ConnectionEvent::Lifecycle(
                        LifecycleEvent::Errored(e.to_string()),
                    ));
                    break;
                }
            },
        }
    }

    // Release the device handle before announcing closure.
    drop(stream);
    closed.store(true, Ordering::SeqCst);
    let _ = events_tx.send(ConnectionEvent::Lifecycle(LifecycleEvent::Closed));
}
