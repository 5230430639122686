use std::sync::Arc;

use tauri::Emitter;
use tokio::sync::broadcast::error::RecvError;

use crate::connection::{ConnectionEvent, ConnectionManager, LifecycleEvent};
use crate::serial::LineEvent;

/// Window event names, one per notification kind.
pub const SENSOR_UPDATE: &str = "sensor-update";
pub const SERIAL_RAW: &str = "serial-raw";
pub const SERIAL_ERROR: &str = "serial-error";
pub const SERIAL_CLOSED: &str = "serial-closed";

/// Bridge the manager's event stream onto window events. Subscribed once at
/// startup; runs for the lifetime of the app.
pub fn spawn_event_forwarder(app_handle: tauri::AppHandle, manager: Arc<ConnectionManager>) {
    let mut events = manager.subscribe();

    tauri::async_runtime::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => forward(&app_handle, event),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Event forwarder lagged, {} events dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn forward(app_handle: &tauri::AppHandle, event: ConnectionEvent) {
    let result = match event {
        ConnectionEvent::Line(LineEvent::Structured(payload)) => {
            app_handle.emit(SENSOR_UPDATE, payload)
        }
        ConnectionEvent::Line(LineEvent::Raw(text)) => app_handle.emit(SERIAL_RAW, text),
        ConnectionEvent::Lifecycle(LifecycleEvent::Errored(message)) => {
            app_handle.emit(SERIAL_ERROR, message)
        }
        ConnectionEvent::Lifecycle(LifecycleEvent::Closed) => {
            app_handle.emit(SERIAL_CLOSED, ())
        }
    };

    if let Err(e) = result {
        log::warn!("Failed to emit serial event: {}", e);
    }
}
