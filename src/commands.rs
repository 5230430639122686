use std::sync::Arc;
use tauri::State;

use crate::connection::{ConnectionConfig, ConnectionManager};
use crate::serial::PortDescriptor;

/// List available serial ports. Enumeration failure yields an empty list
/// plus a serial-error notification, never a command error.
#[tauri::command]
pub async fn list_ports(
    manager: State<'_, Arc<ConnectionManager>>,
) -> Result<Vec<PortDescriptor>, String> {
    Ok(manager.list_ports())
}

/// Open a serial port, closing any currently open one first.
#[tauri::command]
pub async fn open_port(
    path: String,
    baud_rate: Option<u32>,
    manager: State<'_, Arc<ConnectionManager>>,
) -> Result<String, String> {
    let mut config = ConnectionConfig::new(path);
    if let Some(baud_rate) = baud_rate {
        config.baud_rate = baud_rate;
    }

    manager
        .open(config)
        .await
        .map(|_| "ok".to_string())
        .map_err(|e| e.to_string())
}

/// Close the open serial port. Resolves "no-port" if none was ever opened,
/// "closed" otherwise; never fails.
#[tauri::command]
pub async fn close_port(
    manager: State<'_, Arc<ConnectionManager>>,
) -> Result<String, String> {
    Ok(manager.close().await.as_str().to_string())
}
