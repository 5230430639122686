use serialport::SerialPortType;
use tokio::io::AsyncRead;
use tokio_serial::SerialStream;

use super::{PortDescriptor, Result, SerialError};
use crate::connection::ConnectionConfig;

/// The byte stream of an open serial connection.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Access to the host's serial layer: enumerate ports and open one as an
/// async byte stream. The production implementation talks to real devices;
/// tests substitute in-memory streams.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Enumerate serial-capable devices currently attached to the host.
    fn list_ports(&self) -> Result<Vec<PortDescriptor>>;

    /// Open the port described by `config` and hand back its byte stream.
    /// The config is validated here, not at construction.
    async fn open(&self, config: &ConnectionConfig) -> Result<ByteStream>;
}

/// Transport backed by the operating system's serial devices.
pub struct SystemTransport;

#[async_trait::async_trait]
impl Transport for SystemTransport {
    fn list_ports(&self) -> Result<Vec<PortDescriptor>> {
        let ports = serialport::available_ports()
            .map_err(|e| SerialError::EnumerationFailed(e.to_string()))?;

        Ok(ports
            .into_iter()
            .map(|port| {
                let manufacturer = match &port.port_type {
                    SerialPortType::UsbPort(usb) => {
                        usb.manufacturer.clone().unwrap_or_default()
                    }
                    _ => String::new(),
                };
                PortDescriptor {
                    path: port.port_name,
                    manufacturer,
                }
            })
            .collect())
    }

    async fn open(&self, config: &ConnectionConfig) -> Result<ByteStream> {
        // Two phases, like the rest of the lifecycle: build the port in a
        // non-open state, then issue the actual open.
        let builder = tokio_serial::new(&config.path, config.baud_rate);
        let stream = SerialStream::open(&builder)
            .map_err(|e| SerialError::OpenFailed(e.to_string()))?;

        Ok(Box::new(stream))
    }
}
