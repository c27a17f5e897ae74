//! RS-232 link to a receiver over tokio-serial.
//!
//! [`SerialTransport`] implements [`Transport`] on a native async serial
//! stream (usually a USB adapter). [`SerialConnector`] remembers a port and
//! its settings so the command link can reopen the port after it drops.
//!
//! Denon receivers speak 9600 baud 8N1 without flow control, which is what
//! [`SerialConfig::default`] gives.
//!
//! # Example
//!
//! ```no_run
//! use denon232_transport::SerialTransport;
//! use denon232_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> denon232_core::Result<()> {
//! let mut link = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//! link.send(b"MV?\r").await?;
//!
//! let mut buf = [0u8; 64];
//! let n = link.receive(&mut buf, Duration::from_millis(200)).await?;
//! println!("{:?}", String::from_utf8_lossy(&buf[..n]));
//! # Ok(())
//! # }
//! ```

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use denon232_core::error::{Error, Result};
use denon232_core::transport::{Connector, Transport};

pub use tokio_serial::{DataBits, FlowControl, Parity, StopBits};

/// Line settings for the serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    /// 9600 baud 8N1, no flow control.
    fn default() -> Self {
        Self::with_baud(9600)
    }
}

impl SerialConfig {
    /// 8N1 without flow control at `baud_rate`.
    pub fn with_baud(baud_rate: u32) -> Self {
        SerialConfig {
            baud_rate,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }
}

/// A disconnect shows up as one of a few I/O error kinds; everything else
/// is passed through.
fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::NotConnected | ErrorKind::UnexpectedEof => {
            Error::ConnectionLost
        }
        _ => Error::Io(e),
    }
}

/// An open serial port.
pub struct SerialTransport {
    stream: Option<SerialStream>,
    path: String,
}

impl SerialTransport {
    /// Open `path` at `baud_rate`, 8N1.
    pub async fn open(path: &str, baud_rate: u32) -> Result<Self> {
        Self::open_with_config(path, &SerialConfig::with_baud(baud_rate)).await
    }

    /// Open `path` with explicit line settings.
    pub async fn open_with_config(path: &str, config: &SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %path,
            baud_rate = config.baud_rate,
            settings = ?(config.data_bits, config.parity, config.stop_bits),
            "opening serial port"
        );

        let stream = tokio_serial::new(path, config.baud_rate)
            .data_bits(config.data_bits)
            .stop_bits(config.stop_bits)
            .parity(config.parity)
            .flow_control(config.flow_control)
            .open_native_async()
            .map_err(|e| Error::Transport(format!("Failed to open serial port {path}: {e}")))?;

        tracing::info!(port = %path, baud_rate = config.baud_rate, "serial port open");
        Ok(SerialTransport {
            stream: Some(stream),
            path: path.to_string(),
        })
    }

    /// Device path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        tracing::trace!(port = %self.path, data = ?String::from_utf8_lossy(data), "serial write");

        stream.write_all(data).await.map_err(map_io_error)?;
        stream.flush().await.map_err(map_io_error)
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let n = tokio::time::timeout(timeout, stream.read(buf))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(map_io_error)?;
        tracing::trace!(port = %self.path, data = ?String::from_utf8_lossy(&buf[..n]), "serial read");
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        // Dropping the stream releases the device even if the flush fails.
        let flushed = stream.flush().await.map_err(map_io_error);
        drop(stream);
        tracing::debug!(port = %self.path, "serial port closed");
        flushed
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Opens [`SerialTransport`]s on one port with fixed settings.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    path: String,
    config: SerialConfig,
}

impl SerialConnector {
    pub fn new(path: &str, config: SerialConfig) -> Self {
        SerialConnector {
            path: path.to_string(),
            config,
        }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for SerialConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>> {
        let transport = SerialTransport::open_with_config(&self.path, &self.config).await?;
        Ok(Box::new(transport))
    }

    fn describe(&self) -> &str {
        &self.path
    }
}
