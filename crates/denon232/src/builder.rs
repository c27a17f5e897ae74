//! ReceiverBuilder -- fluent builder for constructing [`Receiver`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial port parameters and timeouts before the link is opened.
//!
//! # Example
//!
//! ```no_run
//! use denon232::builder::ReceiverBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> denon232_core::Result<()> {
//! let receiver = ReceiverBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .read_timeout(Duration::from_millis(500))
//!     .build()
//!     .await?;
//! println!("available: {}", receiver.is_available());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use denon232_core::error::{Error, Result};
use denon232_core::transport::Connector;
use denon232_transport::{DataBits, FlowControl, Parity, SerialConfig, SerialConnector, StopBits};

use crate::receiver::{DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT, LinkTimeouts, Receiver};

/// Fluent builder for [`Receiver`].
///
/// Serial settings default to the receiver's 9600 baud 8N1, so the simplest
/// usage is:
///
/// ```ignore
/// let receiver = ReceiverBuilder::new()
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ReceiverBuilder {
    serial_port: Option<String>,
    serial: SerialConfig,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl Default for ReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiverBuilder {
    pub fn new() -> Self {
        ReceiverBuilder {
            serial_port: None,
            serial: SerialConfig::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the baud rate (default: 9600).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.serial.baud_rate = baud;
        self
    }

    pub fn data_bits(mut self, bits: DataBits) -> Self {
        self.serial.data_bits = bits;
        self
    }

    pub fn stop_bits(mut self, bits: StopBits) -> Self {
        self.serial.stop_bits = bits;
        self
    }

    pub fn parity(mut self, parity: Parity) -> Self {
        self.serial.parity = parity;
        self
    }

    pub fn flow_control(mut self, flow: FlowControl) -> Self {
        self.serial.flow_control = flow;
        self
    }

    /// Set the bound on each read while collecting a response (default: 1s).
    ///
    /// A response ends at the first read that sees nothing for this long,
    /// so this is also the minimum duration of every query.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the bound on writing one command (default: 1s).
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// The serial settings `build()` will open the port with.
    pub fn serial_config(&self) -> &SerialConfig {
        &self.serial
    }

    fn timeouts(&self) -> Result<LinkTimeouts> {
        if self.read_timeout.is_zero() {
            return Err(Error::InvalidParameter("read_timeout must be non-zero".into()));
        }
        if self.write_timeout.is_zero() {
            return Err(Error::InvalidParameter("write_timeout must be non-zero".into()));
        }
        Ok(LinkTimeouts {
            read: self.read_timeout,
            write: self.write_timeout,
        })
    }

    /// Build a [`Receiver`] with a caller-provided connector.
    ///
    /// This is the entry point for testing (pass a `MockConnector` from
    /// `denon232-test-harness`). The serial settings are ignored.
    pub async fn build_with_connector(self, connector: Box<dyn Connector>) -> Result<Receiver> {
        let timeouts = self.timeouts()?;
        Ok(Receiver::open(connector, timeouts).await)
    }

    /// Build a [`Receiver`] on a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    /// A port that cannot be opened is not an error here: the receiver is
    /// returned unavailable.
    pub async fn build(self) -> Result<Receiver> {
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let connector = SerialConnector::new(port, self.serial.clone());
        self.build_with_connector(Box::new(connector)).await
    }
}
