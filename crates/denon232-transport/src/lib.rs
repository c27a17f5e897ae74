//! Transport implementations for denon232.
//!
//! This crate provides the concrete serial implementation of the
//! [`Transport`](denon232_core::Transport) and
//! [`Connector`](denon232_core::Connector) traits from `denon232-core`.
//!
//! # Example
//!
//! ```no_run
//! use denon232_transport::{SerialConfig, SerialConnector};
//! use denon232_core::Connector;
//!
//! # async fn example() -> denon232_core::Result<()> {
//! let connector = SerialConnector::new("/dev/ttyUSB0", SerialConfig::default());
//! let transport = connector.connect().await?;
//! assert!(transport.is_connected());
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{
    DataBits, FlowControl, Parity, SerialConfig, SerialConnector, SerialTransport, StopBits,
};
