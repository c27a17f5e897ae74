//! Transport and connector traits for receiver communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a receiver.
//! The serial implementation lives in `denon232-transport`; a scripted mock
//! lives in `denon232-test-harness`.
//!
//! A [`Connector`] knows how to open a fresh [`Transport`]. The command link
//! holds one so it can open the channel at construction and reopen it lazily
//! after the channel has gone away.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a receiver.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the receiver.
    ///
    /// Implementations should not return until all bytes have been handed to
    /// the underlying device and flushed.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the receiver into the provided buffer.
    ///
    /// Waits up to `timeout` for data. Returns
    /// [`Error::Timeout`](crate::error::Error::Timeout) if nothing arrived,
    /// or `Ok(0)` if the channel reached end-of-stream.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}

/// Opens [`Transport`]s to one physical device.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection to the device.
    async fn connect(&self) -> Result<Box<dyn Transport>>;

    /// Identifier of the device this connector opens (e.g. `/dev/ttyUSB0`).
    fn describe(&self) -> &str;
}
