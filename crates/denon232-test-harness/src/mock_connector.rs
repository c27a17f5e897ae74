//! Mock connector handing out pre-built [`MockTransport`]s.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use denon232_core::error::{Error, Result};
use denon232_core::transport::{Connector, Transport};

use crate::mock_serial::MockTransport;

/// A [`Connector`] that returns queued mock transports in order.
///
/// Once the queue is empty every `connect()` fails, which is how tests
/// simulate a port that is missing or cannot be opened.
#[derive(Debug)]
pub struct MockConnector {
    port: String,
    queue: Mutex<VecDeque<MockTransport>>,
    attempts: Arc<AtomicUsize>,
}

impl MockConnector {
    /// Create a connector for `port` with no transports queued.
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            queue: Mutex::new(VecDeque::new()),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a connector whose first `connect()` yields `mock`.
    pub fn with_transport(port: &str, mock: MockTransport) -> Self {
        Self::new(port).then(mock)
    }

    /// Queue another transport for a later `connect()`.
    pub fn then(self, mock: MockTransport) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(mock);
        self
    }

    /// Handle that reports how many times `connect()` has been called.
    pub fn attempts(&self) -> ConnectAttempts {
        ConnectAttempts(self.attempts.clone())
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(mock) => Ok(Box::new(mock)),
            None => Err(Error::Transport(format!(
                "Failed to open serial port {}: no such device",
                self.port
            ))),
        }
    }

    fn describe(&self) -> &str {
        &self.port
    }
}

/// Shared counter of connect attempts made through a [`MockConnector`].
#[derive(Debug, Clone)]
pub struct ConnectAttempts(Arc<AtomicUsize>);

impl ConnectAttempts {
    /// Number of `connect()` calls so far.
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connector_hands_out_queued_transports() {
        let connector = MockConnector::with_transport("/dev/mock0", MockTransport::new());
        let attempts = connector.attempts();

        let transport = connector.connect().await.unwrap();
        assert!(transport.is_connected());
        assert_eq!(attempts.count(), 1);

        assert!(connector.connect().await.is_err());
        assert_eq!(attempts.count(), 2);
    }

    #[tokio::test]
    async fn empty_connector_fails() {
        let connector = MockConnector::new("/dev/mock1");
        let result = connector.connect().await;
        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(connector.describe(), "/dev/mock1");
    }
}
