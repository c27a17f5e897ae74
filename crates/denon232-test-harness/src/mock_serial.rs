//! Mock transport for deterministic testing of the command link.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs, so command formatting and response parsing can be
//! tested without a receiver on the bench.
//!
//! # Example
//!
//! ```
//! use denon232_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the link sends this request, reply with these lines.
//! mock.expect(b"MV?\r", b"MV50\rMVMAX 80\r");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use denon232_core::error::{Error, Result};
use denon232_core::transport::Transport;

/// One observable step of traffic on a mock transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    /// Bytes written by the code under test.
    Sent(Vec<u8>),
    /// Bytes handed back from one `receive()` call.
    Received(Vec<u8>),
    /// A `receive()` call that found nothing to return.
    TimedOut,
}

/// Shared, append-only record of traffic across one or more mock transports.
///
/// Cloning a `Journal` yields another handle to the same record, so a test
/// can keep one handle while the transport itself is moved into the code
/// under test.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<JournalEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an entry.
    pub fn record(&self, entry: JournalEntry) {
        self.lock().push(entry);
    }

    /// Snapshot of all entries in the order they were recorded.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.lock().clone()
    }

    /// Every sent payload as text, with the trailing `\r` removed.
    pub fn sent_commands(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Sent(data) => Some(
                    String::from_utf8_lossy(data)
                        .trim_end_matches('\r')
                        .to_string(),
                ),
                _ => None,
            })
            .collect()
    }
}

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes to return when the matching request is received.
    response: Vec<u8>,
}

/// A mock [`Transport`] for testing without hardware.
///
/// Ordered expectations registered with [`expect`](Self::expect) are consumed
/// first, strictly in order. Once they are exhausted, standing replies
/// registered with [`respond`](Self::respond) answer any matching request
/// any number of times, which suits tests with several concurrent callers.
///
/// A request that matches nothing returns [`Error::Protocol`].
#[derive(Debug)]
pub struct MockTransport {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Reusable replies, matched by request bytes.
    standing: Vec<Expectation>,
    /// The response data pending for the next `receive()` call.
    pending_response: Option<Vec<u8>>,
    /// Cursor into the pending response.
    response_cursor: usize,
    /// Largest chunk handed out by one `receive()` call.
    max_chunk: usize,
    /// Whether the transport is "connected".
    connected: bool,
    /// Fail every `send()` with a broken-pipe I/O error.
    fail_sends: bool,
    /// Fail every `receive()` with an I/O error.
    fail_receives: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
    /// Shared traffic record.
    journal: Journal,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            standing: Vec::new(),
            pending_response: None,
            response_cursor: 0,
            max_chunk: usize::MAX,
            connected: true,
            fail_sends: false,
            fail_receives: false,
            sent_log: Vec::new(),
            journal: Journal::new(),
        }
    }

    /// Record traffic into an existing journal instead of a private one.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Hand out at most `n` bytes per `receive()` call.
    pub fn with_max_chunk(mut self, n: usize) -> Self {
        self.max_chunk = n.max(1);
        self
    }

    /// Add an ordered request/response pair.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Add a standing reply used every time `request` is sent.
    pub fn respond(&mut self, request: &[u8], response: &[u8]) {
        self.standing.push(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Handle to this transport's journal.
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Return all data that has been sent through this transport.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Return the number of ordered expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Set the connected state of the mock transport.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Make every subsequent `send()` fail.
    pub fn fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// Make every subsequent `receive()` fail.
    pub fn fail_receives(&mut self, fail: bool) {
        self.fail_receives = fail;
    }

    fn next_response(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if let Some(expectation) = self.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Protocol(format!(
                    "unexpected send data: expected {:?}, got {:?}",
                    String::from_utf8_lossy(&expectation.request),
                    String::from_utf8_lossy(data)
                )));
            }
            return Ok(expectation.response);
        }

        self.standing
            .iter()
            .find(|s| s.request.as_slice() == data)
            .map(|s| s.response.clone())
            .ok_or_else(|| {
                Error::Protocol(format!(
                    "no expectation for {:?} in mock transport",
                    String::from_utf8_lossy(data)
                ))
            })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());
        self.journal.record(JournalEntry::Sent(data.to_vec()));

        if self.fail_sends {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock send failure",
            )));
        }

        let response = self.next_response(data)?;
        self.pending_response = Some(response);
        self.response_cursor = 0;
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        // Give other tasks a chance to run between reads, as real I/O would.
        tokio::task::yield_now().await;

        if self.fail_receives {
            return Err(Error::Io(std::io::Error::other("mock receive failure")));
        }

        if let Some(ref response) = self.pending_response {
            let remaining = &response[self.response_cursor..];
            if remaining.is_empty() {
                self.pending_response = None;
                self.response_cursor = 0;
                self.journal.record(JournalEntry::TimedOut);
                return Err(Error::Timeout);
            }
            let n = remaining.len().min(buf.len()).min(self.max_chunk);
            buf[..n].copy_from_slice(&remaining[..n]);
            self.journal
                .record(JournalEntry::Received(remaining[..n].to_vec()));
            self.response_cursor += n;
            if self.response_cursor >= response.len() {
                self.pending_response = None;
                self.response_cursor = 0;
            }
            Ok(n)
        } else {
            self.journal.record(JournalEntry::TimedOut);
            Err(Error::Timeout)
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.pending_response = None;
        self.response_cursor = 0;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_transport_basic_send_receive() {
        let mut mock = MockTransport::new();
        mock.expect(b"PW?\r", b"PWON\r");

        mock.send(b"PW?\r").await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"PWON\r");

        // Response exhausted: the next read times out.
        let result = mock.receive(&mut buf, Duration::from_millis(100)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn mock_transport_tracks_sent_data() {
        let mut mock = MockTransport::new();
        mock.expect(b"PWON\r", b"");
        mock.expect(b"MUON\r", b"");

        mock.send(b"PWON\r").await.unwrap();
        mock.send(b"MUON\r").await.unwrap();

        assert_eq!(mock.sent_data().len(), 2);
        assert_eq!(mock.sent_data()[1], b"MUON\r");
        assert_eq!(mock.journal().sent_commands(), vec!["PWON", "MUON"]);
    }

    #[tokio::test]
    async fn mock_transport_wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(b"PW?\r", b"PWON\r");

        let result = mock.send(b"MU?\r").await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn mock_transport_no_expectations_errors() {
        let mut mock = MockTransport::new();
        let result = mock.send(b"PW?\r").await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn mock_transport_standing_replies_repeat() {
        let mut mock = MockTransport::new();
        mock.respond(b"MU?\r", b"MUOFF\r");

        let mut buf = [0u8; 16];
        for _ in 0..3 {
            mock.send(b"MU?\r").await.unwrap();
            let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
            assert_eq!(&buf[..n], b"MUOFF\r");
        }
    }

    #[tokio::test]
    async fn mock_transport_ordered_before_standing() {
        let mut mock = MockTransport::new();
        mock.expect(b"MU?\r", b"MUON\r");
        mock.respond(b"MU?\r", b"MUOFF\r");

        let mut buf = [0u8; 16];
        mock.send(b"MU?\r").await.unwrap();
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"MUON\r");

        mock.send(b"MU?\r").await.unwrap();
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"MUOFF\r");
    }

    #[tokio::test]
    async fn mock_transport_failure_injection() {
        let mut mock = MockTransport::new();
        mock.fail_sends(true);
        let result = mock.send(b"PW?\r").await;
        assert!(matches!(result, Err(Error::Io(_))));

        let mut mock = MockTransport::new();
        mock.fail_receives(true);
        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::ZERO).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn mock_transport_disconnect() {
        let mut mock = MockTransport::new();
        assert!(mock.is_connected());

        mock.close().await.unwrap();
        assert!(!mock.is_connected());

        let result = mock.send(b"PW?\r").await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn mock_transport_chunked_receive() {
        let mut mock = MockTransport::new().with_max_chunk(3);
        mock.expect(b"PW?\r", b"PWON\r");
        mock.send(b"PW?\r").await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"PWO");
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"N\r");
    }

    #[tokio::test]
    async fn journal_is_shared_between_handles() {
        let journal = Journal::new();
        let mut mock = MockTransport::new().with_journal(journal.clone());
        mock.expect(b"PW?\r", b"PWON\r");

        mock.send(b"PW?\r").await.unwrap();
        let mut buf = [0u8; 16];
        let _ = mock.receive(&mut buf, Duration::ZERO).await;
        let _ = mock.receive(&mut buf, Duration::ZERO).await;

        assert_eq!(
            journal.entries(),
            vec![
                JournalEntry::Sent(b"PW?\r".to_vec()),
                JournalEntry::Received(b"PWON\r".to_vec()),
                JournalEntry::TimedOut,
            ]
        );
    }
}
