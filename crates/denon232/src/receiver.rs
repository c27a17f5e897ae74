//! Receiver -- the serialized command link to one Denon receiver.
//!
//! The RS-232 protocol has no framing beyond the `\r` terminator and no
//! request identifiers, so the only way to pair a response with its command
//! is to never let two exchanges overlap. [`Receiver`] owns the physical
//! channel behind a single lock and runs each write-then-read exchange to
//! completion before the next one starts.
//!
//! Failures never reach the caller. A failed open, write or read marks the
//! receiver unavailable and the call returns an empty reply shaped like the
//! one requested; later calls return empty replies immediately until
//! [`Receiver::reconnect`] succeeds.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, trace, warn};

use denon232_core::error::{Error, Result};
use denon232_core::transport::{Connector, Transport};

use crate::protocol::{self, LineBuffer};

/// Default bound on one read while collecting response lines.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Default bound on writing one command.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

const READ_CHUNK: usize = 256;

/// How much of a response to collect after writing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Write only; do not read.
    Nothing,
    /// Collect the response and keep the first line.
    Line,
    /// Collect the response and keep every line.
    AllLines,
}

/// Response to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing was requested.
    None,
    /// First response line, empty when nothing arrived.
    Line(String),
    /// Every response line in arrival order.
    Lines(Vec<String>),
}

impl Reply {
    /// The empty reply of the shape `expect` asks for.
    pub fn empty(expect: Expect) -> Self {
        match expect {
            Expect::Nothing => Reply::None,
            Expect::Line => Reply::Line(String::new()),
            Expect::AllLines => Reply::Lines(Vec::new()),
        }
    }

    /// First line of the reply, or `""`.
    pub fn line(&self) -> &str {
        match self {
            Reply::None => "",
            Reply::Line(line) => line,
            Reply::Lines(lines) => lines.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// Every non-empty line of the reply.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Reply::None => Vec::new(),
            Reply::Line(line) if line.is_empty() => Vec::new(),
            Reply::Line(line) => vec![line.as_str()],
            Reply::Lines(lines) => lines
                .iter()
                .map(String::as_str)
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }

    /// True when the reply carries no text.
    pub fn is_empty(&self) -> bool {
        match self {
            Reply::None => true,
            Reply::Line(line) => line.is_empty(),
            Reply::Lines(lines) => lines.is_empty(),
        }
    }
}

/// Read and write bounds for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTimeouts {
    /// Bound on each read. Elapsing ends the response; it is not a failure.
    pub read: Duration,
    /// Bound on the write. Elapsing is a failure.
    pub write: Duration,
}

impl Default for LinkTimeouts {
    fn default() -> Self {
        Self {
            read: DEFAULT_READ_TIMEOUT,
            write: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// State shared between the [`Receiver`] handle and in-flight exchanges.
struct Link {
    port_path: String,
    connector: Box<dyn Connector>,
    /// The open channel, if any. Holding this lock is what serializes
    /// exchanges.
    channel: Mutex<Option<Box<dyn Transport>>>,
    available: AtomicBool,
    timeouts: LinkTimeouts,
}

/// The command link to one receiver.
///
/// Cheap to share behind an `Arc`; every zone controller of a device holds
/// the same `Receiver`. Construct with [`Receiver::open`] or
/// [`ReceiverBuilder`](crate::builder::ReceiverBuilder).
pub struct Receiver {
    link: Arc<Link>,
}

impl std::fmt::Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("port_path", &self.link.port_path)
            .field("available", &self.is_available())
            .field("timeouts", &self.link.timeouts)
            .finish()
    }
}

impl Receiver {
    /// Open the channel through `connector`.
    ///
    /// Never fails: if the channel cannot be opened the cause is logged and
    /// the receiver starts unavailable.
    pub async fn open(connector: Box<dyn Connector>, timeouts: LinkTimeouts) -> Self {
        let port_path = connector.describe().to_string();
        let (channel, available) = match connector.connect().await {
            Ok(transport) => {
                info!(port = %port_path, "receiver link open");
                (Some(transport), true)
            }
            Err(e) => {
                warn!(port = %port_path, error = %e, "cannot open receiver link, starting unavailable");
                (None, false)
            }
        };

        Receiver {
            link: Arc::new(Link {
                port_path,
                connector,
                channel: Mutex::new(channel),
                available: AtomicBool::new(available),
                timeouts,
            }),
        }
    }

    /// True while the channel is open and the last exchange succeeded.
    pub fn is_available(&self) -> bool {
        self.link.available.load(Ordering::SeqCst)
    }

    /// Serial device path (or connector description).
    pub fn port_path(&self) -> &str {
        &self.link.port_path
    }

    pub fn timeouts(&self) -> LinkTimeouts {
        self.link.timeouts
    }

    /// Send `command` and collect the reply `expect` asks for.
    ///
    /// Returns [`Reply::empty`] without touching the channel when the
    /// receiver is unavailable, and after any I/O failure. The exchange runs
    /// on its own task: dropping the returned future does not abort it, and
    /// the lock is only released once it has finished.
    pub async fn send(&self, command: &str, expect: Expect) -> Reply {
        if !self.is_available() {
            debug!(port = %self.link.port_path, command, "receiver unavailable, command skipped");
            return Reply::empty(expect);
        }

        let link = Arc::clone(&self.link);
        let command = command.to_string();
        match tokio::spawn(async move { link.exchange(&command, expect).await }).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(port = %self.link.port_path, error = %e, "receiver exchange task failed");
                Reply::empty(expect)
            }
        }
    }

    /// Send a command without reading a response.
    pub async fn command(&self, command: &str) {
        self.send(command, Expect::Nothing).await;
    }

    /// Send a query and return the first response line (`""` if none).
    pub async fn query(&self, command: &str) -> String {
        match self.send(command, Expect::Line).await {
            Reply::Line(line) => line,
            other => other.line().to_string(),
        }
    }

    /// Send a query and return every response line.
    pub async fn query_all(&self, command: &str) -> Vec<String> {
        match self.send(command, Expect::AllLines).await {
            Reply::Lines(lines) => lines,
            other => other.lines().into_iter().map(str::to_string).collect(),
        }
    }

    /// Close any open channel and open it again.
    ///
    /// Returns the resulting availability. Waits for an in-flight exchange
    /// to finish first.
    pub async fn reconnect(&self) -> bool {
        let mut channel = self.link.channel.lock().await;
        if let Some(mut transport) = channel.take() {
            if let Err(e) = transport.close().await {
                debug!(port = %self.link.port_path, error = %e, "error closing stale link");
            }
        }

        match self.link.connector.connect().await {
            Ok(transport) => {
                *channel = Some(transport);
                self.link.available.store(true, Ordering::SeqCst);
                info!(port = %self.link.port_path, "receiver link reopened");
                true
            }
            Err(e) => {
                self.link.available.store(false, Ordering::SeqCst);
                warn!(port = %self.link.port_path, error = %e, "cannot reopen receiver link");
                false
            }
        }
    }

    /// Close the channel. Idempotent; close errors are logged, not returned.
    pub async fn close(&self) {
        let mut channel = self.link.channel.lock().await;
        self.link.available.store(false, Ordering::SeqCst);

        match channel.take() {
            Some(mut transport) => match transport.close().await {
                Ok(()) => info!(port = %self.link.port_path, "receiver link closed"),
                Err(e) => error!(port = %self.link.port_path, error = %e, "error closing receiver link"),
            },
            None => debug!(port = %self.link.port_path, "receiver link already closed"),
        }
    }
}

impl Link {
    /// One complete exchange under the channel lock.
    async fn exchange(&self, command: &str, expect: Expect) -> Reply {
        let mut channel = self.channel.lock().await;

        // A failure or close may have landed while this task waited.
        if !self.available.load(Ordering::SeqCst) {
            debug!(port = %self.port_path, command, "receiver went unavailable, command skipped");
            return Reply::empty(expect);
        }

        if !channel.as_ref().is_some_and(|t| t.is_connected()) {
            match self.connector.connect().await {
                Ok(transport) => {
                    info!(port = %self.port_path, "receiver link reopened");
                    *channel = Some(transport);
                }
                Err(e) => {
                    error!(port = %self.port_path, error = %e, "cannot reopen receiver link");
                    *channel = None;
                    self.available.store(false, Ordering::SeqCst);
                    return Reply::empty(expect);
                }
            }
        }

        let Some(transport) = channel.as_mut() else {
            return Reply::empty(expect);
        };

        match self.transact(transport.as_mut(), command, expect).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(port = %self.port_path, command, error = %e, "receiver I/O failed, marking unavailable");
                *channel = None;
                self.available.store(false, Ordering::SeqCst);
                Reply::empty(expect)
            }
        }
    }

    async fn transact(
        &self,
        transport: &mut dyn Transport,
        command: &str,
        expect: Expect,
    ) -> Result<Reply> {
        debug!(port = %self.port_path, command, "sending command");
        let bytes = protocol::encode_command(command);
        trace!(bytes = ?bytes, "raw command");

        match tokio::time::timeout(self.timeouts.write, transport.send(&bytes)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Transport(format!(
                    "write of {command:?} timed out after {:?}",
                    self.timeouts.write
                )));
            }
        }

        match expect {
            Expect::Nothing => Ok(Reply::None),
            Expect::Line => {
                let lines = self.read_lines(transport).await?;
                Ok(Reply::Line(lines.into_iter().next().unwrap_or_default()))
            }
            Expect::AllLines => Ok(Reply::Lines(self.read_lines(transport).await?)),
        }
    }

    /// Read until the link goes quiet, splitting on the terminator.
    async fn read_lines(&self, transport: &mut dyn Transport) -> Result<Vec<String>> {
        let mut buf = [0u8; READ_CHUNK];
        let mut pending = LineBuffer::new();
        let mut lines = Vec::new();

        loop {
            match tokio::time::timeout(
                self.timeouts.read,
                transport.receive(&mut buf, self.timeouts.read),
            )
            .await
            {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    trace!(bytes = ?&buf[..n], "raw response");
                    for line in pending.push(&buf[..n]) {
                        debug!(port = %self.port_path, line = %line, "received line");
                        lines.push(line);
                    }
                }
                // Quiet link: the response is complete.
                Ok(Err(Error::Timeout)) | Err(_) => break,
                Ok(Err(e)) => return Err(e),
            }
        }

        if let Some(line) = pending.finish() {
            debug!(port = %self.port_path, line = %line, "received unterminated line");
            lines.push(line);
        }
        Ok(lines)
    }
}
