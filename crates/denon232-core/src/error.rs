//! Error types for denon232.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Note that the steady-state receiver
//! surface (command link and zone controllers) absorbs these errors into an
//! availability flag; they are only seen directly by code that talks to a
//! [`Transport`](crate::transport::Transport) or runs setup-time validation.

/// The error type for all denon232 operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port open, write, or read failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (malformed or unexpected response line).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for data from the receiver.
    ///
    /// On this protocol a timeout is the normal end of a response, so
    /// callers usually treat it as "no more lines" rather than a failure.
    #[error("timeout waiting for response")]
    Timeout,

    /// An invalid parameter was passed to a builder or command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the receiver has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the receiver was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// Setup-time validation could not open the configured port.
    #[error("cannot connect to serial port {port}: {reason}")]
    CannotConnect {
        /// The port path that was rejected.
        port: String,
        /// Why the port was rejected.
        reason: String,
    },

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let cases = [
            (Error::Transport("port busy".into()), "transport error: port busy"),
            (Error::Protocol("bad volume payload".into()), "protocol error: bad volume payload"),
            (Error::Timeout, "timeout waiting for response"),
            (Error::NotConnected, "not connected"),
            (Error::ConnectionLost, "connection lost"),
            (
                Error::CannotConnect {
                    port: "/dev/ttyUSB9".into(),
                    reason: "no such device".into(),
                },
                "cannot connect to serial port /dev/ttyUSB9: no such device",
            ),
        ];
        for (error, message) in cases {
            assert_eq!(error.to_string(), message);
        }
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn open() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "dialout"))?;
            Ok(())
        }
        let e = open().unwrap_err();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("dialout"));
    }

    #[test]
    fn errors_cross_task_boundaries() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<Error>();
    }
}
