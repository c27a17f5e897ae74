//! denon232-test-harness: Test utilities and mock transports for denon232.
//!
//! This crate provides [`MockTransport`] for deterministic testing of the
//! command link without a receiver attached, [`MockConnector`] for driving
//! open/reopen behavior, and [`Journal`] for asserting on the exact order of
//! writes and reads when several callers share one link.

pub mod mock_connector;
pub mod mock_serial;

pub use mock_connector::{ConnectAttempts, MockConnector};
pub use mock_serial::{Journal, JournalEntry, MockTransport};
