//! denon232-core: Core traits, types, and error definitions for denon232.
//!
//! This crate defines the device-agnostic pieces the receiver driver is built
//! on. Host integrations can depend on these types without pulling in the
//! serial stack.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`Connector`] -- opens (and reopens) a [`Transport`]
//! - [`ZoneId`], [`PowerState`], [`ZoneStatus`] -- zone state vocabulary
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use transport::{Connector, Transport};
pub use types::{ParseZoneError, PowerState, ZoneId, ZoneStatus};
