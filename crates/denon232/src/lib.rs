//! Denon AVR RS-232 receiver driver.
//!
//! This crate drives a Denon receiver over its serial control port. It
//! provides:
//!
//! - **Protocol codec** ([`protocol`]) -- encode `\r`-terminated commands and
//!   split responses into lines.
//! - **Command builders** ([`commands`]) -- per-zone command text and parsers
//!   for volume and status payloads.
//! - **Source tables** ([`sources`]) -- display name to wire source code.
//! - **Zone definitions** ([`zones`]) -- static profiles for the main zone and
//!   zone 2.
//! - **Command link** ([`receiver`]) -- the serialized, fault-tolerant
//!   [`Receiver`] every zone shares.
//! - **Zone control** ([`zone`]) -- [`ZoneController`], state decoding and
//!   actions for one zone.
//! - **Builders** ([`builder`], [`device`]) -- [`ReceiverBuilder`] and
//!   [`Denon232Builder`].
//! - **Setup validation** ([`setup`]) -- one-shot port checks for new
//!   configurations.
//!
//! # Example
//!
//! ```
//! use denon232::commands::{cmd_set_volume, parse_volume, volume_steps};
//! use denon232::protocol::encode_command;
//! use denon232::zones::main_zone;
//!
//! // Half volume on a receiver whose max is 65.
//! let cmd = cmd_set_volume(&main_zone(), volume_steps(0.5, 65));
//! assert_eq!(encode_command(&cmd), b"MV33\r");
//!
//! // A three-digit payload carries a half step.
//! assert_eq!(parse_volume("505").unwrap(), 50.5);
//! ```

pub mod builder;
pub mod commands;
pub mod device;
pub mod protocol;
pub mod receiver;
pub mod setup;
pub mod sources;
pub mod zone;
pub mod zones;

// Re-export the primary types for ergonomic `use denon232::*`.
pub use builder::ReceiverBuilder;
pub use device::{DEFAULT_NAME, Denon232, Denon232Builder, DeviceInfo};
pub use receiver::{Expect, LinkTimeouts, Receiver, Reply};
pub use setup::{SetupEntry, SetupRequest, validate_serial_port, validate_setup};
pub use sources::SourceMap;
pub use zone::{ZoneController, ZoneState};
pub use zones::ZoneProfile;
