//! Core types used throughout denon232.

use std::fmt;
use std::str::FromStr;

/// Identifies an independently controllable output path on the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneId {
    /// The main zone. Its commands carry no zone prefix (`PWON`, `MV50`).
    Main,
    /// Zone 2. Its commands are prefixed with `Z2` (`Z2ON`, `Z250`).
    Zone2,
}

impl ZoneId {
    /// Suffix used when building per-zone unique identifiers.
    pub fn slug(&self) -> &'static str {
        match self {
            ZoneId::Main => "main",
            ZoneId::Zone2 => "zone2",
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZoneId::Main => "Main Zone",
            ZoneId::Zone2 => "Zone 2",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into a [`ZoneId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseZoneError(String);

impl fmt::Display for ParseZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown zone: {}", self.0)
    }
}

impl std::error::Error for ParseZoneError {}

impl FromStr for ZoneId {
    type Err = ParseZoneError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '-', '_'], "").as_str() {
            "main" | "mainzone" => Ok(ZoneId::Main),
            "zone2" | "z2" => Ok(ZoneId::Zone2),
            _ => Err(ParseZoneError(s.to_string())),
        }
    }
}

/// Power state of a zone as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    On,
    Off,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::On => write!(f, "on"),
            PowerState::Off => write!(f, "off"),
        }
    }
}

/// Point-in-time snapshot of one zone's observed state.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneStatus {
    /// Which zone this snapshot describes.
    pub zone: ZoneId,
    /// Whether the command link was available when the snapshot was taken.
    pub available: bool,
    /// Derived power state.
    pub state: PowerState,
    /// Volume in protocol units (half-step precision).
    pub volume: f64,
    /// Maximum volume in protocol units.
    pub volume_max: u8,
    /// `volume / volume_max`, or 0 when the maximum is 0.
    pub volume_level: f64,
    /// Whether the zone is muted.
    pub muted: bool,
    /// Display name of the current source, or the raw wire code when no
    /// display name matches.
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_display() {
        assert_eq!(ZoneId::Main.to_string(), "Main Zone");
        assert_eq!(ZoneId::Zone2.to_string(), "Zone 2");
    }

    #[test]
    fn zone_slug() {
        assert_eq!(ZoneId::Main.slug(), "main");
        assert_eq!(ZoneId::Zone2.slug(), "zone2");
    }

    #[test]
    fn zone_from_str_accepts_common_spellings() {
        assert_eq!("main".parse::<ZoneId>(), Ok(ZoneId::Main));
        assert_eq!("Main Zone".parse::<ZoneId>(), Ok(ZoneId::Main));
        assert_eq!("zone2".parse::<ZoneId>(), Ok(ZoneId::Zone2));
        assert_eq!("Zone 2".parse::<ZoneId>(), Ok(ZoneId::Zone2));
        assert_eq!("Z2".parse::<ZoneId>(), Ok(ZoneId::Zone2));
    }

    #[test]
    fn zone_from_str_rejects_unknown() {
        let err = "zone3".parse::<ZoneId>().unwrap_err();
        assert_eq!(err.to_string(), "unknown zone: zone3");
    }

    #[test]
    fn power_state_display() {
        assert_eq!(PowerState::On.to_string(), "on");
        assert_eq!(PowerState::Off.to_string(), "off");
    }
}
