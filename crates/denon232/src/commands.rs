//! Command builders and response parsers.
//!
//! Builders produce the command text for a zone (without the terminator;
//! the link appends it). Parsers turn the payload of one response line into
//! a typed value. All functions are pure.
//!
//! # Volume encoding
//!
//! Volume payloads are two digits of whole steps, or three digits where the
//! third flags a half step: `50` is 50, `505` is 50.5. The value `99` is the
//! receiver's "minimum" sentinel and reads as 0.

use denon232_core::{Error, Result};

use crate::zones::ZoneProfile;

/// Sentinel volume value the receiver reports for its lowest setting.
pub const VOLUME_SENTINEL: f64 = 99.0;

// ---------------------------------------------------------------
// Command builders
// ---------------------------------------------------------------

/// Build a power command (`PWON`/`PWSTANDBY`, `Z2ON`/`Z2OFF`).
pub fn cmd_power(profile: &ZoneProfile, on: bool) -> String {
    if on {
        profile.power_on.to_string()
    } else {
        profile.power_off.to_string()
    }
}

/// Build a volume step command (`MVUP`/`MVDOWN`, `Z2UP`/`Z2DOWN`).
pub fn cmd_volume_step(profile: &ZoneProfile, up: bool) -> String {
    if up {
        profile.volume_up.to_string()
    } else {
        profile.volume_down.to_string()
    }
}

/// Build an absolute volume command (`MV33`, `Z233`).
///
/// `steps` is zero-padded to two digits.
pub fn cmd_set_volume(profile: &ZoneProfile, steps: u8) -> String {
    format!("{}{steps:02}", profile.volume_prefix)
}

/// Build a mute command (`MUON`/`MUOFF`, `Z2MUON`/`Z2MUOFF`).
pub fn cmd_mute(profile: &ZoneProfile, on: bool) -> String {
    if on {
        profile.mute_on.to_string()
    } else {
        profile.mute_off.to_string()
    }
}

/// Build a source select command from a wire source code (`SICD`, `Z2CD`).
pub fn cmd_select_source(profile: &ZoneProfile, code: &str) -> String {
    format!("{}{code}", profile.source_prefix)
}

/// Convert a 0..1 volume level into whole protocol steps.
///
/// The level is clamped to [0, 1] (NaN counts as 0), scaled by
/// `volume_max`, and rounded half away from zero.
pub fn volume_steps(level: f64, volume_max: u8) -> u8 {
    let level = if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    };
    let steps = (level * f64::from(volume_max)).round();
    steps.clamp(0.0, f64::from(volume_max)) as u8
}

// ---------------------------------------------------------------
// Response parsers
// ---------------------------------------------------------------

/// Parse the payload after the max-volume marker (`MVMAX 80` gives `"80"`).
///
/// Only the first two characters are significant; receivers that report a
/// half step on the maximum (`805`) still yield 80.
pub fn parse_max_volume(data: &str) -> Result<u8> {
    let digits = data.get(..2).unwrap_or(data);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Protocol(format!(
            "invalid max volume payload: {data:?}"
        )));
    }
    digits
        .parse::<u8>()
        .map_err(|e| Error::Protocol(format!("invalid max volume digits: {data:?} ({e})")))
}

/// Parse a volume payload (`"50"`, `"505"`) into protocol units.
///
/// # Errors
///
/// Returns [`Error::Protocol`] unless `data` is one to three ASCII digits.
pub fn parse_volume(data: &str) -> Result<f64> {
    if data.is_empty() || data.len() > 3 || !data.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Protocol(format!("invalid volume payload: {data:?}")));
    }

    let volume = if data.len() == 3 {
        // Two digits of whole steps plus a half-step flag.
        let whole: u8 = data[..2]
            .parse()
            .map_err(|e| Error::Protocol(format!("invalid volume digits: {data:?} ({e})")))?;
        f64::from(whole) + 0.5
    } else {
        let whole: u8 = data
            .parse()
            .map_err(|e| Error::Protocol(format!("invalid volume digits: {data:?} ({e})")))?;
        f64::from(whole)
    };

    if volume == VOLUME_SENTINEL {
        Ok(0.0)
    } else {
        Ok(volume)
    }
}

/// What the remainder of a status line carries once the zone prefix is
/// stripped.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusPayload {
    /// Digits only: a volume reading.
    Volume(f64),
    /// Exactly `ON` or `OFF`: a power state.
    Power(bool),
    /// Anything else: a wire source code.
    Source(String),
}

/// Classify the remainder of a status line.
///
/// Digits (at most three) are volume, `ON`/`OFF` is power, and everything
/// else is taken as a source code. A source whose code is numeric or equal
/// to `ON`/`OFF` is therefore misread; the receiver's status format gives no
/// way to tell them apart.
pub fn classify_status(suffix: &str) -> Result<StatusPayload> {
    if suffix.is_empty() {
        return Err(Error::Protocol("empty status payload".into()));
    }
    if suffix.len() <= 3 && suffix.bytes().all(|b| b.is_ascii_digit()) {
        return parse_volume(suffix).map(StatusPayload::Volume);
    }
    match suffix {
        "ON" => Ok(StatusPayload::Power(true)),
        "OFF" => Ok(StatusPayload::Power(false)),
        code => Ok(StatusPayload::Source(code.to_string())),
    }
}
