//! Zone definitions.
//!
//! Each controllable zone is described by a [`ZoneProfile`]: the status
//! queries to run on refresh, the command tokens for every action, the rule
//! for reading power state, and the zone's source table. One generic
//! [`ZoneController`](crate::zone::ZoneController) drives any profile.
//!
//! Profiles are defined as factory functions ([`main_zone()`], [`zone2()`])
//! that return a fully populated [`ZoneProfile`]:
//!
//! | Zone      | Refresh queries            | Power on | Power off   | Volume | Source |
//! |-----------|----------------------------|----------|-------------|--------|--------|
//! | Main Zone | `PW?` `MV?` `MU?` `SI?`    | `PWON`   | `PWSTANDBY` | `MVnn` | `SIxx` |
//! | Zone 2    | `Z2?` `Z2MU?`              | `Z2ON`   | `Z2OFF`     | `Z2nn` | `Z2xx` |

use denon232_core::{PowerState, ZoneId};

use crate::receiver::Expect;
use crate::sources::{SourceMap, main_zone_sources, zone2_sources};

/// Which piece of zone state a status query reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
    /// One line holding the zone's power token.
    Power,
    /// Volume lines, including the max-volume marker.
    Volume,
    /// One line holding the mute token.
    Mute,
    /// One line holding the source.
    Source,
    /// Several lines mixing power, volume and source (zone 2 `Z2?`).
    Combined,
}

/// A query issued on every refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusQuery {
    /// Query command text (`PW?`).
    pub command: &'static str,
    /// How much of the response to collect.
    pub expect: Expect,
    /// How to decode the response.
    pub field: StatusField,
}

impl StatusQuery {
    pub const fn new(command: &'static str, expect: Expect, field: StatusField) -> Self {
        Self {
            command,
            expect,
            field,
        }
    }
}

/// How a zone's stored power token maps to on/off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerRule {
    /// Off only when the stored token equals this one; anything else,
    /// including no reading yet, is on.
    OffWhen(&'static str),
    /// On only when the stored token equals this one.
    OnWhen(&'static str),
}

impl PowerRule {
    /// Evaluate the rule against the last observed power token.
    pub fn evaluate(&self, power: Option<&str>) -> PowerState {
        match *self {
            PowerRule::OffWhen(token) if power == Some(token) => PowerState::Off,
            PowerRule::OffWhen(_) => PowerState::On,
            PowerRule::OnWhen(token) if power == Some(token) => PowerState::On,
            PowerRule::OnWhen(_) => PowerState::Off,
        }
    }
}

/// Static description of one receiver zone.
#[derive(Debug, Clone)]
pub struct ZoneProfile {
    /// Which zone this profile drives.
    pub zone: ZoneId,
    /// Default display name (e.g. "Main Zone").
    pub name: &'static str,
    /// Queries issued, in order, by a refresh.
    pub status_queries: &'static [StatusQuery],
    pub power_on: &'static str,
    pub power_off: &'static str,
    pub power_rule: PowerRule,
    /// Prefix of absolute volume commands and volume status lines.
    pub volume_prefix: &'static str,
    pub volume_up: &'static str,
    pub volume_down: &'static str,
    /// Marker of the line reporting the maximum volume, for zones that
    /// report one.
    pub max_volume_marker: Option<&'static str>,
    pub mute_on: &'static str,
    pub mute_off: &'static str,
    /// Prefix of source select commands and source status lines.
    pub source_prefix: &'static str,
    /// Display name to wire code table.
    pub sources: SourceMap,
}

impl ZoneProfile {
    /// Replace the source table.
    pub fn with_sources(mut self, sources: SourceMap) -> Self {
        self.sources = sources;
        self
    }
}

const MAIN_ZONE_QUERIES: &[StatusQuery] = &[
    StatusQuery::new("PW?", Expect::Line, StatusField::Power),
    StatusQuery::new("MV?", Expect::AllLines, StatusField::Volume),
    StatusQuery::new("MU?", Expect::Line, StatusField::Mute),
    StatusQuery::new("SI?", Expect::Line, StatusField::Source),
];

const ZONE2_QUERIES: &[StatusQuery] = &[
    StatusQuery::new("Z2?", Expect::AllLines, StatusField::Combined),
    StatusQuery::new("Z2MU?", Expect::Line, StatusField::Mute),
];

/// Main zone profile.
///
/// Power, volume, mute and source each have their own query. `PW?` returns
/// `PWON` or `PWSTANDBY`; the zone counts as on unless standby was seen.
/// `MV?` returns the current volume and an `MVMAX nn` line.
pub fn main_zone() -> ZoneProfile {
    ZoneProfile {
        zone: ZoneId::Main,
        name: "Main Zone",
        status_queries: MAIN_ZONE_QUERIES,
        power_on: "PWON",
        power_off: "PWSTANDBY",
        power_rule: PowerRule::OffWhen("PWSTANDBY"),
        volume_prefix: "MV",
        volume_up: "MVUP",
        volume_down: "MVDOWN",
        max_volume_marker: Some("MVMAX "),
        mute_on: "MUON",
        mute_off: "MUOFF",
        source_prefix: "SI",
        sources: main_zone_sources(),
    }
}

/// Zone 2 profile.
///
/// `Z2?` returns power, volume and source as separate `Z2`-prefixed lines
/// (`Z2ON`, `Z250`, `Z2CD`). Zone 2 does not report a maximum volume.
pub fn zone2() -> ZoneProfile {
    ZoneProfile {
        zone: ZoneId::Zone2,
        name: "Zone 2",
        status_queries: ZONE2_QUERIES,
        power_on: "Z2ON",
        power_off: "Z2OFF",
        power_rule: PowerRule::OnWhen("Z2ON"),
        volume_prefix: "Z2",
        volume_up: "Z2UP",
        volume_down: "Z2DOWN",
        max_volume_marker: None,
        mute_on: "Z2MUON",
        mute_off: "Z2MUOFF",
        source_prefix: "Z2",
        sources: zone2_sources(),
    }
}

/// Profile for `zone`.
pub fn profile_for(zone: ZoneId) -> ZoneProfile {
    match zone {
        ZoneId::Main => main_zone(),
        ZoneId::Zone2 => zone2(),
    }
}
