//! Input source tables: display name to wire source code.
//!
//! The receiver identifies inputs by short uppercase codes (`CD`,
//! `SAT/CBL`, `IPOD`). Hosts show friendlier names, so each zone carries a
//! [`SourceMap`] translating between the two.

use std::collections::BTreeMap;

/// Inputs selectable on the main zone.
pub const MAIN_ZONE_SOURCES: &[(&str, &str)] = &[
    ("Phono", "PHONO"),
    ("CD", "CD"),
    ("Tuner", "TUNER"),
    ("DVD", "DVD"),
    ("HDP", "HDP"),
    ("TV", "TV"),
    ("SAT/CBL", "SAT/CBL"),
    ("VCR", "VCR"),
    ("DVR", "DVR"),
    ("V.AUX", "V.AUX"),
    ("Sirius", "SIRIUS"),
    ("iPod", "IPOD"),
];

/// Inputs selectable on zone 2. TV and HDP cannot be routed to zone 2
/// (AVR-2310 protocol).
pub const ZONE2_SOURCES: &[(&str, &str)] = &[
    ("Phono", "PHONO"),
    ("CD", "CD"),
    ("Tuner", "TUNER"),
    ("DVD", "DVD"),
    ("SAT/CBL", "SAT/CBL"),
    ("VCR", "VCR"),
    ("DVR", "DVR"),
    ("V.AUX", "V.AUX"),
    ("Sirius", "SIRIUS"),
    ("iPod", "IPOD"),
];

/// Mapping from display name to wire source code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: BTreeMap<String, String>,
}

impl SourceMap {
    /// Build a map from `(display name, wire code)` pairs.
    ///
    /// Later duplicates of a display name replace earlier ones.
    pub fn from_pairs<N, C>(pairs: impl IntoIterator<Item = (N, C)>) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(name, code)| (name.into(), code.into()))
                .collect(),
        }
    }

    /// Wire code for `name`, if listed.
    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Display name for wire `code`, if any entry maps to it.
    pub fn name_for(&self, code: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, c)| c.as_str() == code)
            .map(|(name, _)| name.as_str())
    }

    /// Wire code to send for `name`: the mapped code, or `name` verbatim
    /// for sources the table does not list.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.code_for(name).unwrap_or(name)
    }

    /// Display names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source map for the main zone.
pub fn main_zone_sources() -> SourceMap {
    SourceMap::from_pairs(MAIN_ZONE_SOURCES.iter().copied())
}

/// Source map for zone 2.
pub fn zone2_sources() -> SourceMap {
    SourceMap::from_pairs(ZONE2_SOURCES.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_zone_lists_all_inputs() {
        let sources = main_zone_sources();
        assert_eq!(sources.len(), 12);
        assert_eq!(sources.code_for("Sirius"), Some("SIRIUS"));
        assert_eq!(sources.code_for("TV"), Some("TV"));
    }

    #[test]
    fn zone2_excludes_tv_and_hdp() {
        let sources = zone2_sources();
        assert_eq!(sources.len(), 10);
        assert_eq!(sources.code_for("TV"), None);
        assert_eq!(sources.code_for("HDP"), None);
        assert_eq!(sources.code_for("iPod"), Some("IPOD"));
    }

    #[test]
    fn resolve_falls_back_to_raw_name() {
        let sources = main_zone_sources();
        assert_eq!(sources.resolve("iPod"), "IPOD");
        assert_eq!(sources.resolve("NET/USB"), "NET/USB");
    }

    #[test]
    fn name_for_reverse_lookup() {
        let sources = main_zone_sources();
        assert_eq!(sources.name_for("SAT/CBL"), Some("SAT/CBL"));
        assert_eq!(sources.name_for("IPOD"), Some("iPod"));
        assert_eq!(sources.name_for("GAME"), None);
    }

    #[test]
    fn names_are_sorted() {
        let names = zone2_sources().names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.first().map(String::as_str), Some("CD"));
    }

    #[test]
    fn custom_map_replaces_duplicate_names() {
        let sources = SourceMap::from_pairs([("Game", "GAME"), ("Game", "GAME2")]);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources.code_for("Game"), Some("GAME2"));
        assert!(!sources.is_empty());
    }
}
