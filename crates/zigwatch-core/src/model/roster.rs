// ── Roster snapshot ──
//
// The authoritative device list a coordinator publishes on
// `{coordinator}/bridge/devices`. A snapshot is a full replacement: the
// engine keeps only the most recently received one per coordinator, never
// merging across snapshots.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::COORDINATOR_NAME;

/// Device category as reported in the bridge device list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum DeviceKind {
    Coordinator,
    Router,
    EndDevice,
    GreenPower,
    #[serde(other)]
    Unknown,
}

/// One entry of the bridge device list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Display name; mutable, used as the device's topic segment.
    pub friendly_name: String,

    /// Stable hardware (IEEE) address, e.g. `0x00158d0001a2b3c4`.
    #[serde(default)]
    pub ieee_address: Option<String>,

    /// Device category.
    #[serde(default, rename = "type")]
    pub kind: Option<DeviceKind>,

    /// Hardware model identifier.
    #[serde(default)]
    pub model_id: Option<String>,
}

impl RosterEntry {
    /// The bridge lists itself as a pseudo-device; those entries never
    /// become roster members.
    pub fn is_bridge_pseudo_device(&self) -> bool {
        self.kind == Some(DeviceKind::Coordinator) || self.friendly_name == COORDINATOR_NAME
    }
}

/// A coordinator's device roster, with the derived indexes classification
/// and health cross-checks need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterSnapshot {
    entries: Vec<RosterEntry>,
    names: BTreeSet<String>,
    ieee_addresses: BTreeSet<String>,
    ieee_to_name: BTreeMap<String, String>,
}

impl RosterSnapshot {
    /// Build a snapshot from a raw device list, dropping bridge
    /// pseudo-entries.
    pub fn from_entries(entries: Vec<RosterEntry>) -> Self {
        let entries: Vec<RosterEntry> = entries
            .into_iter()
            .filter(|e| !e.is_bridge_pseudo_device())
            .collect();

        let mut names = BTreeSet::new();
        let mut ieee_addresses = BTreeSet::new();
        let mut ieee_to_name = BTreeMap::new();

        for entry in &entries {
            names.insert(entry.friendly_name.clone());
            if let Some(ref ieee) = entry.ieee_address {
                ieee_addresses.insert(ieee.clone());
                ieee_to_name.insert(ieee.clone(), entry.friendly_name.clone());
            }
        }

        Self {
            entries,
            names,
            ieee_addresses,
            ieee_to_name,
        }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    /// Display names of all roster members.
    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    /// Hardware addresses of all roster members that reported one.
    pub fn ieee_addresses(&self) -> &BTreeSet<String> {
        &self.ieee_addresses
    }

    /// Best-effort lookup of a display name by hardware address.
    pub fn name_for_ieee(&self, ieee: &str) -> Option<&str> {
        self.ieee_to_name.get(ieee).map(String::as_str)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, ieee: Option<&str>, kind: Option<DeviceKind>) -> RosterEntry {
        RosterEntry {
            friendly_name: name.into(),
            ieee_address: ieee.map(Into::into),
            kind,
            model_id: None,
        }
    }

    #[test]
    fn bridge_pseudo_entries_are_dropped() {
        let snapshot = RosterSnapshot::from_entries(vec![
            entry("Coordinator", Some("0x00"), Some(DeviceKind::Coordinator)),
            entry("Plug1", Some("0x01"), Some(DeviceKind::Router)),
        ]);
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.contains_name("Coordinator"));
        assert!(snapshot.contains_name("Plug1"));
    }

    #[test]
    fn pseudo_entry_detected_by_name_alone() {
        // Some firmware versions omit the type field on the bridge entry.
        let snapshot = RosterSnapshot::from_entries(vec![entry("Coordinator", None, None)]);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn ieee_index_skips_entries_without_address() {
        let snapshot = RosterSnapshot::from_entries(vec![
            entry("Plug1", Some("0x01"), None),
            entry("Sensor2", None, None),
        ]);
        assert_eq!(snapshot.ieee_addresses().len(), 1);
        assert_eq!(snapshot.name_for_ieee("0x01"), Some("Plug1"));
        assert_eq!(snapshot.name_for_ieee("0x02"), None);
    }

    #[test]
    fn unknown_type_strings_deserialize() {
        let json = r#"{"friendly_name": "Thing", "type": "SomethingNew"}"#;
        let entry: RosterEntry = serde_json::from_str(json).expect("valid entry");
        assert_eq!(entry.kind, Some(DeviceKind::Unknown));
    }
}
