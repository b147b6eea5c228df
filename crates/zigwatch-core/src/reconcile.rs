// ── Reconciliation engine ──
//
// Accumulates decoded bridge events for the duration of one monitoring
// window, then answers classification queries. All mutation is O(1) set or
// map insertion, so `apply` is safe to call from the broker delivery loop
// without backpressure. Classification is a pure read of accumulated state:
// callable at any time, idempotent, and deterministic (lexicographic
// emission order via the BTree containers).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::BridgeEvent;
use crate::model::{
    AvailabilityRecord, AvailabilityState, COORDINATOR_NAME, Coordinator, HealthCounters,
    RosterSnapshot,
};

// ── Classification output ───────────────────────────────────────────

/// A roster device whose last availability state was `"offline"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfflineDevice {
    pub name: String,
    /// When the offline state was last observed.
    pub seen_at: DateTime<Utc>,
}

/// A device name observed on the wire with no matching roster entry —
/// typically leftover retained state for a removed device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrandedDevice {
    pub name: String,
    /// Last availability state, attached for diagnostics when present.
    pub availability: Option<AvailabilityState>,
}

/// An IEEE address tracked in the bridge health report but absent from the
/// roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrandedHealthEntry {
    pub ieee_address: String,
    /// Best-effort display name resolved from the roster's address map;
    /// empty when no mapping exists (not an error).
    pub friendly_name: Option<String>,
    pub counters: HealthCounters,
}

/// Classification of one coordinator's accumulated state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub coordinator: Coordinator,
    /// Whether a roster snapshot was received. When `false`, every observed
    /// name is conservatively stranded.
    pub roster_received: bool,
    /// Roster devices last reported offline, lexicographic by name.
    pub offline: Vec<OfflineDevice>,
    /// Observed-but-not-rostered devices, lexicographic by name.
    pub stranded: Vec<StrandedDevice>,
}

impl Classification {
    pub fn has_findings(&self) -> bool {
        !self.offline.is_empty() || !self.stranded.is_empty()
    }

    /// Offline devices ordered most-recently-seen first instead of the
    /// default lexicographic order.
    pub fn offline_by_recency(&self) -> Vec<OfflineDevice> {
        let mut devices = self.offline.clone();
        devices.sort_by(|a, b| b.seen_at.cmp(&a.seen_at).then_with(|| a.name.cmp(&b.name)));
        devices
    }
}

// ── Per-coordinator accumulated state ───────────────────────────────

#[derive(Debug, Default)]
struct CoordinatorState {
    /// Most recent roster snapshot; full replacement, never merged.
    roster: Option<RosterSnapshot>,
    /// Device-name segments seen in any non-bridge topic. Grows
    /// monotonically; never pruned during a window.
    observed: BTreeSet<String>,
    /// Last-write-wins availability per device name.
    availability: BTreeMap<String, AvailabilityRecord>,
    /// Most recent health report, if any.
    health: Option<BTreeMap<String, HealthCounters>>,
}

// ── Engine ──────────────────────────────────────────────────────────

/// The reconciliation engine. One instance per monitoring run; owns all
/// accumulated state (no globals, independently testable without a
/// broker).
#[derive(Debug, Default)]
pub struct Reconciler {
    coordinators: BTreeMap<Coordinator, CoordinatorState>,
    availability_events: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded event.
    pub fn apply(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::Roster {
                coordinator,
                entries,
            } => {
                let snapshot = RosterSnapshot::from_entries(entries);
                tracing::info!(%coordinator, devices = snapshot.len(), "loaded device roster");
                self.state_mut(coordinator).roster = Some(snapshot);
            }
            BridgeEvent::Health {
                coordinator,
                devices,
            } => {
                tracing::info!(%coordinator, entries = devices.len(), "loaded health report");
                self.state_mut(coordinator).health = Some(devices);
            }
            BridgeEvent::Availability {
                coordinator,
                device,
                state,
            } => {
                self.availability_events += 1;
                self.state_mut(coordinator)
                    .availability
                    .insert(device, AvailabilityRecord::now(state));
            }
            BridgeEvent::TopicSeen {
                coordinator,
                device,
            } => {
                self.state_mut(coordinator).observed.insert(device);
            }
        }
    }

    /// Coordinators any state has been recorded for.
    pub fn coordinators(&self) -> impl Iterator<Item = &Coordinator> {
        self.coordinators.keys()
    }

    /// The roster snapshot for a coordinator, if one arrived.
    pub fn roster(&self, coordinator: &Coordinator) -> Option<&RosterSnapshot> {
        self.coordinators.get(coordinator)?.roster.as_ref()
    }

    /// Device names observed on the wire for a coordinator.
    pub fn observed(&self, coordinator: &Coordinator) -> impl Iterator<Item = &str> {
        self.coordinators
            .get(coordinator)
            .into_iter()
            .flat_map(|state| state.observed.iter().map(String::as_str))
    }

    /// Total availability messages processed across all coordinators.
    pub fn availability_events(&self) -> u64 {
        self.availability_events
    }

    // ── Classification ───────────────────────────────────────────────

    /// Classify one coordinator's accumulated state.
    ///
    /// Pure function of the accumulated maps: no side effects, idempotent,
    /// and callable at any time (the session only queries it after
    /// delivery stops).
    pub fn classify(&self, coordinator: &Coordinator) -> Classification {
        static EMPTY: CoordinatorState = CoordinatorState {
            roster: None,
            observed: BTreeSet::new(),
            availability: BTreeMap::new(),
            health: None,
        };
        let state = self.coordinators.get(coordinator).unwrap_or(&EMPTY);
        let roster_names = state.roster.as_ref().map(RosterSnapshot::names);

        // Stranded: observed names without a roster entry. With no roster at
        // all, everything observed is unverifiable and conservatively
        // flagged. The bridge pseudo-device can never be a roster member, so
        // an availability record for it always lands here — an unreachable
        // coordinator could not be publishing, making "offline" nonsensical.
        let mut stranded_names: BTreeSet<&str> = state
            .observed
            .iter()
            .map(String::as_str)
            .filter(|name| !roster_names.is_some_and(|roster| roster.contains(*name)))
            .collect();
        if state.availability.contains_key(COORDINATOR_NAME) {
            stranded_names.insert(COORDINATOR_NAME);
        }

        let stranded = stranded_names
            .into_iter()
            .map(|name| StrandedDevice {
                name: name.to_owned(),
                availability: state
                    .availability
                    .get(name)
                    .map(|record| record.state.clone()),
            })
            .collect();

        let offline = roster_names
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| {
                        let record = state.availability.get(name)?;
                        record.state.is_offline().then(|| OfflineDevice {
                            name: name.clone(),
                            seen_at: record.seen_at,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Classification {
            coordinator: coordinator.clone(),
            roster_received: state.roster.is_some(),
            offline,
            stranded,
        }
    }

    /// Classify every coordinator with recorded state.
    pub fn classify_all(&self) -> BTreeMap<Coordinator, Classification> {
        self.coordinators
            .keys()
            .map(|coordinator| (coordinator.clone(), self.classify(coordinator)))
            .collect()
    }

    /// Health entries for addresses the roster no longer lists.
    ///
    /// Only meaningful for coordinators holding both a health report and a
    /// roster snapshot; returns an empty vec otherwise.
    pub fn stranded_health(&self, coordinator: &Coordinator) -> Vec<StrandedHealthEntry> {
        let Some(state) = self.coordinators.get(coordinator) else {
            return Vec::new();
        };
        let (Some(health), Some(roster)) = (&state.health, &state.roster) else {
            return Vec::new();
        };

        health
            .iter()
            .filter(|(ieee, _)| !roster.ieee_addresses().contains(*ieee))
            .map(|(ieee, counters)| StrandedHealthEntry {
                ieee_address: ieee.clone(),
                friendly_name: roster.name_for_ieee(ieee).map(ToOwned::to_owned),
                counters: *counters,
            })
            .collect()
    }

    /// Stranded health entries for every coordinator, skipping those with
    /// none.
    pub fn stranded_health_all(&self) -> BTreeMap<Coordinator, Vec<StrandedHealthEntry>> {
        self.coordinators
            .keys()
            .filter_map(|coordinator| {
                let entries = self.stranded_health(coordinator);
                (!entries.is_empty()).then(|| (coordinator.clone(), entries))
            })
            .collect()
    }

    fn state_mut(&mut self, coordinator: Coordinator) -> &mut CoordinatorState {
        self.coordinators.entry(coordinator).or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::RosterEntry;

    fn coordinator() -> Coordinator {
        Coordinator::new("zigbee15")
    }

    fn roster_event(names: &[&str]) -> BridgeEvent {
        BridgeEvent::Roster {
            coordinator: coordinator(),
            entries: names
                .iter()
                .map(|name| RosterEntry {
                    friendly_name: (*name).to_owned(),
                    ieee_address: None,
                    kind: None,
                    model_id: None,
                })
                .collect(),
        }
    }

    fn roster_event_with_ieee(devices: &[(&str, &str)]) -> BridgeEvent {
        BridgeEvent::Roster {
            coordinator: coordinator(),
            entries: devices
                .iter()
                .map(|(name, ieee)| RosterEntry {
                    friendly_name: (*name).to_owned(),
                    ieee_address: Some((*ieee).to_owned()),
                    kind: None,
                    model_id: None,
                })
                .collect(),
        }
    }

    fn seen(device: &str) -> BridgeEvent {
        BridgeEvent::TopicSeen {
            coordinator: coordinator(),
            device: device.to_owned(),
        }
    }

    fn availability(device: &str, state: &str) -> BridgeEvent {
        BridgeEvent::Availability {
            coordinator: coordinator(),
            device: device.to_owned(),
            state: state.into(),
        }
    }

    fn names(stranded: &[StrandedDevice]) -> Vec<&str> {
        stranded.iter().map(|d| d.name.as_str()).collect()
    }

    // Scenario A: one rostered device offline, one unrostered topic.
    #[test]
    fn classifies_offline_and_stranded() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&["Plug1"]));
        engine.apply(seen("Plug1"));
        engine.apply(seen("Plug2"));
        engine.apply(availability("Plug1", "offline"));

        let result = engine.classify(&coordinator());
        assert!(result.roster_received);
        assert_eq!(
            result.offline.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            vec!["Plug1"]
        );
        assert_eq!(names(&result.stranded), vec!["Plug2"]);
    }

    // Scenario B: no roster ever received — everything observed is
    // conservatively stranded.
    #[test]
    fn no_roster_means_everything_stranded() {
        let mut engine = Reconciler::new();
        engine.apply(seen("Sensor3"));

        let result = engine.classify(&coordinator());
        assert!(!result.roster_received);
        assert!(result.offline.is_empty());
        assert_eq!(names(&result.stranded), vec!["Sensor3"]);
    }

    // Scenario C: the bridge pseudo-device is stranded, never offline,
    // regardless of its reported state.
    #[test]
    fn coordinator_pseudo_device_is_stranded_not_offline() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&["Coordinator", "Plug1"]));
        engine.apply(availability("Coordinator", "offline"));

        let result = engine.classify(&coordinator());
        assert!(result.offline.is_empty());
        assert_eq!(names(&result.stranded), vec!["Coordinator"]);
        assert_eq!(
            result.stranded[0].availability,
            Some(AvailabilityState::new("offline"))
        );
    }

    // Scenario D: health entries without a roster address are stranded.
    #[test]
    fn health_cross_check_finds_stranded_addresses() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event_with_ieee(&[("Plug1", "0x22")]));
        engine.apply(BridgeEvent::Health {
            coordinator: coordinator(),
            devices: BTreeMap::from([
                ("0x11".to_owned(), HealthCounters { messages: 5, leave_count: 2 }),
                ("0x22".to_owned(), HealthCounters { messages: 9, leave_count: 0 }),
            ]),
        });

        let stranded = engine.stranded_health(&coordinator());
        assert_eq!(stranded.len(), 1);
        assert_eq!(stranded[0].ieee_address, "0x11");
        assert_eq!(stranded[0].friendly_name, None);
        assert_eq!(stranded[0].counters.messages, 5);
    }

    #[test]
    fn stranded_and_offline_are_disjoint_with_roster() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&["Plug1", "Plug2"]));
        for device in ["Plug1", "Plug2", "Ghost1", "Ghost2"] {
            engine.apply(seen(device));
            engine.apply(availability(device, "offline"));
        }

        let result = engine.classify(&coordinator());
        let offline: BTreeSet<&str> = result.offline.iter().map(|d| d.name.as_str()).collect();
        let stranded: BTreeSet<&str> = result.stranded.iter().map(|d| d.name.as_str()).collect();
        assert!(offline.is_disjoint(&stranded));
    }

    #[test]
    fn classify_is_idempotent() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&["Plug1"]));
        engine.apply(seen("Plug2"));
        engine.apply(availability("Plug1", "offline"));

        let first = engine.classify(&coordinator());
        let second = engine.classify(&coordinator());
        assert_eq!(first, second);
    }

    #[test]
    fn second_roster_snapshot_fully_replaces_the_first() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&["Plug1", "OldPlug"]));
        engine.apply(seen("OldPlug"));
        engine.apply(roster_event(&["Plug1"]));

        let result = engine.classify(&coordinator());
        // OldPlug is no longer a roster member even though it was never
        // explicitly removed.
        assert_eq!(names(&result.stranded), vec!["OldPlug"]);
    }

    #[test]
    fn availability_is_last_write_wins() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&["Plug1"]));
        engine.apply(availability("Plug1", "offline"));
        engine.apply(availability("Plug1", "online"));

        let result = engine.classify(&coordinator());
        assert!(result.offline.is_empty());

        engine.apply(availability("Plug1", "offline"));
        let result = engine.classify(&coordinator());
        assert_eq!(result.offline.len(), 1);
    }

    #[test]
    fn unknown_availability_states_are_not_offline() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&["Plug1"]));
        engine.apply(availability("Plug1", "unreachable"));

        let result = engine.classify(&coordinator());
        assert!(result.offline.is_empty());
    }

    #[test]
    fn stranded_devices_carry_their_last_availability() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&[]));
        engine.apply(seen("Ghost"));
        engine.apply(seen("Silent"));
        engine.apply(availability("Ghost", "online"));

        let result = engine.classify(&coordinator());
        assert_eq!(
            result.stranded,
            vec![
                StrandedDevice {
                    name: "Ghost".into(),
                    availability: Some(AvailabilityState::new("online")),
                },
                StrandedDevice {
                    name: "Silent".into(),
                    availability: None,
                },
            ]
        );
    }

    #[test]
    fn coordinators_are_tracked_independently() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&["Plug1"]));
        engine.apply(BridgeEvent::TopicSeen {
            coordinator: Coordinator::new("zigbee11"),
            device: "Plug1".to_owned(),
        });

        // zigbee11 never got a roster, so its Plug1 is stranded there even
        // though zigbee15's roster lists the same name.
        let other = engine.classify(&Coordinator::new("zigbee11"));
        assert!(!other.roster_received);
        assert_eq!(names(&other.stranded), vec!["Plug1"]);

        let original = engine.classify(&coordinator());
        assert!(original.stranded.is_empty());
    }

    #[test]
    fn classify_all_covers_every_coordinator_with_state() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&["Plug1"]));
        engine.apply(BridgeEvent::TopicSeen {
            coordinator: Coordinator::new("zigbee11"),
            device: "Ghost".to_owned(),
        });

        let all = engine.classify_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&Coordinator::new("zigbee11")].stranded.len(), 1);

        // No health reports anywhere: the cross-check map stays empty.
        assert!(engine.stranded_health_all().is_empty());
    }

    #[test]
    fn classify_unknown_coordinator_is_empty() {
        let engine = Reconciler::new();
        let result = engine.classify(&Coordinator::new("nowhere"));
        assert!(!result.roster_received);
        assert!(result.offline.is_empty());
        assert!(result.stranded.is_empty());
    }

    #[test]
    fn offline_by_recency_orders_newest_first() {
        let mut engine = Reconciler::new();
        engine.apply(roster_event(&["A", "B"]));
        engine.apply(availability("B", "offline"));
        engine.apply(availability("A", "offline"));

        let result = engine.classify(&coordinator());
        // Lexicographic by default.
        assert_eq!(result.offline[0].name, "A");

        let recent = result.offline_by_recency();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].seen_at >= recent[1].seen_at);
    }

    #[test]
    fn availability_event_counter_accumulates() {
        let mut engine = Reconciler::new();
        engine.apply(availability("Plug1", "online"));
        engine.apply(availability("Plug1", "online"));
        engine.apply(seen("Plug1"));
        assert_eq!(engine.availability_events(), 2);
    }
}
