// ── Domain model ──
//
// Canonical representations of everything a Zigbee2MQTT deployment
// publishes that the monitoring tools care about: coordinators, roster
// snapshots, availability records, and health counters. All state here is
// in-memory and lives for one monitoring run.

pub mod availability;
pub mod coordinator;
pub mod health;
pub mod roster;

// ── Re-exports ──────────────────────────────────────────────────────

pub use availability::{AvailabilityRecord, AvailabilityState};
pub use coordinator::Coordinator;
pub use health::HealthCounters;
pub use roster::{DeviceKind, RosterEntry, RosterSnapshot};

/// Reserved second topic segment marking bridge meta-traffic
/// (`bridge/devices`, `bridge/health`, `bridge/info`, ...).
pub const BRIDGE_SEGMENT: &str = "bridge";

/// Display name Zigbee2MQTT gives the bridge's own pseudo-device.
///
/// Never a roster member by policy: an unreachable coordinator could not be
/// publishing at all, so retained state under this name is stranded data,
/// not an offline device.
pub const COORDINATOR_NAME: &str = "Coordinator";
