// zigwatch-core: Domain model and reconciliation logic between
// zigwatch-mqtt and the CLI.

pub mod cleanup;
pub mod error;
pub mod event;
pub mod model;
pub mod reconcile;
pub mod session;
pub mod watch;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cleanup::{CleanupOutcome, CleanupPlan};
pub use error::CoreError;
pub use event::{BridgeEvent, EventError, observation_event, payload_event};
pub use reconcile::{Classification, OfflineDevice, Reconciler, StrandedDevice, StrandedHealthEntry};
pub use session::{MonitorOutcome, MonitorSession};
pub use watch::{DeviceWatcher, StateChange, StateMessage, state_diff};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AvailabilityRecord, AvailabilityState, Coordinator, DeviceKind, HealthCounters, RosterEntry,
    RosterSnapshot,
};
