// ── Availability records ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A device availability state, as published on
/// `{coordinator}/{device}/availability`.
///
/// Deliberately an open string: the engine assumes nothing beyond the two
/// well-known values, and unknown states are retained and reported
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilityState(String);

impl AvailabilityState {
    pub const ONLINE: &'static str = "online";
    pub const OFFLINE: &'static str = "offline";

    pub fn new(state: impl Into<String>) -> Self {
        Self(state.into())
    }

    pub fn is_online(&self) -> bool {
        self.0 == Self::ONLINE
    }

    pub fn is_offline(&self) -> bool {
        self.0 == Self::OFFLINE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AvailabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AvailabilityState {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Last-write-wins availability for one (coordinator, device) pair.
/// No history is retained; the timestamp supports recency ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityRecord {
    pub state: AvailabilityState,
    pub seen_at: DateTime<Utc>,
}

impl AvailabilityRecord {
    pub fn now(state: AvailabilityState) -> Self {
        Self {
            state,
            seen_at: Utc::now(),
        }
    }
}
