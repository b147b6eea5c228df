// ── Coordinator identity ──

use std::fmt;

use serde::{Deserialize, Serialize};

/// A Zigbee2MQTT coordinator (bridge) instance, identified by its top-level
/// MQTT topic namespace segment (e.g. `zigbee11`, `zigbee15`).
///
/// Multiple coordinators are monitored concurrently within one run; every
/// piece of accumulated state is keyed by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coordinator(String);

impl Coordinator {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The wildcard subscription filter covering every topic this
    /// coordinator publishes.
    pub fn wildcard_filter(&self) -> String {
        format!("{}/#", self.0)
    }

    /// Topic the coordinator publishes its device-list snapshot on.
    pub fn devices_topic(&self) -> String {
        format!("{}/bridge/devices", self.0)
    }
}

impl fmt::Display for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Coordinator {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Coordinator {
    fn from(s: String) -> Self {
        Self(s)
    }
}
