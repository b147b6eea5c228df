// ── Bridge health counters ──
//
// Zigbee2MQTT publishes `{coordinator}/bridge/health` periodically when
// health reporting is enabled. Its per-device counters are keyed by IEEE
// address and tracked independently of the roster snapshot, which is what
// makes the stranded-health cross-check possible.

use serde::{Deserialize, Serialize};

/// Per-device counters from a bridge health report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCounters {
    /// Messages seen from this device since the bridge started.
    #[serde(default)]
    pub messages: u64,

    /// Times the device left the network.
    #[serde(default)]
    pub leave_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_report_fields_are_ignored() {
        let json = r#"{"messages": 42, "leave_count": 1, "network_address": 12345}"#;
        let counters: HealthCounters = serde_json::from_str(json).expect("valid counters");
        assert_eq!(counters.messages, 42);
        assert_eq!(counters.leave_count, 1);
    }

    #[test]
    fn missing_counters_default_to_zero() {
        let counters: HealthCounters = serde_json::from_str("{}").expect("valid counters");
        assert_eq!(counters, HealthCounters::default());
    }
}
