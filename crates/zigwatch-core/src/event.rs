// ── Event decoding ──
//
// Raw broker publishes become tagged events here, at the ingest boundary,
// so the reconciler never needs defensive payload checks. Two layers per
// message:
//
//   1. `observation_event` — infallible topic-only observation tracking.
//      Recorded for every non-bridge message regardless of payload, so a
//      malformed availability payload still counts as an observed topic.
//   2. `payload_event` — payload-carrying events (roster, health,
//      availability). Malformed payloads produce a typed error the caller
//      logs and drops; they never abort the monitoring window.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::model::{
    AvailabilityState, BRIDGE_SEGMENT, Coordinator, HealthCounters, RosterEntry,
};

/// Last topic segment carrying device availability.
const AVAILABILITY_SEGMENT: &str = "availability";

/// One decoded bridge event, ready for [`Reconciler::apply`].
///
/// [`Reconciler::apply`]: crate::reconcile::Reconciler::apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Authoritative device-list snapshot; replaces any prior roster for
    /// the coordinator.
    Roster {
        coordinator: Coordinator,
        entries: Vec<RosterEntry>,
    },

    /// Periodic health report keyed by IEEE address.
    Health {
        coordinator: Coordinator,
        devices: BTreeMap<String, HealthCounters>,
    },

    /// Availability state for one device.
    Availability {
        coordinator: Coordinator,
        device: String,
        state: AvailabilityState,
    },

    /// A device-name topic segment was seen on the wire.
    TopicSeen {
        coordinator: Coordinator,
        device: String,
    },
}

/// A payload that did not decode; the event is dropped, monitoring
/// continues.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("bad device-list payload from {coordinator}: {source}")]
    Roster {
        coordinator: Coordinator,
        #[source]
        source: serde_json::Error,
    },

    #[error("bad health payload from {coordinator}: {source}")]
    Health {
        coordinator: Coordinator,
        #[source]
        source: serde_json::Error,
    },

    #[error("bad availability payload for {coordinator}/{device}: {source}")]
    Availability {
        coordinator: Coordinator,
        device: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct HealthReport {
    #[serde(default)]
    devices: BTreeMap<String, HealthCounters>,
}

#[derive(Deserialize)]
struct AvailabilityPayload {
    #[serde(default)]
    state: String,
}

/// Topic-only observation for a publish, if it concerns a device.
///
/// Returns `TopicSeen` for any topic with at least two segments whose
/// second segment is non-empty and does not start with the reserved
/// `bridge` prefix.
pub fn observation_event(topic: &str) -> Option<BridgeEvent> {
    let mut parts = topic.split('/');
    let coordinator = parts.next()?;
    let device = parts.next()?;

    if coordinator.is_empty() || device.is_empty() || device.starts_with(BRIDGE_SEGMENT) {
        return None;
    }

    Some(BridgeEvent::TopicSeen {
        coordinator: Coordinator::new(coordinator),
        device: device.to_owned(),
    })
}

/// Decode the payload-carrying event for a publish, if any.
///
/// `Ok(None)` means the topic carries nothing the engine tracks (bridge
/// meta-traffic other than `devices`/`health`, or a plain device state
/// topic).
pub fn payload_event(topic: &str, payload: &[u8]) -> Result<Option<BridgeEvent>, EventError> {
    let parts: Vec<&str> = topic.split('/').collect();
    let (Some(&first), Some(&second)) = (parts.first(), parts.get(1)) else {
        return Ok(None);
    };
    if first.is_empty() || second.is_empty() {
        return Ok(None);
    }
    let coordinator = Coordinator::new(first);

    if second == BRIDGE_SEGMENT {
        return match parts.get(2..) {
            Some(["devices"]) => {
                let entries: Vec<RosterEntry> =
                    serde_json::from_slice(payload).map_err(|source| EventError::Roster {
                        coordinator: coordinator.clone(),
                        source,
                    })?;
                Ok(Some(BridgeEvent::Roster {
                    coordinator,
                    entries,
                }))
            }
            Some(["health"]) => {
                let report: HealthReport =
                    serde_json::from_slice(payload).map_err(|source| EventError::Health {
                        coordinator: coordinator.clone(),
                        source,
                    })?;
                Ok(Some(BridgeEvent::Health {
                    coordinator,
                    devices: report.devices,
                }))
            }
            _ => Ok(None),
        };
    }

    if parts.last() == Some(&AVAILABILITY_SEGMENT) {
        let device = second.to_owned();
        let parsed: AvailabilityPayload =
            serde_json::from_slice(payload).map_err(|source| EventError::Availability {
                coordinator: coordinator.clone(),
                device: device.clone(),
                source,
            })?;
        return Ok(Some(BridgeEvent::Availability {
            coordinator,
            device,
            state: AvailabilityState::new(parsed.state),
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_topics_are_observed() {
        let event = observation_event("zigbee15/Kitchen Plug/state");
        assert_eq!(
            event,
            Some(BridgeEvent::TopicSeen {
                coordinator: "zigbee15".into(),
                device: "Kitchen Plug".into(),
            })
        );
    }

    #[test]
    fn bridge_topics_are_not_observed() {
        assert_eq!(observation_event("zigbee15/bridge/devices"), None);
        // The prefix rule is a starts-with, matching historical bridge_*
        // topic layouts.
        assert_eq!(observation_event("zigbee15/bridge_info"), None);
    }

    #[test]
    fn degenerate_topics_are_ignored() {
        assert_eq!(observation_event("zigbee15"), None);
        assert_eq!(observation_event("zigbee15/"), None);
        assert_eq!(observation_event("/availability"), None);
    }

    #[test]
    fn roster_payload_decodes() {
        let payload = br#"[{"friendly_name": "Plug1", "ieee_address": "0x01", "type": "Router"}]"#;
        let event = payload_event("zigbee15/bridge/devices", payload).expect("decodes");
        match event {
            Some(BridgeEvent::Roster { coordinator, entries }) => {
                assert_eq!(coordinator.as_str(), "zigbee15");
                assert_eq!(entries.len(), 1);
            }
            other => panic!("expected roster event, got {other:?}"),
        }
    }

    #[test]
    fn malformed_roster_payload_is_an_error() {
        let err = payload_event("zigbee15/bridge/devices", b"{\"not\": \"a list\"}")
            .expect_err("should fail");
        assert!(matches!(err, EventError::Roster { .. }));
    }

    #[test]
    fn availability_payload_decodes() {
        let event = payload_event("zigbee11/Sensor3/availability", br#"{"state": "offline"}"#)
            .expect("decodes");
        match event {
            Some(BridgeEvent::Availability { device, state, .. }) => {
                assert_eq!(device, "Sensor3");
                assert!(state.is_offline());
            }
            other => panic!("expected availability event, got {other:?}"),
        }
    }

    #[test]
    fn unknown_availability_state_is_kept_verbatim() {
        let event = payload_event("zigbee11/Sensor3/availability", br#"{"state": "degraded"}"#)
            .expect("decodes");
        match event {
            Some(BridgeEvent::Availability { state, .. }) => {
                assert_eq!(state.as_str(), "degraded");
            }
            other => panic!("expected availability event, got {other:?}"),
        }
    }

    #[test]
    fn health_payload_decodes() {
        let payload = br#"{"devices": {"0x01": {"messages": 10, "leave_count": 0}}}"#;
        let event = payload_event("zigbee15/bridge/health", payload).expect("decodes");
        match event {
            Some(BridgeEvent::Health { devices, .. }) => {
                assert_eq!(devices.len(), 1);
                assert_eq!(devices["0x01"].messages, 10);
            }
            other => panic!("expected health event, got {other:?}"),
        }
    }

    #[test]
    fn plain_state_topics_carry_no_payload_event() {
        let event = payload_event("zigbee15/Kitchen Plug", br"{}").expect("decodes");
        assert_eq!(event, None);

        let event = payload_event("zigbee15/bridge/info", br"{}").expect("decodes");
        assert_eq!(event, None);
    }
}
