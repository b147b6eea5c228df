// ── Single-device watching ──
//
// Streams one device's state topic and reports which keys changed between
// consecutive messages. Unlike the monitoring window this runs until the
// caller stops it.

use chrono::{DateTime, Utc};
use tracing::warn;

use zigwatch_mqtt::{BrokerClient, BrokerSettings};

use crate::error::CoreError;
use crate::model::Coordinator;

type StateMap = serde_json::Map<String, serde_json::Value>;

/// One full state publish from the watched device.
#[derive(Debug, Clone)]
pub struct StateMessage {
    pub state: StateMap,
    pub received_at: DateTime<Utc>,
}

/// A changed key between two consecutive states.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub key: String,
    pub old: Option<serde_json::Value>,
    pub new: Option<serde_json::Value>,
}

/// Keys that differ between two states, ordered by key.
///
/// Keys present in only one of the two sides appear with the missing side
/// as `None`.
pub fn state_diff(old: &StateMap, new: &StateMap) -> Vec<StateChange> {
    let mut keys: Vec<&String> = old.keys().chain(new.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter(|key| old.get(*key) != new.get(*key))
        .map(|key| StateChange {
            key: key.clone(),
            old: old.get(key).cloned(),
            new: new.get(key).cloned(),
        })
        .collect()
}

/// A connection subscribed to a single device's state topic.
pub struct DeviceWatcher {
    client: BrokerClient,
    topic: String,
}

impl DeviceWatcher {
    /// Connect and subscribe to `{coordinator}/{device}`.
    pub async fn subscribe(
        settings: &BrokerSettings,
        coordinator: &Coordinator,
        device: &str,
    ) -> Result<Self, CoreError> {
        let client = BrokerClient::connect(settings, "watch").await?;
        let topic = format!("{coordinator}/{device}");
        client.subscribe(&topic).await?;
        Ok(Self { client, topic })
    }

    /// Topic being watched.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next state publish on the watched topic.
    ///
    /// Non-object payloads (Zigbee2MQTT publishes sub-topics like `.../set`
    /// with other shapes) are skipped with a diagnostic.
    pub async fn next_state(&mut self) -> Result<StateMessage, CoreError> {
        loop {
            let msg = self.client.next_publish().await?;
            if msg.topic != self.topic {
                continue;
            }
            match serde_json::from_slice::<serde_json::Value>(&msg.payload) {
                Ok(serde_json::Value::Object(state)) => {
                    return Ok(StateMessage {
                        state,
                        received_at: Utc::now(),
                    });
                }
                Ok(other) => {
                    warn!(topic = %msg.topic, payload = %other, "skipping non-object state");
                }
                Err(err) => {
                    warn!(topic = %msg.topic, error = %err, "skipping malformed state");
                }
            }
        }
    }

    pub async fn disconnect(self) {
        self.client.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(json: &str) -> StateMap {
        match serde_json::from_str(json).expect("valid test state") {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn identical_states_have_no_diff() {
        let a = state(r#"{"state": "ON", "linkquality": 120}"#);
        assert!(state_diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn changed_value_is_reported() {
        let old = state(r#"{"state": "ON", "linkquality": 120}"#);
        let new = state(r#"{"state": "OFF", "linkquality": 120}"#);
        let changes = state_diff(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, "state");
        assert_eq!(changes[0].old, Some("ON".into()));
        assert_eq!(changes[0].new, Some("OFF".into()));
    }

    #[test]
    fn added_and_removed_keys_are_reported() {
        let old = state(r#"{"power": 12}"#);
        let new = state(r#"{"energy": 3.4}"#);
        let changes = state_diff(&old, &new);
        assert_eq!(changes.len(), 2);
        // Ordered by key.
        assert_eq!(changes[0].key, "energy");
        assert_eq!(changes[0].old, None);
        assert_eq!(changes[1].key, "power");
        assert_eq!(changes[1].new, None);
    }

    #[test]
    fn nested_objects_compare_by_value() {
        let old = state(r#"{"update": {"state": "idle"}}"#);
        let new = state(r#"{"update": {"state": "available"}}"#);
        let changes = state_diff(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, "update");
    }
}
