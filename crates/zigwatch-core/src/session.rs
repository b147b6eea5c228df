// ── Monitor session ──
//
// Lifecycle orchestration for one monitoring run: connect, subscribe,
// drive the broker event loop for a wall-clock-bounded window feeding the
// reconciler, then answer for the accumulated state. Also executes the
// two-phase cleanup protocol against the same connection.
//
// The window is time-bounded, never message-count bounded: a coordinator
// that never sends its roster does not extend the window, it degrades to
// the fully-stranded classification. Cancellation (Ctrl-C) ends the window
// early with whatever has accumulated — partial results are expected
// behavior, not a failure.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use zigwatch_mqtt::{BrokerClient, BrokerSettings, InboundMessage};

use crate::cleanup::{CleanupOutcome, CleanupPlan};
use crate::error::CoreError;
use crate::event::{observation_event, payload_event};
use crate::model::{Coordinator, RosterSnapshot};
use crate::reconcile::Reconciler;

/// What a collection window produced.
#[derive(Debug)]
pub struct MonitorOutcome {
    pub reconciler: Reconciler,
    /// Whether the window ended early on cancellation.
    pub interrupted: bool,
}

/// A live broker connection driving monitoring windows.
pub struct MonitorSession {
    client: BrokerClient,
    cancel: CancellationToken,
}

impl MonitorSession {
    /// Connect to the broker. Fatal on refusal — there are no retries; a
    /// failed connection fails the run.
    pub async fn connect(
        settings: &BrokerSettings,
        client_id_suffix: &str,
        cancel: CancellationToken,
    ) -> Result<Self, CoreError> {
        let client = BrokerClient::connect(settings, client_id_suffix).await?;
        Ok(Self { client, cancel })
    }

    /// Subscribe to every coordinator's topic tree and accumulate events
    /// for `window`.
    pub async fn collect(
        &mut self,
        coordinators: &[Coordinator],
        window: Duration,
    ) -> Result<MonitorOutcome, CoreError> {
        if coordinators.is_empty() {
            return Err(CoreError::NoCoordinators);
        }
        self.client
            .subscribe_many(coordinators.iter().map(Coordinator::wildcard_filter))
            .await?;

        let mut reconciler = Reconciler::new();
        let interrupted = self
            .pump(window, |msg| {
                ingest(&mut reconciler, &msg);
                false
            })
            .await?;

        debug!(
            coordinators = coordinators.len(),
            availability = reconciler.availability_events(),
            interrupted,
            "collection window closed"
        );
        Ok(MonitorOutcome {
            reconciler,
            interrupted,
        })
    }

    /// Wait for one roster snapshot per coordinator, ending early once all
    /// have arrived.
    ///
    /// Coordinators whose snapshot never came are simply absent from the
    /// result; the caller reports them.
    pub async fn collect_rosters(
        &mut self,
        coordinators: &[Coordinator],
        timeout: Duration,
    ) -> Result<BTreeMap<Coordinator, RosterSnapshot>, CoreError> {
        if coordinators.is_empty() {
            return Err(CoreError::NoCoordinators);
        }
        self.client
            .subscribe_many(coordinators.iter().map(Coordinator::devices_topic))
            .await?;

        let expected = coordinators.len();
        let mut rosters: BTreeMap<Coordinator, RosterSnapshot> = BTreeMap::new();
        self.pump(timeout, |msg| {
            match payload_event(&msg.topic, &msg.payload) {
                Ok(Some(crate::event::BridgeEvent::Roster {
                    coordinator,
                    entries,
                })) => {
                    rosters.insert(coordinator, RosterSnapshot::from_entries(entries));
                }
                Ok(_) => {}
                Err(err) => warn!(topic = %msg.topic, error = %err, "dropping malformed payload"),
            }
            rosters.len() == expected
        })
        .await?;

        Ok(rosters)
    }

    /// Execute a cleanup plan: discover retained topics under every
    /// stranded device tree in a second bounded listen window, then erase
    /// each with a tombstone publish.
    ///
    /// A stranded pair the broker redelivers nothing for contributes zero
    /// cleared topics — a count, not an error. Individual tombstone
    /// failures are counted and never abort the rest.
    pub async fn clear_stranded(
        &mut self,
        plan: &CleanupPlan,
        discovery_window: Duration,
    ) -> Result<CleanupOutcome, CoreError> {
        if plan.is_empty() {
            return Ok(CleanupOutcome::default());
        }

        let filters = plan.subscription_filters();
        self.client.subscribe_many(filters.clone()).await?;

        let mut discovered: BTreeSet<String> = BTreeSet::new();
        self.pump(discovery_window, |msg| {
            if plan.covers(&msg.topic) {
                discovered.insert(msg.topic);
            }
            false
        })
        .await?;

        self.client.unsubscribe_many(filters).await?;

        let mut outcome = CleanupOutcome::default();
        for topic in discovered {
            match self.client.publish_tombstone(&topic).await {
                Ok(()) => {
                    debug!(%topic, "cleared retained message");
                    outcome.cleared.push(topic);
                }
                Err(err) => {
                    warn!(%topic, error = %err, "failed to clear retained message");
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Disconnect cleanly.
    pub async fn disconnect(self) {
        self.client.disconnect().await;
    }

    /// Drive the event loop until the deadline, cancellation, or the
    /// handler signals completion. Returns whether cancellation ended the
    /// window.
    async fn pump<F>(&mut self, window: Duration, mut on_message: F) -> Result<bool, CoreError>
    where
        F: FnMut(InboundMessage) -> bool,
    {
        let deadline = Instant::now() + window;
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => return Ok(false),
                () = self.cancel.cancelled() => return Ok(true),
                msg = self.client.next_publish() => {
                    if on_message(msg?) {
                        return Ok(false);
                    }
                }
            }
        }
    }
}

/// Feed one raw publish into the reconciler: the unconditional topic
/// observation first, then the payload-carrying event. Malformed payloads
/// are logged and dropped; the observation stands either way.
fn ingest(reconciler: &mut Reconciler, msg: &InboundMessage) {
    if let Some(event) = observation_event(&msg.topic) {
        reconciler.apply(event);
    }
    match payload_event(&msg.topic, &msg.payload) {
        Ok(Some(event)) => reconciler.apply(event),
        Ok(None) => {}
        Err(err) => warn!(topic = %msg.topic, error = %err, "dropping malformed payload"),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::model::{AvailabilityState, Coordinator};

    fn message(topic: &str, payload: &str) -> InboundMessage {
        InboundMessage {
            topic: topic.to_owned(),
            payload: Bytes::copy_from_slice(payload.as_bytes()),
            retained: true,
        }
    }

    #[test]
    fn ingest_records_observation_and_availability() {
        let mut reconciler = Reconciler::new();
        ingest(
            &mut reconciler,
            &message("zigbee15/Plug1/availability", r#"{"state": "offline"}"#),
        );

        let result = reconciler.classify(&Coordinator::new("zigbee15"));
        // No roster: the observed name is stranded, carrying its state.
        assert_eq!(result.stranded.len(), 1);
        assert_eq!(result.stranded[0].name, "Plug1");
        assert!(
            result.stranded[0]
                .availability
                .as_ref()
                .is_some_and(AvailabilityState::is_offline)
        );
    }

    #[test]
    fn malformed_availability_still_counts_as_observed() {
        let mut reconciler = Reconciler::new();
        ingest(
            &mut reconciler,
            &message("zigbee15/Plug1/availability", "not json"),
        );

        let result = reconciler.classify(&Coordinator::new("zigbee15"));
        assert_eq!(result.stranded.len(), 1);
        assert_eq!(result.stranded[0].availability, None);
        assert_eq!(reconciler.availability_events(), 0);
    }

    #[test]
    fn malformed_roster_leaves_coordinator_rosterless() {
        let mut reconciler = Reconciler::new();
        ingest(&mut reconciler, &message("zigbee15/bridge/devices", "42"));
        ingest(&mut reconciler, &message("zigbee15/Plug1", "{}"));

        let result = reconciler.classify(&Coordinator::new("zigbee15"));
        assert!(!result.roster_received);
        assert_eq!(result.stranded.len(), 1);
    }
}
