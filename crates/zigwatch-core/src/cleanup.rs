// ── Cleanup planning ──
//
// Clearing a stranded device means erasing *every* retained message under
// its topic tree, and brokers only reveal retained topics by redelivering
// them to new subscriptions. The plan half of that protocol lives here and
// is pure: which filters to subscribe, and which collected topics belong
// to a stranded device. The wire half (the second bounded listen window
// and the tombstone publishes) is in `session`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::Coordinator;
use crate::reconcile::Classification;

/// One stranded (coordinator, device) pair targeted for cleanup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CleanupTarget {
    pub coordinator: Coordinator,
    pub device: String,
}

impl CleanupTarget {
    /// Root topic of this device's tree.
    fn root_topic(&self) -> String {
        format!("{}/{}", self.coordinator, self.device)
    }
}

/// The set of topic trees to discover and clear.
///
/// Built strictly from stranded-set membership: a device present in a
/// roster can never appear in a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupPlan {
    targets: Vec<CleanupTarget>,
}

impl CleanupPlan {
    /// Build a plan from classifications, taking every stranded device.
    pub fn from_classifications<'a, I>(classifications: I) -> Self
    where
        I: IntoIterator<Item = &'a Classification>,
    {
        let mut targets: Vec<CleanupTarget> = classifications
            .into_iter()
            .flat_map(|classification| {
                classification.stranded.iter().map(|device| CleanupTarget {
                    coordinator: classification.coordinator.clone(),
                    device: device.name.clone(),
                })
            })
            .collect();
        targets.sort();
        targets.dedup();
        Self { targets }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of stranded devices targeted.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn targets(&self) -> &[CleanupTarget] {
        &self.targets
    }

    /// Subscription filters for the discovery window: the device's root
    /// topic plus its whole subtree, for every target.
    pub fn subscription_filters(&self) -> Vec<String> {
        self.targets
            .iter()
            .flat_map(|target| {
                let root = target.root_topic();
                [format!("{root}/#"), root]
            })
            .collect()
    }

    /// Whether a topic collected during discovery belongs to one of the
    /// targeted device trees.
    ///
    /// Exact match or a `/`-delimited prefix match; `zigbee15/Plug1` must
    /// not cover `zigbee15/Plug10`.
    pub fn covers(&self, topic: &str) -> bool {
        self.targets.iter().any(|target| {
            let root = target.root_topic();
            topic == root
                || (topic.len() > root.len()
                    && topic.starts_with(&root)
                    && topic.as_bytes().get(root.len()) == Some(&b'/'))
        })
    }
}

/// Result of executing a cleanup plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupOutcome {
    /// Topics whose retained messages were cleared.
    pub cleared: Vec<String>,
    /// Tombstone publishes that failed (counted, never fatal).
    pub failed: u64,
}

impl CleanupOutcome {
    /// Cleared-topic counts grouped by coordinator, for reporting.
    pub fn cleared_by_coordinator(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for topic in &self.cleared {
            let coordinator = topic.split('/').next().unwrap_or_default();
            *counts.entry(coordinator).or_insert(0) += 1;
        }
        counts
    }
}
