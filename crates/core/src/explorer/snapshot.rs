//! Read-only state views published to the rendering surface.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::notifications::NormalizedError;
use crate::remote::{OrderRecord, PicklistOption};

/// Lifecycle phase of one cascade node, derived from its slot state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodePhase {
    /// No parameters yet (ancestor selection missing).
    Idle,
    /// A fetch is in flight; `items` may still hold the last good value.
    Loading,
    Ready,
    Error,
}

/// View of one cascade node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot<T> {
    pub phase: NodePhase,
    pub items: Vec<T>,
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<NormalizedError>,
}

/// Full explorer state, enough to drive a three-stage picklist plus a result
/// table. Column layout and formatting stay with the surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerSnapshot {
    pub accounts: NodeSnapshot<PicklistOption>,
    pub months: NodeSnapshot<PicklistOption>,
    pub orders: NodeSnapshot<OrderRecord>,
    pub selected_account_id: Option<String>,
    pub selected_due_month: Option<String>,
}

/// Trait for receiving state snapshots.
///
/// The host surface implements this to re-render on every state change.
/// `publish()` must be fast and non-blocking; a sink that drops a snapshot
/// only loses one frame, the next mutation publishes a fresh one.
pub trait SnapshotSink: Send + Sync {
    fn publish(&self, snapshot: ExplorerSnapshot);
}

/// No-op implementation for tests or headless contexts.
#[derive(Clone, Default)]
pub struct NoOpSnapshotSink;

impl SnapshotSink for NoOpSnapshotSink {
    fn publish(&self, _snapshot: ExplorerSnapshot) {
        // Intentionally empty - snapshots are discarded
    }
}

/// Mock sink for testing - collects published snapshots.
#[derive(Clone, Default)]
pub struct MockSnapshotSink {
    snapshots: Arc<Mutex<Vec<ExplorerSnapshot>>>,
}

impl MockSnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected snapshots.
    pub fn snapshots(&self) -> Vec<ExplorerSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    /// Returns the most recently published snapshot.
    pub fn latest(&self) -> Option<ExplorerSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.snapshots.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().unwrap().is_empty()
    }
}

impl SnapshotSink for MockSnapshotSink {
    fn publish(&self, snapshot: ExplorerSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}
