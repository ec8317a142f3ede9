//! Shared daemon state.
//!
//! Each poll produces an immutable record consumed read-only by every sensor
//! of that cycle. Readers load the current snapshot; pollers publish a new
//! one wholesale, never merging fields across cycles.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::client::DeviceRecord;

/// Latest known state of one tracker.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    /// Record from the most recent successful poll; `None` after a failed one
    pub record: Option<Arc<DeviceRecord>>,

    /// Error from the most recent poll, cleared on success
    pub last_error: Option<String>,
}

/// Snapshot of all trackers.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub trackers: HashMap<String, TrackerState>,
}

/// Shared handle to the daemon state, cheap to clone.
#[derive(Clone, Default)]
pub struct SharedState {
    inner: Arc<ArcSwap<State>>,
}

impl SharedState {
    /// Current snapshot (atomic refcount bump, essentially free).
    pub fn snapshot(&self) -> Arc<State> {
        self.inner.load_full()
    }

    /// Replace one tracker's state in a fresh snapshot.
    pub fn update_tracker(&self, name: &str, update: TrackerState) {
        self.inner.rcu(|state| {
            let mut next = State::clone(state);
            next.trackers.insert(name.to_string(), update.clone());
            next
        });
    }
}
