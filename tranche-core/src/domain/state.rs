//! Remote resource state snapshots

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of a remote resource's current state
///
/// `current_state` is compared by value against a caller-supplied target.
/// `metadata` carries whatever else the caller wants to show alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState<S> {
    pub identifier: String,
    pub current_state: S,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl<S> ResourceState<S> {
    /// Creates a snapshot with no metadata
    pub fn new(identifier: impl Into<String>, current_state: S) -> Self {
        Self {
            identifier: identifier.into(),
            current_state,
            metadata: HashMap::new(),
        }
    }

    /// Attaches a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl<S: PartialEq> ResourceState<S> {
    /// Whether this snapshot is in the given state
    pub fn is_in(&self, target: &S) -> bool {
        self.current_state == *target
    }
}
