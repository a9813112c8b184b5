//! Two-view attribute storage for model instances.
//!
//! Every record owns one [`AttributeStore`] holding a committed view (the
//! mirror of the last known server state) and a pending view (local
//! mutations not yet confirmed). Reads prefer the committed value; writes
//! through [`AttributeStore::set`] land in both views so the same field
//! always reflects its current value whether or not it has been saved.

use serde_json::Value;

/// Dynamic attribute map, as received from and sent to the backend.
pub type AttrMap = serde_json::Map<String, Value>;

/// Committed + pending attribute views for one record.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    committed: AttrMap,
    pending: AttrMap,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store for a locally constructed record: the initial attributes are
    /// both the current view and the unsaved payload.
    pub fn from_new(attrs: AttrMap) -> Self {
        Self {
            committed: attrs.clone(),
            pending: attrs,
        }
    }

    /// Store for a record the backend already holds: nothing is pending.
    pub fn from_committed(attrs: AttrMap) -> Self {
        Self {
            committed: attrs,
            pending: AttrMap::new(),
        }
    }

    /// Committed value if present, else the pending value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.committed.get(field).or_else(|| self.pending.get(field))
    }

    /// Write a field into both views. Idempotent.
    pub fn set(&mut self, field: &str, value: Value) {
        self.committed.insert(field.to_string(), value.clone());
        self.pending.insert(field.to_string(), value);
    }

    /// Write a field into the pending view only.
    ///
    /// Used when folding a file-upload result into the next save payload
    /// and when merging extra attributes into an update.
    pub(crate) fn stage(&mut self, field: &str, value: Value) {
        self.pending.insert(field.to_string(), value);
    }

    /// Merge a map into the pending view only.
    pub(crate) fn merge_staged(&mut self, extra: AttrMap) {
        for (field, value) in extra {
            self.pending.insert(field, value);
        }
    }

    /// Reconcile a successful server response: merge the response body into
    /// the committed view, re-apply pending values over it (pending wins on
    /// conflict), then clear pending.
    pub(crate) fn commit_response(&mut self, body: AttrMap) {
        for (field, value) in body {
            self.committed.insert(field, value);
        }
        for (field, value) in std::mem::take(&mut self.pending) {
            self.committed.insert(field, value);
        }
    }

    pub fn committed(&self) -> &AttrMap {
        &self.committed
    }

    pub fn pending(&self) -> &AttrMap {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.committed.contains_key(field) || self.pending.contains_key(field)
    }

    /// Union of field names across both views, committed order first.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.committed.keys().map(String::as_str).collect();
        for field in self.pending.keys() {
            if !self.committed.contains_key(field) {
                keys.push(field);
            }
        }
        keys
    }

    /// Drop both views. Used after destroy.
    pub fn clear(&mut self) {
        self.committed.clear();
        self.pending.clear();
    }
}
