//! Local view state of a synchronized collection

use serde::Serialize;

use crate::error::SyncError;

/// What a collection shows after a failed refresh
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackPolicy<T> {
    /// Leave the current items in place
    KeepItems,
    /// Replace the items with a fixed list
    Substitute(Vec<T>),
}

/// Items of one collection plus the error flag driving the UI banner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncState<T> {
    pub items: Vec<T>,
    pub error_flag: bool,
    pub last_error: Option<String>,
    /// Completion time of the last successful refresh
    pub last_synced_epoch_ms: Option<u64>,
}

impl<T> Default for SyncState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error_flag: false,
            last_error: None,
            last_synced_epoch_ms: None,
        }
    }
}

impl<T: Clone> SyncState<T> {
    /// Replace the whole collection with fresh server data
    pub fn apply_success(&mut self, items: Vec<T>, now_ms: u64) {
        self.items = items;
        self.error_flag = false;
        self.last_error = None;
        self.last_synced_epoch_ms = Some(now_ms);
    }

    /// Record a failed refresh, substituting items if the policy says so
    pub fn apply_failure(&mut self, error: &SyncError, fallback: &FallbackPolicy<T>) {
        if let FallbackPolicy::Substitute(items) = fallback {
            self.items = items.clone();
        }
        self.mark_failed(error);
    }

    /// Set the error flag without touching the items
    pub fn mark_failed(&mut self, error: &SyncError) {
        self.error_flag = true;
        self.last_error = Some(error.to_string());
    }
}
