//! Keeps a local copy of a remote collection current
//!
//! A [`CollectionSync`] is the only writer of its collection's state. Every
//! refresh replaces the whole item list from the server response; failures
//! set the error flag and apply the collection's [`FallbackPolicy`]. Results
//! are applied as each request completes, so when two refreshes overlap the
//! one finishing last wins, regardless of which was issued first.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::watch;

use crate::api::LightUpApi;
use crate::error::{Result, SyncError};
use crate::model::{Alarm, Alarms, Collection, Stations};
use crate::state::{FallbackPolicy, SyncState};

/// Synchronizes one named collection with the backend
pub struct CollectionSync<C: Collection> {
    api: Arc<LightUpApi>,
    fallback: FallbackPolicy<C::Item>,
    state: watch::Sender<SyncState<C::Item>>,
}

pub type AlarmSync = CollectionSync<Alarms>;
pub type StationSync = CollectionSync<Stations>;

impl<C: Collection> std::fmt::Debug for CollectionSync<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSync")
            .field("collection", &C::NAME)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl<C: Collection> CollectionSync<C> {
    pub fn new(api: Arc<LightUpApi>, fallback: FallbackPolicy<C::Item>) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            api,
            fallback,
            state,
        }
    }

    /// Fetch the full collection and replace local state with the outcome
    pub async fn refresh(&self) {
        tracing::debug!("Refreshing {}", C::NAME);
        let result = self.api.fetch_all::<C>().await;
        self.apply(result);
    }

    /// Apply one completed fetch to local state
    pub fn apply(&self, result: Result<Vec<C::Item>>) {
        match result {
            Ok(items) => {
                let now_ms = current_epoch_ms();
                tracing::debug!("Synced {} {}", items.len(), C::NAME);
                self.state
                    .send_modify(|state| state.apply_success(items, now_ms));
            }
            Err(e) => {
                tracing::warn!("Refreshing {} failed: {}", C::NAME, e);
                self.state
                    .send_modify(|state| state.apply_failure(&e, &self.fallback));
            }
        }
    }

    /// Flag a failed mutation. Items stay as they are until the next refresh.
    pub fn mark_failed(&self, error: &SyncError) {
        self.state.send_modify(|state| state.mark_failed(error));
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SyncState<C::Item> {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SyncState<C::Item>> {
        self.state.subscribe()
    }

    pub fn name(&self) -> &'static str {
        C::NAME
    }
}

/// Alarm sync that shows `demo` when the backend is unavailable
pub fn alarm_sync(api: Arc<LightUpApi>, demo: Vec<Alarm>) -> AlarmSync {
    CollectionSync::new(api, FallbackPolicy::Substitute(demo))
}

/// Station sync that keeps its last known stations when the backend is unavailable
pub fn station_sync(api: Arc<LightUpApi>) -> StationSync {
    CollectionSync::new(api, FallbackPolicy::KeepItems)
}

pub(crate) fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
