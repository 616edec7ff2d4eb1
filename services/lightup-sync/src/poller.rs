//! Periodic re-polling of a collection
//!
//! Each collection gets its own loop. A tick only fires once the previous
//! refresh has completed, so polls of the same collection never overlap;
//! ticks missed while a slow request was in flight are skipped. Cancellation
//! is checked between polls only, an in-flight refresh always finishes and
//! applies.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::model::Collection;
use crate::sync::CollectionSync;

/// Refresh `sync` every `interval` until `cancel` fires
///
/// The first refresh happens one interval after the call; the service does
/// its eager refresh before starting the pollers.
pub async fn poll_loop<C: Collection>(
    sync: Arc<CollectionSync<C>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!("Polling {} every {:?}", sync.name(), interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Polling loop for {} cancelled", sync.name());
                break;
            }
            _ = ticker.tick() => {}
        }

        sync.refresh().await;
    }
}
