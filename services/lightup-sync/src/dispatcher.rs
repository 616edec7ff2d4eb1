//! Mutations against the backend
//!
//! Each operation sends one request and, on success, asks the owning
//! collection to refresh from the server. Local items are never edited
//! directly. Failures only set the collection's error flag; nothing is
//! returned to the caller.

use std::sync::Arc;

use crate::api::LightUpApi;
use crate::error::Result;
use crate::model::{AlarmPatch, Collection, NewAlarm, StationForm};
use crate::sync::{AlarmSync, CollectionSync, StationSync};

/// Sends add/edit/delete requests and resynchronizes afterwards
#[derive(Debug)]
pub struct MutationDispatcher {
    api: Arc<LightUpApi>,
    alarms: Arc<AlarmSync>,
    stations: Arc<StationSync>,
}

impl MutationDispatcher {
    pub fn new(api: Arc<LightUpApi>, alarms: Arc<AlarmSync>, stations: Arc<StationSync>) -> Self {
        Self {
            api,
            alarms,
            stations,
        }
    }

    pub async fn add_alarm(&self, alarm: &NewAlarm) {
        tracing::info!(
            "Adding alarm {}:{:02} '{}'",
            alarm.hour,
            alarm.minute,
            alarm.label
        );
        let result = self.api.add_alarm(alarm).await;
        settle(&self.alarms, "addAlarm", result).await;
    }

    /// Flip the enabled state of an alarm, given the state currently shown
    pub async fn toggle_alarm_enabled(&self, id: i64, current_enabled: bool) {
        tracing::info!("Setting alarm {} enabled={}", id, !current_enabled);
        let result = self
            .api
            .edit_alarm(id, &AlarmPatch::enabled(!current_enabled))
            .await;
        settle(&self.alarms, "editAlarm", result).await;
    }

    pub async fn edit_alarm(&self, id: i64, patch: &AlarmPatch) {
        tracing::info!("Editing alarm {}", id);
        let result = self.api.edit_alarm(id, patch).await;
        settle(&self.alarms, "editAlarm", result).await;
    }

    pub async fn delete_alarm(&self, id: i64) {
        tracing::info!("Deleting alarm {}", id);
        let result = self.api.delete_alarm(id).await;
        settle(&self.alarms, "deleteAlarm", result).await;
    }

    /// Add a station; the form is cleared only when the backend accepted it
    pub async fn add_station(&self, form: &mut StationForm) {
        tracing::info!("Adding station '{}' ({})", form.name, form.url);
        let result = self.api.add_station(form).await;
        if result.is_ok() {
            form.clear();
        }
        settle(&self.stations, "addStation", result).await;
    }

    pub async fn delete_station(&self, id: i64) {
        tracing::info!("Deleting station {}", id);
        let result = self.api.delete_station(id).await;
        settle(&self.stations, "deleteStation", result).await;
    }

    /// Refresh both collections concurrently
    pub async fn refresh_all(&self) {
        tokio::join!(self.alarms.refresh(), self.stations.refresh());
    }
}

async fn settle<C: Collection>(sync: &CollectionSync<C>, action: &str, result: Result<()>) {
    match result {
        Ok(()) => sync.refresh().await,
        Err(e) => {
            tracing::warn!("{} failed: {}", action, e);
            sync.mark_failed(&e);
        }
    }
}
