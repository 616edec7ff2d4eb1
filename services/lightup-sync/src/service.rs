//! Service: owns both collection syncs and drives their refreshes

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::LightUpApi;
use crate::config::PollingConfig;
use crate::dispatcher::MutationDispatcher;
use crate::model::Alarm;
use crate::poller::poll_loop;
use crate::sync::{alarm_sync, station_sync, AlarmSync, StationSync};

/// Alarm and station syncs sharing one backend
#[derive(Debug)]
pub struct SyncService {
    api: Arc<LightUpApi>,
    alarms: Arc<AlarmSync>,
    stations: Arc<StationSync>,
    dispatcher: Arc<MutationDispatcher>,
}

impl SyncService {
    pub fn new(api: Arc<LightUpApi>, demo_alarms: Vec<Alarm>) -> Self {
        let alarms = Arc::new(alarm_sync(Arc::clone(&api), demo_alarms));
        let stations = Arc::new(station_sync(Arc::clone(&api)));
        let dispatcher = Arc::new(MutationDispatcher::new(
            Arc::clone(&api),
            Arc::clone(&alarms),
            Arc::clone(&stations),
        ));
        Self {
            api,
            alarms,
            stations,
            dispatcher,
        }
    }

    pub fn alarms(&self) -> &Arc<AlarmSync> {
        &self.alarms
    }

    pub fn stations(&self) -> &Arc<StationSync> {
        &self.stations
    }

    pub fn dispatcher(&self) -> &Arc<MutationDispatcher> {
        &self.dispatcher
    }

    /// Log whether the backend answers its liveness endpoint
    pub async fn check_backend(&self) -> bool {
        match self.api.ping().await {
            Ok(()) => {
                tracing::info!("LightUpPi backend reachable at {}", self.api.base_url());
                true
            }
            Err(e) => {
                tracing::warn!(
                    "LightUpPi backend at {} not reachable: {}",
                    self.api.base_url(),
                    e
                );
                false
            }
        }
    }

    /// Load both collections, then keep polling them if enabled.
    /// Returns when the cancellation token is triggered.
    pub async fn run(&self, polling: &PollingConfig, cancel: CancellationToken) {
        self.dispatcher.refresh_all().await;

        let mut handles = Vec::new();
        if polling.enabled {
            let interval = polling.interval();
            handles.push(tokio::spawn(poll_loop(
                Arc::clone(&self.alarms),
                interval,
                cancel.clone(),
            )));
            handles.push(tokio::spawn(poll_loop(
                Arc::clone(&self.stations),
                interval,
                cancel.clone(),
            )));
        } else {
            tracing::debug!("Polling disabled; collections refresh after mutations only");
        }

        cancel.cancelled().await;

        for handle in handles {
            let _ = handle.await;
        }
    }
}
