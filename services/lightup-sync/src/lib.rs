//! LightUp Sync - alarm and station synchronization for the LightUpPi alarm clock
//!
//! Keeps local copies of the backend's alarm and station collections, sends
//! mutations and re-syncs after each one, and serves a small dashboard.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod dispatcher;
pub mod error;
pub mod io;
#[cfg(feature = "mock")]
pub mod mock;
pub mod model;
pub mod poller;
pub mod service;
pub mod state;
pub mod sync;

pub use config::{load_config, Config};
pub use error::{Result, SyncError};
pub use service::SyncService;

#[cfg(feature = "mock")]
pub use mock::{MockBackend, MockFailure};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api::LightUpApi;
use crate::dashboard::{DashboardState, ThemeRegistry};
use crate::io::{HttpClient, ReqwestHttpClient};

/// Builder for the sync service.
///
/// Wires the backend client, both collection syncs and the dashboard, then
/// binds the dashboard listener.
pub struct SyncServiceBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    cancel: Option<CancellationToken>,
}

impl SyncServiceBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            cancel: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn build(self) -> Result<BoundService> {
        self.config.validate()?;

        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::default()));
        let api = Arc::new(LightUpApi::new(&self.config.backend.base_url, http));
        let service = Arc::new(SyncService::new(api, self.config.demo_alarms.clone()));

        let listener = if self.config.dashboard.enabled {
            let port = self.config.dashboard.port;
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            match TcpListener::bind(addr).await {
                Ok(listener) => Some(listener),
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        port,
                        e
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok(BoundService {
            config: self.config,
            service,
            listener,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// A built service whose dashboard port is already bound
pub struct BoundService {
    config: Config,
    service: Arc<SyncService>,
    listener: Option<TcpListener>,
    cancel: CancellationToken,
}

impl BoundService {
    /// Address the dashboard listens on, if it is enabled and bound
    pub fn dashboard_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn service(&self) -> &Arc<SyncService> {
        &self.service
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until the cancellation token fires or ctrl-c is received
    pub async fn start(self) -> Result<()> {
        let Self {
            config,
            service,
            listener,
            cancel,
        } = self;

        service.check_backend().await;

        let cancel_for_signal = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => {
                        tracing::info!("Shutdown signal received");
                        cancel_for_signal.cancel();
                    }
                    Err(e) => tracing::warn!("Failed to listen for ctrl-c: {}", e),
                },
                _ = cancel_for_signal.cancelled() => {}
            }
        });

        let dashboard = listener.map(|listener| {
            let state = DashboardState {
                alarms: Arc::clone(service.alarms()),
                stations: Arc::clone(service.stations()),
                dispatcher: Arc::clone(service.dispatcher()),
                themes: Arc::new(ThemeRegistry::new(config.themes.clone())),
            };
            let cancel_for_dashboard = cancel.clone();

            tokio::spawn(async move {
                if let Ok(addr) = listener.local_addr() {
                    tracing::info!("Dashboard listening on http://{}", addr);
                }
                let router = dashboard::build_router(state);
                if let Err(e) = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        cancel_for_dashboard.cancelled().await;
                    })
                    .await
                {
                    tracing::error!("Dashboard server failed: {}", e);
                }
                tracing::debug!("Dashboard stopped");
            })
        });

        tracing::info!(
            "Syncing with LightUpPi backend at {}",
            config.backend.base_url
        );

        // Blocks until cancelled
        service.run(&config.polling, cancel).await;

        if let Some(handle) = dashboard {
            let _ = handle.await;
        }
        tracing::info!("Sync service stopped");

        Ok(())
    }
}

/// Build and run the sync service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    SyncServiceBuilder::new(config).build().await?.start().await
}
