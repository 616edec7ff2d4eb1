//! Mock LightUpPi backend
//!
//! Serves the LightUpPi HTTP API from memory so the sync service and its
//! dashboard can be exercised without an alarm clock.
//!
//! Usage:
//!   mock_lightup [--port PORT] [--seed] [--fail application|server]

use clap::{Parser, ValueEnum};
use lightup_sync::model::{demo_alarms, Station};
use lightup_sync::{MockBackend, MockFailure};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::Level;

#[derive(Clone, Copy, ValueEnum)]
enum FailureMode {
    Application,
    Server,
}

impl From<FailureMode> for MockFailure {
    fn from(mode: FailureMode) -> Self {
        match mode {
            FailureMode::Application => MockFailure::ApplicationError,
            FailureMode::Server => MockFailure::ServerError,
        }
    }
}

#[derive(Parser)]
#[command(name = "mock_lightup")]
#[command(about = "In-memory LightUpPi backend for testing")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Start with two alarms and one station
    #[arg(long)]
    seed: bool,

    /// Answer every request with this failure
    #[arg(long, value_enum)]
    fail: Option<FailureMode>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let backend = if args.seed {
        MockBackend::with_data(
            demo_alarms(),
            vec![Station {
                id: 1,
                name: "Mock Radio".to_string(),
                url: "http://localhost/stream.mp3".to_string(),
            }],
        )
    } else {
        MockBackend::new()
    };
    backend.set_failure(args.fail.map(MockFailure::from)).await;

    let listener = TcpListener::bind(("127.0.0.1", args.port)).await?;
    tracing::info!(
        "Mock LightUpPi listening on http://{}/LightUpPi/",
        listener.local_addr()?
    );

    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        cancel_for_signal.cancel();
    });

    lightup_sync::mock::serve(listener, backend, cancel).await?;
    tracing::info!("Mock LightUpPi stopped");

    Ok(())
}
