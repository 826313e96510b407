//! JustMaple headless client
//!
//! Connects to the data store, mirrors the arena and sends input at the
//! configured cadence until the connection closes or the process is
//! signalled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use maple_client::net::transport;
use maple_client::session::{SessionSignal, SignalReceiver};
use maple_client::util::{time::interval_for_rate, token};
use maple_client::world::types::RawIntent;
use maple_client::{Config, SessionCoordinator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    let url = config.subscribe_url();
    info!("Starting JustMaple client");
    info!(url = %url, frame_rate = config.frame_rate, send_rate = config.send_rate, "Client configuration");

    let saved_token = config.token_path.as_deref().and_then(token::load);
    let (outbound, events) = transport::connect(url, saved_token);

    let config = Arc::new(config);
    let mut coordinator = SessionCoordinator::new(config.clone(), outbound, events);
    tokio::spawn(log_signals(coordinator.subscribe()));

    let mut frame_interval = interval(interval_for_rate(config.frame_rate));
    frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut hud_interval = interval(Duration::from_secs(5));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = frame_interval.tick() => {
                // No input device in headless mode; MAPLE_TEST_INPUT overrides this
                coordinator.frame(RawIntent::default(), Instant::now());
                if coordinator.is_finished() {
                    break;
                }
            }
            _ = hud_interval.tick() => {
                if let Some(label) = coordinator.hud_label() {
                    info!(
                        player = coordinator.local_username().unwrap_or(""),
                        owned = coordinator.owned_entity_count(),
                        "{}", label
                    );
                }
            }
            _ = &mut shutdown => {
                coordinator.disconnect();
                break;
            }
        }
    }

    info!("Client shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Stand-in for the UI: report session signals in the log
async fn log_signals(mut rx: SignalReceiver) {
    loop {
        match rx.recv().await {
            Ok(SessionSignal::Spawned { entity_id }) => info!(entity_id = %entity_id, "Entity spawned"),
            Ok(SessionSignal::Eliminated) => info!("Eliminated"),
            Ok(other) => info!(signal = ?other, "Session signal"),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(lagged_count = n, "Signal log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
