//! Bearing Monitor - idler-roller bearing temperature monitor
//!
//! Polls the bearing temperature status endpoint, keeps the latest snapshot,
//! and serves it on a local dashboard.

pub mod color;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod io;
pub mod poller;
pub mod snapshot;
pub mod state;

pub use config::{load_config, Config};
pub use error::{MonitorError, Result};
pub use poller::{PollerState, TemperaturePoller};
pub use snapshot::{TemperatureSnapshot, TemperatureStats, TemperatureStatus};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::io::{HttpClient, ReqwestHttpClient};

fn build_poller(config: &Config) -> Result<TemperaturePoller> {
    let http: Arc<dyn HttpClient> =
        Arc::new(ReqwestHttpClient::new(config.endpoint.request_timeout)?);
    let state = state::new_state_handle(config.dashboard.history_size);
    Ok(TemperaturePoller::from_config(&config.endpoint, http, state))
}

/// Fetch the status once and return the resulting snapshot
pub async fn poll_once(config: &Config) -> Result<TemperatureSnapshot> {
    config.validate()?;
    let poller = build_poller(config)?;
    poller.poll_once().await?;
    Ok(poller.snapshot().await)
}

/// Run the monitor until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();

    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    run_until_cancelled(config, cancel).await
}

/// Run the monitor until `cancel` is triggered
pub async fn run_until_cancelled(config: Config, cancel: CancellationToken) -> Result<()> {
    config.validate()?;
    let mut poller = build_poller(&config)?;

    // Start dashboard if enabled
    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let router = dashboard::build_router(poller.state_handle(), config.palette.clone());
        let cancel_for_dashboard = cancel.clone();

        tokio::spawn(async move {
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    poller.start();
    tracing::info!("Bearing monitor started");

    cancel.cancelled().await;

    poller.stop().await;
    tracing::info!("Bearing monitor stopped");

    Ok(())
}
