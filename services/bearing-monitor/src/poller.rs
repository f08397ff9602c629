//! TemperaturePoller: fixed-rate polling of the bearing temperature endpoint

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::EndpointConfig;
use crate::io::HttpClient;
use crate::snapshot::{decode_status_response, TemperatureSnapshot};
use crate::state::StateHandle;

/// Consecutive failures at which a louder warning is logged
const ERROR_WARN_THRESHOLD: u32 = 5;

/// Lifecycle of a poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Polling,
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollerState::Stopped => write!(f, "stopped"),
            PollerState::Polling => write!(f, "polling"),
        }
    }
}

/// Fetch and decode one status response
pub async fn fetch_snapshot(
    http: &dyn HttpClient,
    url: &str,
) -> crate::Result<TemperatureSnapshot> {
    let response = http.get(url).await?;
    if !response.is_success() {
        return Err(crate::MonitorError::Protocol(format!(
            "GET {} returned status {}",
            url, response.status
        )));
    }
    decode_status_response(&response.body)
}

/// Everything a single tick needs, shared between the ticker and its requests
struct PollContext {
    url: String,
    http: Arc<dyn HttpClient>,
    state: StateHandle,
    updates: watch::Sender<TemperatureSnapshot>,
}

impl PollContext {
    /// Run tick `sequence`. Returns whether its response was applied.
    async fn tick(&self, sequence: u64, cancel: &CancellationToken) -> crate::Result<bool> {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        self.state.write().await.record_attempt(current_epoch_ms());

        let result = fetch_snapshot(self.http.as_ref(), &self.url).await;
        if cancel.is_cancelled() {
            tracing::debug!("Dropping response of tick {} after stop", sequence);
            return Ok(false);
        }

        match result {
            Ok(snapshot) => {
                let mut state = self.state.write().await;
                let previous = state.snapshot.status;
                if !state.apply_snapshot(sequence, snapshot.clone(), current_epoch_ms()) {
                    tracing::debug!(
                        "Discarding response of tick {}: tick {} already applied",
                        sequence,
                        state.applied_sequence
                    );
                    return Ok(false);
                }
                if previous != snapshot.status {
                    tracing::info!(
                        "Bearing temperature status {} -> {}",
                        previous,
                        snapshot.status
                    );
                }
                tracing::debug!(
                    "Tick {}: status={} avg={:.1} max={:.1}",
                    sequence,
                    snapshot.status,
                    snapshot.stats.avg_temperature,
                    snapshot.stats.max_temperature
                );
                self.updates.send_replace(snapshot);
                Ok(true)
            }
            Err(e) => {
                let errors = self
                    .state
                    .write()
                    .await
                    .record_failure(sequence, e.to_string());
                tracing::warn!("Failed to fetch bearing temperature status: {}", e);
                if errors == ERROR_WARN_THRESHOLD {
                    tracing::warn!(
                        "Bearing temperature status has {} consecutive errors",
                        errors
                    );
                }
                Err(e)
            }
        }
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodically fetches the bearing temperature status and publishes the
/// latest snapshot.
///
/// Polling runs on a fixed-rate timer: the first request fires on
/// [`start`](Self::start), the following ones every `interval` regardless of
/// how long earlier requests take. Each tick carries a sequence number and a
/// response is only applied if no later tick has been applied already.
/// Dropping the poller stops it.
pub struct TemperaturePoller {
    ctx: Arc<PollContext>,
    interval: Duration,
    sequence: Arc<AtomicU64>,
    running: Option<Running>,
}

impl fmt::Debug for TemperaturePoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemperaturePoller")
            .field("url", &self.ctx.url)
            .field("interval", &self.interval)
            .field("state", &self.state())
            .finish()
    }
}

impl TemperaturePoller {
    pub fn new(
        url: impl Into<String>,
        interval: Duration,
        http: Arc<dyn HttpClient>,
        state: StateHandle,
    ) -> Self {
        let (updates, _) = watch::channel(TemperatureSnapshot::default());
        Self {
            ctx: Arc::new(PollContext {
                url: url.into(),
                http,
                state,
                updates,
            }),
            interval,
            sequence: Arc::new(AtomicU64::new(0)),
            running: None,
        }
    }

    pub fn from_config(
        config: &EndpointConfig,
        http: Arc<dyn HttpClient>,
        state: StateHandle,
    ) -> Self {
        Self::new(config.status_url(), config.polling_interval, http, state)
    }

    pub fn url(&self) -> &str {
        &self.ctx.url
    }

    pub fn state(&self) -> PollerState {
        match &self.running {
            Some(running) if !running.handle.is_finished() => PollerState::Polling,
            _ => PollerState::Stopped,
        }
    }

    /// Handle to the shared state the poller writes into
    pub fn state_handle(&self) -> StateHandle {
        Arc::clone(&self.ctx.state)
    }

    /// Receiver that observes every applied snapshot
    pub fn subscribe(&self) -> watch::Receiver<TemperatureSnapshot> {
        self.ctx.updates.subscribe()
    }

    /// Copy of the currently applied snapshot
    pub async fn snapshot(&self) -> TemperatureSnapshot {
        self.ctx.state.read().await.snapshot.clone()
    }

    /// Begin polling. Returns false if already polling.
    pub fn start(&mut self) -> bool {
        if self.state() == PollerState::Polling {
            tracing::warn!("Poller for {} is already running", self.ctx.url);
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_ticker(
            Arc::clone(&self.ctx),
            Arc::clone(&self.sequence),
            self.interval,
            cancel.clone(),
        ));
        self.running = Some(Running { cancel, handle });

        tracing::info!(
            "Polling {} every {}",
            self.ctx.url,
            humantime::format_duration(self.interval)
        );
        true
    }

    /// Stop polling. Once this returns no further requests are issued and
    /// responses of requests still in flight are never applied.
    pub async fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };

        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            if !e.is_cancelled() {
                tracing::warn!("Poller task for {} ended abnormally: {}", self.ctx.url, e);
            }
        }

        tracing::info!("Stopped polling {}", self.ctx.url);
        true
    }

    /// Perform a single tick inline, outside the timer.
    ///
    /// Returns whether the response was applied.
    pub async fn poll_once(&self) -> crate::Result<bool> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.ctx.tick(sequence, &CancellationToken::new()).await
    }
}

impl Drop for TemperaturePoller {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            running.handle.abort();
        }
    }
}

async fn run_ticker(
    ctx: Arc<PollContext>,
    sequence: Arc<AtomicU64>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Polling loop for {} cancelled", ctx.url);
                break;
            }
            _ = ticker.tick() => {
                let sequence = sequence.fetch_add(1, Ordering::SeqCst) + 1;
                let ctx = Arc::clone(&ctx);
                let cancel = cancel.clone();
                in_flight.spawn(async move {
                    // Failures are logged and counted inside tick
                    let _ = ctx.tick(sequence, &cancel).await;
                });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }

    // Abort and reap in-flight requests so none can apply after stop returns
    in_flight.shutdown().await;
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
