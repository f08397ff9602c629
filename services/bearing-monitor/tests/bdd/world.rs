//! BDD test world for bearing monitor

use std::time::Duration;

use bearing_monitor::{TemperaturePoller, TemperatureSnapshot};
use cucumber::World;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::MockBackend;

#[derive(Debug, Default, World)]
pub struct MonitorWorld {
    // Upstream
    pub backend: Option<MockBackend>,

    // Poller testing
    pub interval: Option<Duration>,
    pub poller: Option<TemperaturePoller>,
    pub updates: Option<watch::Receiver<TemperatureSnapshot>>,
    pub requests_at_mark: usize,

    // Color testing
    pub color_result: Option<bearing_monitor::Result<&'static str>>,

    // Service lifecycle testing
    pub cancel: Option<CancellationToken>,
    pub run_handle: Option<JoinHandle<bearing_monitor::Result<()>>>,
    pub run_result: Option<bearing_monitor::Result<()>>,
}

impl MonitorWorld {
    pub fn backend(&self) -> &MockBackend {
        self.backend.as_ref().expect("backend not started")
    }

    pub fn poller(&self) -> &TemperaturePoller {
        self.poller.as_ref().expect("poller not created")
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
