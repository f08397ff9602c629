//! BDD step definitions for the service lifecycle feature

use std::time::Duration;

use bearing_monitor::config::{Config, DashboardConfig, EndpointConfig};
use cucumber::{then, when};
use tokio_util::sync::CancellationToken;

use crate::world::{wait_until, MonitorWorld};

#[when("the monitor service is started without a dashboard")]
fn start_service(world: &mut MonitorWorld) {
    let config = Config {
        endpoint: EndpointConfig {
            base_url: world.backend().base_url(),
            polling_interval: Duration::from_millis(100),
            ..Default::default()
        },
        dashboard: DashboardConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };

    let cancel = CancellationToken::new();
    world.run_handle = Some(tokio::spawn(bearing_monitor::run_until_cancelled(
        config,
        cancel.clone(),
    )));
    world.cancel = Some(cancel);
}

#[when(expr = "the monitor service is started with polling interval {string}")]
fn start_service_with_interval(world: &mut MonitorWorld, interval: String) {
    let mut config = Config::default();
    config.endpoint.base_url = world.backend().base_url();
    config.endpoint.polling_interval = humantime::parse_duration(&interval).unwrap_or_default();
    config.dashboard.enabled = false;

    let cancel = CancellationToken::new();
    world.run_handle = Some(tokio::spawn(bearing_monitor::run_until_cancelled(
        config,
        cancel.clone(),
    )));
    world.cancel = Some(cancel);
}

#[when("the backend has been polled")]
async fn backend_polled(world: &mut MonitorWorld) {
    let backend = world.backend();
    assert!(wait_until(Duration::from_secs(3), || backend.requests() >= 1).await);
}

#[when("the service is shut down")]
async fn shutdown_service(world: &mut MonitorWorld) {
    world.cancel.as_ref().expect("service not started").cancel();
    let handle = world.run_handle.take().expect("service not started");
    let result = tokio::time::timeout(Duration::from_secs(3), handle)
        .await
        .expect("service did not shut down")
        .expect("service task panicked");
    world.run_result = Some(result);
    world.requests_at_mark = world.backend().requests();
}

#[when("the service exits")]
async fn service_exits(world: &mut MonitorWorld) {
    let handle = world.run_handle.take().expect("service not started");
    let result = tokio::time::timeout(Duration::from_secs(3), handle)
        .await
        .expect("service did not exit")
        .expect("service task panicked");
    world.run_result = Some(result);
}

#[then("the service should have stopped cleanly")]
async fn stopped_cleanly(world: &mut MonitorWorld) {
    let result = world.run_result.as_ref().expect("service not shut down");
    assert!(result.is_ok(), "{:?}", result);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(world.backend().requests(), world.requests_at_mark);
}

#[then(expr = "the service should fail with a configuration error mentioning {string}")]
fn fails_with_config_error(world: &mut MonitorWorld, fragment: String) {
    let result = world.run_result.as_ref().expect("service did not exit");
    match result {
        Err(bearing_monitor::MonitorError::Config(msg)) => {
            assert!(msg.contains(&fragment), "{msg}")
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}
