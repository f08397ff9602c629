//! BDD step definitions for the polling feature

use std::sync::Arc;
use std::time::Duration;

use bearing_monitor::color::status_color;
use bearing_monitor::io::{HttpClient, ReqwestHttpClient};
use bearing_monitor::state::new_state_handle;
use bearing_monitor::{PollerState, TemperaturePoller, TemperatureStatus};
use cucumber::{given, then, when};

use crate::backend::{success_body, MockBackend};
use crate::world::{wait_until, MonitorWorld};

const WAIT: Duration = Duration::from_secs(3);

fn parse_status(status: &str) -> TemperatureStatus {
    status
        .parse()
        .unwrap_or_else(|_| panic!("Unknown status: {}", status))
}

#[given(expr = "a backend that reports {string}")]
async fn backend_reports(world: &mut MonitorWorld, status: String) {
    let backend = MockBackend::start().await;
    backend.respond(200, success_body(&status, 42.0));
    world.backend = Some(backend);
}

#[given(expr = "a poller with a {int} ms interval")]
fn poller_with_interval(world: &mut MonitorWorld, millis: u64) {
    let interval = Duration::from_millis(millis);
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::default());
    let poller = TemperaturePoller::new(
        world.backend().status_url(),
        interval,
        http,
        new_state_handle(10),
    );
    world.updates = Some(poller.subscribe());
    world.interval = Some(interval);
    world.poller = Some(poller);
}

#[when("the poller is started")]
fn start_poller(world: &mut MonitorWorld) {
    let poller = world.poller.as_mut().expect("poller not created");
    assert!(poller.start());
}

#[when("the poller is stopped")]
async fn stop_poller(world: &mut MonitorWorld) {
    let poller = world.poller.as_mut().expect("poller not created");
    assert!(poller.stop().await);
    world.requests_at_mark = world.backend().requests();
}

#[when("the first snapshot arrives")]
async fn first_snapshot(world: &mut MonitorWorld) {
    let updates = world.updates.as_mut().expect("not subscribed");
    tokio::time::timeout(WAIT, updates.changed())
        .await
        .expect("no snapshot within timeout")
        .expect("poller dropped");
}

#[when(expr = "the backend starts reporting {string}")]
fn backend_switches(world: &mut MonitorWorld, status: String) {
    world.backend().respond(200, success_body(&status, 88.0));
}

#[when("the backend starts reporting failure")]
fn backend_reports_failure(world: &mut MonitorWorld) {
    world
        .backend()
        .respond(200, r#"{"success": false, "message": "sensor offline"}"#.to_string());
}

#[when("the backend starts returning server errors")]
fn backend_server_errors(world: &mut MonitorWorld) {
    world.backend().respond(500, "Internal Server Error".to_string());
}

#[when(expr = "the backend starts reporting unknown status {string}")]
fn backend_unknown_status(world: &mut MonitorWorld, status: String) {
    world.backend().respond(200, success_body(&status, 99.0));
}

#[when(expr = "the poller completes {int} more requests")]
async fn more_requests(world: &mut MonitorWorld, count: usize) {
    let target = world.backend().requests() + count;
    let backend = world.backend();
    assert!(
        wait_until(WAIT, || backend.requests() >= target).await,
        "backend saw {} requests, expected {}",
        backend.requests(),
        target
    );
    // Give the last response time to be processed
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[when(expr = "{int} polling intervals elapse")]
async fn intervals_elapse(world: &mut MonitorWorld, count: u32) {
    let interval = world.interval.expect("interval not set");
    tokio::time::sleep(interval * count).await;
}

#[then(expr = "the displayed status should be {string}")]
async fn displayed_status(world: &mut MonitorWorld, expected: String) {
    let expected = parse_status(&expected);
    assert_eq!(world.poller().snapshot().await.status, expected);
}

#[then(expr = "the displayed status should become {string}")]
async fn displayed_status_becomes(world: &mut MonitorWorld, expected: String) {
    let expected = parse_status(&expected);
    let updates = world.updates.as_mut().expect("not subscribed");
    let reached = matches!(
        tokio::time::timeout(WAIT, updates.wait_for(|s| s.status == expected)).await,
        Ok(Ok(_))
    );
    assert!(reached, "status never became {}", expected);
}

#[then(expr = "the displayed color should be the {string} color")]
async fn displayed_color(world: &mut MonitorWorld, status: String) {
    let snapshot = world.poller().snapshot().await;
    assert_eq!(
        status_color(snapshot.status),
        status_color(parse_status(&status))
    );
}

#[then("the poller should record a consecutive error")]
async fn records_error(world: &mut MonitorWorld) {
    let state = world.poller().state_handle();
    let state = state.read().await;
    assert!(state.consecutive_errors >= 1);
    assert!(state.last_error.is_some());
}

#[then("the poller should still be polling")]
fn still_polling(world: &mut MonitorWorld) {
    assert_eq!(world.poller().state(), PollerState::Polling);
}

#[then("the backend should receive no further requests")]
fn no_further_requests(world: &mut MonitorWorld) {
    assert_eq!(world.backend().requests(), world.requests_at_mark);
    assert_eq!(world.poller().state(), PollerState::Stopped);
}
