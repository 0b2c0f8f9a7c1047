//! Circuit breaker behavior through the full service.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

mod common;

async fn get_client(client: &reqwest::Client, addr: SocketAddr) -> u16 {
    client
        .get(format!("http://{}/client", addr))
        .send()
        .await
        .unwrap()
        .status()
        .as_u16()
}

#[tokio::test]
async fn breaker_opens_at_threshold_and_fast_fails() {
    let upstream_calls = Arc::new(AtomicU32::new(0));
    let calls = upstream_calls.clone();
    let upstream_addr = common::start_programmable_upstream(move || {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            (503, "down".into())
        }
    })
    .await;

    let mut config = common::test_config(upstream_addr);
    config.breaker.failure_threshold = 3;
    let (addr, _shutdown) = common::start_service(config).await;
    let client = reqwest::Client::new();

    // Three upstream failures while Closed.
    for _ in 0..3 {
        assert_eq!(get_client(&client, addr).await, 502);
    }
    assert_eq!(upstream_calls.load(Ordering::SeqCst), 3);

    // Fourth request is short-circuited: distinct status, no upstream call.
    assert_eq!(get_client(&client, addr).await, 503);
    assert_eq!(upstream_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn breaker_recovers_after_successful_probe() {
    let upstream_status = Arc::new(AtomicU16::new(503));
    let status = upstream_status.clone();
    let upstream_addr = common::start_programmable_upstream(move || {
        let status = status.clone();
        async move { (status.load(Ordering::SeqCst), "{}".into()) }
    })
    .await;

    let mut config = common::test_config(upstream_addr);
    config.breaker.failure_threshold = 1;
    config.breaker.recovery_timeout_ms = 300;
    let (addr, _shutdown) = common::start_service(config).await;
    let client = reqwest::Client::new();

    assert_eq!(get_client(&client, addr).await, 502); // opens the breaker
    assert_eq!(get_client(&client, addr).await, 503); // still open, fast fail

    upstream_status.store(200, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(400)).await;

    // Half-open probe succeeds, breaker closes.
    assert_eq!(get_client(&client, addr).await, 200);
    assert_eq!(get_client(&client, addr).await, 200);
}

#[tokio::test]
async fn half_open_failure_reopens_breaker() {
    let upstream_addr =
        common::start_programmable_upstream(|| async { (503, "down".into()) }).await;

    let mut config = common::test_config(upstream_addr);
    config.breaker.failure_threshold = 1;
    config.breaker.recovery_timeout_ms = 200;
    let (addr, _shutdown) = common::start_service(config).await;
    let client = reqwest::Client::new();

    assert_eq!(get_client(&client, addr).await, 502); // opens
    tokio::time::sleep(Duration::from_millis(250)).await;

    // Probe is admitted, fails, and reopens the breaker immediately.
    assert_eq!(get_client(&client, addr).await, 502);
    assert_eq!(get_client(&client, addr).await, 503);
}

#[tokio::test]
async fn success_resets_consecutive_failure_count() {
    let script: Arc<Mutex<VecDeque<u16>>> =
        Arc::new(Mutex::new(VecDeque::from([503, 503, 200, 503, 503, 200])));
    let scripted = script.clone();
    let upstream_addr = common::start_programmable_upstream(move || {
        let scripted = scripted.clone();
        async move {
            let status = scripted.lock().unwrap().pop_front().unwrap_or(200);
            (status, "{}".into())
        }
    })
    .await;

    let mut config = common::test_config(upstream_addr);
    config.breaker.failure_threshold = 3;
    let (addr, _shutdown) = common::start_service(config).await;
    let client = reqwest::Client::new();

    // Two failures, a reset, two more failures: the threshold of three
    // consecutive failures is never reached.
    let expected = [502, 502, 200, 502, 502, 200];
    for want in expected {
        assert_eq!(get_client(&client, addr).await, want);
    }
}

#[tokio::test]
async fn timeout_counts_as_breaker_evidence() {
    let upstream_addr = common::start_programmable_upstream(|| async {
        tokio::time::sleep(Duration::from_millis(800)).await;
        (200, "{}".into())
    })
    .await;

    let mut config = common::test_config(upstream_addr);
    config.upstream.timeout_ms = 100;
    config.breaker.failure_threshold = 1;
    let (addr, _shutdown) = common::start_service(config).await;
    let client = reqwest::Client::new();

    let started = Instant::now();
    assert_eq!(get_client(&client, addr).await, 504);
    // The handler must not be held past the deadline.
    assert!(started.elapsed() < Duration::from_millis(500));

    // The timeout opened the breaker, same as an explicit failure would.
    assert_eq!(get_client(&client, addr).await, 503);
}
