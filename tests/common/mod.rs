//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use loadshed_api::config::AppConfig;
use loadshed_api::HttpServer;

/// Start a programmable mock upstream. The closure decides status and body
/// per request, and may sleep to simulate latency.
#[allow(dead_code)]
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Drain the request head; the mock only cares about
                        // the scripted response.
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Base test configuration pointing at the given mock upstream.
#[allow(dead_code)]
pub fn test_config(upstream_addr: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.upstream.base_url = format!("http://{}", upstream_addr);
    config.upstream.timeout_ms = 1_000;
    config.breaker.failure_threshold = 3;
    config.breaker.recovery_timeout_ms = 60_000;
    config.breaker.half_open_trials = 1;
    config.admission.max_inflight = 10;
    config.observability.metrics_enabled = false;
    config
}

/// Start the service on an ephemeral port. Dropping the returned sender
/// shuts the server down.
#[allow(dead_code)]
pub async fn start_service(config: AppConfig) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(server.run_with_shutdown(listener, async move {
        let _ = rx.await;
    }));

    (addr, tx)
}
