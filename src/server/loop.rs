// Server loop module
// Accepts connections until shutdown, then drains in-flight ones

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the accept loop until `shutdown` resolves.
///
/// After shutdown no new connections are accepted; open ones get up to the
/// shutdown grace period to finish.
pub async fn start_server_loop<S>(listener: TcpListener, state: Arc<AppState>, shutdown: S)
where
    S: Future<Output = &'static str>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            signal = &mut shutdown => {
                logger::log_shutdown_requested(signal);
                break;
            }
        }
    }

    drop(listener);
    let remaining = drain(
        &active_connections,
        state.config.performance.shutdown_grace(),
    )
    .await;
    logger::log_shutdown_complete(remaining);
}

/// Wait for the active count to reach zero or `grace` to elapse; returns the
/// number still open
async fn drain(active_connections: &AtomicUsize, grace: Duration) -> usize {
    let deadline = Instant::now() + grace;
    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 || Instant::now() >= deadline {
            return remaining;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EnvOverrides, SiteMode};
    use crate::contact::testing::{RecordingMailer, SlowMailer};
    use crate::server::create_listener;
    use tera::Tera;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    fn assets_state() -> Arc<AppState> {
        let mut cfg = Config::load_with("no-such-config", &EnvOverrides::default()).unwrap();
        cfg.site.mode = SiteMode::Assets;
        cfg.site.static_dir = "no-such-static-dir".to_string();
        cfg.logging.access_log = false;
        cfg.performance.read_timeout = 1;
        cfg.performance.write_timeout = 1;
        Arc::new(AppState::new(cfg, None, Arc::new(RecordingMailer::default())))
    }

    #[tokio::test]
    async fn test_drain_returns_immediately_when_idle() {
        let counter = AtomicUsize::new(0);
        assert_eq!(drain(&counter, Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace() {
        let counter = AtomicUsize::new(2);
        assert_eq!(drain(&counter, Duration::from_millis(250)).await, 2);
    }

    #[tokio::test]
    async fn test_slow_dispatch_outlives_read_timeout() {
        let mut cfg = Config::load_with("no-such-config", &EnvOverrides::default()).unwrap();
        cfg.logging.access_log = false;
        cfg.performance.keep_alive_timeout = 1;
        cfg.performance.read_timeout = 1;
        cfg.performance.write_timeout = 1;
        let mailer = Arc::new(SlowMailer::new(Duration::from_millis(1500)));
        let state = Arc::new(AppState::new(cfg, Some(Tera::default()), mailer.clone()));

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(start_server_loop(listener, state, async move {
            let _ = rx.await;
            "test"
        }));

        let body = "name=Ann&email=a%40b.com&message=Hi";
        let request = format!(
            "POST /contact HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        tokio::time::timeout(Duration::from_secs(10), stream.read_to_string(&mut response))
            .await
            .unwrap()
            .unwrap();

        assert!(response.starts_with("HTTP/1.1 302 Found"), "{response}");
        assert!(response.to_ascii_lowercase().contains("location: /thank-you"));
        assert_eq!(mailer.inner.sent().len(), 1);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_serves_health_then_shuts_down() {
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(start_server_loop(listener, assets_state(), async move {
            let _ = rx.await;
            "test"
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with(r#"{"ok":true}"#));

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }
}
