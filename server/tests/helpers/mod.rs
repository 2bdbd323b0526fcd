//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for sending requests through the full axum router with a
//! controllable fake bot, plus [`spawn_test_server()`] for tests that need a
//! real listener.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use keepalive_server::api::{create_router, AppState};
use keepalive_server::bot::{BotError, BotRunner, BotState, BotSupervisor, RestartPolicy};
use keepalive_server::config::Config;

// ============================================================================
// Fake bots
// ============================================================================

/// How a [`FakeBot`] behaves once started.
#[derive(Debug, Clone, Copy)]
pub enum FakeBehavior {
    /// Run until cancelled.
    Idle,
    /// Exit with an error immediately.
    Crash,
    /// Ignore cancellation and keep running.
    Unresponsive,
}

/// In-process stand-in for the external bot.
pub struct FakeBot {
    behavior: FakeBehavior,
    pub runs: Arc<AtomicU32>,
}

impl FakeBot {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            runs: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl BotRunner for FakeBot {
    fn name(&self) -> &str {
        "fake-bot"
    }

    fn run(&self, shutdown: CancellationToken) -> BoxFuture<'static, Result<(), BotError>> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior;
        Box::pin(async move {
            match behavior {
                FakeBehavior::Idle => {
                    shutdown.cancelled().await;
                    Ok(())
                }
                FakeBehavior::Crash => Err(BotError::Exited { code: Some(1) }),
                FakeBehavior::Unresponsive => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        })
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub bot: BotSupervisor,
    pub runs: Arc<AtomicU32>,
}

impl TestApp {
    /// Create a test app around an idle fake bot (not started).
    pub fn new() -> Self {
        Self::with_bot(FakeBehavior::Idle, RestartPolicy::disabled())
    }

    /// Create a test app with the given fake bot behavior and restart policy.
    pub fn with_bot(behavior: FakeBehavior, policy: RestartPolicy) -> Self {
        Self::with_config(Config::default_for_test(), behavior, policy)
    }

    /// Create a test app with a custom config.
    ///
    /// The supervisor waits `config.bot.stop_timeout` seconds for a stop.
    pub fn with_config(config: Config, behavior: FakeBehavior, policy: RestartPolicy) -> Self {
        let fake = FakeBot::new(behavior);
        let runs = Arc::clone(&fake.runs);
        let stop_timeout = Duration::from_secs(config.bot.stop_timeout);
        let bot = BotSupervisor::new(Arc::new(fake), policy, stop_timeout);
        let router = create_router(AppState::new(config, bot.clone()));

        Self { router, bot, runs }
    }

    /// Send a request through the router.
    pub async fn request(&self, method: Method, uri: &str) -> Response<Body> {
        self.send(empty_request(method, uri)).await
    }

    /// Send a request the way a browser form submission would.
    pub async fn form_post(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Send a prebuilt request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Poll until the bot reaches `state` (gives up after 5 seconds).
    pub async fn wait_for_state(&self, state: BotState) {
        for _ in 0..500 {
            if self.bot.status().await.state == state {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("bot never reached state {state}");
    }
}

/// Build a bodiless request.
pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// ============================================================================
// Body helpers
// ============================================================================

/// Collect a response body as a string.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Test Server
// ============================================================================

/// A real HTTP server bound to an ephemeral port.
pub struct TestServer {
    /// Server address (127.0.0.1:PORT).
    pub addr: SocketAddr,
    /// Base URL for HTTP requests (e.g., `http://127.0.0.1:12345`).
    pub url: String,
    /// Handle to the server task for cleanup.
    _handle: JoinHandle<()>,
}

/// Spawn a real HTTP server on a random port.
///
/// Use this instead of `oneshot` when a test needs connection info or a real
/// client (the access log and keep-alive pinger both do).
pub async fn spawn_test_server(router: Router) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let url = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Test server failed");
    });

    TestServer {
        addr,
        url,
        _handle: handle,
    }
}
