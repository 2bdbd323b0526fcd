//! Request Middleware Tests
//!
//! Covers the worker limits applied to every route: the request timeout and
//! the global concurrency limit, plus a stop that outlives its request.

mod helpers;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use helpers::{body_json, empty_request, FakeBehavior, TestApp};
use keepalive_server::bot::{BotState, RestartPolicy};
use keepalive_server::config::Config;
use tower::ServiceExt;

fn app_with(config: Config) -> TestApp {
    TestApp::with_config(config, FakeBehavior::Unresponsive, RestartPolicy::disabled())
}

#[tokio::test]
async fn test_slow_stop_times_out_but_completes() {
    let mut config = Config::default_for_test();
    config.worker_timeout = 1;
    config.bot.stop_timeout = 2;
    let app = app_with(config);

    let resp = app.request(Method::POST, "/start").await;
    assert_eq!(resp.status(), StatusCode::OK);
    app.wait_for_state(BotState::Running).await;

    // The bot ignores cancellation, so the stop outlasts the request timeout.
    let resp = app.request(Method::POST, "/stop").await;
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);

    app.wait_for_state(BotState::Stopped).await;
    let body = body_json(app.request(Method::GET, "/status").await).await;
    assert_eq!(body["state"], "stopped");
    assert!(body["stopped_at"].is_string());

    let resp = app.request(Method::POST, "/start").await;
    assert_eq!(resp.status(), StatusCode::OK);
    app.bot.shutdown().await;
}

#[tokio::test]
async fn test_zero_timeout_disables_request_timeout() {
    let mut config = Config::default_for_test();
    config.worker_timeout = 0;
    let app = app_with(config);

    let resp = app.request(Method::GET, "/health").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.request(Method::GET, "/status").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_concurrency_limit_queues_requests() {
    let mut config = Config::default_for_test();
    config.worker_connections = 1;
    config.bot.stop_timeout = 1;
    let app = app_with(config);

    app.request(Method::POST, "/start").await;
    app.wait_for_state(BotState::Running).await;

    // Holds the only slot until the stop timeout expires.
    let router = app.router.clone();
    let stop = tokio::spawn(async move {
        router
            .oneshot(empty_request(Method::POST, "/stop"))
            .await
            .unwrap()
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let queued =
        tokio::time::timeout(Duration::from_millis(300), app.request(Method::GET, "/health")).await;
    assert!(queued.is_err(), "request should wait for a free slot");

    let resp = stop.await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.request(Method::GET, "/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
}
