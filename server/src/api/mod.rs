//! API Router and Application State
//!
//! Central routing configuration and shared state.

mod handlers;
mod page;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{bot::BotSupervisor, config::Config, observability};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Lifecycle owner of the bot process
    pub bot: BotSupervisor,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(config: Config, bot: BotSupervisor) -> Self {
        Self {
            config: Arc::new(config),
            bot,
        }
    }
}

/// Create the main application router.
///
/// Routes:
/// - GET / - HTML status page
/// - GET /health - platform health check
/// - GET /status - JSON status
/// - POST /start - start the bot
/// - POST /stop - stop the bot
pub fn create_router(state: AppState) -> Router {
    let access_log = state.config.access_log;
    let timeout = state.config.request_timeout();
    let max_connections = state.config.worker_connections;

    let router = Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/start", post(handlers::start))
        .route("/stop", post(handlers::stop))
        // Middleware
        .layer(GlobalConcurrencyLimitLayer::new(max_connections));

    // WORKER_TIMEOUT=0 means no request timeout
    let router = match timeout {
        Some(timeout) => router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        )),
        None => router,
    };

    let router = router
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state);

    if access_log {
        router.layer(from_fn(observability::access_log))
    } else {
        router
    }
}
