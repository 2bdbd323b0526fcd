//! Bot status and control handlers.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use super::{page, AppState};
use crate::bot::{BotError, BotStatus};

/// Response body for start/stop requests.
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    /// Always `true`; failures use the error body instead.
    pub ok: bool,
    /// Status after the transition.
    pub status: BotStatus,
}

/// Whether the request came from an HTML form rather than an API client.
fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

fn control_response(headers: &HeaderMap, status: BotStatus) -> Response {
    if wants_html(headers) {
        Redirect::to("/").into_response()
    } else {
        Json(ControlResponse { ok: true, status }).into_response()
    }
}

/// Status page.
pub async fn home(State(state): State<AppState>) -> Html<String> {
    Html(page::render(&state.bot.status().await))
}

/// Health check endpoint. Independent of the bot's state.
pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Current bot status as JSON.
pub async fn status(State(state): State<AppState>) -> Json<BotStatus> {
    Json(state.bot.status().await)
}

/// Start the bot.
#[tracing::instrument(skip(state, headers))]
pub async fn start(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, BotError> {
    let status = state.bot.start().await?;
    info!(bot = %status.name, "Bot started via HTTP");
    Ok(control_response(&headers, status))
}

/// Stop the bot.
#[tracing::instrument(skip(state, headers))]
pub async fn stop(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, BotError> {
    let status = state.bot.stop().await?;
    info!(bot = %status.name, "Bot stopped via HTTP");
    Ok(control_response(&headers, status))
}
