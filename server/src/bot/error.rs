//! Bot Supervision Errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors that can occur while controlling the bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Start requested while a run is active.
    #[error("Bot is already running")]
    AlreadyRunning,

    /// Stop requested without an active run.
    #[error("Bot is not running")]
    NotRunning,

    /// A stop is still in progress.
    #[error("Bot is stopping, try again shortly")]
    Busy,

    /// The bot process could not be spawned.
    #[error("Failed to spawn bot process: {0}")]
    Spawn(#[source] std::io::Error),

    /// The bot process exited with a failure status.
    #[error("Bot process exited with {}", exit_label(.code))]
    Exited {
        /// Exit code, absent when terminated by a signal.
        code: Option<i32>,
    },

    /// The configured command is empty.
    #[error("Bot command is empty")]
    InvalidCommand,
}

#[allow(clippy::ref_option)]
fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
}

impl BotError {
    /// Stable error code used in JSON bodies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRunning => "ALREADY_RUNNING",
            Self::NotRunning => "NOT_RUNNING",
            Self::Busy => "BUSY",
            Self::Spawn(_) => "SPAWN_FAILED",
            Self::Exited { .. } => "BOT_EXITED",
            Self::InvalidCommand => "INVALID_COMMAND",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::AlreadyRunning | Self::NotRunning | Self::Busy => StatusCode::CONFLICT,
            Self::Spawn(_) | Self::Exited { .. } | Self::InvalidCommand => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BotError {
    fn into_response(self) -> Response {
        use serde_json::json;

        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Bot control failed");
        }

        (
            status,
            Json(json!({ "error": self.code(), "message": self.to_string() })),
        )
            .into_response()
    }
}
