//! Bot lifecycle state and status snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle state of the supervised bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BotState {
    /// Never started, or stopped on request.
    Stopped,
    /// Start accepted, run loop not yet entered.
    Starting,
    /// Bot main loop is running.
    Running,
    /// Waiting out the backoff before a restart.
    Restarting,
    /// Stop requested, waiting for the bot to finish.
    Stopping,
    /// Bot exited cleanly on its own and was not restarted.
    Exited,
    /// Bot failed and the restart budget is exhausted (or restarts are off).
    Failed,
}

impl BotState {
    /// Whether a run is active (the bot is up or about to be).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::Restarting)
    }

    /// Lowercase label, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Restarting => "restarting",
            Self::Stopping => "stopping",
            Self::Exited => "exited",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for BotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the bot, as returned by `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    /// Runner label.
    pub name: String,
    /// Current lifecycle state.
    pub state: BotState,
    /// Shorthand for an active state.
    pub running: bool,
    /// When the current (or last) run was started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the last run ended.
    pub stopped_at: Option<DateTime<Utc>>,
    /// Seconds since `started_at`, only while running.
    pub uptime_secs: Option<i64>,
    /// Automatic restarts since the last manual start.
    pub restarts: u32,
    /// Description of the last unexpected exit.
    pub last_exit: Option<String>,
}
