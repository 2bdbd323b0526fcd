//! Bot Supervision
//!
//! Runs the external Telegram bot in the background and tracks its lifecycle.
//!
//! The bot itself lives outside this crate. It is reached only through the
//! [`BotRunner`] trait:
//! - [`CommandBot`] runs the bot as a child process
//! - [`BotSupervisor`] starts, stops and restarts a runner and reports its state

mod command;
pub mod error;
pub mod supervisor;
mod types;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

// Re-exports
pub use command::CommandBot;
pub use error::BotError;
pub use supervisor::{BotSupervisor, RestartPolicy};
pub use types::{BotState, BotStatus};

/// Entry point of an external bot.
///
/// `run` drives the bot's main loop until it exits on its own or `shutdown`
/// is cancelled. After cancellation the runner releases its resources and
/// returns promptly.
pub trait BotRunner: Send + Sync + 'static {
    /// Label used in logs and on the status page.
    fn name(&self) -> &str;

    /// Run the bot until it exits or `shutdown` is cancelled.
    fn run(&self, shutdown: CancellationToken) -> BoxFuture<'static, Result<(), BotError>>;
}
