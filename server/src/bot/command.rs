//! Bot runner backed by an external program.

use std::path::PathBuf;
use std::process::Stdio;

use futures::future::BoxFuture;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{BotError, BotRunner};
use crate::config::BotConfig;

/// Runs the bot as a child process.
///
/// The child inherits this process's environment, so the bot token set on the
/// hosting platform reaches the bot unchanged.
#[derive(Debug, Clone)]
pub struct CommandBot {
    name: String,
    program: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
}

impl CommandBot {
    /// Create a runner for `command` (program followed by its arguments).
    pub fn new(name: impl Into<String>, command: &[String]) -> Result<Self, BotError> {
        let (program, args) = command.split_first().ok_or(BotError::InvalidCommand)?;
        Ok(Self {
            name: name.into(),
            program: program.clone(),
            args: args.to_vec(),
            workdir: None,
        })
    }

    /// Create a runner from the bot section of the server config.
    pub fn from_config(config: &BotConfig) -> Result<Self, BotError> {
        let bot = Self::new(config.name.clone(), &config.command)?;
        Ok(match &config.workdir {
            Some(dir) => bot.with_workdir(dir),
            None => bot,
        })
    }

    /// Run the program from `dir`.
    #[must_use]
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl BotRunner for CommandBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, shutdown: CancellationToken) -> BoxFuture<'static, Result<(), BotError>> {
        let mut cmd = self.command();
        let program = self.program.clone();

        Box::pin(async move {
            let mut child = cmd.spawn().map_err(BotError::Spawn)?;
            info!(program = %program, pid = child.id(), "Bot process started");

            let exited = tokio::select! {
                status = child.wait() => Some(status),
                () = shutdown.cancelled() => None,
            };

            match exited {
                Some(status) => {
                    let status = status.map_err(BotError::Spawn)?;
                    if status.success() {
                        info!(program = %program, "Bot process exited");
                        Ok(())
                    } else {
                        Err(BotError::Exited { code: status.code() })
                    }
                }
                None => {
                    if let Err(e) = child.kill().await {
                        warn!(program = %program, error = %e, "Failed to kill bot process");
                    }
                    info!(program = %program, "Bot process stopped");
                    Ok(())
                }
            }
        })
    }
}
