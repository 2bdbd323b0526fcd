//! Bot lifecycle supervisor.
//!
//! Every state transition happens under one write lock, so `/status` always
//! reads a consistent snapshot. Each start bumps a generation counter; a run
//! loop only touches shared state while its generation is current, which keeps
//! a slow, already-stopped loop from clobbering a newer run.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{BotError, BotRunner, BotState, BotStatus};
use crate::config::BotConfig;

/// When and how often a bot that exits on its own is restarted.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    /// Restart after an unexpected exit.
    pub enabled: bool,
    /// Restarts allowed inside `window`.
    pub max_restarts: u32,
    /// Sliding window for counting restarts.
    pub window: Duration,
    /// Delay between an exit and the restart.
    pub backoff: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_restarts: 5,
            window: Duration::from_secs(3600),
            backoff: Duration::from_secs(10),
        }
    }
}

impl RestartPolicy {
    /// Never restart.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Build the policy from the bot section of the server config.
    #[must_use]
    pub const fn from_config(config: &BotConfig) -> Self {
        Self {
            enabled: config.restart,
            max_restarts: config.max_restarts,
            window: Duration::from_secs(config.restart_window),
            backoff: Duration::from_secs(config.restart_backoff),
        }
    }
}

/// Handle to the active run loop.
struct ActiveRun {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Inner {
    state: BotState,
    generation: u64,
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    restarts: u32,
    restart_history: VecDeque<Instant>,
    last_exit: Option<String>,
    active: Option<ActiveRun>,
}

impl Inner {
    fn snapshot(&self, name: &str) -> BotStatus {
        let uptime_secs = if self.state.is_active() {
            self.started_at
                .map(|started| (Utc::now() - started).num_seconds().max(0))
        } else {
            None
        };

        BotStatus {
            name: name.to_string(),
            state: self.state,
            running: self.state.is_active(),
            started_at: self.started_at,
            stopped_at: self.stopped_at,
            uptime_secs,
            restarts: self.restarts,
            last_exit: self.last_exit.clone(),
        }
    }

    /// Record a restart if the policy still allows one inside its window.
    fn try_consume_restart(&mut self, policy: &RestartPolicy) -> bool {
        if !policy.enabled {
            return false;
        }

        let now = Instant::now();
        while let Some(oldest) = self.restart_history.front() {
            if now.duration_since(*oldest) >= policy.window {
                self.restart_history.pop_front();
            } else {
                break;
            }
        }

        if self.restart_history.len() >= policy.max_restarts as usize {
            return false;
        }

        self.restart_history.push_back(now);
        true
    }
}

/// Starts, stops and restarts the bot, and reports its state.
#[derive(Clone)]
pub struct BotSupervisor {
    runner: Arc<dyn BotRunner>,
    policy: RestartPolicy,
    stop_timeout: Duration,
    inner: Arc<RwLock<Inner>>,
}

impl BotSupervisor {
    /// Create a supervisor; the bot is not started.
    pub fn new(runner: Arc<dyn BotRunner>, policy: RestartPolicy, stop_timeout: Duration) -> Self {
        Self {
            runner,
            policy,
            stop_timeout,
            inner: Arc::new(RwLock::new(Inner {
                state: BotState::Stopped,
                generation: 0,
                started_at: None,
                stopped_at: None,
                restarts: 0,
                restart_history: VecDeque::new(),
                last_exit: None,
                active: None,
            })),
        }
    }

    /// Runner label.
    pub fn name(&self) -> &str {
        self.runner.name()
    }

    /// Start the bot in the background.
    pub async fn start(&self) -> Result<BotStatus, BotError> {
        let mut inner = self.inner.write().await;

        if inner.state.is_active() {
            return Err(BotError::AlreadyRunning);
        }
        if inner.state == BotState::Stopping {
            return Err(BotError::Busy);
        }

        inner.generation += 1;
        inner.state = BotState::Starting;
        inner.started_at = Some(Utc::now());
        inner.stopped_at = None;
        inner.restarts = 0;
        inner.restart_history.clear();
        inner.last_exit = None;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.runner),
            Arc::clone(&self.inner),
            self.policy.clone(),
            inner.generation,
            cancel.clone(),
        ));
        inner.active = Some(ActiveRun { cancel, task });

        info!(bot = %self.name(), generation = inner.generation, "Bot started");
        Ok(inner.snapshot(self.name()))
    }

    /// Stop the bot and wait for it to finish.
    pub async fn stop(&self) -> Result<BotStatus, BotError> {
        let (active, generation) = {
            let mut inner = self.inner.write().await;
            if !inner.state.is_active() {
                return Err(if inner.state == BotState::Stopping {
                    BotError::Busy
                } else {
                    BotError::NotRunning
                });
            }
            let Some(active) = inner.active.take() else {
                return Err(BotError::NotRunning);
            };
            inner.state = BotState::Stopping;
            active.cancel.cancel();
            (active, inner.generation)
        };

        info!(bot = %self.name(), generation, "Stopping bot");

        // Completes even if the caller's future is dropped mid-stop.
        let finisher = tokio::spawn(finish_stop(
            Arc::clone(&self.runner),
            Arc::clone(&self.inner),
            active.task,
            generation,
            self.stop_timeout,
        ));

        match finisher.await {
            Ok(status) => Ok(status),
            Err(e) => {
                error!(bot = %self.name(), error = %e, "Stop task failed");
                Ok(self.status().await)
            }
        }
    }

    /// Stop the bot if it is running; used on process shutdown.
    pub async fn shutdown(&self) {
        match self.stop().await {
            Ok(_) | Err(BotError::NotRunning) => {}
            Err(e) => warn!(bot = %self.name(), error = %e, "Bot shutdown incomplete"),
        }
    }

    /// Current status snapshot.
    pub async fn status(&self) -> BotStatus {
        self.inner.read().await.snapshot(self.name())
    }

    /// Whether a run is active.
    pub async fn is_running(&self) -> bool {
        self.inner.read().await.state.is_active()
    }
}

/// Wait for (or abort) the cancelled run loop, then record the stop.
async fn finish_stop(
    runner: Arc<dyn BotRunner>,
    inner: Arc<RwLock<Inner>>,
    mut task: JoinHandle<()>,
    generation: u64,
    stop_timeout: Duration,
) -> BotStatus {
    let name = runner.name();

    if tokio::time::timeout(stop_timeout, &mut task).await.is_err() {
        warn!(
            bot = %name,
            timeout_secs = stop_timeout.as_secs(),
            "Bot did not stop in time, aborting"
        );
        task.abort();
    }

    let mut guard = inner.write().await;
    if guard.generation == generation {
        guard.state = BotState::Stopped;
        guard.stopped_at = Some(Utc::now());
    }
    info!(bot = %name, "Bot stopped");
    guard.snapshot(name)
}

async fn run_loop(
    runner: Arc<dyn BotRunner>,
    inner: Arc<RwLock<Inner>>,
    policy: RestartPolicy,
    generation: u64,
    cancel: CancellationToken,
) {
    let name = runner.name().to_string();

    loop {
        {
            let mut guard = inner.write().await;
            if guard.generation != generation || cancel.is_cancelled() {
                return;
            }
            guard.state = BotState::Running;
        }

        let result = runner.run(cancel.clone()).await;
        if cancel.is_cancelled() {
            return;
        }

        let mut guard = inner.write().await;
        if guard.generation != generation || cancel.is_cancelled() {
            return;
        }

        let failed = result.is_err();
        match &result {
            Ok(()) => {
                warn!(bot = %name, "Bot exited on its own");
                guard.last_exit = Some("exited cleanly".to_string());
            }
            Err(e) => {
                error!(bot = %name, error = %e, "Bot crashed");
                guard.last_exit = Some(e.to_string());
            }
        }

        if !guard.try_consume_restart(&policy) {
            guard.state = if failed {
                BotState::Failed
            } else {
                BotState::Exited
            };
            guard.stopped_at = Some(Utc::now());
            guard.active = None;
            if policy.enabled {
                error!(
                    bot = %name,
                    max_restarts = policy.max_restarts,
                    window_secs = policy.window.as_secs(),
                    "Restart budget exhausted, giving up"
                );
            }
            return;
        }

        guard.state = BotState::Restarting;
        guard.restarts += 1;
        let attempt = guard.restarts;
        drop(guard);

        info!(
            bot = %name,
            attempt,
            backoff_secs = policy.backoff.as_secs(),
            "Restarting bot"
        );

        tokio::select! {
            () = tokio::time::sleep(policy.backoff) => {}
            () = cancel.cancelled() => return,
        }
    }
}
