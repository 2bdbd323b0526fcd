//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:5000")
    pub bind_address: String,

    /// Runtime worker threads (default: 1, enough for a free-tier instance)
    pub workers: usize,

    /// Maximum number of in-flight requests (default: 1000)
    pub worker_connections: usize,

    /// Request timeout in seconds (default: 30, 0 disables the timeout)
    pub worker_timeout: u64,

    /// Emit one access log event per request
    pub access_log: bool,

    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,

    /// Emit JSON logs (`LOG_FORMAT=json`) instead of plain text
    pub log_json: bool,

    /// Bot process settings
    pub bot: BotConfig,

    /// Public base URL pinged to keep the instance awake (optional)
    pub keepalive_url: Option<String>,

    /// Seconds between keep-alive pings (default: 600 = 10 min)
    pub keepalive_interval: u64,
}

/// Settings for the supervised bot process.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Program followed by its arguments
    pub command: Vec<String>,

    /// Label shown on the status page
    pub name: String,

    /// Working directory for the bot process (optional)
    pub workdir: Option<String>,

    /// Start the bot together with the server
    pub autostart: bool,

    /// Seconds to wait for the bot to stop before aborting it
    pub stop_timeout: u64,

    /// Restart the bot after it exits on its own
    pub restart: bool,

    /// Restarts allowed inside one window
    pub max_restarts: u32,

    /// Restart window in seconds (default: 3600 = 1 hour)
    pub restart_window: u64,

    /// Seconds between an exit and the restart
    pub restart_backoff: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let bind_address = non_empty("BIND_ADDRESS").unwrap_or_else(|| {
            non_empty("PORT").map_or_else(|| "0.0.0.0:5000".into(), |port| format!("0.0.0.0:{port}"))
        });

        let log_format = non_empty("LOG_FORMAT").unwrap_or_else(|| "json".into());

        Ok(Self {
            bind_address,
            workers: env_parse("WORKERS", 1usize).max(1),
            worker_connections: env_parse("WORKER_CONNECTIONS", 1000usize).max(1),
            worker_timeout: env_parse("WORKER_TIMEOUT", 30),
            access_log: env_flag("ACCESS_LOG", true),
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: !log_format.eq_ignore_ascii_case("text"),
            bot: BotConfig::from_env()?,
            keepalive_url: non_empty("KEEPALIVE_URL").or_else(|| non_empty("RENDER_EXTERNAL_URL")),
            keepalive_interval: env_parse("KEEPALIVE_INTERVAL", 600).max(1),
        })
    }

    /// Request timeout, `None` when `WORKER_TIMEOUT=0`.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        if self.worker_timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(self.worker_timeout))
        }
    }

    /// Create a default configuration for testing.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:0".into(),
            workers: 1,
            worker_connections: 1000,
            worker_timeout: 30,
            access_log: false,
            log_level: "debug".into(),
            log_json: false,
            bot: BotConfig {
                command: vec!["sleep".into(), "3600".into()],
                name: "test-bot".into(),
                workdir: None,
                autostart: false,
                stop_timeout: 2,
                restart: false,
                max_restarts: 5,
                restart_window: 3600,
                restart_backoff: 0,
            },
            keepalive_url: None,
            keepalive_interval: 600,
        }
    }
}

impl BotConfig {
    /// Load bot settings from environment variables.
    pub fn from_env() -> Result<Self> {
        let raw = env::var("BOT_COMMAND").context("BOT_COMMAND must be set")?;
        let command = parse_command(&raw);
        if command.is_empty() {
            bail!("BOT_COMMAND must not be empty");
        }

        Ok(Self {
            command,
            name: non_empty("BOT_NAME").unwrap_or_else(|| "telegram-bot".into()),
            workdir: non_empty("BOT_WORKDIR"),
            autostart: env_flag("BOT_AUTOSTART", true),
            stop_timeout: env_parse("BOT_STOP_TIMEOUT", 10),
            restart: env_flag("BOT_RESTART", true),
            max_restarts: env_parse("BOT_MAX_RESTARTS", 5),
            restart_window: env_parse("BOT_RESTART_WINDOW", 3600),
            restart_backoff: env_parse("BOT_RESTART_BACKOFF", 10),
        })
    }
}

/// Split a command line on whitespace. Quoting is not supported.
pub fn parse_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}
