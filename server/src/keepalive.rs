//! Self-ping task.
//!
//! Free-tier instances are put to sleep after a stretch without inbound
//! traffic. Requesting our own public `/health` URL on a timer counts as
//! traffic and keeps the bot process alive.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Timeout for a single ping.
const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Health URL for a public base URL.
pub fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url.trim_end_matches('/'))
}

/// Periodically requests `{base_url}/health`.
pub struct KeepAlive {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl KeepAlive {
    /// Create a pinger for `base_url`.
    pub fn new(base_url: &str, interval: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(PING_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: health_url(base_url),
            interval,
        })
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one ping. Returns whether the target answered with a success status.
    pub async fn ping(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(url = %self.url, status = resp.status().as_u16(), "Keep-alive ping ok");
                true
            }
            Ok(resp) => {
                warn!(url = %self.url, status = resp.status().as_u16(), "Keep-alive ping rejected");
                false
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "Keep-alive ping failed");
                false
            }
        }
    }

    /// Ping every interval until `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                url = %self.url,
                interval_secs = self.interval.as_secs(),
                "Keep-alive pinger started"
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; the server may not be reachable yet.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.ping().await;
                    }
                    () = shutdown.cancelled() => break,
                }
            }

            info!("Keep-alive pinger stopped");
        })
    }
}
