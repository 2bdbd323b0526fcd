//! Observability
//!
//! Structured logging via `tracing` and the per-request access log.
//!
//! ```rust,no_run
//! # use keepalive_server::{config::Config, observability};
//! let config = Config::default_for_test();
//! // In main(), before any logging:
//! observability::init(&config);
//! ```

pub mod access_log;
mod logging;

pub use access_log::access_log;
pub use logging::{default_filter, init};
