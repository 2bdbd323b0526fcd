//! Keepalive Server
//!
//! Keeps a Telegram bot alive on free-tier hosting: runs the bot in the
//! background and exposes HTTP endpoints that report and control its state.

pub mod api;
pub mod bot;
pub mod config;
pub mod keepalive;
pub mod observability;
