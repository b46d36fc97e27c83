//! Skywatch - ADS-B watchlist alert bot
//!
//! Watches the readsb/tar1090 `aircraft.json` feed, matches aircraft against
//! curated remote watchlists, and pushes rate-limited Telegram notifications
//! while tracking per-aircraft daily visibility statistics.
//!
//! The interesting part lives in [`module::engine`]: the per-aircraft
//! session & cooldown state machine. Everything else is feed parsing,
//! watchlist caching and message delivery around it.

pub mod config;
pub mod logging;
pub mod module;
pub mod service;

/// Crate version, also reported in outbound HTTP User-Agent headers.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
