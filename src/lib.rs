#![deny(missing_docs)]
//! Subreddit image relay.
//!
//! Platform-free core (listing fetcher, channel queue store, dispatcher)
//! plus the Telegram transport that feeds it.

/// Telegram transport
pub mod bot;
/// Configuration management.
pub mod config;
/// Command and follow-up handling.
pub mod dispatcher;
/// Tracing subscriber setup with secret redaction.
pub mod logging;
/// Listing fetcher and image-host filter.
pub mod reddit;
/// Per-channel queue store.
pub mod store;
