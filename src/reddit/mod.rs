//! Listing fetcher
//!
//! Pulls a subreddit listing, decodes it against a strict schema and keeps
//! only links to accepted direct-image hosts.

mod client;
mod listing;

pub use client::{ClientOptions, RedditClient};
pub use listing::{ImageHostFilter, Listing, ListingChild, ListingData, RawListingEntry};

use thiserror::Error;

/// Hint shown when the listing could not be retrieved
pub const NETWORK_HINT: &str = "Cannot access json data. Please check if the subreddit exists. If it does, please run the same command a few times till you get the data.";
/// Hint shown when the listing body had an unexpected shape
pub const PARSE_HINT: &str = "Cannot parse json data.";

/// Errors returned by a [`ListingSource`]
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream unreachable, timed out, or answered with a non-2xx status
    #[error("Listing unavailable: {0}")]
    NetworkOrNotFound(String),
    /// Response body did not match the listing schema
    #[error("Listing parse failure: {0}")]
    ParseFailure(String),
}

/// Kind of a [`FetchError`], without its diagnostic detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailureKind {
    /// See [`FetchError::NetworkOrNotFound`]
    NetworkOrNotFound,
    /// See [`FetchError::ParseFailure`]
    ParseFailure,
}

impl FetchError {
    /// Kind of failure
    #[must_use]
    pub const fn kind(&self) -> FetchFailureKind {
        match self {
            Self::NetworkOrNotFound(_) => FetchFailureKind::NetworkOrNotFound,
            Self::ParseFailure(_) => FetchFailureKind::ParseFailure,
        }
    }

    /// Message suitable for showing to the user who issued the command
    #[must_use]
    pub const fn user_hint(&self) -> &'static str {
        match self {
            Self::NetworkOrNotFound(_) => NETWORK_HINT,
            Self::ParseFailure(_) => PARSE_HINT,
        }
    }
}

/// Source of filtered image URLs for a subreddit
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the subreddit listing and return accepted image URLs in listing order.
    ///
    /// An empty vector is a valid result.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NetworkOrNotFound`] on transport or status failures
    /// and [`FetchError::ParseFailure`] when the body cannot be decoded.
    async fn fetch(&self, subreddit: &str) -> Result<Vec<String>, FetchError>;
}
