//! Channel queue store
//!
//! Process-wide mapping from channel to its active subreddit and the queue of
//! image URLs still to be shown. Transport-agnostic: the channel identifier is
//! an opaque string.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use tokio::sync::RwLock;
use tracing::debug;

/// Opaque messaging-platform destination identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(String);

impl ChannelId {
    /// Wrap a platform channel identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ChannelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Subreddit binding and pending URLs of one channel.
///
/// Kept in a single entry so the label and the queue always change together.
#[derive(Debug, Clone, Default)]
struct ChannelEntry {
    subreddit: String,
    queue: VecDeque<String>,
}

/// Shared store of per-channel queues.
///
/// Every operation takes the lock exactly once, so concurrent callers never
/// observe a half-applied `replace` and never pop the same URL twice.
#[derive(Debug, Default)]
pub struct ChannelQueueStore {
    channels: RwLock<HashMap<ChannelId, ChannelEntry>>,
}

impl ChannelQueueStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `subreddit` to `channel` and replace its queue with `urls`
    pub async fn replace(&self, channel: &ChannelId, subreddit: &str, urls: Vec<String>) {
        let count = urls.len();
        let mut channels = self.channels.write().await;
        channels.insert(
            channel.clone(),
            ChannelEntry {
                subreddit: subreddit.to_string(),
                queue: urls.into(),
            },
        );
        debug!(channel = %channel, subreddit = %subreddit, count, "Channel queue replaced");
    }

    /// Remove and return the next URL; `None` for an empty or unknown channel
    pub async fn pop_front(&self, channel: &ChannelId) -> Option<String> {
        self.pop_next(channel).await.map(|(_, url)| url)
    }

    /// Remove the next URL together with the subreddit it was fetched from
    pub async fn pop_next(&self, channel: &ChannelId) -> Option<(String, String)> {
        let mut channels = self.channels.write().await;
        let entry = channels.get_mut(channel)?;
        let url = entry.queue.pop_front()?;
        Some((entry.subreddit.clone(), url))
    }

    /// Subreddit currently bound to `channel`
    pub async fn active_subreddit(&self, channel: &ChannelId) -> Option<String> {
        let channels = self.channels.read().await;
        channels.get(channel).map(|entry| entry.subreddit.clone())
    }

    /// Whether the channel has nothing left to show
    pub async fn is_empty(&self, channel: &ChannelId) -> bool {
        self.remaining(channel).await == 0
    }

    /// Number of URLs still queued for `channel`
    pub async fn remaining(&self, channel: &ChannelId) -> usize {
        let channels = self.channels.read().await;
        channels.get(channel).map_or(0, |entry| entry.queue.len())
    }

    /// Consistent copy of the binding and the queue of `channel`
    pub async fn snapshot(&self, channel: &ChannelId) -> Option<(String, Vec<String>)> {
        let channels = self.channels.read().await;
        channels.get(channel).map(|entry| {
            (
                entry.subreddit.clone(),
                entry.queue.iter().cloned().collect(),
            )
        })
    }
}
