//! Interaction dispatcher
//!
//! Interprets `show`/`help` commands and the `more` follow-up, drives the
//! channel queue store and the listing source, and shapes every reply.
//! Transport-agnostic: replies go out through a [`ReplySink`].

mod command;
/// Reply texts and post formatting
pub mod views;

pub use command::{parse_command, Command, UsageError};

use crate::reddit::{FetchFailureKind, ListingSource};
use crate::store::{ChannelId, ChannelQueueStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use views::{post_title, subreddit_link, ReplyText, MORE_ACTION, MORE_LABEL};

/// Who triggered an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Stable platform user identifier
    pub id: String,
    /// Name used for attribution in rendered posts
    pub display_name: String,
}

impl Author {
    /// Create an author
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Inbound platform event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Text posted in a channel
    Message {
        /// Where it was posted
        channel: ChannelId,
        /// Who posted it
        author: Author,
        /// Raw text
        text: String,
    },
    /// Interactive control activated under a rendered post
    FollowUp {
        /// Channel of the post
        channel: ChannelId,
        /// Who pressed the control
        author: Author,
        /// Opaque action identifier of the control
        action: String,
    },
}

impl Event {
    /// Channel the event belongs to
    #[must_use]
    pub const fn channel(&self) -> &ChannelId {
        match self {
            Self::Message { channel, .. } | Self::FollowUp { channel, .. } => channel,
        }
    }

    /// Author of the event
    #[must_use]
    pub const fn author(&self) -> &Author {
        match self {
            Self::Message { author, .. } | Self::FollowUp { author, .. } => author,
        }
    }
}

/// Control attached to a rendered post that requests the next item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpControl {
    /// Button text
    pub label: String,
    /// Action identifier echoed back in [`Event::FollowUp`]
    pub action: String,
}

impl Default for FollowUpControl {
    fn default() -> Self {
        Self {
            label: MORE_LABEL.to_string(),
            action: MORE_ACTION.to_string(),
        }
    }
}

/// One image ready to be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPost {
    /// `r/<subreddit>`
    pub title: String,
    /// Subreddit page
    pub link: String,
    /// Direct image URL
    pub image_url: String,
    /// Display name of the user who asked for it
    pub attribution: String,
    /// Control for the next image
    pub follow_up: FollowUpControl,
}

/// Outbound reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain acknowledgement, hint or error text
    Text(String),
    /// Rich image post
    Post(RenderedPost),
}

/// Where the dispatcher sends its replies
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver a reply to `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejected the message.
    async fn send(&self, channel: &ChannelId, reply: Reply) -> anyhow::Result<()>;
}

/// What handling an event amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a command, or an unknown follow-up action
    Ignored,
    /// Authored by the bot itself
    SelfAuthored,
    /// Help text sent
    Help,
    /// Malformed `show`
    UsageError,
    /// Listing could not be retrieved or decoded
    FetchFailed(FetchFailureKind),
    /// Listing contained no accepted images; nothing was rebound
    EmptyResult,
    /// Follow-up before any successful `show`
    NoActiveSubreddit,
    /// Queue drained
    QueueExhausted,
    /// An image post was sent
    Rendered,
}

/// Command and follow-up core
pub struct Dispatcher<S> {
    source: S,
    store: Arc<ChannelQueueStore>,
    bot_id: Option<String>,
    prefix: String,
    texts: ReplyText,
}

impl<S: ListingSource> Dispatcher<S> {
    /// Create a dispatcher over a listing source and a shared store
    pub fn new(source: S, store: Arc<ChannelQueueStore>) -> Self {
        let prefix = crate::config::DEFAULT_COMMAND_PREFIX.to_string();
        Self {
            source,
            store,
            bot_id: None,
            texts: ReplyText::new(prefix.clone()),
            prefix,
        }
    }

    /// Ignore every event authored by `id`
    #[must_use]
    pub fn with_bot_id(mut self, id: impl Into<String>) -> Self {
        self.bot_id = Some(id.into());
        self
    }

    /// Use `prefix` in front of command names
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.texts = ReplyText::new(self.prefix.clone());
        self
    }

    /// Command prefix in use
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Shared queue store
    #[must_use]
    pub const fn store(&self) -> &Arc<ChannelQueueStore> {
        &self.store
    }

    /// Handle one inbound event, sending replies to `sink` in order.
    #[instrument(skip(self, event, sink), fields(channel = %event.channel(), author = %event.author().id))]
    pub async fn handle(&self, event: Event, sink: &dyn ReplySink) -> Outcome {
        if self.bot_id.as_deref() == Some(event.author().id.as_str()) {
            debug!("Ignoring self-authored event");
            return Outcome::SelfAuthored;
        }

        match event {
            Event::Message {
                channel,
                author,
                text,
            } => match parse_command(&text, &self.prefix) {
                None => Outcome::Ignored,
                Some(Err(e)) => {
                    info!(error = %e, "Malformed show command");
                    self.deliver(sink, &channel, Reply::Text(self.texts.usage()))
                        .await;
                    Outcome::UsageError
                }
                Some(Ok(Command::Help)) => {
                    self.deliver(sink, &channel, Reply::Text(self.texts.help()))
                        .await;
                    Outcome::Help
                }
                Some(Ok(Command::Show { subreddit })) => {
                    self.show(sink, &channel, &author, &subreddit).await
                }
            },
            Event::FollowUp {
                channel,
                author,
                action,
            } => {
                if action != MORE_ACTION {
                    debug!(action = %action, "Ignoring unknown follow-up action");
                    return Outcome::Ignored;
                }
                if self.store.active_subreddit(&channel).await.is_none() {
                    self.deliver(sink, &channel, Reply::Text(self.texts.choose_subreddit()))
                        .await;
                    return Outcome::NoActiveSubreddit;
                }
                self.render(sink, &channel, &author).await
            }
        }
    }

    async fn show(
        &self,
        sink: &dyn ReplySink,
        channel: &ChannelId,
        author: &Author,
        subreddit: &str,
    ) -> Outcome {
        info!(subreddit = %subreddit, "Fetching listing");
        self.deliver(sink, channel, Reply::Text(self.texts.please_wait()))
            .await;

        // No store lock is held across the request
        let urls = match self.source.fetch(subreddit).await {
            Ok(urls) => urls,
            Err(e) => {
                match e.kind() {
                    FetchFailureKind::ParseFailure => {
                        error!(subreddit = %subreddit, error = %e, "Listing could not be decoded");
                    }
                    FetchFailureKind::NetworkOrNotFound => {
                        warn!(subreddit = %subreddit, error = %e, "Listing fetch failed");
                    }
                }
                self.deliver(sink, channel, Reply::Text(e.user_hint().to_string()))
                    .await;
                return Outcome::FetchFailed(e.kind());
            }
        };

        if urls.is_empty() {
            info!(subreddit = %subreddit, "Listing had no accepted images");
            self.deliver(sink, channel, Reply::Text(self.texts.no_data()))
                .await;
            return Outcome::EmptyResult;
        }

        info!(subreddit = %subreddit, count = urls.len(), "Channel bound to subreddit");
        self.store.replace(channel, subreddit, urls).await;
        self.render(sink, channel, author).await
    }

    async fn render(&self, sink: &dyn ReplySink, channel: &ChannelId, author: &Author) -> Outcome {
        let Some((subreddit, image_url)) = self.store.pop_next(channel).await else {
            self.deliver(sink, channel, Reply::Text(self.texts.queue_empty()))
                .await;
            return Outcome::QueueExhausted;
        };

        let post = RenderedPost {
            title: post_title(&subreddit),
            link: subreddit_link(&subreddit),
            image_url,
            attribution: author.display_name.clone(),
            follow_up: FollowUpControl::default(),
        };
        self.deliver(sink, channel, Reply::Post(post)).await;
        Outcome::Rendered
    }

    async fn deliver(&self, sink: &dyn ReplySink, channel: &ChannelId, reply: Reply) {
        if let Err(e) = sink.send(channel, reply).await {
            warn!(channel = %channel, error = %e, "Failed to deliver reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::{FetchError, MockListingSource};
    use mockall::predicate::eq;
    use mockall::Sequence;

    const CHANNEL: &str = "chan-1";

    fn user() -> Author {
        Author::new("u1", "alice")
    }

    fn message(text: &str) -> Event {
        Event::Message {
            channel: ChannelId::from(CHANNEL),
            author: user(),
            text: text.to_string(),
        }
    }

    fn more() -> Event {
        Event::FollowUp {
            channel: ChannelId::from(CHANNEL),
            author: user(),
            action: MORE_ACTION.to_string(),
        }
    }

    fn accepting_sink() -> MockReplySink {
        let mut sink = MockReplySink::new();
        sink.expect_send().returning(|_, _| Ok(()));
        sink
    }

    fn source_returning(urls: &'static [&'static str]) -> MockListingSource {
        let mut source = MockListingSource::new();
        source
            .expect_fetch()
            .returning(move |_| Ok(urls.iter().map(ToString::to_string).collect()));
        source
    }

    #[tokio::test]
    async fn test_show_acknowledges_then_renders_first_image() {
        let mut source = MockListingSource::new();
        source
            .expect_fetch()
            .with(eq("aww"))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    "https://i.redd.it/a.jpg".to_string(),
                    "https://i.redd.it/b.jpg".to_string(),
                ])
            });

        let mut seq = Sequence::new();
        let mut sink = MockReplySink::new();
        sink.expect_send()
            .withf(|_, reply| matches!(reply, Reply::Text(t) if t.starts_with("Please wait")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        sink.expect_send()
            .withf(|channel, reply| {
                channel.as_str() == CHANNEL
                    && *reply
                        == Reply::Post(RenderedPost {
                            title: "r/aww".to_string(),
                            link: "https://www.reddit.com/r/aww".to_string(),
                            image_url: "https://i.redd.it/a.jpg".to_string(),
                            attribution: "alice".to_string(),
                            follow_up: FollowUpControl::default(),
                        })
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let store = Arc::new(ChannelQueueStore::new());
        let dispatcher = Dispatcher::new(source, Arc::clone(&store));

        let outcome = dispatcher.handle(message(".show aww"), &sink).await;
        assert_eq!(outcome, Outcome::Rendered);
        assert_eq!(
            store.snapshot(&ChannelId::from(CHANNEL)).await,
            Some(("aww".to_string(), vec!["https://i.redd.it/b.jpg".to_string()]))
        );
    }

    #[tokio::test]
    async fn test_usage_errors_do_not_fetch_or_mutate() {
        let mut source = MockListingSource::new();
        source.expect_fetch().never();
        let mut sink = MockReplySink::new();
        sink.expect_send()
            .withf(|_, reply| {
                *reply == Reply::Text("Please provide the command and subreddit name.".to_string())
            })
            .times(2)
            .returning(|_, _| Ok(()));

        let store = Arc::new(ChannelQueueStore::new());
        let dispatcher = Dispatcher::new(source, Arc::clone(&store));

        assert_eq!(
            dispatcher.handle(message(".show"), &sink).await,
            Outcome::UsageError
        );
        assert_eq!(
            dispatcher.handle(message(".show aww extra"), &sink).await,
            Outcome::UsageError
        );
        assert_eq!(store.snapshot(&ChannelId::from(CHANNEL)).await, None);
    }

    #[tokio::test]
    async fn test_help_and_plain_chatter() {
        let mut source = MockListingSource::new();
        source.expect_fetch().never();
        let mut sink = MockReplySink::new();
        sink.expect_send()
            .withf(|_, reply| matches!(reply, Reply::Text(t) if t.contains("`.show aww`")))
            .times(1)
            .returning(|_, _| Ok(()));

        let dispatcher = Dispatcher::new(source, Arc::new(ChannelQueueStore::new()));
        assert_eq!(dispatcher.handle(message(".help"), &sink).await, Outcome::Help);
        assert_eq!(
            dispatcher.handle(message("nice picture"), &sink).await,
            Outcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_glued_show_argument_is_a_usage_error() {
        let mut source = MockListingSource::new();
        source.expect_fetch().never();
        let mut sink = MockReplySink::new();
        sink.expect_send()
            .withf(|_, reply| {
                *reply == Reply::Text("Please provide the command and subreddit name.".to_string())
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let store = Arc::new(ChannelQueueStore::new());
        let dispatcher = Dispatcher::new(source, Arc::clone(&store));
        assert_eq!(
            dispatcher.handle(message(".showaww"), &sink).await,
            Outcome::UsageError
        );
        assert!(store.active_subreddit(&ChannelId::from(CHANNEL)).await.is_none());
    }

    #[tokio::test]
    async fn test_follow_up_without_binding_asks_for_show() {
        let mut source = MockListingSource::new();
        source.expect_fetch().never();
        let mut sink = MockReplySink::new();
        sink.expect_send()
            .withf(|_, reply| {
                *reply
                    == Reply::Text("Please choose a subreddit with the `.show` command.".to_string())
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let dispatcher = Dispatcher::new(source, Arc::new(ChannelQueueStore::new()));
        assert_eq!(
            dispatcher.handle(more(), &sink).await,
            Outcome::NoActiveSubreddit
        );
    }

    #[tokio::test]
    async fn test_follow_up_drains_queue_then_reports_exhaustion() {
        let dispatcher = Dispatcher::new(
            source_returning(&["https://i.redd.it/a.jpg"]),
            Arc::new(ChannelQueueStore::new()),
        );
        let sink = accepting_sink();

        assert_eq!(
            dispatcher.handle(message(".show aww"), &sink).await,
            Outcome::Rendered
        );
        assert_eq!(
            dispatcher.handle(more(), &sink).await,
            Outcome::QueueExhausted
        );
        // Binding persists, so further follow-ups keep reporting exhaustion
        assert_eq!(
            dispatcher.handle(more(), &sink).await,
            Outcome::QueueExhausted
        );
    }

    #[tokio::test]
    async fn test_empty_listing_keeps_previous_binding() {
        let store = Arc::new(ChannelQueueStore::new());
        let channel = ChannelId::from(CHANNEL);
        store
            .replace(&channel, "aww", vec!["https://i.redd.it/old.jpg".to_string()])
            .await;

        let mut sink = MockReplySink::new();
        sink.expect_send()
            .withf(|_, reply| matches!(reply, Reply::Text(t) if t.starts_with("Please wait")))
            .times(1)
            .returning(|_, _| Ok(()));
        sink.expect_send()
            .withf(|_, reply| matches!(reply, Reply::Text(t) if t.starts_with("No images found")))
            .times(1)
            .returning(|_, _| Ok(()));

        let dispatcher = Dispatcher::new(source_returning(&[]), Arc::clone(&store));
        assert_eq!(
            dispatcher.handle(message(".show textonly"), &sink).await,
            Outcome::EmptyResult
        );
        assert_eq!(
            store.snapshot(&channel).await,
            Some((
                "aww".to_string(),
                vec!["https://i.redd.it/old.jpg".to_string()]
            ))
        );
    }

    #[tokio::test]
    async fn test_fetch_errors_surface_hint_without_state_change() {
        let mut source = MockListingSource::new();
        source
            .expect_fetch()
            .with(eq("missing"))
            .returning(|_| Err(FetchError::NetworkOrNotFound("status 404".to_string())));
        source
            .expect_fetch()
            .with(eq("broken"))
            .returning(|_| Err(FetchError::ParseFailure("expected value".to_string())));

        let mut sink = MockReplySink::new();
        sink.expect_send()
            .withf(|_, reply| matches!(reply, Reply::Text(t) if t.starts_with("Please wait")))
            .times(2)
            .returning(|_, _| Ok(()));
        sink.expect_send()
            .withf(|_, reply| *reply == Reply::Text(crate::reddit::NETWORK_HINT.to_string()))
            .times(1)
            .returning(|_, _| Ok(()));
        sink.expect_send()
            .withf(|_, reply| *reply == Reply::Text(crate::reddit::PARSE_HINT.to_string()))
            .times(1)
            .returning(|_, _| Ok(()));

        let store = Arc::new(ChannelQueueStore::new());
        let dispatcher = Dispatcher::new(source, Arc::clone(&store));

        assert_eq!(
            dispatcher.handle(message(".show missing"), &sink).await,
            Outcome::FetchFailed(FetchFailureKind::NetworkOrNotFound)
        );
        assert_eq!(
            dispatcher.handle(message(".show broken"), &sink).await,
            Outcome::FetchFailed(FetchFailureKind::ParseFailure)
        );
        assert_eq!(store.active_subreddit(&ChannelId::from(CHANNEL)).await, None);
    }

    #[tokio::test]
    async fn test_self_authored_events_are_dropped() {
        let mut source = MockListingSource::new();
        source.expect_fetch().never();
        let mut sink = MockReplySink::new();
        sink.expect_send().never();

        let dispatcher =
            Dispatcher::new(source, Arc::new(ChannelQueueStore::new())).with_bot_id("u1");
        assert_eq!(
            dispatcher.handle(message(".show aww"), &sink).await,
            Outcome::SelfAuthored
        );
        assert_eq!(dispatcher.handle(more(), &sink).await, Outcome::SelfAuthored);
    }

    #[tokio::test]
    async fn test_unknown_follow_up_action_is_ignored() {
        let mut sink = MockReplySink::new();
        sink.expect_send().never();
        let dispatcher = Dispatcher::new(
            MockListingSource::new(),
            Arc::new(ChannelQueueStore::new()),
        );

        let event = Event::FollowUp {
            channel: ChannelId::from(CHANNEL),
            author: user(),
            action: "retry".to_string(),
        };
        assert_eq!(dispatcher.handle(event, &sink).await, Outcome::Ignored);
    }

    #[tokio::test]
    async fn test_send_failures_do_not_abort_handling() {
        let mut sink = MockReplySink::new();
        sink.expect_send()
            .returning(|_, _| Err(anyhow::anyhow!("chat not found")));

        let store = Arc::new(ChannelQueueStore::new());
        let dispatcher = Dispatcher::new(
            source_returning(&["https://i.redd.it/a.jpg", "https://i.redd.it/b.jpg"]),
            Arc::clone(&store),
        );

        assert_eq!(
            dispatcher.handle(message(".show aww"), &sink).await,
            Outcome::Rendered
        );
        assert_eq!(store.remaining(&ChannelId::from(CHANNEL)).await, 1);
    }

    #[tokio::test]
    async fn test_custom_prefix_is_used_in_replies() {
        let mut sink = MockReplySink::new();
        sink.expect_send()
            .withf(|_, reply| matches!(reply, Reply::Text(t) if t.contains("`/show aww`")))
            .times(1)
            .returning(|_, _| Ok(()));
        let dispatcher = Dispatcher::new(
            MockListingSource::new(),
            Arc::new(ChannelQueueStore::new()),
        )
        .with_prefix("/");

        assert_eq!(dispatcher.handle(message("/help"), &sink).await, Outcome::Help);
        assert_eq!(
            dispatcher.handle(message(".help"), &sink).await,
            Outcome::Ignored
        );
    }
}
