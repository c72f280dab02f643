use crate::bot::views::{follow_up_keyboard, is_animation, post_caption, post_fallback_text};
use crate::dispatcher::{RenderedPost, Reply, ReplySink};
use crate::store::ChannelId;
use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, ParseMode};
use tracing::warn;

/// Delivers dispatcher replies to Telegram chats.
///
/// Channel identifiers are Telegram chat ids rendered as decimal strings.
#[derive(Clone)]
pub struct TelegramReplySink {
    bot: Bot,
}

impl TelegramReplySink {
    /// Create a sink sending through `bot`
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Channel identifier for a Telegram chat
#[must_use]
pub fn channel_for_chat(chat_id: ChatId) -> ChannelId {
    ChannelId::new(chat_id.0.to_string())
}

/// Telegram chat behind a channel identifier.
///
/// # Errors
///
/// Returns an error if the identifier is not a chat id.
pub fn chat_for_channel(channel: &ChannelId) -> Result<ChatId> {
    let id = channel
        .as_str()
        .parse::<i64>()
        .with_context(|| format!("Channel {channel} is not a Telegram chat id"))?;
    Ok(ChatId(id))
}

#[async_trait]
impl ReplySink for TelegramReplySink {
    async fn send(&self, channel: &ChannelId, reply: Reply) -> Result<()> {
        let chat_id = chat_for_channel(channel)?;
        match reply {
            Reply::Text(text) => {
                self.bot.send_message(chat_id, text).await?;
            }
            Reply::Post(post) => send_post(&self.bot, chat_id, &post).await?,
        }
        Ok(())
    }
}

/// Send a rendered post as native media, falling back to a text message
/// carrying the link when Telegram refuses the URL.
async fn send_post(bot: &Bot, chat_id: ChatId, post: &RenderedPost) -> Result<()> {
    let url = reqwest::Url::parse(&post.image_url)
        .with_context(|| format!("Invalid image URL: {}", post.image_url))?;
    let caption = post_caption(post);
    let keyboard = follow_up_keyboard(&post.follow_up);

    let media_result = if is_animation(&post.image_url) {
        bot.send_animation(chat_id, InputFile::url(url))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await
    } else {
        bot.send_photo(chat_id, InputFile::url(url))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await
    };

    if let Err(e) = media_result {
        warn!(
            image_url = %post.image_url,
            error = %e,
            "Failed to send image as native media; falling back to link"
        );
        bot.send_message(chat_id, post_fallback_text(post))
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await?;
    }

    Ok(())
}
