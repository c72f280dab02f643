use crate::bot::transport::{channel_for_chat, TelegramReplySink};
use crate::config::Settings;
use crate::dispatcher::{Author, Dispatcher, Event};
use crate::reddit::{ClientOptions, RedditClient};
use crate::store::ChannelQueueStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, User};
use tracing::{debug, info, warn};

/// Dispatcher wired to the HTTP listing client
pub type RelayDispatcher = Dispatcher<RedditClient>;

/// The bot's own Telegram account
#[derive(Debug, Clone)]
pub struct BotIdentity {
    /// Bot user id
    pub id: UserId,
    /// Bot username, without `@`
    pub username: String,
}

/// Run the Telegram transport until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listing client cannot be built or the bot token is rejected.
pub async fn run_bot(settings: Arc<Settings>) -> Result<()> {
    let options = ClientOptions::from(settings.as_ref());
    info!(
        base_url = %options.base_url,
        hosts = ?options.filter.hosts(),
        limit = options.limit,
        "Initializing listing client"
    );
    let client = RedditClient::new(options)?;

    let bot = Bot::new(settings.telegram_token.clone());
    let me = bot
        .get_me()
        .await
        .context("Failed to fetch bot identity; check TELEGRAM_TOKEN")?;
    let identity = Arc::new(BotIdentity {
        id: me.id,
        username: me.username().to_string(),
    });
    info!(bot = %identity.username, "Bot identity resolved");

    let dispatcher: Arc<RelayDispatcher> = Arc::new(
        Dispatcher::new(client, Arc::new(ChannelQueueStore::new()))
            .with_bot_id(identity.id.0.to_string())
            .with_prefix(settings.command_prefix.clone()),
    );
    let sink = Arc::new(TelegramReplySink::new(bot.clone()));
    let handler = setup_handler();

    info!("Bot is running...");

    teloxide::dispatching::Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher, sink, identity])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some())
                .endpoint(handle_message),
        )
}

async fn handle_message(
    msg: Message,
    dispatcher: Arc<RelayDispatcher>,
    sink: Arc<TelegramReplySink>,
    identity: Arc<BotIdentity>,
) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text() else {
        return respond(());
    };

    let event = Event::Message {
        channel: channel_for_chat(msg.chat.id),
        author: msg.from.as_ref().map_or_else(
            || Author::new(msg.chat.id.0.to_string(), "unknown"),
            author_from_user,
        ),
        text: normalize_command_text(text, &identity.username, dispatcher.prefix()),
    };

    let outcome = dispatcher.handle(event, sink.as_ref()).await;
    debug!(chat_id = msg.chat.id.0, ?outcome, "Message handled");
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    dispatcher: Arc<RelayDispatcher>,
    sink: Arc<TelegramReplySink>,
) -> Result<(), teloxide::RequestError> {
    // Stop the client's spinner before the (possibly slow) render
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let Some(action) = q.data.clone() else {
        return respond(());
    };
    let Some(chat_id) = q.message.as_ref().map(|msg| msg.chat().id) else {
        warn!("Callback query without originating message");
        return respond(());
    };

    let event = Event::FollowUp {
        channel: channel_for_chat(chat_id),
        author: author_from_user(&q.from),
        action,
    };

    let outcome = dispatcher.handle(event, sink.as_ref()).await;
    debug!(chat_id = chat_id.0, ?outcome, "Callback handled");
    respond(())
}

fn author_from_user(user: &User) -> Author {
    let display_name = user
        .username
        .clone()
        .unwrap_or_else(|| user.full_name());
    Author::new(user.id.0.to_string(), display_name)
}

/// Rewrite Telegram command conventions into dispatcher commands.
///
/// Strips a trailing `@botname` from the leading token, as Telegram appends it
/// to commands issued in groups, and maps `/start` to `<prefix>help`.
#[must_use]
pub fn normalize_command_text(text: &str, bot_username: &str, prefix: &str) -> String {
    let trimmed = text.trim_start();
    let (head, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));

    let suffix = format!("@{bot_username}");
    let command = match head.strip_suffix(suffix.as_str()) {
        Some(command) if !bot_username.is_empty() => command,
        _ => head,
    };

    if command == "/start" {
        return format!("{prefix}help");
    }
    if command.len() == head.len() {
        return text.to_string();
    }
    if rest.is_empty() {
        command.to_string()
    } else {
        format!("{command} {rest}")
    }
}
