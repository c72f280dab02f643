/// Update routing and the runtime entrypoint
pub mod runner;
/// Reply delivery to Telegram chats
pub mod transport;
/// Keyboards and captions
pub mod views;

pub use runner::{run_bot, BotIdentity, RelayDispatcher};
pub use transport::TelegramReplySink;
