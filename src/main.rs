use dotenvy::dotenv;
use std::sync::Arc;
use subreddit_relay::bot::run_bot;
use subreddit_relay::config::Settings;
use subreddit_relay::logging::{init_logging, RedactionPatterns};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Compile redaction patterns before any log line can carry the token
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    init_logging(patterns);

    info!("Starting subreddit relay bot...");

    let settings = init_settings();

    if let Err(e) = run_bot(settings).await {
        error!("Bot stopped with error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}
