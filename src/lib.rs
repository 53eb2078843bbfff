use anyhow::{Context, Result};
use colored::*;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;

pub mod bot;
pub mod config;
pub mod format;
pub mod importer;
pub mod logger;
pub mod normalize;
pub mod registry;
pub mod store;
pub mod telegram;

use bot::Dispatcher;
use logger::Logger;
use registry::RegistryClient;
use telegram::{PollError, TelegramClient};

fn print_banner(config: &config::AppConfig) {
    println!("{}", "====================================".bright_cyan());
    println!("{}", "         BOT CNPJ ONLINE            ".bright_cyan().bold());
    println!("{}", "====================================".bright_cyan());
    println!("{} {}", "✓ Registry:".green(), config.registry_api_url.dimmed());
    println!("{} {}", "✓ Database:".green(), config.db_path.dimmed());
    if config.require_authorization {
        println!("{}", "✓ Authorization gate enabled.".green());
    }
    println!("{}\n", " Polling for commands — Ctrl-C to stop".dimmed());
}

/// Run the bot: load `.env`, read the token, open the store, then poll
/// Telegram until the process is killed.
///
/// A missing `TOKEN` or an unopenable database are the only fatal startup
/// errors; everything after the loop starts is logged and survived.
pub async fn run() -> Result<()> {
    // Load environment variables from .env
    dotenv().ok();

    let token = std::env::var("TOKEN")
        .context("TOKEN missing — set the bot token in the environment or a .env file")?;

    let config = config::AppConfig::load();
    let logger = Arc::new(Logger::new(&config.log_dir)?);
    let store = Store::open(&config.db_path).await?;
    let registry = RegistryClient::new(&config);
    let telegram = TelegramClient::new(&config, &token);
    let dispatcher = Dispatcher::new(&config, registry, store, logger.clone());

    print_banner(&config);
    let _ = logger.log("Bot started, polling for updates");

    let mut offset = 0i64;
    loop {
        match telegram.get_updates(offset).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    if let Some(message) = update.message {
                        dispatcher.handle_message(&telegram, &message).await;
                    }
                }
            }
            Err(PollError::Conflict) => {
                let _ = logger
                    .log_warning("another instance is polling this bot token (409), backing off");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Err(PollError::Other(e)) => {
                let _ = logger.log_error(&format!("poll failed: {e}"));
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
        }
    }
}

// Re-exports for library consumers: common useful types
pub use config::AppConfig;
pub use store::{CompanyStub, Store};
