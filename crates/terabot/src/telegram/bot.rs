//! Bot initialization
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use teracore::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "how to use the bot")]
    Start,
    #[command(description = "how to use the bot")]
    Help,
    #[command(description = "show the download queue")]
    Status,
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to create bot (invalid URL, client build failure)
pub fn create_bot() -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(config::BOT_TOKEN.as_str(), client);

    // A local Bot API server lifts the 50 MB upload cap
    let bot = match config::BOT_API_URL.as_deref() {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_descriptions() {
        let command_list = format!("{}", Command::descriptions());
        assert!(command_list.contains("Available commands"));
        assert!(command_list.contains("start"));
        assert!(command_list.contains("status"));
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/status", "terabot").unwrap(), Command::Status);
        assert_eq!(Command::parse("/help", "terabot").unwrap(), Command::Help);
        assert!(Command::parse("/unknown", "terabot").is_err());
    }
}
