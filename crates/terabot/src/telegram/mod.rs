//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;
pub mod relay;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands};
pub use handlers::{schema, HandlerDeps};
pub use relay::TelegramRelay;
