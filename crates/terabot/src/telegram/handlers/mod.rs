//! Telegram bot handler tree configuration
//!
//! The dispatcher schema lives here so the binary and tests share one tree.

mod schema;
mod types;

pub use schema::schema;
pub use types::HandlerDeps;
