//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use teracore::download::relay;
use teracore::{extract_links, ConsumerId, LinkMatcher, Task};

/// What to do with an incoming text message.
#[derive(Debug, PartialEq, Eq)]
pub enum Triage {
    /// Nothing matched: reply with the "no valid links" notice
    NoLinks,
    /// Queue one task per link, in textual order
    Links(Vec<String>),
}

/// Sorts a message text into "no links" or the list of links to queue.
pub fn triage(matcher: &LinkMatcher, text: &str) -> Triage {
    let links = extract_links(matcher, text);
    if links.is_empty() {
        Triage::NoLinks
    } else {
        Triage::Links(links)
    }
}

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Commands are matched first; every other text message is scanned for links.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start | Command::Help => {
                        bot.send_message(msg.chat.id, relay::HELP_TEXT).await?;
                    }
                    Command::Status => {
                        let pending = deps.queue.len().await;
                        let draining = deps.queue.is_draining().await;
                        bot.send_message(msg.chat.id, relay::status_notice(pending, draining))
                            .await?;
                    }
                }
                Ok(())
            }
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                handle_text_message(&bot, &msg, &deps).await;
                Ok(())
            }
        })
}

async fn handle_text_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) {
    let Some(text) = msg.text() else {
        return;
    };

    let links = match triage(&deps.matcher, text) {
        Triage::NoLinks => {
            log::debug!("No links in message from chat {}", msg.chat.id);
            if let Err(e) = bot.send_message(msg.chat.id, relay::no_links_notice()).await {
                log::warn!("Failed to reply to chat {}: {}", msg.chat.id, e);
            }
            return;
        }
        Triage::Links(links) => links,
    };

    // The acknowledgement goes out before queueing; a failed send must not drop the links.
    if let Err(e) = bot.send_message(msg.chat.id, relay::queued_notice(links.len())).await {
        log::warn!("Failed to acknowledge {} link(s) in chat {}: {}", links.len(), msg.chat.id, e);
    }

    let consumer = ConsumerId(msg.chat.id.0);
    let count = links.len();
    let depth = deps
        .queue
        .enqueue_all(links.into_iter().map(|link| Task::new(consumer, link)))
        .await;
    log::info!("Queued {} link(s) from chat {} ({} pending)", count, msg.chat.id, depth);
}
