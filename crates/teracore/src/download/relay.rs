//! Delivery of finished transfers and status notices to the requester.

use crate::core::utils::format_size;
use crate::download::error::{DeliveryError, PipelineError};
use crate::download::queue::ConsumerId;
use crate::download::transfer::TransferPayload;
use async_trait::async_trait;

/// Outbound side of the pipeline: the chat transport.
#[async_trait]
pub trait RelaySink: Send + Sync {
    /// Uploads a transferred file. Called at most once per task.
    async fn deliver(
        &self,
        consumer: ConsumerId,
        payload: &TransferPayload,
        reference: &str,
    ) -> Result<(), DeliveryError>;

    /// Sends a plain status message.
    async fn notify(&self, consumer: ConsumerId, text: &str) -> Result<(), DeliveryError>;
}

pub const HELP_TEXT: &str = "Send me one or more Terabox share links and I will fetch the videos and send them back as files.\n\n\
Links look like https://terabox.com/s/<id>. Several links in one message are processed in order.\n\n\
Commands:\n/start - show this message\n/help - show this message\n/status - show the queue";

pub fn queued_notice(count: usize) -> String {
    format!("Found {} link(s). Processing...", count)
}

pub fn no_links_notice() -> &'static str {
    "No valid links found."
}

pub fn resolving_notice(reference: &str) -> String {
    format!("🔎 Resolving {}", reference)
}

pub fn transferring_notice(reference: &str, size: u64) -> String {
    format!("⬇️ Downloading {} ({})", reference, format_size(size))
}

pub fn failure_notice(reference: &str, error: &PipelineError) -> String {
    format!("❌ Failed to process {}: {}", reference, error.reason())
}

pub fn internal_error_notice(reference: &str) -> String {
    format!("❌ Failed to process {}: internal error", reference)
}

pub fn status_notice(pending: usize, draining: bool) -> String {
    if draining {
        format!("⏳ Working. {} link(s) waiting after the current one.", pending)
    } else {
        "✅ Idle. Nothing in the queue.".to_string()
    }
}
