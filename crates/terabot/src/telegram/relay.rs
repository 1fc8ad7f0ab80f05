//! Telegram side of the relay: uploads payloads as documents and sends notices.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::InputFile;

use teracore::download::error::DeliveryError;
use teracore::download::transfer::{PayloadContent, TransferPayload};
use teracore::{ConsumerId, RelaySink};

/// Relay that talks to chats through the Bot API.
#[derive(Clone)]
pub struct TelegramRelay {
    bot: Bot,
}

impl TelegramRelay {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl RelaySink for TelegramRelay {
    async fn deliver(
        &self,
        consumer: ConsumerId,
        payload: &TransferPayload,
        reference: &str,
    ) -> Result<(), DeliveryError> {
        let input = match &payload.content {
            PayloadContent::Memory(bytes) => InputFile::memory(bytes.to_vec()),
            PayloadContent::File(file) => InputFile::file(file.path().to_path_buf()),
        }
        .file_name(payload.file_name.clone());

        log::info!(
            "📤 Uploading {} ({} bytes) to chat {}",
            payload.file_name,
            payload.size,
            consumer
        );
        self.bot
            .send_document(ChatId(consumer.0), input)
            .caption(reference.to_string())
            .await
            .map_err(|e| DeliveryError::Upload(e.to_string()))?;

        Ok(())
    }

    async fn notify(&self, consumer: ConsumerId, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(consumer.0), text.to_string())
            .await
            .map_err(|e| DeliveryError::Notice(e.to_string()))?;
        Ok(())
    }
}
