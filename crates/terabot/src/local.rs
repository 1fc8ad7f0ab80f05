//! Relay used by the `fetch` subcommand: saves payloads to a directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use teracore::download::error::DeliveryError;
use teracore::download::transfer::{PayloadContent, TransferPayload};
use teracore::{ConsumerId, RelaySink};

pub struct LocalRelay {
    output_dir: PathBuf,
    saved: Mutex<Vec<PathBuf>>,
}

impl LocalRelay {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Files written so far.
    pub async fn saved(&self) -> Vec<PathBuf> {
        self.saved.lock().await.clone()
    }

    async fn write(&self, payload: &TransferPayload, dest: &Path) -> std::io::Result<()> {
        match &payload.content {
            PayloadContent::Memory(bytes) => tokio::fs::write(dest, bytes).await,
            PayloadContent::File(file) => tokio::fs::copy(file.path(), dest).await.map(|_| ()),
        }
    }
}

#[async_trait]
impl RelaySink for LocalRelay {
    async fn deliver(
        &self,
        _consumer: ConsumerId,
        payload: &TransferPayload,
        reference: &str,
    ) -> Result<(), DeliveryError> {
        let dest = self.output_dir.join(&payload.file_name);
        self.write(payload, &dest)
            .await
            .map_err(|e| DeliveryError::Upload(format!("{}: {}", dest.display(), e)))?;

        log::info!("Saved {} ({} bytes) from {}", dest.display(), payload.size, reference);
        self.saved.lock().await.push(dest);
        Ok(())
    }

    async fn notify(&self, _consumer: ConsumerId, text: &str) -> Result<(), DeliveryError> {
        log::info!("{}", text);
        Ok(())
    }
}
