//! Streaming transfer stage.
//!
//! Reads the body of a resolved location in fixed-size chunks into either an
//! in-memory buffer or a transient file. Any read error, stall or overrun
//! fails the whole transfer; the partial buffer is dropped and a transient
//! file is deleted by its guard.

use crate::core::error::{AppError, AppResult};
use crate::core::metrics;
use crate::core::utils::escape_filename;
use crate::download::error::TransferError;
use crate::download::resolve::ResolvedLocation;
use crate::download::source::ByteSource;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

/// File name used when neither the headers nor the URL provide one.
pub const DEFAULT_FILE_NAME: &str = "video.mp4";

/// Where transferred bytes are accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkMode {
    /// Whole body kept in memory
    Memory,
    /// Body written to a transient file under `dir`
    File { dir: PathBuf },
}

impl SinkMode {
    /// Parses `SINK_MODE` ("file" or "memory"); `dir` is used for the file sink.
    pub fn parse(mode: &str, dir: impl Into<PathBuf>) -> AppResult<Self> {
        match mode.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(SinkMode::Memory),
            "file" | "disk" => Ok(SinkMode::File { dir: dir.into() }),
            other => Err(AppError::Config(format!(
                "unknown SINK_MODE '{}' (expected file or memory)",
                other
            ))),
        }
    }
}

/// A file on disk that is removed when the guard goes away.
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
    armed: bool,
}

impl TransientFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file now.
    pub async fn release(mut self) {
        self.armed = false;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => log::debug!("Removed transient file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove transient file {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove transient file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Transferred content, ready for relay.
#[derive(Debug)]
pub enum PayloadContent {
    Memory(Bytes),
    File(TransientFile),
}

/// Result of a successful transfer. Owned by the pipeline until released.
#[derive(Debug)]
pub struct TransferPayload {
    pub file_name: String,
    pub size: u64,
    pub content: PayloadContent,
}

impl TransferPayload {
    /// Path of the transient file, for the file sink.
    pub fn path(&self) -> Option<&Path> {
        match &self.content {
            PayloadContent::File(file) => Some(file.path()),
            PayloadContent::Memory(_) => None,
        }
    }

    /// Frees the transient storage.
    pub async fn release(self) {
        match self.content {
            PayloadContent::File(file) => file.release().await,
            PayloadContent::Memory(_) => {}
        }
    }
}

/// Accumulator owned by one transfer.
enum TransferBuffer {
    Memory(Vec<u8>),
    File {
        file: tokio::fs::File,
        guard: TransientFile,
    },
}

impl TransferBuffer {
    /// The on-disk name never carries the upstream file name, which is only
    /// used as the display name of the upload.
    async fn create(mode: &SinkMode) -> std::io::Result<Self> {
        match mode {
            SinkMode::Memory => Ok(TransferBuffer::Memory(Vec::new())),
            SinkMode::File { dir } => {
                let path = dir.join(format!("{}.part", uuid::Uuid::new_v4()));
                let guard = TransientFile::new(path);
                let file = tokio::fs::File::create(guard.path()).await?;
                Ok(TransferBuffer::File { file, guard })
            }
        }
    }

    async fn append(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        match self {
            TransferBuffer::Memory(buf) => {
                buf.extend_from_slice(chunk);
                Ok(())
            }
            TransferBuffer::File { file, .. } => file.write_all(chunk).await,
        }
    }

    async fn finish(self) -> std::io::Result<PayloadContent> {
        match self {
            TransferBuffer::Memory(buf) => Ok(PayloadContent::Memory(Bytes::from(buf))),
            TransferBuffer::File { mut file, guard } => {
                file.flush().await?;
                file.sync_all().await?;
                drop(file);
                Ok(PayloadContent::File(guard))
            }
        }
    }
}

/// Chunked body reader with a byte ceiling and a stall deadline.
#[derive(Debug, Clone)]
pub struct StreamTransfer {
    chunk_size: usize,
    read_timeout: Duration,
    max_bytes: u64,
    sink_mode: SinkMode,
}

impl StreamTransfer {
    pub fn new(chunk_size: usize, read_timeout: Duration, max_bytes: u64, sink_mode: SinkMode) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            read_timeout,
            max_bytes,
            sink_mode,
        }
    }

    /// Streams `location` into a fresh sink.
    ///
    /// Fails with `LimitExceeded` as soon as the declared or read size goes
    /// above the ceiling, without reading further.
    pub async fn transfer(
        &self,
        source: &dyn ByteSource,
        location: &ResolvedLocation,
    ) -> Result<TransferPayload, TransferError> {
        let body = tokio::time::timeout(self.read_timeout, source.open(&location.url))
            .await
            .map_err(|_| TransferError::Timeout(self.read_timeout.as_secs()))??;

        if let Some(declared) = body.content_length {
            if declared > self.max_bytes {
                return Err(TransferError::LimitExceeded {
                    size: Some(declared),
                    max: self.max_bytes,
                });
            }
        }

        let file_name = body
            .file_name
            .as_deref()
            .map(escape_filename)
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

        let mut sink = TransferBuffer::create(&self.sink_mode).await?;
        let mut reader = StreamReader::new(body.stream);
        let mut chunk = vec![0u8; self.chunk_size];
        let mut total: u64 = 0;

        loop {
            let filled = self.fill_chunk(&mut reader, &mut chunk).await?;
            if filled == 0 {
                break;
            }
            total += filled as u64;
            if total > self.max_bytes {
                log::warn!("Body of {} exceeded {} bytes, aborting", location.url, self.max_bytes);
                return Err(TransferError::LimitExceeded {
                    size: None,
                    max: self.max_bytes,
                });
            }
            sink.append(&chunk[..filled]).await?;
        }

        let content = sink.finish().await?;
        metrics::record_bytes_transferred(total);
        log::info!("Transferred {} bytes from {} as {}", total, location.url, file_name);

        Ok(TransferPayload {
            file_name,
            size: total,
            content,
        })
    }

    /// Reads until `buf` is full or the body ends. Each read has its own deadline.
    async fn fill_chunk<R>(&self, reader: &mut R, buf: &mut [u8]) -> Result<usize, TransferError>
    where
        R: AsyncRead + Unpin,
    {
        let mut filled = 0;
        while filled < buf.len() {
            let n = tokio::time::timeout(self.read_timeout, reader.read(&mut buf[filled..]))
                .await
                .map_err(|_| TransferError::Timeout(self.read_timeout.as_secs()))?
                .map_err(|e| TransferError::Stream(e.to_string()))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}
