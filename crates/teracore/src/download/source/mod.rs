//! Byte sources: where the transfer stage reads a resolved location from.
//!
//! The pipeline only talks to the [`ByteSource`] trait so tests can swap the
//! network for an in-memory source.

pub mod http;

pub use http::HttpSource;

use crate::download::error::TransferError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;
use url::Url;

/// Body stream yielded by a source. Errors surface as `io::Error` so the
/// stream can be wrapped in a `StreamReader`.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Result of a metadata-only probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeInfo {
    /// Declared body length, if the server sent one
    pub content_length: Option<u64>,
}

/// An opened body ready to be streamed.
pub struct SourceBody {
    pub stream: ByteStream,
    pub content_length: Option<u64>,
    pub file_name: Option<String>,
}

impl std::fmt::Debug for SourceBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceBody")
            .field("content_length", &self.content_length)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

/// Something that can describe and stream a resolved location.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Metadata-only request (HEAD for HTTP). Never reads the body.
    async fn probe(&self, url: &Url) -> Result<ProbeInfo, TransferError>;

    /// Opens the body for streaming.
    async fn open(&self, url: &Url) -> Result<SourceBody, TransferError>;
}
