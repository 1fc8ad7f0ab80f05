use crate::core::utils::format_size;
use thiserror::Error;

/// Failure of the resolution stage.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Landing page (or browser) did not answer before the deadline
    #[error("landing page timed out after {0}s")]
    Timeout(u64),

    /// Landing page could not be retrieved
    #[error("landing page could not be fetched: {0}")]
    Fetch(String),

    /// Headless browser failed to render the page
    #[error("browser failed: {0}")]
    Browser(String),

    /// The page has no video element
    #[error("no video element on the page")]
    MissingElement,

    /// The video element carries no usable source
    #[error("video element has no source")]
    EmptySource,

    /// The source attribute is not a streamable http(s) URL
    #[error("video source is not streamable: {0}")]
    InvalidSource(String),
}

/// Failure while probing or streaming the resolved location.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Request could not be sent or the connection failed before the body
    #[error("request failed: {0}")]
    Request(String),

    /// Upstream answered with a non-success status
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// No bytes arrived within the read deadline
    #[error("stream stalled for {0}s")]
    Timeout(u64),

    /// Connection dropped or another read error mid-stream
    #[error("connection dropped: {0}")]
    Stream(String),

    /// Writing to the transient file failed
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// More than `max` bytes were announced or read.
    ///
    /// `size` is the announced length; it is `None` when the body ran past
    /// `max` without one, since reading stops there.
    #[error("body exceeded {max} bytes")]
    LimitExceeded { size: Option<u64>, max: u64 },
}

/// Failure of the relay stage.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The chat transport rejected or failed the upload
    #[error("upload failed: {0}")]
    Upload(String),

    /// A status notice could not be sent
    #[error("notice failed: {0}")]
    Notice(String),
}

/// Per-task pipeline failure, tagged by the stage that produced it.
///
/// Every variant is non-fatal: the orchestrator turns it into one notice and
/// the worker moves on.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not resolve the link: {0}")]
    Resolution(#[from] ResolveError),

    #[error("{}", oversize_message(*size, *max))]
    Oversize { size: Option<u64>, max: u64 },

    #[error("transfer failed: {0}")]
    Transfer(TransferError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl From<TransferError> for PipelineError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::LimitExceeded { size, max } => PipelineError::Oversize { size, max },
            other => PipelineError::Transfer(other),
        }
    }
}

impl PipelineError {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Resolution(_) => "resolution",
            PipelineError::Oversize { .. } => "oversize",
            PipelineError::Transfer(_) => "transfer",
            PipelineError::Delivery(_) => "delivery",
        }
    }

    /// Short reason shown to the user
    pub fn reason(&self) -> String {
        match self {
            PipelineError::Resolution(ResolveError::Timeout(_)) => "the link page took too long to load".to_string(),
            PipelineError::Resolution(_) => "no downloadable video found behind this link".to_string(),
            PipelineError::Oversize { size, max } => oversize_message(*size, *max),
            PipelineError::Transfer(TransferError::Timeout(_)) => "download stalled".to_string(),
            PipelineError::Transfer(_) => "download failed".to_string(),
            PipelineError::Delivery(_) => "could not upload the file".to_string(),
        }
    }
}

fn oversize_message(size: Option<u64>, max: u64) -> String {
    match size {
        Some(size) => format!("file is too large ({}, limit {})", format_size(size), format_size(max)),
        None => format!("file is over the {} limit", format_size(max)),
    }
}
