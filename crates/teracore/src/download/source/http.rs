//! HttpSource - streams a resolved CDN location over HTTP.
//!
//! - HEAD probe for the declared length (never reads the body)
//! - GET with chunked body streaming via `bytes_stream`
//! - Content-Disposition parsing for the file name

use crate::core::config;
use crate::download::error::TransferError;
use crate::download::source::{ByteSource, ProbeInfo, SourceBody};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_LENGTH};
use reqwest::Client;
use url::Url;

/// Byte source backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Builds a client with the configured user agent and connect timeout.
    ///
    /// No total request timeout is set: bodies can take minutes, and stalls
    /// are caught per read by the transfer stage.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config::network::USER_AGENT)
            .connect_timeout(config::network::connect_timeout())
            .build()?;
        Ok(Self { client })
    }
}

/// Parses `Content-Length` directly from the headers.
///
/// `Response::content_length` reports the body size hint, which is zero for
/// HEAD responses.
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Extracts a file name from `Content-Disposition`.
///
/// Handles both `filename="clip.mp4"` and `filename*=UTF-8''clip%20one.mp4`;
/// the extended form wins when both are present.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in value.split(';').map(str::trim) {
        if let Some(raw) = part.strip_prefix("filename*=") {
            let encoded = raw.rsplit("''").next().unwrap_or(raw).trim_matches('"');
            extended = urlencoding::decode(encoded).ok().map(|s| s.into_owned());
        } else if let Some(raw) = part.strip_prefix("filename=") {
            plain = Some(raw.trim_matches('"').to_string());
        }
    }

    extended.or(plain).filter(|name| !name.trim().is_empty())
}

/// File name for a response: Content-Disposition first, then the last URL path segment.
pub fn extract_filename(headers: &HeaderMap, url: &Url) -> Option<String> {
    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_disposition)
        .or_else(|| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(|s| urlencoding::decode(s).unwrap_or_else(|_| s.into()).to_string())
        })
}

fn request_error(err: reqwest::Error) -> TransferError {
    TransferError::Request(err.to_string())
}

#[async_trait]
impl ByteSource for HttpSource {
    async fn probe(&self, url: &Url) -> Result<ProbeInfo, TransferError> {
        log::debug!("HEAD {}", url);
        let response = self.client.head(url.as_str()).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status(status.as_u16()));
        }

        Ok(ProbeInfo {
            content_length: declared_length(response.headers()),
        })
    }

    async fn open(&self, url: &Url) -> Result<SourceBody, TransferError> {
        log::info!("📥 Streaming {}", url);
        let response = self.client.get(url.as_str()).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status(status.as_u16()));
        }

        let content_length = declared_length(response.headers()).or_else(|| response.content_length());
        let file_name = extract_filename(response.headers(), url);
        let stream = response.bytes_stream().map_err(std::io::Error::other);

        Ok(SourceBody {
            stream: Box::pin(stream),
            content_length,
            file_name,
        })
    }
}
