//! Resolution stage: share link -> direct streamable location.
//!
//! Backends render or fetch the landing page and hand the HTML to
//! [`extract_video_src`]; the pipeline only sees the [`Resolver`] trait.

pub mod headless;
pub mod page;

pub use headless::HeadlessResolver;
pub use page::PageResolver;

use crate::core::error::{AppError, AppResult};
use crate::download::error::ResolveError;
use async_trait::async_trait;
use select::document::Document;
use select::predicate::Name;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Direct location of the media behind a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub url: Url,
    /// Length already known at resolution time, if any
    pub content_length: Option<u64>,
}

impl ResolvedLocation {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            content_length: None,
        }
    }
}

/// Turns a share link into a direct location. One attempt, no retry.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    async fn resolve(&self, reference: &str) -> Result<ResolvedLocation, ResolveError>;
}

/// Takes the source of the first `<video>` element in `html`.
///
/// Uses the element's `src`, else its first `<source src>`. Relative values
/// are joined onto `base`. Only http(s) results are accepted, so `blob:` and
/// `data:` sources fail with [`ResolveError::InvalidSource`].
pub fn extract_video_src(html: &str, base: &Url) -> Result<Url, ResolveError> {
    let document = Document::from(html);
    let video = document.find(Name("video")).next().ok_or(ResolveError::MissingElement)?;

    let raw = video
        .attr("src")
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .or_else(|| {
            video
                .find(Name("source"))
                .filter_map(|source| source.attr("src"))
                .map(str::trim)
                .find(|src| !src.is_empty())
        })
        .ok_or(ResolveError::EmptySource)?;

    let url = base
        .join(raw)
        .map_err(|e| ResolveError::InvalidSource(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ResolveError::InvalidSource(raw.to_string())),
    }
}

/// Which resolver implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverBackend {
    /// Headless Chromium, renders scripts before reading the DOM
    Headless,
    /// Plain HTTP GET of the landing page
    Page,
}

impl FromStr for ResolverBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "headless" | "chrome" | "chromium" => Ok(ResolverBackend::Headless),
            "page" | "http" => Ok(ResolverBackend::Page),
            other => Err(AppError::Config(format!(
                "unknown RESOLVER_BACKEND '{}' (expected headless or page)",
                other
            ))),
        }
    }
}

/// Builds the configured resolver.
pub fn build_resolver(backend: ResolverBackend, chrome_bin: &str, timeout: Duration) -> AppResult<Arc<dyn Resolver>> {
    let resolver: Arc<dyn Resolver> = match backend {
        ResolverBackend::Headless => Arc::new(HeadlessResolver::new(chrome_bin, timeout)),
        ResolverBackend::Page => Arc::new(PageResolver::new(timeout)?),
    };
    log::info!("Using {} resolver (timeout {}s)", resolver.name(), timeout.as_secs());
    Ok(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base() -> Url {
        Url::parse("https://www.terabox.com/s/abc").unwrap()
    }

    #[test]
    fn test_extracts_video_src() {
        let html = r#"<html><body><video id="v" src="https://cdn.example.com/v.mp4?sign=1"></video></body></html>"#;
        let url = extract_video_src(html, &base()).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/v.mp4?sign=1");
    }

    #[test]
    fn test_falls_back_to_source_child() {
        let html = r#"<video controls><source src=""><source src="/media/clip.mp4" type="video/mp4"></video>"#;
        let url = extract_video_src(html, &base()).unwrap();
        assert_eq!(url.as_str(), "https://www.terabox.com/media/clip.mp4");
    }

    #[test]
    fn test_missing_video_element() {
        let err = extract_video_src("<html><p>nothing</p></html>", &base()).unwrap_err();
        assert!(matches!(err, ResolveError::MissingElement));
    }

    #[test]
    fn test_empty_source() {
        let err = extract_video_src(r#"<video src="  "></video>"#, &base()).unwrap_err();
        assert!(matches!(err, ResolveError::EmptySource));
    }

    #[test]
    fn test_blob_source_is_rejected() {
        let err = extract_video_src(r#"<video src="blob:https://www.terabox.com/1234"></video>"#, &base()).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidSource(_)));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("headless".parse::<ResolverBackend>().unwrap(), ResolverBackend::Headless);
        assert_eq!(" Page ".parse::<ResolverBackend>().unwrap(), ResolverBackend::Page);
        assert!("selenium".parse::<ResolverBackend>().is_err());
    }
}
