use crate::core::config;
use crate::download::error::ResolveError;
use crate::download::resolve::{extract_video_src, ResolvedLocation, Resolver};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Resolver that fetches the landing page over plain HTTP.
///
/// Works for pages that ship the `<video>` element in the initial HTML; pages
/// that inject it from scripts need [`super::HeadlessResolver`].
#[derive(Debug, Clone)]
pub struct PageResolver {
    client: Client,
    timeout: Duration,
}

impl PageResolver {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config::network::USER_AGENT)
            .connect_timeout(config::network::connect_timeout())
            .timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, err: reqwest::Error) -> ResolveError {
        if err.is_timeout() {
            ResolveError::Timeout(self.timeout.as_secs())
        } else {
            ResolveError::Fetch(err.to_string())
        }
    }
}

#[async_trait]
impl Resolver for PageResolver {
    fn name(&self) -> &str {
        "page"
    }

    async fn resolve(&self, reference: &str) -> Result<ResolvedLocation, ResolveError> {
        let landing = Url::parse(reference).map_err(|e| ResolveError::Fetch(format!("{}: {}", reference, e)))?;
        log::debug!("Fetching landing page {}", landing);

        let response = self
            .client
            .get(landing.as_str())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Fetch(format!("HTTP {} for {}", status, landing)));
        }

        // Relative sources resolve against the page after redirects.
        let base = response.url().clone();
        let html = response.text().await.map_err(|e| self.map_error(e))?;

        let url = extract_video_src(&html, &base)?;
        log::debug!("Resolved {} -> {}", reference, url);
        Ok(ResolvedLocation::new(url))
    }
}
