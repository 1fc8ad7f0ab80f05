//! Headless Chromium resolver.
//!
//! Each call renders the landing page in a fresh browser process with its own
//! throwaway profile directory, dumps the DOM after scripts ran, and reads the
//! `<video>` source from it. The process is killed when the deadline passes
//! (`kill_on_drop`), and the profile directory is removed on every exit path.

use crate::core::config;
use crate::core::process::{run_with_timeout, ProcessError};
use crate::download::error::ResolveError;
use crate::download::resolve::{extract_video_src, ResolvedLocation, Resolver};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use url::Url;

/// Milliseconds of virtual time Chromium lets scripts run before dumping the DOM.
const VIRTUAL_TIME_BUDGET_MS: u64 = 10_000;

/// Removes the per-call browser profile when dropped.
struct ProfileDir {
    path: PathBuf,
}

impl ProfileDir {
    fn create(base: &Path) -> std::io::Result<Self> {
        let path = base.join(format!("terabot-chrome-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }
}

impl Drop for ProfileDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove browser profile {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Resolver driving a headless Chromium binary.
#[derive(Debug, Clone)]
pub struct HeadlessResolver {
    chrome_bin: String,
    timeout: Duration,
    profile_root: PathBuf,
}

impl HeadlessResolver {
    pub fn new(chrome_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            chrome_bin: chrome_bin.into(),
            timeout,
            profile_root: PathBuf::from(config::TEMP_FILES_DIR.as_str()),
        }
    }

    /// Overrides where throwaway profiles are created.
    pub fn with_profile_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profile_root = root.into();
        self
    }

    fn command(&self, url: &Url, profile: &Path) -> Command {
        let mut cmd = Command::new(&self.chrome_bin);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--mute-audio")
            .arg("--no-first-run")
            .arg(format!("--user-agent={}", config::network::USER_AGENT))
            .arg(format!("--virtual-time-budget={}", VIRTUAL_TIME_BUDGET_MS))
            .arg(format!("--user-data-dir={}", profile.display()))
            .arg("--dump-dom")
            .arg(url.as_str());
        cmd
    }
}

#[async_trait]
impl Resolver for HeadlessResolver {
    fn name(&self) -> &str {
        "headless"
    }

    async fn resolve(&self, reference: &str) -> Result<ResolvedLocation, ResolveError> {
        let landing = Url::parse(reference).map_err(|e| ResolveError::Fetch(format!("{}: {}", reference, e)))?;
        let profile = ProfileDir::create(&self.profile_root)
            .map_err(|e| ResolveError::Browser(format!("cannot create browser profile: {}", e)))?;

        log::debug!("Rendering {} with {}", landing, self.chrome_bin);
        let mut cmd = self.command(&landing, &profile.path);
        let output = run_with_timeout(&mut cmd, self.timeout).await.map_err(|e| match e {
            ProcessError::TimedOut { timeout, .. } => ResolveError::Timeout(timeout.as_secs()),
            ProcessError::Io { .. } => ResolveError::Browser(e.to_string()),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().last().unwrap_or("").trim();
            return Err(ResolveError::Browser(format!("{} exited with {}: {}", self.chrome_bin, output.status, last_line)));
        }

        let html = String::from_utf8_lossy(&output.stdout);
        let url = extract_video_src(&html, &landing)?;
        log::debug!("Resolved {} -> {}", reference, url);
        Ok(ResolvedLocation::new(url))
    }
}
