use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration read once from the environment at startup.
///
/// Nothing here is reloaded while the process runs; `.env` is loaded by the
/// binary before the first access.
fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|value| value.trim().parse::<u64>().ok())
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable.
/// Empty when unset; the bot refuses to start in that case.
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env_non_empty("BOT_TOKEN")
        .or_else(|| env_non_empty("TELOXIDE_TOKEN"))
        .unwrap_or_default()
});

/// Custom Bot API server URL (local telegram-bot-api lifts the 50 MB upload cap)
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| env_non_empty("BOT_API_URL"));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env_non_empty("LOG_FILE_PATH").unwrap_or_else(|| "app.log".to_string()));

/// Log level for both console and file output (error, warn, info, debug, trace)
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env_non_empty("LOG_LEVEL").unwrap_or_else(|| "info".to_string()));

/// Temporary directory for file-backed transfer sinks.
/// Supports tilde (~) expansion for home directory.
pub static TEMP_FILES_DIR: Lazy<String> = Lazy::new(|| {
    let raw = env_non_empty("TEMP_FILES_DIR").unwrap_or_else(|| "/tmp".to_string());
    shellexpand::tilde(&raw).to_string()
});

/// Hosts accepted in share links (comma-separated)
pub static LINK_HOSTS: Lazy<Vec<String>> = Lazy::new(|| {
    env_non_empty("LINK_HOSTS")
        .map(|raw| parse_host_list(&raw))
        .filter(|hosts| !hosts.is_empty())
        .unwrap_or_else(|| links::DEFAULT_HOSTS.iter().map(|h| h.to_string()).collect())
});

fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split([',', ' ', '\n', '\t'])
        .map(|part| part.trim().trim_start_matches("www.").to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Share link configuration
pub mod links {
    /// Hosts recognised when LINK_HOSTS is unset
    pub const DEFAULT_HOSTS: &[&str] = &["terabox.com", "1024terabox.com", "teraboxapp.com"];
}

/// Transfer limits and chunking
pub mod transfer {
    use super::{env_non_empty, env_u64, Duration, Lazy};

    /// Default ceiling: 2 GiB (the local Bot API upload limit)
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

    /// Default chunk size: 1 MiB
    pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

    /// Default per-stage deadline in seconds
    pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 30;

    /// Maximum accepted file size in bytes (MAX_FILE_SIZE_BYTES)
    pub static MAX_FILE_SIZE: Lazy<u64> =
        Lazy::new(|| env_u64("MAX_FILE_SIZE_BYTES").unwrap_or(DEFAULT_MAX_FILE_SIZE));

    /// Chunk size used when reading response bodies (CHUNK_SIZE_BYTES)
    pub static CHUNK_SIZE: Lazy<usize> = Lazy::new(|| {
        env_u64("CHUNK_SIZE_BYTES")
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_CHUNK_SIZE)
    });

    /// Per-stage deadline (STAGE_TIMEOUT_SECS)
    pub static STAGE_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
        env_u64("STAGE_TIMEOUT_SECS")
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_STAGE_TIMEOUT_SECS)
    });

    /// Sink mode: "file" (default) or "memory" (SINK_MODE)
    pub static SINK_MODE: Lazy<String> =
        Lazy::new(|| env_non_empty("SINK_MODE").unwrap_or_else(|| "file".to_string()).to_lowercase());

    /// Stage timeout duration
    pub fn stage_timeout() -> Duration {
        Duration::from_secs(*STAGE_TIMEOUT_SECS)
    }
}

/// Resolver configuration
pub mod resolver {
    use super::{env_non_empty, env_u64, Duration, Lazy};

    /// Resolver backend: "headless" (default) or "page" (RESOLVER_BACKEND)
    pub static BACKEND: Lazy<String> =
        Lazy::new(|| env_non_empty("RESOLVER_BACKEND").unwrap_or_else(|| "headless".to_string()).to_lowercase());

    /// Chromium binary used by the headless backend (CHROME_BIN)
    pub static CHROME_BIN: Lazy<String> =
        Lazy::new(|| env_non_empty("CHROME_BIN").unwrap_or_else(|| "chromium".to_string()));

    /// Landing page fetch deadline (RESOLVE_TIMEOUT_SECS), defaults to the stage timeout
    pub static TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
        env_u64("RESOLVE_TIMEOUT_SECS")
            .filter(|v| *v > 0)
            .unwrap_or(*super::transfer::STAGE_TIMEOUT_SECS)
    });

    /// Resolver timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(*TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram API calls (in seconds)
    /// Large uploads through a local Bot API server take minutes.
    pub const REQUEST_TIMEOUT_SECS: u64 = 900;

    /// Connect timeout for outgoing HTTP connections (in seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;

    /// User agent sent to share-link hosts and CDNs
    pub const USER_AGENT: &str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    /// Connect timeout duration
    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }
}
