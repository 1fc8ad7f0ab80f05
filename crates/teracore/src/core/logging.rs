//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the pipeline configuration

use anyhow::Result;
use simplelog::*;
use std::fs::File;
use std::str::FromStr;

use crate::download::{PipelineSettings, SinkMode};

/// Parses a level name, falling back to `Info` for unknown values.
pub fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Info)
}

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `level` - Level name (error, warn, info, debug, trace)
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the log file or a logger was already set
pub fn init_logger(log_file_path: &str, level: &str) -> Result<()> {
    let level = parse_level(level);
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective pipeline configuration at application startup.
pub fn log_pipeline_configuration(settings: &PipelineSettings, link_hosts: &[String]) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Pipeline configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("  Link hosts:     {}", link_hosts.join(", "));
    log::info!(
        "  Max file size:  {} bytes ({:.2} MB)",
        settings.max_file_size,
        settings.max_file_size as f64 / (1024.0 * 1024.0)
    );
    log::info!("  Chunk size:     {} bytes", settings.chunk_size);
    log::info!("  Stage timeout:  {}s", settings.stage_timeout.as_secs());
    match &settings.sink_mode {
        SinkMode::Memory => log::info!("  Sink:           memory"),
        SinkMode::File { dir } => {
            if dir.is_dir() {
                log::info!("  Sink:           file ({})", dir.display());
            } else {
                log::error!("  Sink:           file ({}) - DIRECTORY NOT FOUND", dir.display());
                log::error!("  Transfers will fail until TEMP_FILES_DIR points to a writable directory");
            }
        }
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
