//! Process execution utilities with timeout support
//!
//! Provides helpers for running external processes (the headless browser)
//! with a fixed deadline so a hung renderer cannot block the queue.

use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Failure to run an external process to completion.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Spawning or waiting on the process failed
    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process did not finish before the deadline and was killed
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
}

/// Run an async Command with a timeout.
///
/// The child is spawned with `kill_on_drop`, so it is killed whenever the
/// output future is dropped: on timeout, on error, or if the caller itself
/// is dropped mid-await.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, ProcessError> {
    let program = cmd.as_std().get_program().to_string_lossy().to_string();
    cmd.kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(ProcessError::Io { program, source }),
        Err(_) => Err(ProcessError::TimedOut { program, timeout }),
    }
}
