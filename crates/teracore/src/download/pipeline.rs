//! Pipeline orchestrator.
//!
//! Drives one task through the stages:
//!   resolve → size check → transfer → relay → release storage
//!
//! Every stage failure short-circuits the rest and becomes exactly one
//! failure notice for the requester. Transient storage is released after the
//! relay whether or not the upload succeeded.

use crate::core::config;
use crate::core::error::AppResult;
use crate::core::metrics;
use crate::download::error::{PipelineError, ResolveError};
use crate::download::queue::{ConsumerId, Task, TaskProcessor};
use crate::download::relay::{self, RelaySink};
use crate::download::resolve::Resolver;
use crate::download::size_gate::SizeGate;
use crate::download::source::ByteSource;
use crate::download::transfer::{SinkMode, StreamTransfer};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Knobs fixed at startup and handed to the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Largest accepted body in bytes; equal passes
    pub max_file_size: u64,
    pub chunk_size: usize,
    /// Deadline for the size probe, opening the body, and each body read
    pub stage_timeout: Duration,
    /// Deadline for resolution
    pub resolve_timeout: Duration,
    pub sink_mode: SinkMode,
}

impl PipelineSettings {
    /// Settings from the environment (see `core::config`).
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            max_file_size: *config::transfer::MAX_FILE_SIZE,
            chunk_size: *config::transfer::CHUNK_SIZE,
            stage_timeout: config::transfer::stage_timeout(),
            resolve_timeout: config::resolver::timeout(),
            sink_mode: SinkMode::parse(&config::transfer::SINK_MODE, config::TEMP_FILES_DIR.as_str())?,
        })
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let stage_timeout = Duration::from_secs(config::transfer::DEFAULT_STAGE_TIMEOUT_SECS);
        Self {
            max_file_size: config::transfer::DEFAULT_MAX_FILE_SIZE,
            chunk_size: config::transfer::DEFAULT_CHUNK_SIZE,
            stage_timeout,
            resolve_timeout: stage_timeout,
            sink_mode: SinkMode::File {
                dir: PathBuf::from("/tmp"),
            },
        }
    }
}

/// Where a task is in its run. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStage {
    Pending,
    Resolving,
    SizeChecking,
    Transferring,
    Relaying,
    Done,
}

impl TaskStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStage::Pending => "pending",
            TaskStage::Resolving => "resolving",
            TaskStage::SizeChecking => "size_checking",
            TaskStage::Transferring => "transferring",
            TaskStage::Relaying => "relaying",
            TaskStage::Done => "done",
        }
    }
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-task stage tracker: logs transitions and records stage durations.
struct StageClock<'a> {
    task: &'a Task,
    stage: TaskStage,
    entered: Instant,
}

impl<'a> StageClock<'a> {
    fn start(task: &'a Task) -> Self {
        Self {
            task,
            stage: TaskStage::Pending,
            entered: Instant::now(),
        }
    }

    fn advance(&mut self, next: TaskStage) {
        if self.stage != TaskStage::Pending {
            metrics::observe_stage_duration(self.stage.as_str(), self.entered.elapsed().as_secs_f64());
        }
        log::debug!("Task {}: {} -> {}", self.task.id, self.stage, next);
        self.stage = next;
        self.entered = Instant::now();
    }
}

/// Runs tasks through resolve → size gate → transfer → relay.
pub struct Pipeline {
    resolver: Arc<dyn Resolver>,
    source: Arc<dyn ByteSource>,
    relay: Arc<dyn RelaySink>,
    size_gate: SizeGate,
    transfer: StreamTransfer,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        resolver: Arc<dyn Resolver>,
        source: Arc<dyn ByteSource>,
        relay: Arc<dyn RelaySink>,
    ) -> Self {
        let size_gate = SizeGate::new(settings.max_file_size, settings.stage_timeout);
        let transfer = StreamTransfer::new(
            settings.chunk_size,
            settings.stage_timeout,
            settings.max_file_size,
            settings.sink_mode.clone(),
        );
        Self {
            resolver,
            source,
            relay,
            size_gate,
            transfer,
            settings,
        }
    }

    /// Runs one task to completion and returns the number of bytes delivered.
    pub async fn run(&self, task: &Task) -> Result<u64, PipelineError> {
        let mut clock = StageClock::start(task);

        clock.advance(TaskStage::Resolving);
        self.notify_best_effort(task.consumer, &relay::resolving_notice(&task.reference))
            .await;
        let location = match tokio::time::timeout(
            self.settings.resolve_timeout,
            self.resolver.resolve(&task.reference),
        )
        .await
        {
            Ok(resolved) => resolved?,
            Err(_) => return Err(ResolveError::Timeout(self.settings.resolve_timeout.as_secs()).into()),
        };
        log::info!("Task {}: resolved via {} to {}", task.id, self.resolver.name(), location.url);

        clock.advance(TaskStage::SizeChecking);
        let size = self.size_gate.check_size(self.source.as_ref(), &location).await;
        self.size_gate.enforce(size)?;
        log::info!("Task {}: declared size {} (limit {})", task.id, size, self.size_gate.max());

        clock.advance(TaskStage::Transferring);
        self.notify_best_effort(task.consumer, &relay::transferring_notice(&task.reference, size))
            .await;
        let payload = self.transfer.transfer(self.source.as_ref(), &location).await?;

        clock.advance(TaskStage::Relaying);
        let delivered = self.relay.deliver(task.consumer, &payload, &task.reference).await;
        let bytes = payload.size;
        payload.release().await;
        delivered?;

        clock.advance(TaskStage::Done);
        Ok(bytes)
    }

    async fn notify_best_effort(&self, consumer: ConsumerId, text: &str) {
        if let Err(e) = self.relay.notify(consumer, text).await {
            log::warn!("Failed to send notice to {}: {}", consumer, e);
        }
    }
}

#[async_trait]
impl TaskProcessor for Pipeline {
    async fn process(&self, task: &Task) {
        let started = Instant::now();
        match self.run(task).await {
            Ok(bytes) => {
                metrics::record_task_outcome("success");
                log::info!(
                    "Task {} delivered {} bytes in {:.2}s: {}",
                    task.id,
                    bytes,
                    started.elapsed().as_secs_f64(),
                    task.reference
                );
            }
            Err(e) => {
                metrics::record_task_outcome(e.kind());
                log::warn!("Task {} failed ({}): {} [{}]", task.id, e.kind(), e, task.reference);
                self.notify_best_effort(task.consumer, &relay::failure_notice(&task.reference, &e))
                    .await;
            }
        }
    }

    async fn on_panic(&self, task: &Task) {
        self.notify_best_effort(task.consumer, &relay::internal_error_notice(&task.reference))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(TaskStage::SizeChecking.to_string(), "size_checking");
        assert_eq!(TaskStage::Done.as_str(), "done");
    }

    #[test]
    fn test_default_settings_match_config_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.max_file_size, 2 * 1024 * 1024 * 1024);
        assert_eq!(settings.chunk_size, 1024 * 1024);
        assert_eq!(settings.stage_timeout, Duration::from_secs(30));
    }
}
