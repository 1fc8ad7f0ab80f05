//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fakes;

#[allow(unused_imports)]
pub use fakes::{Delivery, MemorySource, RecordingRelay, ScriptedResolver};

use std::path::Path;
use std::time::Duration;
use teracore::download::SinkMode;
use teracore::PipelineSettings;

/// Settings with short deadlines and a small chunk size.
#[allow(dead_code)]
pub fn test_settings(max_file_size: u64, sink_mode: SinkMode) -> PipelineSettings {
    PipelineSettings {
        max_file_size,
        chunk_size: 64,
        stage_timeout: Duration::from_millis(500),
        resolve_timeout: Duration::from_millis(500),
        sink_mode,
    }
}

/// File sink rooted at `dir`.
#[allow(dead_code)]
pub fn file_sink(dir: &Path) -> SinkMode {
    SinkMode::File { dir: dir.to_path_buf() }
}

/// Number of entries left in `dir`.
#[allow(dead_code)]
pub fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
