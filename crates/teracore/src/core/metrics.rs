//! Metrics collection using Prometheus
//!
//! Tracks the task pipeline only:
//! - Task outcomes by kind (success / resolution / oversize / transfer / delivery / panic)
//! - Pending queue depth
//! - Bytes streamed through the process
//! - Per-stage durations
//!
//! Metrics live in the default registry; exporting them is left to the embedding binary.
//! A failed registration (duplicate name) leaves the metric unset instead of panicking.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter, CounterVec, Gauge,
    HistogramVec,
};

/// Finished tasks by outcome
/// Labels: outcome (success/resolution/oversize/transfer/delivery/panic)
pub static TASKS_TOTAL: Lazy<Option<CounterVec>> =
    Lazy::new(|| register_counter_vec!("terabot_tasks_total", "Finished tasks by outcome", &["outcome"]).ok());

/// Pending tasks waiting for the worker
pub static QUEUE_DEPTH: Lazy<Option<Gauge>> =
    Lazy::new(|| register_gauge!("terabot_queue_depth", "Tasks waiting in the queue").ok());

/// Bytes streamed from upstream into transfer sinks
pub static BYTES_TRANSFERRED_TOTAL: Lazy<Option<Counter>> = Lazy::new(|| {
    register_counter!(
        "terabot_bytes_transferred_total",
        "Bytes streamed from upstream into transfer sinks"
    )
    .ok()
});

/// Stage duration in seconds
/// Labels: stage (resolving/size_checking/transferring/relaying)
pub static STAGE_DURATION_SECONDS: Lazy<Option<HistogramVec>> = Lazy::new(|| {
    register_histogram_vec!(
        "terabot_stage_duration_seconds",
        "Time spent in each pipeline stage",
        &["stage"],
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]
    )
    .ok()
});

/// Records a finished task.
pub fn record_task_outcome(outcome: &str) {
    if let Some(counter) = TASKS_TOTAL.as_ref() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Updates the queue depth gauge.
pub fn update_queue_depth(depth: usize) {
    if let Some(gauge) = QUEUE_DEPTH.as_ref() {
        gauge.set(depth as f64);
    }
}

/// Adds streamed bytes to the transfer counter.
pub fn record_bytes_transferred(bytes: u64) {
    if let Some(counter) = BYTES_TRANSFERRED_TOTAL.as_ref() {
        counter.inc_by(bytes as f64);
    }
}

/// Observes how long a stage took.
pub fn observe_stage_duration(stage: &str, seconds: f64) {
    if let Some(histogram) = STAGE_DURATION_SECONDS.as_ref() {
        histogram.with_label_values(&[stage]).observe(seconds);
    }
}
