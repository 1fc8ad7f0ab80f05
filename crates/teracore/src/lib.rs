//! teracore - the resolve, size-gate, stream and relay pipeline behind terabot
//!
//! This library holds everything that does not talk to Telegram directly:
//! link extraction, the single-flight task queue, the resolver backends,
//! the size gate, the chunked transfer engine and the pipeline orchestrator.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, metrics and process helpers
//! - `download`: queue, resolvers, size gate, transfer, relay contract and the pipeline

pub mod core;
pub mod download;

// Re-export commonly used types for convenience
pub use core::{AppError, AppResult};
pub use download::{
    extract_links, ConsumerId, LinkMatcher, Pipeline, PipelineError, PipelineSettings, RelaySink, Resolver, Task,
    TaskQueue,
};
