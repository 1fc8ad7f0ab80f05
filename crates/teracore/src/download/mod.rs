//! Download management: queue, resolution, size gate, transfer and relay

pub mod error;
pub mod links;
pub mod pipeline;
pub mod queue;
pub mod relay;
pub mod resolve;
pub mod size_gate;
pub mod source;
pub mod transfer;

// Re-exports for convenience
pub use error::{DeliveryError, PipelineError, ResolveError, TransferError};
pub use links::{extract_links, LinkMatcher};
pub use pipeline::{Pipeline, PipelineSettings, TaskStage};
pub use queue::{ConsumerId, Task, TaskProcessor, TaskQueue};
pub use relay::RelaySink;
pub use resolve::{ResolvedLocation, Resolver, ResolverBackend};
pub use size_gate::SizeGate;
pub use source::{ByteSource, HttpSource};
pub use transfer::{SinkMode, StreamTransfer, TransferPayload};
