use crate::download::error::PipelineError;
use crate::download::resolve::ResolvedLocation;
use crate::download::source::ByteSource;
use std::time::Duration;

/// Admission check on the declared size of a resolved location.
///
/// `check_size` reports `0` when the length is unknown; `enforce` lets that
/// through and the transfer stage bounds the body as it streams.
#[derive(Debug, Clone, Copy)]
pub struct SizeGate {
    max: u64,
    timeout: Duration,
}

impl SizeGate {
    pub fn new(max: u64, timeout: Duration) -> Self {
        Self { max, timeout }
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// Declared length of `location`, or `0` if unknown.
    ///
    /// Uses the length carried by the location when present, otherwise a
    /// metadata-only probe. A failed or slow probe counts as unknown.
    pub async fn check_size(&self, source: &dyn ByteSource, location: &ResolvedLocation) -> u64 {
        if let Some(length) = location.content_length {
            return length;
        }

        match tokio::time::timeout(self.timeout, source.probe(&location.url)).await {
            Ok(Ok(info)) => info.content_length.unwrap_or(0),
            Ok(Err(e)) => {
                log::warn!("Size probe failed for {}: {}, treating size as unknown", location.url, e);
                0
            }
            Err(_) => {
                log::warn!(
                    "Size probe for {} timed out after {}s, treating size as unknown",
                    location.url,
                    self.timeout.as_secs()
                );
                0
            }
        }
    }

    /// Fails with `Oversize` when `size` is above the ceiling. `size == max` passes.
    pub fn enforce(&self, size: u64) -> Result<(), PipelineError> {
        if size > self.max {
            return Err(PipelineError::Oversize {
                size: Some(size),
                max: self.max,
            });
        }
        Ok(())
    }
}
