//! Handler types and dependencies

use std::sync::Arc;

use teracore::{LinkMatcher, TaskQueue};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub queue: Arc<TaskQueue>,
    pub matcher: Arc<LinkMatcher>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(queue: Arc<TaskQueue>, matcher: LinkMatcher) -> Self {
        Self {
            queue,
            matcher: Arc::new(matcher),
        }
    }
}
