//! Operation queue.
//!
//! Thin scheduling layer over the tokio runtime. Enqueueing an operation
//! spawns it onto the runtime and hands back an [`OperationHandle`] so the
//! caller can observe or cancel it after submission.

use tracing::warn;

use crate::operation::{NetworkOperation, OperationHandle};

/// Schedules [`NetworkOperation`]s onto the async runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct OperationQueue;

impl OperationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Spawn the operation and return a handle to it.
    ///
    /// A lifecycle error out of the spawned operation (started from a
    /// terminal state) is logged rather than surfaced; the caller already
    /// observes terminal states through the handle.
    pub fn enqueue(&self, operation: NetworkOperation) -> OperationHandle {
        let handle = operation.handle();
        tokio::spawn(async move {
            if let Err(err) = operation.start().await {
                warn!(error = %err, "operation failed to start");
            }
        });
        handle
    }
}
