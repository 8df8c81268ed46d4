//! Cancellable operation lifecycle.
//!
//! An operation is a unit of asynchronous, cancellable work with an
//! observable state. The state is a single tagged enum rather than
//! independent flags; observers register a callback and receive exactly
//! one `(from, to)` event per successful transition.
//!
//! Transition table:
//!
//! | From              | Event      | To        |
//! |-------------------|------------|-----------|
//! | Ready             | `start`    | Executing |
//! | Executing         | `finish`   | Finished  |
//! | Ready / Executing | `cancel`   | Cancelled |
//!
//! Finished and Cancelled are absorbing. `start` while Executing is a
//! no-op; `start` from a terminal state is a reported error. `cancel` is
//! always accepted and is a no-op once the operation is terminal, so the
//! completion path and the cancelled path can never both fire.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::auth::TokenStore;
use crate::client::BackendClient;
use crate::config::BackendConfig;
use crate::error::{NetError, NetResult};
use crate::request::RequestDescriptor;

/// Lifecycle state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Constructed, not yet started.
    Ready,
    /// The underlying call is in flight.
    Executing,
    /// Completed through its own completion path.
    Finished,
    /// Cancelled before completion; sticky.
    Cancelled,
}

impl OperationState {
    /// Whether this state accepts no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready"),
            Self::Executing => write!(f, "Executing"),
            Self::Finished => write!(f, "Finished"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

type Observer = Box<dyn Fn(OperationState, OperationState) + Send + Sync>;

/// Observable state machine driving one operation.
///
/// Shared between the operation itself and any [`OperationHandle`]s; all
/// transitions happen under one lock so exactly one of the completion and
/// cancellation paths wins.
pub struct OperationLifecycle {
    state: Mutex<OperationState>,
    observers: Mutex<Vec<Observer>>,
}

impl Default for OperationLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self { state: Mutex::new(OperationState::Ready), observers: Mutex::new(Vec::new()) }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> OperationState {
        *self.state.lock()
    }

    /// Register an observer invoked once per transition with `(from, to)`,
    /// after the state has been swapped, in registration order.
    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(OperationState, OperationState) + Send + Sync + 'static,
    {
        self.observers.lock().push(Box::new(observer));
    }

    /// Apply the `start` event.
    ///
    /// Returns `Ok(true)` when the operation moved to Executing and the
    /// caller should issue its request, `Ok(false)` when already
    /// Executing (no-op).
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidTransition`] from a terminal state.
    pub fn start(&self) -> NetResult<bool> {
        let from = {
            let mut state = self.state.lock();
            match *state {
                OperationState::Ready => {
                    let from = *state;
                    *state = OperationState::Executing;
                    from
                }
                OperationState::Executing => return Ok(false),
                terminal => {
                    return Err(NetError::InvalidTransition { from: terminal, event: "start" })
                }
            }
        };
        self.notify(from, OperationState::Executing);
        Ok(true)
    }

    /// Apply the `finish` event (completion path only).
    ///
    /// Returns `false` without changing state unless currently Executing;
    /// in particular a cancelled operation stays Cancelled.
    pub fn finish(&self) -> bool {
        let from = {
            let mut state = self.state.lock();
            if *state != OperationState::Executing {
                return false;
            }
            let from = *state;
            *state = OperationState::Finished;
            from
        };
        self.notify(from, OperationState::Finished);
        true
    }

    /// Apply the `cancel` event.
    ///
    /// Always accepted; returns `true` when the state actually moved to
    /// Cancelled and `false` when the operation was already terminal.
    pub fn cancel(&self) -> bool {
        let from = {
            let mut state = self.state.lock();
            if state.is_terminal() {
                return false;
            }
            let from = *state;
            *state = OperationState::Cancelled;
            from
        };
        self.notify(from, OperationState::Cancelled);
        true
    }

    fn notify(&self, from: OperationState, to: OperationState) {
        debug!(%from, %to, "operation transition");
        for observer in self.observers.lock().iter() {
            observer(from, to);
        }
    }
}

/// Completion callback for a successful call.
pub type SuccessCallback = Box<dyn FnOnce(Option<Value>) + Send>;
/// Completion callback for a failed call.
pub type FailureCallback = Box<dyn FnOnce(NetError) + Send>;

/// One cancellable backend call bound to an [`OperationLifecycle`].
///
/// The operation creates its own [`BackendClient`] (and therefore its own
/// transport). Callbacks are set once by the creator before the operation
/// is enqueued; `start` consumes the operation, so the underlying call
/// runs at most once.
pub struct NetworkOperation {
    client: BackendClient,
    descriptor: RequestDescriptor,
    lifecycle: Arc<OperationLifecycle>,
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl NetworkOperation {
    /// Create an operation for one request.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Config`] if the client cannot be built.
    pub fn new(
        config: Arc<BackendConfig>,
        tokens: Arc<dyn TokenStore>,
        descriptor: RequestDescriptor,
    ) -> NetResult<Self> {
        Ok(Self {
            client: BackendClient::new(config, tokens)?,
            descriptor,
            lifecycle: Arc::new(OperationLifecycle::new()),
            on_success: None,
            on_failure: None,
        })
    }

    /// Set the success callback. Last write before enqueue wins.
    #[must_use]
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Option<Value>) + Send + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Set the failure callback. Last write before enqueue wins.
    #[must_use]
    pub fn on_failure<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(NetError) + Send + 'static,
    {
        self.on_failure = Some(Box::new(callback));
        self
    }

    /// Handle for observing and cancelling this operation from outside.
    #[must_use]
    pub fn handle(&self) -> OperationHandle {
        OperationHandle {
            lifecycle: Arc::clone(&self.lifecycle),
            client: self.client.clone(),
        }
    }

    /// Run the operation: transition to Executing, issue the call, then
    /// transition to Finished and fire exactly one callback.
    ///
    /// If the operation is cancelled while the call is in flight, the
    /// completion path is suppressed and no callback fires.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidTransition`] when started from a
    /// terminal state (e.g. cancelled before start).
    pub async fn start(mut self) -> NetResult<()> {
        if !self.lifecycle.start()? {
            return Ok(());
        }

        let result = self.client.call(&self.descriptor).await;

        // The cancelled path owns terminal delivery once it wins; the
        // completion path must not fire callbacks after that.
        if !self.lifecycle.finish() {
            debug!(endpoint = self.descriptor.endpoint(), "operation cancelled before completion");
            return Ok(());
        }

        match result {
            Ok(value) => {
                if let Some(callback) = self.on_success.take() {
                    callback(value);
                }
            }
            Err(err) => {
                if let Some(callback) = self.on_failure.take() {
                    callback(err);
                }
            }
        }

        Ok(())
    }
}

/// Clonable view of a running operation: state, observers, cancel.
#[derive(Clone)]
pub struct OperationHandle {
    lifecycle: Arc<OperationLifecycle>,
    client: BackendClient,
}

impl OperationHandle {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> OperationState {
        self.lifecycle.state()
    }

    /// Register a transition observer.
    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(OperationState, OperationState) + Send + Sync + 'static,
    {
        self.lifecycle.observe(observer);
    }

    /// Cancel the operation and any in-flight transport call.
    ///
    /// Accepted in every state; once the operation is Finished this is a
    /// no-op and the state stays Finished.
    pub fn cancel(&self) {
        if self.lifecycle.cancel() {
            self.client.cancel();
        }
    }
}
