//! A resource guarded by a gate, with calls buffered until it is ready.
//!
//! [`GatedClient`] pairs a [`GateController`] with a [`DeferredQueue`]. Calls
//! made before the resource is bound wait in submission order; once
//! [`GatedClient::open_with`] binds the resource they are drained, and later
//! calls run directly. The queue lock is held across the gate transition and
//! the drain, so a call issued after the gate opens always runs after every
//! call issued before it.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::gate::GateController;
use crate::health::QueueReporter;
use crate::queue::{DeferredQueue, DrainReport, PendingOperation, Submission};

/// Gated access to a lazily initialised resource `R`.
pub struct GatedClient<R> {
    enabled: bool,
    gate: GateController,
    queue: Mutex<DeferredQueue<R>>,
}

impl<R> GatedClient<R>
where
    R: Clone + Send + 'static,
{
    /// Builds a client holding at most `capacity` calls before the resource
    /// is bound.
    ///
    /// A disabled client discards every call without queuing or running it.
    #[must_use]
    pub fn new(enabled: bool, capacity: usize, reporter: Arc<dyn QueueReporter>) -> Self {
        let gate = GateController::new();
        let queue = DeferredQueue::new(gate.clone(), capacity, reporter);
        Self {
            enabled,
            gate,
            queue: Mutex::new(queue),
        }
    }

    /// Submits `operation` against the resource.
    ///
    /// Nothing is returned to the caller: failures, drops and deferrals are
    /// visible only through the queue reporter.
    pub async fn invoke(&self, operation: PendingOperation<R>) {
        if !self.enabled {
            return;
        }

        let mut queue = self.queue.lock().await;
        match queue.submit(operation).await {
            Submission::Executed(_) | Submission::Deferred | Submission::Dropped => {}
        }
    }

    /// Opens the gate, binds `resource` and drains the queued calls in order.
    ///
    /// Only the first call on an enabled client has any effect.
    pub async fn open_with(&self, resource: R) -> DrainReport {
        if !self.enabled {
            return DrainReport::default();
        }
        let mut queue = self.queue.lock().await;
        if !self.gate.open() {
            return DrainReport::default();
        }
        queue.drain_in_order(resource).await
    }

    /// Returns `false` when the kill switch discards every call.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` once the resource has been bound.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.gate.is_open()
    }

    /// Gate guarding the resource.
    #[must_use]
    pub fn gate(&self) -> &GateController {
        &self.gate
    }

    /// Number of calls waiting for the resource.
    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// The bound resource, once the gate has opened.
    pub async fn resource(&self) -> Option<R> {
        self.queue.lock().await.resource().cloned()
    }
}

impl<R> fmt::Debug for GatedClient<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GatedClient")
            .field("enabled", &self.enabled)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
