//! Ordered buffer of operations awaiting a gated resource.
//!
//! Operations submitted while the gate is closed are appended in submission
//! order and executed head to tail once the owner binds the ready resource.
//! Operations submitted after that point bypass the buffer entirely. The
//! queue is bounded: once full, new submissions are dropped and reported
//! rather than accumulating without limit behind a gate that never opens.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;

use crate::gate::GateController;
use crate::health::QueueReporter;

/// Failure reported by an individual gated operation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl OperationError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

type OperationFn<R> = Box<dyn FnOnce(R) -> BoxFuture<'static, Result<(), OperationError>> + Send>;

/// A unit of work executed against the ready resource `R`.
pub struct PendingOperation<R> {
    label: &'static str,
    run: OperationFn<R>,
}

impl<R> PendingOperation<R> {
    /// Wraps an asynchronous closure over the resource.
    ///
    /// The label is only used for diagnostics.
    pub fn new<F, Fut>(label: &'static str, operation: F) -> Self
    where
        F: FnOnce(R) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), OperationError>> + Send + 'static,
    {
        Self {
            label,
            run: Box::new(move |resource| operation(resource).boxed()),
        }
    }

    /// Diagnostic label supplied at construction.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    async fn execute(self, resource: R) -> Result<(), OperationError> {
        (self.run)(resource).await
    }
}

impl<R> fmt::Debug for PendingOperation<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PendingOperation")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Identifies a submitted operation in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationTicket {
    /// Position in submission order, starting at zero.
    pub sequence: u64,
    /// Label supplied with the operation.
    pub label: &'static str,
}

/// What happened to a submitted operation.
#[derive(Debug)]
#[must_use]
pub enum Submission {
    /// The gate was open and the operation ran immediately.
    Executed(Result<(), OperationError>),
    /// The gate was closed; the operation waits in the queue. No result will
    /// ever be delivered to the submitter.
    Deferred,
    /// The queue was full and the operation was discarded.
    Dropped,
}

/// Counts produced by a drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Operations that completed successfully.
    pub succeeded: usize,
    /// Operations whose failure was reported and discarded.
    pub failed: usize,
}

impl DrainReport {
    /// Total number of operations executed by the drain.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

struct QueuedOperation<R> {
    ticket: OperationTicket,
    operation: PendingOperation<R>,
}

/// Bounded FIFO of operations awaiting the resource guarded by a gate.
pub struct DeferredQueue<R> {
    gate: GateController,
    resource: Option<R>,
    pending: VecDeque<QueuedOperation<R>>,
    capacity: usize,
    next_sequence: u64,
    reporter: Arc<dyn QueueReporter>,
}

impl<R> DeferredQueue<R>
where
    R: Clone + Send + 'static,
{
    /// Builds an empty queue tied to `gate`.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(gate: GateController, capacity: usize, reporter: Arc<dyn QueueReporter>) -> Self {
        Self {
            gate,
            resource: None,
            pending: VecDeque::new(),
            capacity: capacity.max(1),
            next_sequence: 0,
            reporter,
        }
    }

    /// Submits an operation.
    ///
    /// Runs it immediately when the gate is open and the resource has been
    /// bound; otherwise appends it to the tail of the queue. Direct failures
    /// are reported as well as returned.
    pub async fn submit(&mut self, operation: PendingOperation<R>) -> Submission {
        let ticket = self.next_ticket(operation.label());

        if let Some(resource) = self.ready_resource() {
            let result = operation.execute(resource).await;
            if let Err(error) = &result {
                self.reporter.operation_failed(ticket, error);
            }
            return Submission::Executed(result);
        }

        if self.pending.len() >= self.capacity {
            self.reporter.operation_dropped(ticket, self.capacity);
            return Submission::Dropped;
        }

        self.pending.push_back(QueuedOperation { ticket, operation });
        self.reporter.operation_deferred(ticket, self.pending.len());
        Submission::Deferred
    }

    /// Binds the ready resource and executes every queued operation in
    /// submission order.
    ///
    /// Failures are reported and discarded; they never stop the drain. While
    /// the gate is closed nothing is bound and the queue is left untouched.
    /// Once the resource is bound further calls return an empty report.
    pub async fn drain_in_order(&mut self, resource: R) -> DrainReport {
        if !self.gate.is_open() || self.resource.is_some() {
            return DrainReport::default();
        }
        self.resource = Some(resource.clone());

        let mut report = DrainReport::default();
        while let Some(queued) = self.pending.pop_front() {
            match queued.operation.execute(resource.clone()).await {
                Ok(()) => report.succeeded += 1,
                Err(error) => {
                    self.reporter.operation_failed(queued.ticket, &error);
                    report.failed += 1;
                }
            }
        }

        self.reporter.drain_completed(&report);
        report
    }

    /// Number of operations waiting for the resource.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Maximum number of operations held while the gate is closed.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The bound resource, once drained.
    #[must_use]
    pub fn resource(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    fn ready_resource(&self) -> Option<R> {
        if self.gate.is_open() {
            self.resource.clone()
        } else {
            None
        }
    }

    fn next_ticket(&mut self, label: &'static str) -> OperationTicket {
        let ticket = OperationTicket {
            sequence: self.next_sequence,
            label,
        };
        self.next_sequence += 1;
        ticket
    }
}

impl<R> fmt::Debug for DeferredQueue<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DeferredQueue")
            .field("gate", &self.gate)
            .field("pending", &self.pending.len())
            .field("capacity", &self.capacity)
            .field("bound", &self.resource.is_some())
            .finish()
    }
}
