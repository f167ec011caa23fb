//! Structured health reporting for bootstrap and gated-queue lifecycle events.

use std::sync::Arc;

use bootgate_config::Network;

use crate::queue::{DrainReport, OperationError, OperationTicket};
use crate::stages::{FatalStageError, RecoverableStageError};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");
const QUEUE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::queue");

/// Observer trait used to surface bootstrap lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before the first stage runs.
    fn bootstrap_starting(&self, network: Network);

    /// Invoked before a stage runs.
    fn stage_starting(&self, stage: &'static str);

    /// Invoked after a stage completes successfully.
    fn stage_completed(&self, stage: &'static str);

    /// Invoked when a conditional stage does not apply and is not run.
    fn stage_skipped(&self, stage: &'static str);

    /// Invoked when an optional stage fails and the run continues.
    fn stage_recovered(&self, error: &RecoverableStageError);

    /// Invoked when a required stage fails and the run aborts.
    fn stage_failed(&self, error: &FatalStageError);

    /// Invoked when a fresh client identity had to be generated.
    fn identity_generated(&self, network: Network);

    /// Invoked after the bootstrap reaches the ready state.
    fn bootstrap_succeeded(&self, network: Network);

    /// Invoked after the bootstrap reaches the failed state.
    fn bootstrap_failed(&self, error: &FatalStageError);

    /// Invoked when a running bootstrap is dropped before it finishes.
    fn bootstrap_cancelled(&self, network: Network);

    /// Invoked once the loading indicator has been dismissed.
    fn loading_dismissed(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self, network: Network) {
        (**self).bootstrap_starting(network);
    }

    fn stage_starting(&self, stage: &'static str) {
        (**self).stage_starting(stage);
    }

    fn stage_completed(&self, stage: &'static str) {
        (**self).stage_completed(stage);
    }

    fn stage_skipped(&self, stage: &'static str) {
        (**self).stage_skipped(stage);
    }

    fn stage_recovered(&self, error: &RecoverableStageError) {
        (**self).stage_recovered(error);
    }

    fn stage_failed(&self, error: &FatalStageError) {
        (**self).stage_failed(error);
    }

    fn identity_generated(&self, network: Network) {
        (**self).identity_generated(network);
    }

    fn bootstrap_succeeded(&self, network: Network) {
        (**self).bootstrap_succeeded(network);
    }

    fn bootstrap_failed(&self, error: &FatalStageError) {
        (**self).bootstrap_failed(error);
    }

    fn bootstrap_cancelled(&self, network: Network) {
        (**self).bootstrap_cancelled(network);
    }

    fn loading_dismissed(&self) {
        (**self).loading_dismissed();
    }
}

/// Side channel for operations a [`DeferredQueue`](crate::DeferredQueue)
/// buffers, drops, or fails to execute.
///
/// Drained failures never reach their original caller, so this is the only
/// place they become visible.
pub trait QueueReporter: Send + Sync {
    /// Invoked when an operation is buffered behind a closed gate.
    fn operation_deferred(&self, ticket: OperationTicket, depth: usize);

    /// Invoked when an operation is discarded because the queue is full.
    fn operation_dropped(&self, ticket: OperationTicket, capacity: usize);

    /// Invoked when a drained or direct operation fails.
    fn operation_failed(&self, ticket: OperationTicket, error: &OperationError);

    /// Invoked after every buffered operation has been executed.
    fn drain_completed(&self, report: &DrainReport);
}

impl<T> QueueReporter for Arc<T>
where
    T: QueueReporter + ?Sized,
{
    fn operation_deferred(&self, ticket: OperationTicket, depth: usize) {
        (**self).operation_deferred(ticket, depth);
    }

    fn operation_dropped(&self, ticket: OperationTicket, capacity: usize) {
        (**self).operation_dropped(ticket, capacity);
    }

    fn operation_failed(&self, ticket: OperationTicket, error: &OperationError) {
        (**self).operation_failed(ticket, error);
    }

    fn drain_completed(&self, report: &DrainReport) {
        (**self).drain_completed(report);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self, network: Network) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            network = %network,
            "initialising app"
        );
    }

    fn stage_starting(&self, stage: &'static str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "stage_starting",
            stage,
            "starting bootstrap stage"
        );
    }

    fn stage_completed(&self, stage: &'static str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "stage_completed",
            stage,
            "bootstrap stage completed"
        );
    }

    fn stage_skipped(&self, stage: &'static str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "stage_skipped",
            stage,
            "bootstrap stage not applicable"
        );
    }

    fn stage_recovered(&self, error: &RecoverableStageError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "stage_recovered",
            stage = error.stage(),
            error = %error.error(),
            "optional bootstrap stage failed; continuing"
        );
    }

    fn stage_failed(&self, error: &FatalStageError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "stage_failed",
            stage = error.stage(),
            error = %error.error(),
            "required bootstrap stage failed"
        );
    }

    fn identity_generated(&self, network: Network) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "identity_generated",
            network = %network,
            "generated new app identity"
        );
    }

    fn bootstrap_succeeded(&self, network: Network) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            network = %network,
            "initialised app successfully"
        );
    }

    fn bootstrap_failed(&self, error: &FatalStageError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            stage = error.stage(),
            error = %error,
            "app initialisation failed"
        );
    }

    fn bootstrap_cancelled(&self, network: Network) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "bootstrap_cancelled",
            network = %network,
            "app initialisation was abandoned before it finished"
        );
    }

    fn loading_dismissed(&self) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "loading_dismissed",
            "loading indicator dismissed"
        );
    }
}

/// Default queue reporter that records events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredQueueReporter;

impl StructuredQueueReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl QueueReporter for StructuredQueueReporter {
    fn operation_deferred(&self, ticket: OperationTicket, depth: usize) {
        tracing::debug!(
            target: QUEUE_TARGET,
            event = "operation_deferred",
            sequence = ticket.sequence,
            operation = ticket.label,
            depth,
            "operation queued until the resource is ready"
        );
    }

    fn operation_dropped(&self, ticket: OperationTicket, capacity: usize) {
        tracing::warn!(
            target: QUEUE_TARGET,
            event = "operation_dropped",
            sequence = ticket.sequence,
            operation = ticket.label,
            capacity,
            "queue full; operation discarded"
        );
    }

    fn operation_failed(&self, ticket: OperationTicket, error: &OperationError) {
        tracing::warn!(
            target: QUEUE_TARGET,
            event = "operation_failed",
            sequence = ticket.sequence,
            operation = ticket.label,
            error = %error,
            "gated operation failed; discarding"
        );
    }

    fn drain_completed(&self, report: &DrainReport) {
        tracing::debug!(
            target: QUEUE_TARGET,
            event = "drain_completed",
            succeeded = report.succeeded,
            failed = report.failed,
            "deferred operations drained"
        );
    }
}
