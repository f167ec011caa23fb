//! Recording doubles for [`HealthReporter`] and [`QueueReporter`].

use std::sync::Mutex;

use bootgate_config::Network;

use crate::health::{HealthReporter, QueueReporter};
use crate::queue::{DrainReport, OperationError, OperationTicket};
use crate::stages::{FatalStageError, RecoverableStageError};

/// Bootstrap lifecycle events captured during tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    BootstrapStarting(Network),
    StageStarting(&'static str),
    StageCompleted(&'static str),
    StageSkipped(&'static str),
    StageRecovered(&'static str),
    StageFailed(&'static str),
    IdentityGenerated(Network),
    BootstrapSucceeded(Network),
    BootstrapFailed(&'static str),
    BootstrapCancelled(Network),
    LoadingDismissed,
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Counts recorded events equal to `event`.
    pub fn count(&self, event: &HealthEvent) -> usize {
        self.events()
            .iter()
            .filter(|recorded| *recorded == event)
            .count()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self, network: Network) {
        self.record(HealthEvent::BootstrapStarting(network));
    }

    fn stage_starting(&self, stage: &'static str) {
        self.record(HealthEvent::StageStarting(stage));
    }

    fn stage_completed(&self, stage: &'static str) {
        self.record(HealthEvent::StageCompleted(stage));
    }

    fn stage_skipped(&self, stage: &'static str) {
        self.record(HealthEvent::StageSkipped(stage));
    }

    fn stage_recovered(&self, error: &RecoverableStageError) {
        self.record(HealthEvent::StageRecovered(error.stage()));
    }

    fn stage_failed(&self, error: &FatalStageError) {
        self.record(HealthEvent::StageFailed(error.stage()));
    }

    fn identity_generated(&self, network: Network) {
        self.record(HealthEvent::IdentityGenerated(network));
    }

    fn bootstrap_succeeded(&self, network: Network) {
        self.record(HealthEvent::BootstrapSucceeded(network));
    }

    fn bootstrap_failed(&self, error: &FatalStageError) {
        self.record(HealthEvent::BootstrapFailed(error.stage()));
    }

    fn bootstrap_cancelled(&self, network: Network) {
        self.record(HealthEvent::BootstrapCancelled(network));
    }

    fn loading_dismissed(&self) {
        self.record(HealthEvent::LoadingDismissed);
    }
}

/// Queue events captured during tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueueEvent {
    Deferred { sequence: u64, label: &'static str },
    Dropped { sequence: u64, label: &'static str },
    Failed { sequence: u64, label: &'static str },
    Drained { succeeded: usize, failed: usize },
}

/// Records queue events for assertions.
#[derive(Debug, Default)]
pub struct RecordingQueueReporter {
    events: Mutex<Vec<QueueEvent>>,
}

impl RecordingQueueReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<QueueEvent> {
        self.events
            .lock()
            .expect("queue reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: QueueEvent) {
        self.events
            .lock()
            .expect("queue reporter mutex poisoned")
            .push(event);
    }
}

impl QueueReporter for RecordingQueueReporter {
    fn operation_deferred(&self, ticket: OperationTicket, _depth: usize) {
        self.record(QueueEvent::Deferred {
            sequence: ticket.sequence,
            label: ticket.label,
        });
    }

    fn operation_dropped(&self, ticket: OperationTicket, _capacity: usize) {
        self.record(QueueEvent::Dropped {
            sequence: ticket.sequence,
            label: ticket.label,
        });
    }

    fn operation_failed(&self, ticket: OperationTicket, _error: &OperationError) {
        self.record(QueueEvent::Failed {
            sequence: ticket.sequence,
            label: ticket.label,
        });
    }

    fn drain_completed(&self, report: &DrainReport) {
        self.record(QueueEvent::Drained {
            succeeded: report.succeeded,
            failed: report.failed,
        });
    }
}
