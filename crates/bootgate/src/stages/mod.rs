//! Ordered, severity-aware execution of initialisation stages.
//!
//! A stage list is totally ordered. Each stage receives exclusive access to a
//! shared context and observes every write made by the stages before it.
//! Required stages abort the run on failure; optional stages are recorded and
//! skipped over.

mod errors;
mod runner;

use async_trait::async_trait;

pub use errors::{FatalStageError, RecoverableStageError, StageError};
pub use runner::StageRunner;

/// Result of running one stage. Values produced by a successful stage are
/// committed to the shared context rather than returned.
pub type StageOutcome = Result<(), StageError>;

/// Failure severity of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Failure aborts the remaining stages.
    Required,
    /// Failure is recorded and the run continues.
    Optional,
}

/// One named unit of a staged initialisation sequence.
#[async_trait]
pub trait Stage<C>: Send + Sync
where
    C: Send,
{
    /// Stable stage name used in records and diagnostics.
    fn name(&self) -> &'static str;

    /// Failure severity.
    fn requirement(&self) -> Requirement;

    /// Whether a run containing this stage opens the runner's gate when it
    /// finishes without a fatal failure.
    fn opens_gate(&self) -> bool {
        false
    }

    /// Conditional stages return `false` to be skipped without running.
    fn is_applicable(&self, _context: &C) -> bool {
        true
    }

    /// Executes the stage against the shared context.
    async fn run(&self, context: &mut C) -> StageOutcome;
}

/// How a stage ended.
#[derive(Debug)]
pub enum StageStatus {
    /// The stage ran and succeeded.
    Completed,
    /// The stage did not apply and was not run.
    Skipped,
    /// The stage was optional, ran, and failed.
    Recovered(RecoverableStageError),
}

/// Record of one stage within a run.
#[derive(Debug)]
pub struct StageRecord {
    name: &'static str,
    requirement: Requirement,
    status: StageStatus,
}

impl StageRecord {
    pub(crate) fn new(name: &'static str, requirement: Requirement, status: StageStatus) -> Self {
        Self {
            name,
            requirement,
            status,
        }
    }

    /// Stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stage severity.
    #[must_use]
    pub fn requirement(&self) -> Requirement {
        self.requirement
    }

    /// How the stage ended.
    #[must_use]
    pub fn status(&self) -> &StageStatus {
        &self.status
    }

    /// Returns `true` when the stage was actually run.
    #[must_use]
    pub fn was_attempted(&self) -> bool {
        !matches!(self.status, StageStatus::Skipped)
    }
}

/// Outcome of a full stage run.
#[derive(Debug, Default)]
pub struct RunResult {
    records: Vec<StageRecord>,
    fatal: Option<FatalStageError>,
}

impl RunResult {
    /// Records of every stage that ran or was skipped before the run ended.
    /// A fatal stage is reported through [`RunResult::fatal`] instead.
    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// The record for `name`, if that stage was reached.
    #[must_use]
    pub fn record(&self, name: &str) -> Option<&StageRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    /// The first required-stage failure, if any.
    #[must_use]
    pub fn fatal(&self) -> Option<&FatalStageError> {
        self.fatal.as_ref()
    }

    /// Returns `true` when a required stage failed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    /// Errors recorded for optional stages that failed.
    pub fn recovered(&self) -> impl Iterator<Item = &RecoverableStageError> {
        self.records.iter().filter_map(|record| match &record.status {
            StageStatus::Recovered(error) => Some(error),
            StageStatus::Completed | StageStatus::Skipped => None,
        })
    }

    /// Splits the result into its records and fatal error.
    #[must_use]
    pub fn into_parts(self) -> (Vec<StageRecord>, Option<FatalStageError>) {
        (self.records, self.fatal)
    }
}
