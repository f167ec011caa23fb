//! Sequential stage execution.

use std::sync::Arc;
use std::time::Duration;

use crate::gate::GateController;
use crate::health::HealthReporter;

use super::{
    FatalStageError, RecoverableStageError, Requirement, RunResult, Stage, StageError,
    StageOutcome, StageRecord, StageStatus,
};

/// Executes an ordered stage list with short-circuit-on-required-failure
/// semantics.
///
/// The runner never retries. Re-running a failed sequence is left to the
/// caller.
#[derive(Clone)]
pub struct StageRunner {
    reporter: Arc<dyn HealthReporter>,
    gate: Option<GateController>,
    stage_timeout: Option<Duration>,
}

impl StageRunner {
    /// Builds a runner that reports through `reporter`.
    #[must_use]
    pub fn new(reporter: Arc<dyn HealthReporter>) -> Self {
        Self {
            reporter,
            gate: None,
            stage_timeout: None,
        }
    }

    /// Attaches the gate opened by runs containing a gate-opening stage.
    #[must_use]
    pub fn with_gate(mut self, gate: GateController) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Bounds every stage by `timeout`; `None` lets stages run indefinitely.
    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// The attached gate, if any.
    #[must_use]
    pub fn gate(&self) -> Option<&GateController> {
        self.gate.as_ref()
    }

    /// Runs `stages` in order against `context`.
    pub async fn run<C>(&self, stages: &[Box<dyn Stage<C>>], context: &mut C) -> RunResult
    where
        C: Send,
    {
        let mut records = Vec::with_capacity(stages.len());

        for stage in stages {
            let name = stage.name();
            let requirement = stage.requirement();

            if !stage.is_applicable(context) {
                self.reporter.stage_skipped(name);
                records.push(StageRecord::new(name, requirement, StageStatus::Skipped));
                continue;
            }

            self.reporter.stage_starting(name);
            match self.execute(stage.as_ref(), context).await {
                Ok(()) => {
                    self.reporter.stage_completed(name);
                    records.push(StageRecord::new(name, requirement, StageStatus::Completed));
                }
                Err(source) => match requirement {
                    Requirement::Required => {
                        let error = FatalStageError::new(name, source);
                        self.reporter.stage_failed(&error);
                        return RunResult {
                            records,
                            fatal: Some(error),
                        };
                    }
                    Requirement::Optional => {
                        let error = RecoverableStageError::new(name, source);
                        self.reporter.stage_recovered(&error);
                        records.push(StageRecord::new(
                            name,
                            requirement,
                            StageStatus::Recovered(error),
                        ));
                    }
                },
            }
        }

        if stages.iter().any(|stage| stage.opens_gate()) {
            if let Some(gate) = &self.gate {
                gate.open();
            }
        }

        RunResult {
            records,
            fatal: None,
        }
    }

    async fn execute<C>(&self, stage: &dyn Stage<C>, context: &mut C) -> StageOutcome
    where
        C: Send,
    {
        match self.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, stage.run(context))
                .await
                .unwrap_or_else(|_| Err(StageError::timed_out(limit))),
            None => stage.run(context).await,
        }
    }
}
