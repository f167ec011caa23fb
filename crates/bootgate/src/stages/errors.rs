//! Error taxonomy for staged initialisation.

use std::time::Duration;

use thiserror::Error;

/// Failure produced by a single stage.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StageError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StageError {
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

    /// Builds the error reported when a stage exceeds its time budget.
    #[must_use]
    pub fn timed_out(limit: Duration) -> Self {
        Self::new(format!("stage did not finish within {}ms", limit.as_millis()))
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// A required stage failed; the remaining stages were not run.
#[derive(Debug, Error)]
#[error("required stage {stage} failed: {source}")]
pub struct FatalStageError {
    stage: &'static str,
    #[source]
    source: StageError,
}

impl FatalStageError {
    /// Attributes `source` to `stage`.
    #[must_use]
    pub fn new(stage: &'static str, source: StageError) -> Self {
        Self { stage, source }
    }

    /// Name of the stage that failed.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// The stage's own failure.
    #[must_use]
    pub fn error(&self) -> &StageError {
        &self.source
    }
}

/// An optional stage failed; the run continued without it.
#[derive(Debug, Error)]
#[error("optional stage {stage} failed: {source}")]
pub struct RecoverableStageError {
    stage: &'static str,
    #[source]
    source: StageError,
}

impl RecoverableStageError {
    /// Attributes `source` to `stage`.
    #[must_use]
    pub fn new(stage: &'static str, source: StageError) -> Self {
        Self { stage, source }
    }

    /// Name of the stage that failed.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// The stage's own failure.
    #[must_use]
    pub fn error(&self) -> &StageError {
        &self.source
    }
}
