//! Application bootstrap orchestration.
//!
//! The orchestrator runs the fixed startup sequence exactly once:
//!
//! 1. `identity-ensure`: load or mint the client identity (required).
//! 2. `api-binding`: bind API clients to that identity (required).
//! 3. `store-hydration`: restore persisted stores and the pairing token
//!    (required).
//! 4. `paired-account-fetch`: fetch remote account data when paired
//!    (optional, conditional).
//! 5. `rewards-sdk-init`: start the rewards SDK (optional).
//!
//! Readiness moves `NotStarted → Running → Ready | Failed` and is published on
//! a `watch` channel for the presentation layer. A run whose future is dropped
//! part way through ends in `Cancelled`. The loading indicator is dismissed
//! exactly once whichever way the run ends.

mod collaborators;
mod stages;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bootgate_config::{Config, Network};
use thiserror::Error;
use tokio::sync::watch;

use crate::gate::GateController;
use crate::health::HealthReporter;
use crate::identity::Identity;
use crate::stages::{
    FatalStageError, RecoverableStageError, Stage, StageRecord, StageRunner, StageStatus,
};

pub use collaborators::{
    AccountError, AccountService, AccountSnapshot, ApiBinder, BindError, Card, Collaborators,
    HydrationError, KeyValueStore, LoadingIndicator, PairedStores, PairingToken, RewardsSdk,
    SdkError, StoreError, StoreHydrator, UserProfile, identity_key, pairing_token_key,
};
pub use stages::{
    API_BINDING, BootstrapContext, IDENTITY_ENSURE, PAIRED_ACCOUNT_FETCH, REWARDS_SDK_INIT,
    STORE_HYDRATION,
};

use stages::{
    ApiBindingStage, IdentityEnsureStage, PairedAccountFetchStage, RewardsSdkStage,
    StoreHydrationStage,
};

/// Application readiness as observed by the presentation layer.
#[derive(Debug, Clone, Default)]
pub enum Readiness {
    /// Bootstrap has not been requested.
    #[default]
    NotStarted,
    /// Stages are executing.
    Running,
    /// Every required stage succeeded.
    Ready,
    /// A required stage failed.
    Failed(Arc<FatalStageError>),
    /// The run was dropped before it finished.
    Cancelled,
}

impl Readiness {
    /// Returns `true` once the application is usable.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` when bootstrap failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns `true` for states with no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_) | Self::Cancelled)
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        };
        formatter.write_str(label)
    }
}

/// Errors surfaced by [`BootstrapOrchestrator::start`].
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Bootstrap already ran or is running on this orchestrator.
    #[error("bootstrap already started; readiness is {state}")]
    AlreadyStarted {
        /// Readiness observed when the call was rejected.
        state: Readiness,
    },
    /// A required stage failed.
    #[error("bootstrap failed: {source}")]
    Stage {
        /// The first required-stage failure.
        #[source]
        source: Arc<FatalStageError>,
        /// Stages that ran or were skipped before the failure.
        records: Vec<StageRecord>,
    },
}

/// Result of a successful bootstrap.
#[derive(Debug)]
pub struct Bootstrapped {
    context: BootstrapContext,
    records: Vec<StageRecord>,
}

impl Bootstrapped {
    /// The identity the API clients were bound to.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.context.identity()
    }

    /// Paired account data, when the client is paired and the fetch succeeded.
    #[must_use]
    pub fn account(&self) -> Option<&AccountSnapshot> {
        self.context.account()
    }

    /// Full context accumulated by the stages.
    #[must_use]
    pub fn context(&self) -> &BootstrapContext {
        &self.context
    }

    /// Per-stage records in execution order.
    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Optional stages that failed.
    pub fn recovered(&self) -> impl Iterator<Item = &RecoverableStageError> {
        self.records
            .iter()
            .filter_map(|record| match record.status() {
                StageStatus::Recovered(error) => Some(error),
                StageStatus::Completed | StageStatus::Skipped => None,
            })
    }
}

/// Drives the application startup sequence.
pub struct BootstrapOrchestrator {
    network: Network,
    stages: Vec<Box<dyn Stage<BootstrapContext>>>,
    runner: StageRunner,
    reporter: Arc<dyn HealthReporter>,
    loading: Arc<dyn LoadingIndicator>,
    readiness: watch::Sender<Readiness>,
    settle: Duration,
}

impl BootstrapOrchestrator {
    /// Builds an orchestrator for the configured network.
    #[must_use]
    pub fn new(
        config: &Config,
        collaborators: Collaborators,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        let Collaborators {
            store,
            identity_generator,
            api_binders,
            hydrators,
            accounts,
            paired_stores,
            rewards,
            loading,
        } = collaborators;

        let stages: Vec<Box<dyn Stage<BootstrapContext>>> = vec![
            Box::new(IdentityEnsureStage::new(
                store.clone(),
                identity_generator,
                reporter.clone(),
            )),
            Box::new(ApiBindingStage::new(api_binders)),
            Box::new(StoreHydrationStage::new(store, hydrators)),
            Box::new(PairedAccountFetchStage::new(accounts, paired_stores)),
            Box::new(RewardsSdkStage::new(rewards)),
        ];

        let runner = StageRunner::new(reporter.clone())
            .with_gate(GateController::new())
            .with_stage_timeout(config.stage_timeout());
        let (readiness, _receiver) = watch::channel(Readiness::NotStarted);

        Self {
            network: config.network(),
            stages,
            runner,
            reporter,
            loading,
            readiness,
            settle: config.splash_settle(),
        }
    }

    /// Network being bootstrapped.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Current readiness.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.readiness.borrow().clone()
    }

    /// Subscribes to readiness transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.readiness.subscribe()
    }

    /// Gate opened when the sequence finishes without a fatal failure.
    #[must_use]
    pub fn gate(&self) -> Option<&GateController> {
        self.runner.gate()
    }

    /// Runs the startup sequence.
    ///
    /// Only the first call runs; later calls fail with
    /// [`BootstrapError::AlreadyStarted`]. Retrying after a failure means
    /// building a new orchestrator.
    ///
    /// Dropping the returned future mid-run publishes
    /// [`Readiness::Cancelled`] and still dismisses the loading indicator.
    pub async fn start(&self) -> Result<Bootstrapped, BootstrapError> {
        if !self.claim() {
            return Err(BootstrapError::AlreadyStarted {
                state: self.readiness(),
            });
        }
        let mut run = RunGuard {
            orchestrator: self,
            finished: false,
        };

        self.reporter.bootstrap_starting(self.network);
        let mut context = BootstrapContext::new(self.network);
        let (records, fatal) = self
            .runner
            .run(&self.stages, &mut context)
            .await
            .into_parts();

        let outcome = match fatal {
            Some(failure) => {
                let error = Arc::new(failure);
                self.reporter.bootstrap_failed(&error);
                let failed = Readiness::Failed(error.clone());
                self.readiness.send_modify(|state| *state = failed);
                Err(BootstrapError::Stage {
                    source: error,
                    records,
                })
            }
            None => {
                if !self.settle.is_zero() {
                    tokio::time::sleep(self.settle).await;
                }
                self.readiness.send_modify(|state| *state = Readiness::Ready);
                self.reporter.bootstrap_succeeded(self.network);
                Ok(Bootstrapped { context, records })
            }
        };

        run.finished = true;
        self.dismiss_loading();
        outcome
    }

    fn dismiss_loading(&self) {
        self.loading.dismiss();
        self.reporter.loading_dismissed();
    }

    fn claim(&self) -> bool {
        self.readiness.send_if_modified(|state| {
            if matches!(state, Readiness::NotStarted) {
                *state = Readiness::Running;
                true
            } else {
                false
            }
        })
    }
}

/// Settles a claimed run whose future was dropped before completion.
struct RunGuard<'a> {
    orchestrator: &'a BootstrapOrchestrator,
    finished: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let orchestrator = self.orchestrator;
        orchestrator
            .readiness
            .send_modify(|state| *state = Readiness::Cancelled);
        orchestrator.reporter.bootstrap_cancelled(orchestrator.network);
        orchestrator.dismiss_loading();
    }
}

impl fmt::Debug for BootstrapOrchestrator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BootstrapOrchestrator")
            .field("network", &self.network)
            .field("stages", &self.stage_names())
            .field("readiness", &*self.readiness.borrow())
            .finish_non_exhaustive()
    }
}
