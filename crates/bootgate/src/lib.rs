//! Gated, run-once client initialisation.
//!
//! A client process brings itself up in a fixed order: ensure a durable
//! identity, bind API clients to it, hydrate persisted stores, optionally
//! fetch paired-account data and start third-party SDKs. Some subsystems,
//! analytics in particular, finish asynchronously after the rest of the
//! application is already issuing calls to them.
//!
//! The crate provides the primitives and their two instantiations:
//!
//! - [`GateController`] tracks whether a singleton resource is ready.
//! - [`DeferredQueue`] buffers operations submitted before that point and
//!   replays them in submission order.
//! - [`StageRunner`] executes ordered stages, aborting on required failures
//!   and recording optional ones.
//! - [`BootstrapOrchestrator`] runs the application startup stages exactly
//!   once and publishes [`Readiness`].
//! - [`GatedClient`] and [`AnalyticsClient`] wrap a lazily created resource so
//!   callers never wait for it and never observe its failures.
//!
//! Lifecycle events are reported through [`HealthReporter`] and
//! [`QueueReporter`], whose default implementations emit structured
//! `tracing` events.

pub mod analytics;
pub mod bootstrap;
mod gate;
mod gated;
mod health;
pub mod identity;
mod launch;
pub mod placeholder;
mod queue;
pub mod stages;
pub mod telemetry;

pub use analytics::{AnalyticsClient, AnalyticsError, AnalyticsSettings};
pub use bootstrap::{BootstrapError, BootstrapOrchestrator, Bootstrapped, Readiness};
pub use gate::{GateController, GateState};
pub use gated::GatedClient;
pub use health::{
    HealthReporter, QueueReporter, StructuredHealthReporter, StructuredQueueReporter,
};
pub use launch::{
    Client, ConfigLoader, LaunchError, StaticConfigLoader, SystemConfigLoader, run_client,
};
pub use queue::{
    DeferredQueue, DrainReport, OperationError, OperationTicket, PendingOperation, Submission,
};
pub use stages::{Requirement, Stage, StageRunner};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
