//! Test doubles shared by the unit and behavioural suites.

mod analytics;
mod reporter;
mod services;
mod store;
mod world;

pub use analytics::{AnalyticsCall, RecordingAnalyticsSdk};
pub use reporter::{HealthEvent, QueueEvent, RecordingHealthReporter, RecordingQueueReporter};
pub use services::{
    BIND, CARDS, FETCH, FakeServices, GENERATE, HYDRATE, PROFILE, REWARDS, sample_account,
};
pub use store::MemoryStore;
pub use world::{TestWorld, test_config, world};
