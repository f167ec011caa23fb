//! Recording analytics SDK double.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::analytics::{
    AnalyticsConfig, AnalyticsHandle, AnalyticsPlugin, AnalyticsSdk, Properties,
};
use crate::queue::OperationError;

/// A call that reached an SDK handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsCall {
    Plugin(AnalyticsPlugin),
    Identify(Option<String>),
    Screen(String),
    Track(String),
}

#[derive(Debug, Default)]
struct Shared {
    calls: Mutex<Vec<AnalyticsCall>>,
    failing_events: Mutex<HashSet<String>>,
}

impl Shared {
    fn record(&self, call: AnalyticsCall) {
        self.calls
            .lock()
            .expect("analytics calls mutex poisoned")
            .push(call);
    }

    fn rejects(&self, event: &str) -> bool {
        self.failing_events
            .lock()
            .expect("analytics failures mutex poisoned")
            .contains(event)
    }
}

/// SDK recording every created handle and every call those handles receive.
#[derive(Debug, Default)]
pub struct RecordingAnalyticsSdk {
    shared: Arc<Shared>,
    configs: Mutex<Vec<AnalyticsConfig>>,
    creations: AtomicUsize,
    failures_remaining: AtomicUsize,
    stalled: AtomicBool,
}

impl RecordingAnalyticsSdk {
    /// Fails the next `count` creation attempts.
    pub fn fail_next_creations(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Makes every creation attempt hang forever.
    pub fn stall_creation(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    /// Makes `track` calls for `event` fail without being recorded.
    pub fn fail_event(&self, event: &str) {
        self.shared
            .failing_events
            .lock()
            .expect("analytics failures mutex poisoned")
            .insert(event.to_owned());
    }

    /// Calls received by handles, in order.
    pub fn calls(&self) -> Vec<AnalyticsCall> {
        self.shared
            .calls
            .lock()
            .expect("analytics calls mutex poisoned")
            .clone()
    }

    /// Configurations passed to successful creations.
    pub fn configs(&self) -> Vec<AnalyticsConfig> {
        self.configs
            .lock()
            .expect("analytics configs mutex poisoned")
            .clone()
    }

    /// Number of creation attempts, successful or not.
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl AnalyticsSdk for RecordingAnalyticsSdk {
    async fn create(
        &self,
        config: &AnalyticsConfig,
    ) -> Result<Arc<dyn AnalyticsHandle>, OperationError> {
        self.creations.fetch_add(1, Ordering::SeqCst);
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.take_failure() {
            return Err(OperationError::new("analytics backend unreachable"));
        }

        self.configs
            .lock()
            .expect("analytics configs mutex poisoned")
            .push(config.clone());
        Ok(Arc::new(RecordingAnalyticsHandle {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct RecordingAnalyticsHandle {
    shared: Arc<Shared>,
}

#[async_trait]
impl AnalyticsHandle for RecordingAnalyticsHandle {
    fn add_plugin(&self, plugin: AnalyticsPlugin) {
        self.shared.record(AnalyticsCall::Plugin(plugin));
    }

    async fn identify(
        &self,
        user_id: Option<String>,
        _traits: Properties,
    ) -> Result<(), OperationError> {
        self.shared.record(AnalyticsCall::Identify(user_id));
        Ok(())
    }

    async fn screen(&self, name: String, _properties: Properties) -> Result<(), OperationError> {
        self.shared.record(AnalyticsCall::Screen(name));
        Ok(())
    }

    async fn track(&self, event: String, _properties: Properties) -> Result<(), OperationError> {
        if self.shared.rejects(&event) {
            return Err(OperationError::new(format!("{event} rejected")));
        }
        self.shared.record(AnalyticsCall::Track(event));
        Ok(())
    }
}
