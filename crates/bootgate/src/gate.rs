//! Readiness gate guarding a lazily initialised resource.
//!
//! A gate starts [`GateState::Closed`] and flips to [`GateState::Open`] exactly
//! once. Reads never block; observers that need to wait for readiness
//! subscribe to the underlying `watch` channel.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Readiness of a guarded resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GateState {
    /// The resource is still being prepared.
    #[default]
    Closed,
    /// The resource is ready for direct use.
    Open,
}

impl fmt::Display for GateState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Closed => "closed",
            Self::Open => "open",
        };
        formatter.write_str(label)
    }
}

/// Shared handle over a single gate.
///
/// Clones observe and drive the same gate.
#[derive(Clone)]
pub struct GateController {
    state: Arc<watch::Sender<GateState>>,
}

impl GateController {
    /// Builds a closed gate.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(GateState::Closed);
        Self {
            state: Arc::new(sender),
        }
    }

    /// Returns the current gate state without blocking.
    #[must_use]
    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// Returns `true` once the gate has opened.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == GateState::Open
    }

    /// Opens the gate.
    ///
    /// Redundant calls are harmless. Only the call that performed the
    /// transition returns `true`; owners use this to drain their queue once.
    pub fn open(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == GateState::Open {
                return false;
            }
            *state = GateState::Open;
            true
        })
    }

    /// Subscribes to gate transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    /// Resolves once the gate is open.
    pub async fn wait_open(&self) {
        let mut receiver = self.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        drop(
            receiver
                .wait_for(|state| *state == GateState::Open)
                .await,
        );
    }
}

impl Default for GateController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GateController {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GateController")
            .field("state", &self.state())
            .finish()
    }
}
