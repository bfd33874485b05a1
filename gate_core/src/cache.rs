use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a gate as seen by this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// No configuration has been loaded yet
    Uninitialized,
    /// The reward can still be dispensed
    Ready,
    /// The reward has been dispensed
    Granted,
}

impl GateState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => GateState::Ready,
            2 => GateState::Granted,
            _ => GateState::Uninitialized,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            GateState::Uninitialized => 0,
            GateState::Ready => 1,
            GateState::Granted => 2,
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateState::Uninitialized => write!(f, "Uninitialized"),
            GateState::Ready => write!(f, "Ready"),
            GateState::Granted => write!(f, "Granted"),
        }
    }
}

/// Process-local mirror of the persisted `granted` bit.
///
/// Never the source of truth; rebuilt from the store on every config load.
#[derive(Debug)]
pub struct GateCache {
    state: AtomicU8,
}

impl Default for GateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GateCache {
    pub fn new() -> Self {
        GateCache {
            state: AtomicU8::new(GateState::Uninitialized.as_u8()),
        }
    }

    pub fn state(&self) -> GateState {
        GateState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_granted(&self) -> bool {
        self.state() == GateState::Granted
    }

    /// Replace the mirrored bit with a value read from the store
    pub fn load_from(&self, granted: bool) {
        let state = if granted {
            GateState::Granted
        } else {
            GateState::Ready
        };
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub fn mark_granted(&self) {
        self.state
            .store(GateState::Granted.as_u8(), Ordering::Release);
    }

    pub fn mark_ready(&self) {
        self.state.store(GateState::Ready.as_u8(), Ordering::Release);
    }
}
