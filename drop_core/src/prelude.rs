//! Prelude module for convenient imports
//!
//! ```rust
//! use drop_core::prelude::*;
//! ```

// Service and hooks
pub use crate::hooks::DropHooks;
pub use crate::service::{KillOutcome, LootOutcome, OnceDropService};

// Config
pub use crate::config::OnceDropConfig;

// Host-facing types
pub use crate::types::{Actor, KilledCreature, LootContainer, LootSource};

// Ports
pub use crate::ports::{Broadcaster, Clock, NameResolver};
