//! drop_core - Once-per-server reward drop
//!
//! This library provides:
//! - OnceDropConfig: Validated, fail-closed settings
//! - roll: Fixed-point percentage roll
//! - Announcer: Server-wide loot message
//! - OnceDropService: Kill-phase grant and loot-phase reconciliation
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use drop_core::prelude::*;
//! use gate_core::SqliteBackend;
//!
//! let backend = Arc::new(SqliteBackend::open(Path::new("world.sqlite"))?);
//! let service = OnceDropService::new(backend, broadcaster, names);
//! service.on_config_loaded(OnceDropConfig::load_from_path(Path::new("once_drop.toml"))?, false);
//!
//! // From the host's creature-death hook
//! service.on_entity_killed(&killer, &creature, &mut corpse_loot);
//! // From the host's item-looted hook
//! service.on_item_collected(&looter, item_entry, source);
//! ```

pub mod announcer;
pub mod config;
pub mod hooks;
pub mod ports;
pub mod prelude;
pub mod roll;
pub mod service;
pub mod types;

// Core API
pub use config::OnceDropConfig;
pub use hooks::DropHooks;
pub use service::{GateStatus, KillOutcome, LootOutcome, OnceDropService};
pub use types::{Actor, KilledCreature, LootContainer, LootItem, LootSource};

// Collaborators
pub use announcer::Announcer;
pub use ports::{Broadcaster, Clock, NameResolver, SystemClock};

// Re-export the gate types hosts need to wire a backend
pub use gate_core::{GateBackend, GateRecord, GateState, StoreError};

use std::path::PathBuf;
use thiserror::Error;

/// Error loading once-drop configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading '{path:?}': {error}")]
    Io {
        error: std::io::Error,
        path: Option<PathBuf>,
    },
    #[error("Parse error in '{path:?}': {error}")]
    Parse {
        error: toml::de::Error,
        path: Option<PathBuf>,
    },
}
