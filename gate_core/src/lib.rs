//! gate_core - Persisted once-only gate
//!
//! This library provides:
//! - GateRecord: The single persisted row describing a gate
//! - GateBackend: Storage port (memory, SQLite and JSON file implementations)
//! - GateStore: Serialized read-modify-write operations over a backend
//! - GateCache: In-process mirror of the granted bit

mod backend;
mod cache;
mod file;
mod memory;
mod record;
mod sqlite;
mod store;

pub use backend::GateBackend;
pub use cache::{GateCache, GateState};
pub use file::JsonFileBackend;
pub use memory::MemoryBackend;
pub use record::{sanitize_actor_name, GateRecord, MAX_ACTOR_NAME_LEN};
pub use sqlite::SqliteBackend;
pub use store::GateStore;

use std::path::PathBuf;
use thiserror::Error;

/// Error talking to a gate backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error during {operation}: {error}")]
    Sqlite {
        operation: &'static str,
        error: rusqlite::Error,
    },
    #[error("IO error on '{path:?}': {error}")]
    Io {
        error: std::io::Error,
        path: PathBuf,
    },
    #[error("JSON error in '{path:?}': {error}")]
    Json {
        error: serde_json::Error,
        path: PathBuf,
    },
    #[error("Lock poisoned: {0}")]
    Poisoned(&'static str),
    #[error("Invalid stored value for '{key}': {message}")]
    Corrupt { key: String, message: String },
}

impl StoreError {
    pub(crate) fn sqlite(operation: &'static str, error: rusqlite::Error) -> Self {
        StoreError::Sqlite { operation, error }
    }
}
