use crate::record::GateRecord;
use crate::StoreError;

/// Durable storage for gate records.
///
/// Implementations persist structured values only. Each call must complete or
/// fail within the backend's own timeout; callers never retry.
pub trait GateBackend: Send + Sync {
    /// Create the backing table or file if needed
    fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Read the record stored under `key`
    fn get(&self, key: &str) -> Result<Option<GateRecord>, StoreError>;

    /// Store `record` only if no record exists for its key.
    ///
    /// Returns `true` when a new record was written.
    fn insert_if_absent(&self, record: &GateRecord) -> Result<bool, StoreError>;

    /// Create or replace the record stored under `record.key`
    fn upsert(&self, record: &GateRecord) -> Result<(), StoreError>;
}
