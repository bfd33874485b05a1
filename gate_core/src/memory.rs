use crate::backend::GateBackend;
use crate::record::GateRecord;
use crate::StoreError;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory backend, lost with the process
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, GateRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GateBackend for MemoryBackend {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<GateRecord>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StoreError::Poisoned("memory backend"))?;
        Ok(records.get(key).cloned())
    }

    fn insert_if_absent(&self, record: &GateRecord) -> Result<bool, StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::Poisoned("memory backend"))?;
        if records.contains_key(&record.key) {
            return Ok(false);
        }
        records.insert(record.key.clone(), record.clone());
        Ok(true)
    }

    fn upsert(&self, record: &GateRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::Poisoned("memory backend"))?;
        records.insert(record.key.clone(), record.clone());
        Ok(())
    }
}
