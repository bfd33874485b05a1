use crate::backend::GateBackend;
use crate::record::{sanitize_actor_name, GateRecord};
use crate::StoreError;
use std::sync::{Arc, Mutex, MutexGuard};

/// Gate operations over a backend.
///
/// Every write is a read-modify-write performed while holding `write_lock`,
/// so concurrent writers never interleave between the read and the upsert.
/// The `granted` bit only ever goes back to `false` through [`GateStore::reset`].
pub struct GateStore {
    backend: Arc<dyn GateBackend>,
    write_lock: Mutex<()>,
}

impl GateStore {
    pub fn new(backend: Arc<dyn GateBackend>) -> Self {
        GateStore {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Poisoned("gate store"))
    }

    fn current(&self, key: &str) -> Result<GateRecord, StoreError> {
        Ok(self
            .backend
            .get(key)?
            .unwrap_or_else(|| GateRecord::new(key)))
    }

    /// Create the schema and a never-granted record for `key` if absent.
    ///
    /// Returns `true` when the record was created by this call.
    pub fn ensure_initialized(&self, key: &str) -> Result<bool, StoreError> {
        let _guard = self.lock()?;
        self.backend.ensure_schema()?;
        let created = self.backend.insert_if_absent(&GateRecord::new(key))?;
        if created {
            tracing::debug!(key, "Created gate record");
        }
        Ok(created)
    }

    /// Read the full record, surfacing backend failures
    pub fn load_record(&self, key: &str) -> Result<Option<GateRecord>, StoreError> {
        self.backend.get(key)
    }

    /// Read the granted bit.
    ///
    /// Fails open: an unreadable or missing record counts as not granted.
    pub fn load(&self, key: &str) -> bool {
        match self.backend.get(key) {
            Ok(Some(record)) => record.granted,
            Ok(None) => false,
            Err(e) => {
                tracing::error!(key, error = %e, "Gate read failed, treating as not granted");
                false
            }
        }
    }

    /// Clear the grant, timestamp and actor
    pub fn reset(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut record = self.current(key)?;
        record.clear();
        self.backend.upsert(&record)
    }

    /// Record a kill-phase grant.
    ///
    /// Outside repeat mode this sets `granted`; in repeat mode `granted` is
    /// left as is. Timestamp and actor are updated either way.
    pub fn record_grant(
        &self,
        key: &str,
        actor: &str,
        now: u64,
        allow_repeat: bool,
    ) -> Result<GateRecord, StoreError> {
        let _guard = self.lock()?;
        let mut record = self.current(key)?;
        if !allow_repeat {
            record.granted = true;
        }
        record.stamp(sanitize_actor_name(actor), now);
        self.backend.upsert(&record)?;
        Ok(record)
    }

    /// Record who collected the reward and when, leaving `granted` alone
    pub fn record_loot_metadata(
        &self,
        key: &str,
        actor: &str,
        now: u64,
    ) -> Result<GateRecord, StoreError> {
        let _guard = self.lock()?;
        let mut record = self.current(key)?;
        record.stamp(sanitize_actor_name(actor), now);
        self.backend.upsert(&record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    const KEY: &str = "geddon_17782_once";

    fn memory_store() -> (GateStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        (GateStore::new(backend.clone()), backend)
    }

    /// Backend whose every call fails
    struct BrokenBackend;

    impl GateBackend for BrokenBackend {
        fn ensure_schema(&self) -> Result<(), StoreError> {
            Err(StoreError::Poisoned("broken"))
        }
        fn get(&self, _key: &str) -> Result<Option<GateRecord>, StoreError> {
            Err(StoreError::Poisoned("broken"))
        }
        fn insert_if_absent(&self, _record: &GateRecord) -> Result<bool, StoreError> {
            Err(StoreError::Poisoned("broken"))
        }
        fn upsert(&self, _record: &GateRecord) -> Result<(), StoreError> {
            Err(StoreError::Poisoned("broken"))
        }
    }

    #[test]
    fn test_ensure_initialized_is_idempotent() {
        let (store, backend) = memory_store();
        assert!(store.ensure_initialized(KEY).unwrap());
        store.record_grant(KEY, "Alice", 10, false).unwrap();

        for _ in 0..5 {
            assert!(!store.ensure_initialized(KEY).unwrap());
        }

        assert_eq!(backend.len(), 1);
        assert!(store.load(KEY));
        assert_eq!(
            store.load_record(KEY).unwrap().unwrap().last_actor.as_deref(),
            Some("Alice")
        );
    }

    #[test]
    fn test_record_grant_sets_granted() {
        let (store, _) = memory_store();
        store.ensure_initialized(KEY).unwrap();
        assert!(!store.load(KEY));

        let record = store.record_grant(KEY, "Alice", 1_000, false).unwrap();
        assert!(record.granted);
        assert_eq!(record.granted_at, 1_000);
        assert!(store.load(KEY));
    }

    #[test]
    fn test_repeat_mode_leaves_granted_untouched() {
        let (store, _) = memory_store();
        store.ensure_initialized(KEY).unwrap();

        let record = store.record_grant(KEY, "Alice", 5, true).unwrap();
        assert!(!record.granted);
        assert_eq!(record.granted_at, 5);

        store.record_grant(KEY, "Bob", 6, false).unwrap();
        let record = store.record_grant(KEY, "Carol", 7, true).unwrap();
        assert!(record.granted);
        assert_eq!(record.last_actor.as_deref(), Some("Carol"));
    }

    #[test]
    fn test_loot_metadata_never_touches_granted() {
        let (store, _) = memory_store();
        store.ensure_initialized(KEY).unwrap();

        let record = store.record_loot_metadata(KEY, "Alice", 20).unwrap();
        assert!(!record.granted);
        assert_eq!(record.granted_at, 20);

        store.record_grant(KEY, "Bob", 30, false).unwrap();
        let record = store.record_loot_metadata(KEY, "Alice", 40).unwrap();
        assert!(record.granted);
        assert_eq!(record.last_actor.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_empty_actor_is_stored_as_none() {
        let (store, _) = memory_store();
        store.ensure_initialized(KEY).unwrap();
        let record = store.record_grant(KEY, "", 1, false).unwrap();
        assert_eq!(record.last_actor, None);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (store, _) = memory_store();
        store.ensure_initialized(KEY).unwrap();
        store.record_grant(KEY, "Alice", 50, false).unwrap();

        store.reset(KEY).unwrap();
        assert_eq!(store.load_record(KEY).unwrap(), Some(GateRecord::new(KEY)));
        assert!(!store.load(KEY));
    }

    #[test]
    fn test_load_fails_open() {
        let store = GateStore::new(Arc::new(BrokenBackend));
        assert!(!store.load(KEY));
        assert!(store.load_record(KEY).is_err());
        assert!(store.record_grant(KEY, "Alice", 1, false).is_err());
    }

    #[test]
    fn test_concurrent_grants_stay_granted() {
        let (store, backend) = memory_store();
        store.ensure_initialized(KEY).unwrap();

        std::thread::scope(|scope| {
            for i in 0..16u64 {
                let store = &store;
                scope.spawn(move || {
                    if i % 2 == 0 {
                        store
                            .record_grant(KEY, &format!("killer{}", i), i, false)
                            .unwrap();
                    } else {
                        store
                            .record_loot_metadata(KEY, &format!("looter{}", i), i)
                            .unwrap();
                    }
                });
            }
        });

        let record = store.load_record(KEY).unwrap().unwrap();
        assert!(record.granted);
        assert!(record.last_actor.is_some());
        assert_eq!(backend.len(), 1);
    }
}
