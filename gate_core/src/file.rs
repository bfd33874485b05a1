use crate::backend::GateBackend;
use crate::record::GateRecord;
use crate::StoreError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Backend keeping every gate record in a single JSON document.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the
/// original, so a crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

type Document = BTreeMap<String, GateRecord>;

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileBackend {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, StoreError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| StoreError::Io {
            error: e,
            path: self.path.clone(),
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::Json {
            error: e,
            path: self.path.clone(),
        })
    }

    fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(document).map_err(|e| StoreError::Json {
            error: e,
            path: self.path.clone(),
        })?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content).map_err(|e| StoreError::Io {
            error: e,
            path: tmp.clone(),
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::Io {
            error: e,
            path: self.path.clone(),
        })
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Document) -> T) -> Result<T, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Poisoned("json file backend"))?;
        let mut document = self.read_document()?;
        let out = f(&mut document);
        self.write_document(&document)?;
        Ok(out)
    }
}

impl GateBackend for JsonFileBackend {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Poisoned("json file backend"))?;
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                    error: e,
                    path: parent.to_path_buf(),
                })?;
            }
        }
        self.write_document(&Document::new())
    }

    fn get(&self, key: &str) -> Result<Option<GateRecord>, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Poisoned("json file backend"))?;
        Ok(self.read_document()?.remove(key))
    }

    fn insert_if_absent(&self, record: &GateRecord) -> Result<bool, StoreError> {
        self.modify(|document| {
            if document.contains_key(&record.key) {
                false
            } else {
                document.insert(record.key.clone(), record.clone());
                true
            }
        })
    }

    fn upsert(&self, record: &GateRecord) -> Result<(), StoreError> {
        self.modify(|document| {
            document.insert(record.key.clone(), record.clone());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_schema_creates_empty_document() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("state/gates.json"));
        backend.ensure_schema().unwrap();
        assert!(backend.path().exists());
        assert!(backend.get("gate").unwrap().is_none());
    }

    #[test]
    fn test_ensure_schema_keeps_existing_data() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("gates.json"));
        backend.ensure_schema().unwrap();
        backend.insert_if_absent(&GateRecord::new("gate")).unwrap();

        backend.ensure_schema().unwrap();
        assert!(backend.get("gate").unwrap().is_some());
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gates.json");

        let backend = JsonFileBackend::new(&path);
        backend.ensure_schema().unwrap();
        let mut record = GateRecord::new("gate");
        record.granted = true;
        record.granted_at = 99;
        backend.upsert(&record).unwrap();

        let reopened = JsonFileBackend::new(&path);
        assert_eq!(reopened.get("gate").unwrap(), Some(record));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("missing.json"));
        assert!(matches!(backend.get("gate"), Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_garbage_file_is_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gates.json");
        std::fs::write(&path, "not json").unwrap();
        let backend = JsonFileBackend::new(&path);
        assert!(matches!(backend.get("gate"), Err(StoreError::Json { .. })));
    }
}
