use crate::backend::GateBackend;
use crate::record::GateRecord;
use crate::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite backend storing one row per gate key in `mod_geddon_once_drop`
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::sqlite("open", e))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::sqlite("open", e))?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection, e.g. one shared with other tables
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| StoreError::sqlite("busy_timeout", e))?;
        Ok(SqliteBackend {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| StoreError::Poisoned("sqlite connection"))?;
        f(&guard)
    }
}

fn to_sql_time(record: &GateRecord) -> Result<i64, StoreError> {
    i64::try_from(record.granted_at).map_err(|_| StoreError::Corrupt {
        key: record.key.clone(),
        message: format!("timestamp {} exceeds i64 range", record.granted_at),
    })
}

impl GateBackend for SqliteBackend {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS mod_geddon_once_drop (
                    keyname        TEXT    NOT NULL PRIMARY KEY,
                    dropped        INTEGER NOT NULL DEFAULT 0,
                    last_drop_time INTEGER NOT NULL DEFAULT 0,
                    last_killer    TEXT             DEFAULT NULL
                )",
                [],
            )
            .map_err(|e| StoreError::sqlite("create table", e))?;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> Result<Option<GateRecord>, StoreError> {
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT dropped, last_drop_time, last_killer
                 FROM mod_geddon_once_drop WHERE keyname = ?1 LIMIT 1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| StoreError::sqlite("select", e))
        })?;

        let Some((dropped, time, killer)) = row else {
            return Ok(None);
        };

        let granted_at = u64::try_from(time).map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            message: format!("negative timestamp {}", time),
        })?;

        Ok(Some(GateRecord {
            key: key.to_string(),
            granted: dropped != 0,
            granted_at,
            last_actor: killer,
        }))
    }

    fn insert_if_absent(&self, record: &GateRecord) -> Result<bool, StoreError> {
        let time = to_sql_time(record)?;
        self.with_conn(|conn| {
            let inserted = conn
                .execute(
                    "INSERT OR IGNORE INTO mod_geddon_once_drop
                        (keyname, dropped, last_drop_time, last_killer)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![record.key, record.granted, time, record.last_actor],
                )
                .map_err(|e| StoreError::sqlite("insert", e))?;
            Ok(inserted > 0)
        })
    }

    fn upsert(&self, record: &GateRecord) -> Result<(), StoreError> {
        let time = to_sql_time(record)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO mod_geddon_once_drop
                    (keyname, dropped, last_drop_time, last_killer)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(keyname) DO UPDATE SET
                    dropped = excluded.dropped,
                    last_drop_time = excluded.last_drop_time,
                    last_killer = excluded.last_killer",
                params![record.key, record.granted, time, record.last_actor],
            )
            .map_err(|e| StoreError::sqlite("upsert", e))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn granted_record(key: &str, actor: &str) -> GateRecord {
        GateRecord {
            key: key.to_string(),
            granted: true,
            granted_at: 1_700_000_000,
            last_actor: Some(actor.to_string()),
        }
    }

    #[test]
    fn test_ensure_schema_twice() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.ensure_schema().unwrap();
        backend.ensure_schema().unwrap();
        assert!(backend.get("gate").unwrap().is_none());
    }

    #[test]
    fn test_insert_or_ignore() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.ensure_schema().unwrap();

        assert!(backend.insert_if_absent(&GateRecord::new("gate")).unwrap());
        assert!(!backend
            .insert_if_absent(&granted_record("gate", "Alice"))
            .unwrap());
        assert_eq!(backend.get("gate").unwrap(), Some(GateRecord::new("gate")));
    }

    #[test]
    fn test_upsert_round_trip() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.ensure_schema().unwrap();

        let record = granted_record("gate", "Robert'); DROP TABLE mod_geddon_once_drop;--");
        backend.upsert(&record).unwrap();
        assert_eq!(backend.get("gate").unwrap(), Some(record));
    }

    #[test]
    fn test_get_without_schema_fails() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        assert!(matches!(
            backend.get("gate"),
            Err(StoreError::Sqlite { .. })
        ));
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("world.sqlite");

        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.ensure_schema().unwrap();
            backend.upsert(&granted_record("gate", "Alice")).unwrap();
        }

        let backend = SqliteBackend::open(&path).unwrap();
        backend.ensure_schema().unwrap();
        let record = backend.get("gate").unwrap().unwrap();
        assert!(record.granted);
        assert_eq!(record.last_actor.as_deref(), Some("Alice"));
    }
}
