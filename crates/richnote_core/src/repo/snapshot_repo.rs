//! Key/value snapshot storage.
//!
//! # Responsibility
//! - Store serialized document snapshots under string keys.
//! - Keep SQL details behind the `SnapshotStore` contract.
//!
//! # Invariants
//! - `write` overwrites any previous value for the key wholesale.
//! - `delete` of a missing key is not an error.
//! - `SqliteSnapshotStore` refuses connections whose schema lacks
//!   `kv_snapshots`.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Connection was not bootstrapped through `db::open_db*`.
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "snapshot store requires table `{table}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Raw snapshot persistence contract.
pub trait SnapshotStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;
    fn delete(&self, key: &str) -> StoreResult<()>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).write(key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key)
    }
}

/// SQLite-backed store over the `kv_snapshots` table.
pub struct SqliteSnapshotStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotStore<'conn> {
    /// Wraps a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        if !table_exists(conn, "kv_snapshots")? {
            return Err(StoreError::MissingRequiredTable("kv_snapshots"));
        }
        Ok(Self { conn })
    }

    /// Last write time of `key` in epoch milliseconds.
    pub fn updated_at(&self, key: &str) -> StoreResult<Option<i64>> {
        let updated_at = self
            .conn
            .query_row(
                "SELECT updated_at FROM kv_snapshots WHERE storage_key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated_at)
    }
}

impl SnapshotStore for SqliteSnapshotStore<'_> {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM kv_snapshots WHERE storage_key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_snapshots (storage_key, payload, updated_at)
             VALUES (?1, ?2, CAST(strftime('%s', 'now') AS INTEGER) * 1000)
             ON CONFLICT(storage_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_snapshots WHERE storage_key = ?1;", [key])?;
        Ok(())
    }
}

/// Process-local store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore, StoreError};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;

    #[test]
    fn sqlite_store_overwrites_and_deletes() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteSnapshotStore::try_new(&conn).unwrap();

        assert_eq!(store.read("content").unwrap(), None);
        store.write("content", "{\"a\":1}").unwrap();
        store.write("content", "{\"a\":2}").unwrap();
        assert_eq!(store.read("content").unwrap().as_deref(), Some("{\"a\":2}"));
        assert!(store.updated_at("content").unwrap().is_some());

        store.delete("content").unwrap();
        store.delete("content").unwrap();
        assert_eq!(store.read("content").unwrap(), None);
    }

    #[test]
    fn sqlite_store_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteSnapshotStore::try_new(&conn).err().unwrap();
        assert!(matches!(err, StoreError::MissingRequiredTable("kv_snapshots")));
    }

    #[test]
    fn memory_store_through_reference() {
        let store = MemorySnapshotStore::new();
        let by_ref: &MemorySnapshotStore = &store;
        by_ref.write("k", "v").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.len(), 1);
        by_ref.delete("k").unwrap();
        assert!(store.is_empty());
    }
}
