//! Snapshot persistence use-cases.
//!
//! # Responsibility
//! - Save the active document under one fixed storage key.
//! - Load it back, falling back to the bundled default document.
//!
//! # Invariants
//! - `load` never fails on missing or malformed data; only store transport
//!   errors surface.
//! - Logs carry metadata only (key, byte length, reason), never content.

use crate::model::default_document::default_document;
use crate::model::document::Document;
use crate::model::snapshot::Snapshot;
use crate::repo::snapshot_repo::{SnapshotStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key of the editor snapshot.
pub const STORAGE_KEY: &str = "content";

/// Why `load` used the bundled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Missing,
    /// Stored payload is not valid JSON or not a valid document.
    Malformed(String),
}

impl FallbackReason {
    fn code(&self) -> &'static str {
        match self {
            Self::Missing => "snapshot_missing",
            Self::Malformed(_) => "snapshot_malformed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    Persisted,
    Default(FallbackReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub document: Document,
    pub source: LoadSource,
}

#[derive(Debug)]
pub enum PersistError {
    Store(StoreError),
    Serialize(serde_json::Error),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize snapshot: {err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<StoreError> for PersistError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Save/load/reset over any `SnapshotStore`.
pub struct PersistenceGateway<S: SnapshotStore> {
    store: S,
    key: String,
}

impl<S: SnapshotStore> PersistenceGateway<S> {
    /// Gateway using [`STORAGE_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Overwrites the stored snapshot with `document`.
    pub fn save(&self, document: &Document) -> Result<(), PersistError> {
        let json = Snapshot::new(document.clone()).to_json()?;
        self.store.write(&self.key, &json)?;
        info!(
            "event=snapshot_save module=persistence status=ok key={} bytes={} nodes={}",
            self.key,
            json.len(),
            document.node_count()
        );
        Ok(())
    }

    /// Stored document, or the bundled default when nothing usable is stored.
    pub fn load(&self) -> Result<LoadOutcome, PersistError> {
        let reason = match self.store.read(&self.key)? {
            None => FallbackReason::Missing,
            Some(json) => match Snapshot::from_json(&json) {
                Ok(snapshot) => {
                    info!(
                        "event=snapshot_load module=persistence status=ok key={} bytes={}",
                        self.key,
                        json.len()
                    );
                    return Ok(LoadOutcome {
                        document: snapshot.document,
                        source: LoadSource::Persisted,
                    });
                }
                Err(err) => FallbackReason::Malformed(err.to_string()),
            },
        };
        warn!(
            "event=snapshot_load module=persistence status=fallback key={} reason={}",
            self.key,
            reason.code()
        );
        Ok(LoadOutcome {
            document: default_document(),
            source: LoadSource::Default(reason),
        })
    }

    /// Deletes the stored snapshot and returns the bundled default.
    pub fn reset(&self) -> Result<Document, PersistError> {
        self.store.delete(&self.key)?;
        info!(
            "event=snapshot_reset module=persistence status=ok key={}",
            self.key
        );
        Ok(default_document())
    }
}
