//! Core of the RichNote editor: document model, schema, editing commands,
//! input dispatch and snapshot persistence.

pub mod command;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod logging;
pub mod model;
pub mod render;
pub mod repo;
pub mod schema;
pub mod service;
pub mod session;

pub use command::{
    has_block, has_mark, is_block_active, is_mark_active, CommandEngine, CommandError,
    CommandOutcome, CommandResult, IndentDirection,
};
pub use config::SessionConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use dispatch::{
    Control, Dispatch, EditorEvent, FileBlob, Key, KeyEvent, Modifiers, TransferEvent,
    TransferKind, TransferPayload,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::default_document::default_document;
pub use model::document::{Document, DocumentError, DocumentResult, Parent};
pub use model::node::{Block, BlockType, Mark, MarkType, Node, NodeKey, Text};
pub use model::selection::{Point, Selection};
pub use model::snapshot::Snapshot;
pub use render::{render_document, HtmlRenderer, Renderer};
pub use repo::snapshot_repo::{
    MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore, StoreError, StoreResult,
};
pub use schema::{Schema, SchemaError, SchemaRule};
pub use service::persistence_gateway::{
    LoadOutcome, LoadSource, PersistError, PersistenceGateway, STORAGE_KEY,
};
pub use session::{EditorSession, SessionError, SessionResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
