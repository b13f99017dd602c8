//! Rich-text document model.
//!
//! # Responsibility
//! - Define the immutable node tree, selection, and persisted snapshot shape.
//! - Provide the bundled default document used when nothing is persisted.
//!
//! # Invariants
//! - Every node is identified by a `NodeKey` unique within its document.
//! - Edits produce new `Document` values and share untouched subtrees.

pub mod default_document;
pub mod document;
pub mod node;
pub mod selection;
pub mod snapshot;
