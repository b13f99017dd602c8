//! Storage contracts and implementations.
//!
//! # Responsibility
//! - Define the raw snapshot storage contract.
//! - Isolate SQLite query details from services.

pub mod snapshot_repo;
