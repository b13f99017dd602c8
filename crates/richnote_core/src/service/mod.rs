//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Keep session and CLI layers decoupled from storage details.

pub mod persistence_gateway;
