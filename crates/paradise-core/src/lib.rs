//! paradise-core: Shared types, configuration, and error handling.
//!
//! This crate provides the foundational types used across all Paradise components:
//! - Entity and relation records read from the leak tables
//! - Relation kinds (officer_of, registered_address, ...) for graph edges
//! - External ids, store handles, and path results
//! - Layered configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use error::ParadiseError;
pub use types::{
    EntityAttributes, EntityRecord, ExternalId, Latency, NodeHandle, NodeKind, PathResult,
    RelationKind, RelationRecord,
};
