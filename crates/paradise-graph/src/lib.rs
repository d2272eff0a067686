//! Paradise Graph: Neo4j client for the leak relationship graph.
//!
//! This crate is the single mutation point for the graph. Node and edge
//! writes, external id resolution, and shortest-path traversal all flow
//! through the [`GraphStore`] seam so callers never depend on the store's
//! storage layout, only on its query/mutate contract.

pub mod client;
pub mod memory;
pub mod mutations;
pub mod queries;
pub mod resolve;
pub mod retry;
pub mod schema;
pub mod store;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use mutations::{MaterializeMode, MutationTarget, NodeMutation, RelationMutation};
pub use queries::PathReply;
pub use resolve::Resolver;
pub use retry::RetryPolicy;
pub use store::GraphStore;
