//! The seam between the pipeline and the graph store.
//!
//! Components take an `Arc<dyn GraphStore>` instead of reaching for a global
//! client, so tests can substitute [`crate::memory::MemoryGraph`]. The
//! `Send + Sync` bound is what makes one store instance safe to share across
//! concurrently handled requests.

use async_trait::async_trait;

use paradise_core::{ExternalId, NodeHandle, RelationKind};

use crate::client::{GraphClient, Result};
use crate::mutations::{NodeMutation, RelationMutation};
use crate::queries::PathReply;
use crate::schema;

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Handles of all nodes whose external id equals `id`.
    async fn find_handles(&self, id: ExternalId) -> Result<Vec<NodeHandle>>;

    /// Commit one node mutation and return the node's handle.
    async fn materialize(&self, mutation: &NodeMutation) -> Result<NodeHandle>;

    /// Commit one edge mutation.
    async fn relate(&self, mutation: &RelationMutation) -> Result<()>;

    /// Shortest path between two handles using `predicates` as edges.
    async fn shortest_path(
        &self,
        from: &NodeHandle,
        to: &NodeHandle,
        predicates: &[RelationKind],
    ) -> Result<PathReply>;

    /// Declare indexes needed before ingestion.
    async fn apply_schema(&self) -> Result<()>;
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn find_handles(&self, id: ExternalId) -> Result<Vec<NodeHandle>> {
        GraphClient::find_handles(self, id).await
    }

    async fn materialize(&self, mutation: &NodeMutation) -> Result<NodeHandle> {
        self.materialize_node(mutation).await
    }

    async fn relate(&self, mutation: &RelationMutation) -> Result<()> {
        self.relate_nodes(mutation).await
    }

    async fn shortest_path(
        &self,
        from: &NodeHandle,
        to: &NodeHandle,
        predicates: &[RelationKind],
    ) -> Result<PathReply> {
        self.find_shortest_path(from, to, predicates).await
    }

    async fn apply_schema(&self) -> Result<()> {
        schema::initialize_schema(self).await
    }
}
