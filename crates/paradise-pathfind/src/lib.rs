//! paradise-pathfind: Shortest-path queries over the Paradise graph.
//!
//! Resolves two external ids to store handles, asks the store for the
//! shortest undirected path between them over every relation predicate, and
//! returns the ordered external ids on that path with a latency breakdown.
//! Path search itself runs inside the store's query engine.

pub mod config;
pub mod error;
pub mod server;

pub use error::PathfindError;

use std::sync::Arc;
use std::time::Instant;

use paradise_core::{ExternalId, Latency, NodeHandle, PathResult, RelationKind};
use paradise_graph::retry::with_read_retry;
use paradise_graph::{GraphError, GraphStore, PathReply, Resolver, RetryPolicy};

/// The path query engine. Shared across request handlers.
pub struct PathfindEngine {
    store: Arc<dyn GraphStore>,
    resolver: Resolver,
    retry: RetryPolicy,
}

impl PathfindEngine {
    /// Traversals go to the resolver's store.
    pub fn new(resolver: Resolver) -> Self {
        Self {
            store: resolver.store().clone(),
            resolver,
            retry: RetryPolicy::NONE,
        }
    }

    /// Retry transient traversal failures.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Shortest path between two external ids.
    ///
    /// Either id failing resolution is [`PathfindError::EndpointNotFound`].
    /// Endpoints that exist but are not connected yield an empty path.
    pub async fn shortest_path(&self, from: ExternalId, to: ExternalId) -> error::Result<PathResult> {
        let start = Instant::now();

        let (src, dst) = tokio::join!(self.endpoint(from), self.endpoint(to));
        let (src, dst) = (src?, dst?);
        let resolution_ns = start.elapsed().as_nanos() as u64;

        let reply = if src == dst {
            PathReply {
                path: vec![from],
                traversal_ns: 0,
            }
        } else {
            self.traverse(&src, &dst).await?
        };

        let latency = Latency {
            resolution_ns,
            traversal_ns: reply.traversal_ns,
            total_ns: start.elapsed().as_nanos() as u64,
        };
        tracing::debug!(
            %from,
            %to,
            hops = reply.path.len().saturating_sub(1),
            total_ns = latency.total_ns,
            "Shortest path computed"
        );

        Ok(PathResult {
            path: reply.path,
            latency,
        })
    }

    async fn endpoint(&self, id: ExternalId) -> error::Result<NodeHandle> {
        self.resolver.resolve(id).await.map_err(|e| match e {
            GraphError::NotFound { .. } | GraphError::AmbiguousRecord { .. } => {
                PathfindError::EndpointNotFound {
                    id,
                    reason: e.to_string(),
                }
            }
            other => PathfindError::Graph(other),
        })
    }

    async fn traverse(&self, src: &NodeHandle, dst: &NodeHandle) -> error::Result<PathReply> {
        let reply = with_read_retry(self.retry, "shortest_path", || {
            self.store.shortest_path(src, dst, &RelationKind::ALL)
        })
        .await?;
        Ok(reply)
    }
}
