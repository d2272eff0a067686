//! Read operations: external id lookup and shortest-path traversal.

use std::time::Instant;

use neo4rs::query;

use paradise_core::{ExternalId, NodeHandle, RelationKind};

use crate::client::{GraphClient, GraphError, Result};
use crate::mutations::NODE_LABEL;

/// Decoded traversal response: external ids in path order plus the time the
/// store round trip took.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathReply {
    pub path: Vec<ExternalId>,
    pub traversal_ns: u64,
}

/// Render the shortest-path statement over the given predicates.
///
/// The pattern is undirected; every listed relationship type is traversable.
pub fn shortest_path_cypher(predicates: &[RelationKind]) -> String {
    let types = predicates
        .iter()
        .map(|k| k.cypher_type())
        .collect::<Vec<_>>()
        .join("|");

    format!(
        "MATCH (a) WHERE elementId(a) = $from
         MATCH (b) WHERE elementId(b) = $to
         OPTIONAL MATCH p = shortestPath((a)-[:{types}*]-(b))
         RETURN [n IN nodes(p) | n.id] AS path"
    )
}

/// Turn the raw `path` column into external ids, rejecting nodes that carry
/// no external id.
pub fn decode_path(raw: Option<Vec<Option<i64>>>) -> Result<Vec<ExternalId>> {
    raw.unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(pos, id)| {
            id.map(ExternalId).ok_or_else(|| {
                GraphError::Decode(format!("path node at position {pos} has no external id"))
            })
        })
        .collect()
}

impl GraphClient {
    // ── Single Node Lookups ──────────────────────────────────────

    /// Handles of every node whose external id equals `id`.
    pub async fn find_handles(&self, id: ExternalId) -> Result<Vec<NodeHandle>> {
        let cypher = format!(
            "MATCH (n:{NODE_LABEL} {{id: $id}})
             RETURN elementId(n) AS handle"
        );
        let q = query(&cypher).param("id", id.0);

        let rows = self.query_rows(q).await?;
        let mut handles = Vec::with_capacity(rows.len());
        for row in rows {
            let handle: String = row
                .get("handle")
                .map_err(|e| GraphError::Decode(format!("handle: {e}")))?;
            handles.push(NodeHandle(handle));
        }
        Ok(handles)
    }

    // ── Path Queries ─────────────────────────────────────────────

    /// Shortest path between two materialized nodes.
    ///
    /// An empty path means both nodes exist but are not connected.
    pub async fn find_shortest_path(
        &self,
        from: &NodeHandle,
        to: &NodeHandle,
        predicates: &[RelationKind],
    ) -> Result<PathReply> {
        let q = query(&shortest_path_cypher(predicates))
            .param("from", from.0.clone())
            .param("to", to.0.clone());

        let start = Instant::now();
        let row = self.query_one(q).await?;
        let traversal_ns = start.elapsed().as_nanos() as u64;

        let Some(row) = row else {
            return Err(GraphError::HandleNotFound {
                handle: from.clone(),
            });
        };
        let raw: Option<Vec<Option<i64>>> = row
            .get("path")
            .map_err(|e| GraphError::Decode(format!("path: {e}")))?;

        Ok(PathReply {
            path: decode_path(raw)?,
            traversal_ns,
        })
    }
}
