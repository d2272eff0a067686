//! Write operations for the relationship graph.
//!
//! Mutations are built as plain values first so their shape can be checked
//! without a database, then submitted as a single auto-commit statement.
//! Nodes are identified by their store handle or, when merging, by their
//! external id.

use neo4rs::{query, Query};

use paradise_core::{EntityRecord, ExternalId, NodeHandle, NodeKind, RelationKind};

use crate::client::{GraphClient, GraphError, Result};

/// Shared label carried by every materialized node.
pub const NODE_LABEL: &str = "Node";

/// How a record without a handle is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterializeMode {
    /// Always allocate a new node.
    #[default]
    Create,
    /// Let the store upsert on the external id.
    MergeOnExternalId,
}

/// Which node a [`NodeMutation`] writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationTarget {
    Create,
    Handle(NodeHandle),
    ExternalId,
}

/// A partial node document: only attributes that are set are carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMutation {
    pub target: MutationTarget,
    pub id: ExternalId,
    pub kind: NodeKind,
    pub properties: Vec<(&'static str, String)>,
}

impl NodeMutation {
    pub fn from_record(record: &EntityRecord, mode: MaterializeMode) -> Self {
        let target = match (&record.handle, mode) {
            (Some(handle), _) => MutationTarget::Handle(handle.clone()),
            (None, MaterializeMode::Create) => MutationTarget::Create,
            (None, MaterializeMode::MergeOnExternalId) => MutationTarget::ExternalId,
        };
        let properties = record
            .attributes
            .present()
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();

        Self {
            target,
            id: record.id,
            kind: record.kind,
            properties,
        }
    }

    /// Render the Cypher statement. Property names come from a fixed set, so
    /// interpolating them is safe; values always travel as parameters.
    pub fn to_cypher(&self) -> String {
        let label = self.kind.label();
        let mut assignments = vec!["n.id = $id".to_string()];
        assignments.extend(
            self.properties
                .iter()
                .map(|(k, _)| format!("n.`{k}` = $p_{k}")),
        );
        let set = assignments.join(", ");

        match self.target {
            MutationTarget::Create => format!(
                "CREATE (n:{NODE_LABEL}:{label})
                 SET {set}
                 RETURN elementId(n) AS handle"
            ),
            MutationTarget::Handle(_) => format!(
                "MATCH (n) WHERE elementId(n) = $handle
                 SET n:{NODE_LABEL}:{label}, {set}
                 RETURN elementId(n) AS handle"
            ),
            MutationTarget::ExternalId => format!(
                "MERGE (n:{NODE_LABEL} {{id: $id}})
                 SET n:{label}, {set}
                 RETURN elementId(n) AS handle"
            ),
        }
    }

    pub fn to_query(&self) -> Query {
        let mut q = query(&self.to_cypher()).param("id", self.id.0);
        if let MutationTarget::Handle(handle) = &self.target {
            q = q.param("handle", handle.0.clone());
        }
        for (k, v) in &self.properties {
            q = q.param(&format!("p_{k}"), v.clone());
        }
        q
    }
}

/// A single typed edge `src -[kind]-> dst` between resolved nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMutation {
    pub kind: RelationKind,
    pub src: NodeHandle,
    pub dst: NodeHandle,
}

impl RelationMutation {
    pub fn new(kind: RelationKind, src: NodeHandle, dst: NodeHandle) -> Self {
        Self { kind, src, dst }
    }

    /// Build from a raw source tag. Tags outside the closed set are rejected
    /// instead of producing an empty write.
    pub fn from_tag(tag: &str, src: NodeHandle, dst: NodeHandle) -> Result<Self> {
        let kind = tag
            .parse::<RelationKind>()
            .map_err(|_| GraphError::UnknownRelationType(tag.to_string()))?;
        Ok(Self::new(kind, src, dst))
    }

    /// MERGE keeps a resubmitted relation from creating a parallel edge.
    pub fn to_cypher(&self) -> String {
        let rel_type = self.kind.cypher_type();
        format!(
            "MATCH (a) WHERE elementId(a) = $src
             MATCH (b) WHERE elementId(b) = $dst
             MERGE (a)-[r:{rel_type}]->(b)
             RETURN count(r) AS cnt"
        )
    }

    pub fn to_query(&self) -> Query {
        query(&self.to_cypher())
            .param("src", self.src.0.clone())
            .param("dst", self.dst.0.clone())
    }
}

impl GraphClient {
    // ── Node Writes ──────────────────────────────────────────────

    /// Create or update one node and return its handle.
    pub async fn materialize_node(&self, mutation: &NodeMutation) -> Result<NodeHandle> {
        match self.query_one(mutation.to_query()).await? {
            Some(row) => row
                .get::<String>("handle")
                .map(NodeHandle)
                .map_err(|e| GraphError::Decode(format!("handle: {e}"))),
            None => match &mutation.target {
                MutationTarget::Handle(handle) => Err(GraphError::HandleNotFound {
                    handle: handle.clone(),
                }),
                _ => Err(GraphError::Decode(format!(
                    "write for external id {} returned no row",
                    mutation.id
                ))),
            },
        }
    }

    // ── Edge Writes ──────────────────────────────────────────────

    /// Create the typed edge if it does not exist yet.
    pub async fn relate_nodes(&self, mutation: &RelationMutation) -> Result<()> {
        let written = match self.query_one(mutation.to_query()).await? {
            Some(row) => row.get::<i64>("cnt").unwrap_or(0),
            None => 0,
        };
        if written == 0 {
            // One of the endpoints vanished between resolution and write.
            return Err(GraphError::HandleNotFound {
                handle: mutation.src.clone(),
            });
        }
        Ok(())
    }
}
