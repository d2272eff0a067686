//! Core domain types for the offshore-leaks relationship graph.
//!
//! Entities (companies, officers, intermediaries, addresses) are keyed by a
//! source-assigned external id; the graph store hands out its own opaque
//! handle once a node is materialized.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParadiseError;

// ── Identifiers ───────────────────────────────────────────────────

/// Stable, source-assigned integer identifying one entity across systems.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ExternalId(pub i64);

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalId {
    type Err = ParadiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ExternalId)
            .map_err(|e| ParadiseError::Parse {
                reason: format!("invalid external id {s:?}: {e}"),
            })
    }
}

/// The graph store's own identifier for a materialized node. Opaque.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NodeHandle(pub String);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Node Kinds ────────────────────────────────────────────────────

/// Which `nodes.*` source table a record came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Address,
    Entity,
    Intermediary,
    Officer,
    Other,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Address,
        NodeKind::Entity,
        NodeKind::Intermediary,
        NodeKind::Officer,
        NodeKind::Other,
    ];

    /// Graph label applied next to the shared `Node` label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Address => "Address",
            Self::Entity => "Entity",
            Self::Intermediary => "Intermediary",
            Self::Officer => "Officer",
            Self::Other => "Other",
        }
    }

    /// Default source table holding rows of this kind.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Address => "nodes.address",
            Self::Entity => "nodes.entity",
            Self::Intermediary => "nodes.intermediary",
            Self::Officer => "nodes.officer",
            Self::Other => "nodes.other",
        }
    }

    /// Infer the kind from a table name such as `nodes.officer`.
    pub fn from_table(table: &str) -> Option<Self> {
        let suffix = table.rsplit('.').next().unwrap_or(table);
        Self::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(suffix))
    }
}

// ── Relation Kinds ────────────────────────────────────────────────

/// The closed set of relationship predicates between entities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    RegisteredAddress,
    OfficerOf,
    ConnectedTo,
    IntermediaryOf,
    SameNameAs,
    SameIdAs,
}

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        RelationKind::RegisteredAddress,
        RelationKind::OfficerOf,
        RelationKind::ConnectedTo,
        RelationKind::IntermediaryOf,
        RelationKind::SameNameAs,
        RelationKind::SameIdAs,
    ];

    /// The source tag, also used as the predicate name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegisteredAddress => "registered_address",
            Self::OfficerOf => "officer_of",
            Self::ConnectedTo => "connected_to",
            Self::IntermediaryOf => "intermediary_of",
            Self::SameNameAs => "same_name_as",
            Self::SameIdAs => "same_id_as",
        }
    }

    /// Cypher relationship type.
    pub fn cypher_type(&self) -> &'static str {
        match self {
            Self::RegisteredAddress => "REGISTERED_ADDRESS",
            Self::OfficerOf => "OFFICER_OF",
            Self::ConnectedTo => "CONNECTED_TO",
            Self::IntermediaryOf => "INTERMEDIARY_OF",
            Self::SameNameAs => "SAME_NAME_AS",
            Self::SameIdAs => "SAME_ID_AS",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = ParadiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParadiseError::UnknownRelationType(s.to_string()))
    }
}

// ── Records ───────────────────────────────────────────────────────

/// Optional string attributes of an entity row.
///
/// `None` means "not set" and must never be written as an empty value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityAttributes {
    pub labels: Option<String>,
    pub valid_until: Option<String>,
    pub country_codes: Option<String>,
    pub countries: Option<String>,
    pub source_id: Option<String>,
    pub address: Option<String>,
    pub name: Option<String>,
    pub juris_descr: Option<String>,
    pub service_prov: Option<String>,
    pub jurisdiction: Option<String>,
    pub closed_date: Option<String>,
    pub incorp_date: Option<String>,
    pub ibcruc: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub status: Option<String>,
    pub company_type: Option<String>,
    pub note: Option<String>,
}

impl EntityAttributes {
    /// Property names in source column order.
    pub const PROPERTY_NAMES: [&'static str; 17] = [
        "labels",
        "valid_until",
        "country_codes",
        "countries",
        "source_id",
        "address",
        "name",
        "juris_descr",
        "service_prov",
        "jurisdiction",
        "closed_date",
        "incorp_date",
        "ibcruc",
        "type",
        "status",
        "company_type",
        "note",
    ];

    /// All attributes paired with their property names, set or not.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 17] {
        let values = [
            &self.labels,
            &self.valid_until,
            &self.country_codes,
            &self.countries,
            &self.source_id,
            &self.address,
            &self.name,
            &self.juris_descr,
            &self.service_prov,
            &self.jurisdiction,
            &self.closed_date,
            &self.incorp_date,
            &self.ibcruc,
            &self.entity_type,
            &self.status,
            &self.company_type,
            &self.note,
        ];
        let mut out = [("", None); 17];
        for (i, value) in values.into_iter().enumerate() {
            out[i] = (Self::PROPERTY_NAMES[i], value.as_deref());
        }
        out
    }

    /// Only the attributes that are set.
    pub fn present(&self) -> Vec<(&'static str, &str)> {
        self.fields()
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect()
    }

    /// Mutable slot for a property name, in source column order.
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Option<String>> {
        let slot = match index {
            0 => &mut self.labels,
            1 => &mut self.valid_until,
            2 => &mut self.country_codes,
            3 => &mut self.countries,
            4 => &mut self.source_id,
            5 => &mut self.address,
            6 => &mut self.name,
            7 => &mut self.juris_descr,
            8 => &mut self.service_prov,
            9 => &mut self.jurisdiction,
            10 => &mut self.closed_date,
            11 => &mut self.incorp_date,
            12 => &mut self.ibcruc,
            13 => &mut self.entity_type,
            14 => &mut self.status,
            15 => &mut self.company_type,
            16 => &mut self.note,
            _ => return None,
        };
        Some(slot)
    }
}

/// One node of the graph as read from an entity table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityRecord {
    /// Present only once the store has materialized the node.
    pub handle: Option<NodeHandle>,
    pub id: ExternalId,
    pub kind: NodeKind,
    pub attributes: EntityAttributes,
}

impl EntityRecord {
    pub fn new(id: ExternalId, kind: NodeKind) -> Self {
        Self {
            handle: None,
            id,
            kind,
            attributes: EntityAttributes::default(),
        }
    }

    pub fn with_handle(mut self, handle: NodeHandle) -> Self {
        self.handle = Some(handle);
        self
    }
}

/// One row of the edges table. `edge_id` is provenance only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationRecord {
    pub edge_id: i64,
    pub node1: ExternalId,
    pub node2: ExternalId,
    pub rel_type: String,
}

// ── Path Results ──────────────────────────────────────────────────

/// Timing metadata for a path query, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Latency {
    pub resolution_ns: u64,
    pub traversal_ns: u64,
    pub total_ns: u64,
}

/// Ordered external ids on the shortest path plus timing.
///
/// An empty `path` means the endpoints exist but are not connected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathResult {
    pub path: Vec<ExternalId>,
    pub latency: Latency,
}
