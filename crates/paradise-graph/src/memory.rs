//! In-memory implementation of [`GraphStore`].
//!
//! Mirrors the write semantics of the Neo4j client (create / update by
//! handle / merge on external id, deduplicated edges) so the ingestion and
//! query layers can be exercised without a database. Path search is a plain
//! breadth-first walk meant for test-sized graphs.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use paradise_core::{ExternalId, NodeHandle, NodeKind, RelationKind};

use crate::client::{GraphError, Result};
use crate::mutations::{MutationTarget, NodeMutation, RelationMutation};
use crate::queries::PathReply;
use crate::store::GraphStore;

/// A stored node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNode {
    pub id: ExternalId,
    pub kind: NodeKind,
    pub properties: BTreeMap<String, String>,
}

#[derive(Default)]
struct State {
    nodes: HashMap<NodeHandle, MemoryNode>,
    edges: HashSet<(NodeHandle, RelationKind, NodeHandle)>,
}

#[derive(Default)]
pub struct MemoryGraph {
    state: RwLock<State>,
    next_handle: AtomicU64,
    lookups: AtomicUsize,
    writes: AtomicUsize,
    failing_reads: AtomicU32,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` reads fail with a transport error.
    pub fn fail_next_reads(&self, n: u32) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    /// External id lookups served so far, failed ones included.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Committed mutations so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn node_count(&self) -> usize {
        self.state.read().await.nodes.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.state.read().await.edges.len()
    }

    /// All nodes carrying external id `id`.
    pub async fn nodes_with_id(&self, id: ExternalId) -> Vec<MemoryNode> {
        self.state
            .read()
            .await
            .nodes
            .values()
            .filter(|n| n.id == id)
            .cloned()
            .collect()
    }

    /// Whether an edge `src -[kind]-> dst` exists between the given external ids.
    pub async fn has_edge(&self, src: ExternalId, kind: RelationKind, dst: ExternalId) -> bool {
        let state = self.state.read().await;
        state.edges.iter().any(|(a, k, b)| {
            *k == kind
                && state.nodes.get(a).map(|n| n.id) == Some(src)
                && state.nodes.get(b).map(|n| n.id) == Some(dst)
        })
    }

    fn take_read_failure(&self) -> Result<()> {
        let injected = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(GraphError::Connection("injected read failure".to_string()));
        }
        Ok(())
    }

    fn allocate(&self) -> NodeHandle {
        let n = self.next_handle.fetch_add(1, Ordering::SeqCst);
        NodeHandle(format!("mem:{n}"))
    }
}

fn apply(node: &mut MemoryNode, mutation: &NodeMutation) {
    node.id = mutation.id;
    node.kind = mutation.kind;
    for (k, v) in &mutation.properties {
        node.properties.insert((*k).to_string(), v.clone());
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn find_handles(&self, id: ExternalId) -> Result<Vec<NodeHandle>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.take_read_failure()?;

        let state = self.state.read().await;
        let mut handles: Vec<NodeHandle> = state
            .nodes
            .iter()
            .filter(|(_, n)| n.id == id)
            .map(|(h, _)| h.clone())
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(handles)
    }

    async fn materialize(&self, mutation: &NodeMutation) -> Result<NodeHandle> {
        let mut state = self.state.write().await;

        let existing = match &mutation.target {
            MutationTarget::Create => None,
            MutationTarget::Handle(handle) => {
                if !state.nodes.contains_key(handle) {
                    return Err(GraphError::HandleNotFound {
                        handle: handle.clone(),
                    });
                }
                Some(handle.clone())
            }
            MutationTarget::ExternalId => state
                .nodes
                .iter()
                .find(|(_, n)| n.id == mutation.id)
                .map(|(h, _)| h.clone()),
        };

        let handle = existing.unwrap_or_else(|| self.allocate());
        let node = state.nodes.entry(handle.clone()).or_insert_with(|| MemoryNode {
            id: mutation.id,
            kind: mutation.kind,
            properties: BTreeMap::new(),
        });
        apply(node, mutation);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    async fn relate(&self, mutation: &RelationMutation) -> Result<()> {
        let mut state = self.state.write().await;
        for handle in [&mutation.src, &mutation.dst] {
            if !state.nodes.contains_key(handle) {
                return Err(GraphError::HandleNotFound {
                    handle: handle.clone(),
                });
            }
        }
        state
            .edges
            .insert((mutation.src.clone(), mutation.kind, mutation.dst.clone()));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn shortest_path(
        &self,
        from: &NodeHandle,
        to: &NodeHandle,
        predicates: &[RelationKind],
    ) -> Result<PathReply> {
        self.take_read_failure()?;
        let state = self.state.read().await;
        for handle in [from, to] {
            if !state.nodes.contains_key(handle) {
                return Err(GraphError::HandleNotFound {
                    handle: handle.clone(),
                });
            }
        }

        let mut adjacency: HashMap<&NodeHandle, Vec<&NodeHandle>> = HashMap::new();
        for (a, kind, b) in &state.edges {
            if predicates.contains(kind) {
                adjacency.entry(a).or_default().push(b);
                adjacency.entry(b).or_default().push(a);
            }
        }

        let mut parent: HashMap<&NodeHandle, &NodeHandle> = HashMap::new();
        let mut seen: HashSet<&NodeHandle> = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);
        let mut found = from == to;

        while let Some(current) = queue.pop_front() {
            if found {
                break;
            }
            for &next in adjacency.get(current).into_iter().flatten() {
                if seen.insert(next) {
                    parent.insert(next, current);
                    if next == to {
                        found = true;
                        break;
                    }
                    queue.push_back(next);
                }
            }
        }

        if !found {
            return Ok(PathReply::default());
        }

        let mut path = vec![state.nodes[to].id];
        let mut cursor = to;
        while let Some(prev) = parent.get(cursor) {
            path.push(state.nodes[*prev].id);
            cursor = *prev;
        }
        path.reverse();

        Ok(PathReply {
            path,
            traversal_ns: 0,
        })
    }

    async fn apply_schema(&self) -> Result<()> {
        Ok(())
    }
}
