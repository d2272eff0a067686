//! The ingestion orchestrator.
//!
//! Walks the node tables, then the edges table, one row at a time:
//! parse the row, build its mutation, submit it, move on. There is no
//! batching and no multi-row transaction; each accepted row is exactly one
//! committed write. Mutations are never retried.

use std::sync::Arc;
use std::time::Instant;

use paradise_core::NodeKind;
use paradise_graph::{GraphStore, MaterializeMode, NodeMutation, RelationMutation, Resolver};

use crate::config::{ErrorPolicy, IngestConfig};
use crate::error::{IngestError, Result};
use crate::parse::{parse_entity, parse_relation};
use crate::source::{Row, RowSource};

/// Which tables one run reads, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestPlan {
    pub node_tables: Vec<(String, NodeKind)>,
    pub edges_table: Option<String>,
}

impl Default for IngestPlan {
    fn default() -> Self {
        Self {
            node_tables: NodeKind::ALL
                .iter()
                .map(|k| (k.table().to_string(), *k))
                .collect(),
            edges_table: Some("edges".to_string()),
        }
    }
}

impl IngestPlan {
    /// Build the plan from config. Node tables must be named `<prefix>.<kind>`.
    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        let node_tables = config
            .node_tables
            .iter()
            .map(|table| {
                NodeKind::from_table(table)
                    .map(|kind| (table.clone(), kind))
                    .ok_or_else(|| {
                        IngestError::Config(format!(
                            "cannot infer node kind of table {table:?}"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            node_tables,
            edges_table: Some(config.edges_table.clone()).filter(|t| !t.is_empty()),
        })
    }

    /// Keep only the named tables.
    pub fn retain(mut self, tables: &[String]) -> Self {
        self.node_tables.retain(|(t, _)| tables.contains(t));
        self.edges_table = self.edges_table.filter(|t| tables.contains(t));
        self
    }
}

/// A row that was skipped under [`ErrorPolicy::Isolate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// 1-based position of the row in its table.
    pub row: u64,
    pub reason: String,
}

/// Outcome of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    pub rows_read: u64,
    pub rows_written: u64,
    pub failures: Vec<RowFailure>,
}

impl TableReport {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub tables: Vec<TableReport>,
}

impl IngestReport {
    pub fn rows_written(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_written).sum()
    }

    pub fn failures(&self) -> usize {
        self.tables.iter().map(|t| t.failures.len()).sum()
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }
}

pub struct Ingestor {
    store: Arc<dyn GraphStore>,
    resolver: Resolver,
    policy: ErrorPolicy,
    mode: MaterializeMode,
}

impl Ingestor {
    /// Writes go to the resolver's store.
    pub fn new(resolver: Resolver) -> Self {
        Self {
            store: resolver.store().clone(),
            resolver,
            policy: ErrorPolicy::default(),
            mode: MaterializeMode::default(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_mode(mut self, mode: MaterializeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Ingest every table of `plan`, node tables first.
    pub async fn run(&self, source: &dyn RowSource, plan: &IngestPlan) -> Result<IngestReport> {
        let start = Instant::now();
        let mut report = IngestReport::default();

        for (table, kind) in &plan.node_tables {
            report
                .tables
                .push(self.ingest_node_table(source, table, *kind).await?);
        }
        if let Some(edges) = &plan.edges_table {
            report.tables.push(self.ingest_edges(source, edges).await?);
        }

        tracing::info!(
            tables = report.tables.len(),
            rows_written = report.rows_written(),
            failures = report.failures(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Ingestion complete"
        );
        Ok(report)
    }

    /// Materialize every row of one node table.
    pub async fn ingest_node_table(
        &self,
        source: &dyn RowSource,
        table: &str,
        kind: NodeKind,
    ) -> Result<TableReport> {
        tracing::info!(table, kind = kind.label(), "Ingesting node table");
        let mut report = TableReport::new(table);
        let mut rows = source.scan(table);

        while let Some(row) = rows.next().await {
            let row = row?;
            report.rows_read += 1;
            let outcome = self.materialize_row(&row, kind).await;
            self.settle(&mut report, outcome)?;
        }

        log_table(&report);
        Ok(report)
    }

    /// Resolve both endpoints of every edge row and write the edge.
    pub async fn ingest_edges(&self, source: &dyn RowSource, table: &str) -> Result<TableReport> {
        tracing::info!(table, "Ingesting edges");
        let mut report = TableReport::new(table);
        let mut rows = source.scan(table);

        while let Some(row) = rows.next().await {
            let row = row?;
            report.rows_read += 1;
            let outcome = self.relate_row(&row).await;
            self.settle(&mut report, outcome)?;
        }

        log_table(&report);
        Ok(report)
    }

    async fn materialize_row(&self, row: &Row, kind: NodeKind) -> Result<()> {
        let record = parse_entity(row, kind)?;
        let mutation = NodeMutation::from_record(&record, self.mode);
        let handle = self.store.materialize(&mutation).await?;
        tracing::trace!(id = %record.id, %handle, "Node materialized");
        Ok(())
    }

    async fn relate_row(&self, row: &Row) -> Result<()> {
        let record = parse_relation(row)?;
        let src = self.resolver.resolve(record.node1).await?;
        let dst = self.resolver.resolve(record.node2).await?;
        let mutation = RelationMutation::from_tag(&record.rel_type, src, dst)?;
        self.store.relate(&mutation).await?;
        tracing::trace!(
            edge = record.edge_id,
            from = %record.node1,
            to = %record.node2,
            kind = %mutation.kind,
            "Edge written"
        );
        Ok(())
    }

    /// Apply the error policy to the outcome of the row just read.
    fn settle(&self, report: &mut TableReport, outcome: Result<()>) -> Result<()> {
        let row = report.rows_read;
        let Err(e) = outcome else {
            report.rows_written += 1;
            return Ok(());
        };

        match self.policy {
            ErrorPolicy::FailFast => {
                tracing::error!(table = %report.table, row, error = %e, "Row failed, aborting");
                Err(IngestError::Aborted {
                    table: report.table.clone(),
                    row,
                    source: Box::new(e),
                })
            }
            ErrorPolicy::Isolate => {
                tracing::warn!(table = %report.table, row, error = %e, "Row failed, skipping");
                report.failures.push(RowFailure {
                    row,
                    reason: e.to_string(),
                });
                Ok(())
            }
        }
    }
}

fn log_table(report: &TableReport) {
    tracing::info!(
        table = %report.table,
        rows_read = report.rows_read,
        rows_written = report.rows_written,
        failures = report.failures.len(),
        "Table ingested"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use paradise_core::{ExternalId, RelationKind};
    use paradise_graph::memory::MemoryGraph;
    use paradise_graph::GraphError;
    use rusqlite::Connection;

    use crate::source::SqliteSource;

    const ENTITY_DDL: &str = "(labels TEXT, valid_until TEXT, country_codes TEXT, \
        countries TEXT, node_id INTEGER, sourceID TEXT, address TEXT, name TEXT, \
        jurisdiction_description TEXT, service_provider TEXT, jurisdiction TEXT, \
        closed_date TEXT, incorporation_date TEXT, ibcRUC TEXT, type TEXT, status TEXT, \
        company_type TEXT, note TEXT)";

    struct Fixture {
        _file: tempfile::NamedTempFile,
        source: SqliteSource,
    }

    /// A leak database with all five node tables, seeded by `sql`.
    fn fixture(sql: &str) -> Fixture {
        let file = tempfile::NamedTempFile::new().unwrap();
        let conn = Connection::open(file.path()).unwrap();
        for kind in NodeKind::ALL {
            conn.execute_batch(&format!("CREATE TABLE \"{}\" {ENTITY_DDL};", kind.table()))
                .unwrap();
        }
        conn.execute_batch(
            "CREATE TABLE edges (id INTEGER, node1 INTEGER, node2 INTEGER, rel_type TEXT);",
        )
        .unwrap();
        conn.execute_batch(sql).unwrap();
        Fixture {
            source: SqliteSource::new(file.path()),
            _file: file,
        }
    }

    fn entity(table: &str, id: i64, name: &str, jurisdiction: &str) -> String {
        format!(
            "INSERT INTO \"{table}\" (node_id, name, jurisdiction) \
             VALUES ({id}, '{name}', '{jurisdiction}');"
        )
    }

    fn edge(id: i64, a: i64, b: i64, tag: &str) -> String {
        format!("INSERT INTO edges VALUES ({id}, {a}, {b}, '{tag}');")
    }

    fn ingestor(graph: &Arc<MemoryGraph>) -> Ingestor {
        Ingestor::new(Resolver::new(graph.clone()))
    }

    #[tokio::test]
    async fn entity_and_officer_edge_land_in_the_graph() {
        let fx = fixture(&[
            entity("nodes.entity", 101, "Acme Corp", "BVI"),
            entity("nodes.officer", 202, "J. Smith", ""),
            edge(1, 101, 202, "officer_of"),
        ]
        .concat());
        let graph = Arc::new(MemoryGraph::new());

        let report = ingestor(&graph)
            .run(&fx.source, &IngestPlan::default())
            .await
            .unwrap();

        assert_eq!(report.tables.len(), 6);
        assert_eq!(report.rows_written(), 3);
        assert_eq!(report.failures(), 0);

        let acme = graph.nodes_with_id(ExternalId(101)).await;
        assert_eq!(acme.len(), 1);
        assert_eq!(acme[0].kind, NodeKind::Entity);
        assert_eq!(acme[0].properties["name"], "Acme Corp");
        assert_eq!(acme[0].properties["jurisdiction"], "BVI");

        let smith = graph.nodes_with_id(ExternalId(202)).await;
        assert!(!smith[0].properties.contains_key("jurisdiction"));

        assert!(
            graph
                .has_edge(ExternalId(101), RelationKind::OfficerOf, ExternalId(202))
                .await
        );
        assert_eq!(graph.edge_count().await, 1);
    }

    #[tokio::test]
    async fn fail_fast_aborts_on_first_bad_row() {
        let fx = fixture(&[
            entity("nodes.entity", 1, "a", "x"),
            edge(1, 1, 999, "officer_of"),
            edge(2, 1, 1, "same_name_as"),
        ]
        .concat());
        let graph = Arc::new(MemoryGraph::new());

        let err = ingestor(&graph)
            .run(&fx.source, &IngestPlan::default())
            .await
            .unwrap_err();

        match err {
            IngestError::Aborted { table, row, source } => {
                assert_eq!(table, "edges");
                assert_eq!(row, 1);
                assert!(matches!(
                    *source,
                    IngestError::Graph(GraphError::NotFound { .. })
                ));
            }
            other => panic!("expected abort, got {other:?}"),
        }
        assert_eq!(graph.edge_count().await, 0);
    }

    #[tokio::test]
    async fn isolate_records_failures_and_continues() {
        let fx = fixture(&[
            entity("nodes.entity", 1, "a", "x"),
            entity("nodes.entity", 2, "b", "y"),
            "INSERT INTO \"nodes.entity\" (node_id, name) VALUES (NULL, 'no id');".to_string(),
            edge(1, 1, 999, "officer_of"),
            edge(2, 1, 2, "partner_of"),
            edge(3, 1, 2, "connected_to"),
        ]
        .concat());
        let graph = Arc::new(MemoryGraph::new());

        let report = ingestor(&graph)
            .with_policy(ErrorPolicy::Isolate)
            .run(&fx.source, &IngestPlan::default())
            .await
            .unwrap();

        let nodes = report.table("nodes.entity").unwrap();
        assert_eq!(nodes.rows_read, 3);
        assert_eq!(nodes.rows_written, 2);
        assert_eq!(nodes.failures[0].row, 3);

        let edges = report.table("edges").unwrap();
        assert_eq!(edges.rows_written, 1);
        let rows: Vec<u64> = edges.failures.iter().map(|f| f.row).collect();
        assert_eq!(rows, vec![1, 2]);
        assert!(edges.failures[1].reason.contains("partner_of"));

        assert!(
            graph
                .has_edge(ExternalId(1), RelationKind::ConnectedTo, ExternalId(2))
                .await
        );
    }

    #[tokio::test]
    async fn duplicate_endpoint_id_fails_the_edge() {
        let fx = fixture(&[
            entity("nodes.entity", 5, "a", "x"),
            entity("nodes.other", 5, "a again", "x"),
            entity("nodes.officer", 6, "b", "y"),
            edge(1, 5, 6, "same_id_as"),
        ]
        .concat());
        let graph = Arc::new(MemoryGraph::new());

        let report = ingestor(&graph)
            .with_policy(ErrorPolicy::Isolate)
            .run(&fx.source, &IngestPlan::default())
            .await
            .unwrap();

        let edges = report.table("edges").unwrap();
        assert_eq!(edges.failures.len(), 1);
        assert!(edges.failures[0].reason.contains("5"));
        assert_eq!(graph.edge_count().await, 0);
    }

    #[tokio::test]
    async fn merge_mode_makes_reruns_idempotent() {
        let fx = fixture(&[
            entity("nodes.entity", 101, "Acme Corp", "BVI"),
            entity("nodes.officer", 202, "J. Smith", "UK"),
            edge(1, 101, 202, "officer_of"),
        ]
        .concat());
        let graph = Arc::new(MemoryGraph::new());
        let ingestor = ingestor(&graph).with_mode(MaterializeMode::MergeOnExternalId);

        ingestor.run(&fx.source, &IngestPlan::default()).await.unwrap();
        ingestor.run(&fx.source, &IngestPlan::default()).await.unwrap();

        assert_eq!(graph.node_count().await, 2);
        assert_eq!(graph.edge_count().await, 1);
    }

    #[tokio::test]
    async fn retained_plan_skips_other_tables() {
        let fx = fixture(&[
            entity("nodes.entity", 1, "a", "x"),
            entity("nodes.officer", 2, "b", "y"),
        ]
        .concat());
        let graph = Arc::new(MemoryGraph::new());
        let plan = IngestPlan::default().retain(&["nodes.officer".to_string()]);

        let report = ingestor(&graph).run(&fx.source, &plan).await.unwrap();
        assert_eq!(report.tables.len(), 1);
        assert!(plan.edges_table.is_none());
        assert_eq!(graph.nodes_with_id(ExternalId(1)).await.len(), 0);
        assert_eq!(graph.nodes_with_id(ExternalId(2)).await.len(), 1);
    }

    #[tokio::test]
    async fn cached_resolver_looks_each_endpoint_up_once() {
        let fx = fixture(&[
            entity("nodes.entity", 1, "a", "x"),
            entity("nodes.entity", 2, "b", "y"),
            edge(1, 1, 2, "connected_to"),
            edge(2, 2, 1, "same_name_as"),
        ]
        .concat());
        let graph = Arc::new(MemoryGraph::new());
        let ingestor = Ingestor::new(Resolver::new(graph.clone()).with_cache(16));

        ingestor.run(&fx.source, &IngestPlan::default()).await.unwrap();
        assert_eq!(graph.lookups(), 2);
        assert_eq!(graph.edge_count().await, 2);
    }

    #[test]
    fn plan_from_config_infers_kinds() {
        let config = IngestConfig {
            node_tables: vec!["leak.officer".into(), "nodes.address".into()],
            ..Default::default()
        };
        let plan = IngestPlan::from_config(&config).unwrap();
        assert_eq!(
            plan.node_tables,
            vec![
                ("leak.officer".to_string(), NodeKind::Officer),
                ("nodes.address".to_string(), NodeKind::Address)
            ]
        );
        assert_eq!(plan.edges_table.as_deref(), Some("edges"));

        let bad = IngestConfig {
            node_tables: vec!["people".into()],
            ..Default::default()
        };
        assert!(matches!(
            IngestPlan::from_config(&bad),
            Err(IngestError::Config(_))
        ));
    }
}
