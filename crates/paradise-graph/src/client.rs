//! Neo4j connection management and shared graph client.

use std::future::Future;
use std::time::Duration;

use neo4rs::{ConfigBuilder, Graph, Query};
use paradise_core::{ExternalId, NodeHandle};
use serde::Deserialize;

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Neo4j round trip exceeded {seconds}s deadline")]
    Timeout { seconds: u64 },

    #[error("No node with external id {id}")]
    NotFound { id: ExternalId },

    #[error("External id {id} matches {matches} nodes, expected exactly one")]
    AmbiguousRecord { id: ExternalId, matches: usize },

    #[error("No node with handle {handle}")]
    HandleNotFound { handle: NodeHandle },

    #[error("Unknown relation type: {0:?}")]
    UnknownRelationType(String),

    #[error("Failed to decode store response: {0}")]
    Decode(String),
}

impl GraphError {
    /// Transport-level failures that an idempotent read may retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Query(_) | Self::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Configuration for connecting to Neo4j.
///
/// Loaded from the `[neo4j]` section or `PARADISE__NEO4J__*` variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
    /// Deadline applied to every store round trip.
    pub query_timeout_secs: u64,
    /// Extra attempts for idempotent reads after a transport failure.
    pub read_retries: u32,
    pub retry_backoff_ms: u64,
    /// Entries kept by the external id resolver cache. 0 disables caching.
    pub resolver_cache_capacity: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "paradise-dev".to_string(),
            max_connections: 16,
            fetch_size: 256,
            query_timeout_secs: 30,
            read_retries: 2,
            retry_backoff_ms: 100,
            resolver_cache_capacity: 1_000_000,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// This is the single point of access for all graph operations.
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    timeout: Duration,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    ///
    /// neo4rs builds its pool lazily, so a `RETURN 1` ping forces the Bolt
    /// handshake and surfaces bad credentials here instead of on first use.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let client = Self {
            graph,
            timeout: Duration::from_secs(config.query_timeout_secs.max(1)),
        };
        client
            .run(Query::new("RETURN 1".to_string()))
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(client)
    }

    /// Execute a write-only query (CREATE, MERGE, DELETE, SET).
    pub async fn run(&self, query: Query) -> Result<()> {
        self.deadline(async {
            self.graph.run(query).await?;
            Ok(())
        })
        .await
    }

    /// Execute a query and collect all rows.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>> {
        self.deadline(async {
            let mut stream = self.graph.execute(query).await?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next().await? {
                rows.push(row);
            }
            Ok(rows)
        })
        .await
    }

    /// Execute a query and return the first row, if any.
    pub async fn query_one(&self, query: Query) -> Result<Option<neo4rs::Row>> {
        self.deadline(async {
            let mut stream = self.graph.execute(query).await?;
            Ok(stream.next().await?)
        })
        .await
    }

    async fn deadline<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(GraphError::Timeout {
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}
