//! Neo4j schema declaration.

use neo4rs::Query;

use crate::client::{GraphClient, Result};

/// Cypher statements for schema initialization.
///
/// The external id index is non-unique, so a duplicated id reaches the
/// resolver as an ambiguous record instead of failing the write.
/// `address` is a plain string property and needs no declaration.
pub const SCHEMA_STATEMENTS: &[&str] =
    &["CREATE INDEX node_external_id IF NOT EXISTS FOR (n:Node) ON (n.id)"];

/// Declare indexes. Safe to run multiple times.
pub async fn initialize_schema(client: &GraphClient) -> Result<()> {
    tracing::info!("Initializing Neo4j schema");

    for statement in SCHEMA_STATEMENTS {
        client.run(Query::new(statement.to_string())).await?;
    }

    tracing::info!(statements = SCHEMA_STATEMENTS.len(), "Neo4j schema initialized");
    Ok(())
}
