//! Error types for the paradise-ingest crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Source error: {0}")]
    Source(#[from] rusqlite::Error),

    #[error("Source reader stopped: {0}")]
    SourceWorker(String),

    #[error("{0}")]
    Parse(#[from] paradise_core::ParadiseError),

    #[error("Graph error: {0}")]
    Graph(#[from] paradise_graph::GraphError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Ingestion of {table} aborted at row {row}: {source}")]
    Aborted {
        table: String,
        row: u64,
        #[source]
        source: Box<IngestError>,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;
