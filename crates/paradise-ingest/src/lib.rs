//! paradise-ingest: Loads offshore-leak tables into the Paradise graph.
//!
//! Streams the `nodes.*` tables and the edges table out of SQLite, turns each
//! row into a node or edge mutation, and submits it through the graph store.
//! Edge endpoints are located by external id via the resolver.

pub mod config;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod source;

pub use config::{ErrorPolicy, IngestConfig};
pub use error::IngestError;
pub use pipeline::{IngestPlan, IngestReport, Ingestor, RowFailure, TableReport};
pub use source::{Cell, RowSource, SqliteSource};
