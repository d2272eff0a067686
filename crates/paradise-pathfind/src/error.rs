//! Error types for the paradise-pathfind crate.

use paradise_core::ExternalId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathfindError {
    #[error("Endpoint {id} could not be resolved: {reason}")]
    EndpointNotFound { id: ExternalId, reason: String },

    #[error("Graph error: {0}")]
    Graph(#[from] paradise_graph::GraphError),

    #[error("Missing required parameter `{param}`")]
    MissingParameter { param: &'static str },

    #[error("Invalid parameter `{param}`: {reason}")]
    MalformedRequest { param: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, PathfindError>;
