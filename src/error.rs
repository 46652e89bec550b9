//! Crate-level error type

use crate::nodes::NodeId;
use std::path::PathBuf;

/// Errors surfaced by configuration, node creation and workflow persistence.
///
/// Probe failures have their own type ([`crate::probe::ProbeError`]) since
/// they never leave the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid workflow document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
