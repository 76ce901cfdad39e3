//! Analysis errors.

use std::path::PathBuf;

use astg_loader::{LoadError, ResolveError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no annotated interfaces found in {dir}")]
    NoContracts { dir: PathBuf },

    /// A TypeID stayed unresolved after one invalidate-and-retry.
    #[error("type {type_id} could not be loaded: {source}")]
    TypeMissing {
        type_id: String,
        #[source]
        source: LoadError,
    },

    #[error("malformed type reference {value:?} in @{tag}")]
    BadReference { tag: String, value: String },

    #[error("computing project marker: {0}")]
    Marker(#[from] serde_json::Error),
}

impl AnalyzeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalyzeError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = AnalyzeError> = std::result::Result<T, E>;
