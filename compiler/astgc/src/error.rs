//! Driver errors: one per failed run, naming its cause.

use std::path::PathBuf;

use astg_analyzer::AnalyzeError;
use astg_loader::ResolveError;
use astg_render::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("project document {path}: {source}")]
    Project {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoding the project: {0}")]
    Encode(#[source] serde_json::Error),

    /// The output directory lies outside the module and no import path
    /// was given for it.
    #[error("cannot derive the import path of {out}: it is outside module root {root}; pass --module")]
    ImportPath { out: PathBuf, root: PathBuf },
}

impl DriverError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DriverError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = DriverError> = std::result::Result<T, E>;
