//! Rendering errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::markdown::DocError;

#[derive(Debug, Error)]
pub enum RenderError {
    /// A generated file or directory could not be written.
    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("building documentation: {0}")]
    Doc(#[from] DocError),
}

impl RenderError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RenderError::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
