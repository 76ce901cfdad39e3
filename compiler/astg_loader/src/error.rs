//! Resolution and loading errors.

use std::path::PathBuf;

use astg_syntax::SyntaxError;
use thiserror::Error;

/// A package path could not be mapped to sources.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("package {pkg_path:?} not found")]
    NotFound { pkg_path: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("go.mod line {line}: {message}")]
    GoMod { line: usize, message: String },
}

impl ResolveError {
    pub fn not_found(pkg_path: &str) -> Self {
        ResolveError::NotFound {
            pkg_path: pkg_path.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResolveError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A package or one of its declarations could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("package {pkg_path:?}: {message}")]
    TypeCheck { pkg_path: String, message: String },

    #[error("type {name:?} not declared in package {pkg_path:?}")]
    UnknownType { pkg_path: String, name: String },

    #[error("function {name:?} not declared in package {pkg_path:?}")]
    UnknownFunc { pkg_path: String, name: String },
}

impl LoadError {
    /// Whether the error means the package itself is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Resolve(ResolveError::NotFound { .. }))
    }
}

pub type Result<T, E = LoadError> = std::result::Result<T, E>;
