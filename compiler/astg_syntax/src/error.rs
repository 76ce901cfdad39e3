//! Syntax errors.

use thiserror::Error;

/// A lexing or parsing failure. Lines are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("line {line}: unexpected character {text:?}")]
    UnexpectedChar { line: u32, text: String },

    #[error("line {line}: comment not terminated")]
    UnterminatedComment { line: u32 },

    #[error("line {line}: expected {expected}, found {found}")]
    Expected {
        line: u32,
        expected: String,
        found: String,
    },

    #[error("missing package clause")]
    MissingPackage,

    #[error("malformed build constraint {0:?}")]
    BadConstraint(String),
}

impl SyntaxError {
    #[cold]
    pub fn expected(line: u32, expected: impl Into<String>, found: impl Into<String>) -> Self {
        SyntaxError::Expected {
            line,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyntaxError>;
