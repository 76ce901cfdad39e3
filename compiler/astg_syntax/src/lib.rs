//! Go source syntax for the generator.
//!
//! Lexes and parses Go files down to the declaration level: package clause,
//! imports, type and function declarations with their doc comments. Bodies
//! stay as token streams for later scanning.

pub mod ast;
pub mod constraint;
mod error;
mod lexer;
mod parser;
mod token;

pub use constraint::{file_included, BuildTags, Constraint};
pub use error::{Result, SyntaxError};
pub use lexer::{lex, LexOutput};
pub use parser::{parse_file, unquote};
pub use token::{Comment, Span, Token, TokenKind};
