//! Doc-comment annotations for astg.
//!
//! Contracts, methods, arguments and the project itself carry `@tag value`
//! lines in their doc comments. This crate parses those lines into an
//! [`Annotations`] map and evaluates tags across nested scopes with
//! [`TagChain`].
//!
//! # Scoping
//!
//! ```text
//! variable ─► method ─► contract ─► project
//! (narrowest)                      (broadest)
//! ```
//!
//! The first scope holding a non-empty value wins. `is_set` stops at the
//! first scope where the tag is *present*, even with an empty value.

mod annotations;
mod chain;
pub mod names;

pub use annotations::{parse_comments, Annotations, ParsedComments};
pub use chain::TagChain;
