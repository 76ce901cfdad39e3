//! Analysis of a Go module into a [`astg_ir::Project`].
//!
//! Annotated interfaces of the contracts directory become contracts; the
//! module walk finds their implementations; method bodies and tags yield
//! error types; every type reachable from a contract is converted into the
//! project registry.

mod analyzer;
mod config;
mod contracts;
mod convert;
mod error;
mod errors;
mod expand;
mod git;
mod implements;
mod matching;
mod services;
mod stack;

#[cfg(test)]
mod testutil;

pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, EAGER_INTERFACES};
pub use contracts::{package_dirs, ContractDiscovery};
pub use convert::Converter;
pub use error::{AnalyzeError, Result};
pub use errors::{collect_errors, ErrorClassifier};
pub use expand::{error_roots, Expander};
pub use git::git_info;
pub use implements::InterfaceDetector;
pub use matching::ImplementationMatcher;
pub use services::services;
pub use stack::ensure_sufficient_stack;
