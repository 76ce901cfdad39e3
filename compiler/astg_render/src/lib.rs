//! Go client generation from an analyzed [`astg_ir::Project`].
//!
//! The renderer emits one Go package: a root client with options, one
//! client and one exchange file per contract, DTO declarations, the
//! JSON-RPC transport and batch harness, streaming helpers, Prometheus
//! metrics and a Markdown manual.

mod batch;
mod client;
mod collect;
mod config;
mod context;
mod docs;
mod dto;
mod error;
mod exchange;
mod gotype;
mod jsonrpc;
mod markdown;
mod metrics;
mod multipart;
mod names;
mod plan;
mod renderer;
mod writer;

#[cfg(test)]
mod testutil;

pub use collect::{is_pass_through, CollectedTypes};
pub use config::RenderConfig;
pub use context::RenderContext;
pub use error::{RenderError, Result};
pub use markdown::{anchor, link, DocError, Markdown};
pub use names::{lower_camel, package_ident, rpc_method};
pub use plan::{BodyMode, Codec, MethodPlan, ResponseMode};
pub use renderer::{write_tree, OutputFile, Renderer};
pub use writer::{CodeWriter, GoFile, Imports, GENERATED_HEADER};
