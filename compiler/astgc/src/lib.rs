//! The `astg` driver.
//!
//! Wires module loading, analysis and rendering into the operations the
//! command line exposes: generate a client, dump the analyzed project,
//! and regenerate from a dumped project.

mod cli;
mod config;
mod driver;
mod error;
mod logging;

pub use cli::{run, ClientCmd, Cli, Commands, DumpCmd, ModuleArgs};
pub use config::DriverConfig;
pub use driver::{analyze, analyze_with_env, client, client_from_project, dump, generate, read_project};
pub use error::{DriverError, Result};
pub use logging::{init_tracing, DEFAULT_FILTER};
