//! Tracing setup for the `astg` binary.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn,astgc=info,astg_analyzer=info,astg_render=info";

/// Install the global subscriber. Safe to call more than once.
///
/// `RUST_LOG` selects what is logged. `ASTG_LOG_TREE=1` switches to an
/// indented span tree, useful when following the analysis of one type.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if verbose {
                "info,astgc=debug,astg_analyzer=debug,astg_render=debug"
            } else {
                DEFAULT_FILTER
            })
        });
        let tree = std::env::var("ASTG_LOG_TREE").is_ok_and(|v| v == "1");
        if tree {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_writer(std::io::stderr)
                        .with_targets(true),
                )
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .with(filter)
                .init();
        }
    });
}
