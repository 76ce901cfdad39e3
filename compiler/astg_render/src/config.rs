//! Output settings for one rendering run.

use std::path::{Path, PathBuf};

use crate::names::package_ident;

#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Directory receiving the generated tree.
    pub out_dir: PathBuf,
    /// Go package name of the generated client.
    pub package_name: String,
    /// Go import path of `out_dir`, used to import the `jsonrpc` subpackage.
    pub import_path: String,
    /// Emit `metrics.go` and instrument contracts tagged `@metrics`.
    pub metrics: bool,
    /// Emit `readme.md`.
    pub docs: bool,
    /// Written to `VersionASTg`; empty means the project version.
    pub version: String,
}

impl RenderConfig {
    /// Settings for `out_dir` with the package named after its last element.
    pub fn new(out_dir: impl Into<PathBuf>, import_path: impl Into<String>) -> Self {
        let out_dir = out_dir.into();
        let package_name = package_ident(
            out_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .as_deref()
                .unwrap_or("client"),
        );
        RenderConfig {
            out_dir,
            package_name,
            import_path: import_path.into(),
            metrics: true,
            docs: true,
            version: String::new(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Import path of the generated JSON-RPC subpackage.
    pub fn jsonrpc_import(&self) -> String {
        if self.import_path.is_empty() {
            "jsonrpc".to_string()
        } else {
            format!("{}/jsonrpc", self.import_path.trim_end_matches('/'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_name_follows_out_dir() {
        let config = RenderConfig::new("/tmp/gen/users-client", "example.com/app/gen/users-client");
        assert_eq!(config.package_name, "usersclient");
        assert_eq!(config.jsonrpc_import(), "example.com/app/gen/users-client/jsonrpc");
        assert!(config.metrics && config.docs);
    }
}
