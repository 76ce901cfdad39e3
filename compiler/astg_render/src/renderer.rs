//! Rendering a project into the files of a Go client package.

use std::fs;
use std::path::{Path, PathBuf};

use astg_ir::Project;

use crate::batch::batch_file;
use crate::client::{contract_client_file, root_client_file};
use crate::config::RenderConfig;
use crate::context::RenderContext;
use crate::docs::readme;
use crate::dto::types_file;
use crate::error::{RenderError, Result};
use crate::exchange::exchange_file;
use crate::jsonrpc::jsonrpc_files;
use crate::metrics::{metrics_file, version_file};
use crate::multipart::multipart_file;
use crate::names::file_stem;

/// One generated file, relative to the output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub content: String,
}

impl OutputFile {
    fn new(path: impl Into<PathBuf>, content: String) -> Self {
        OutputFile {
            path: path.into(),
            content,
        }
    }
}

pub struct Renderer<'a> {
    project: &'a Project,
    config: &'a RenderConfig,
}

impl<'a> Renderer<'a> {
    pub fn new(project: &'a Project, config: &'a RenderConfig) -> Self {
        Renderer { project, config }
    }

    /// Every file of the client package, sorted by path.
    #[tracing::instrument(level = "debug", skip_all, fields(package = %self.config.package_name))]
    pub fn render(&self) -> Result<Vec<OutputFile>> {
        let ctx = RenderContext::new(self.project, self.config);
        if ctx.contracts.is_empty() {
            tracing::warn!("no contract carries a transport tag; the client has no methods");
        }

        let mut files = vec![
            OutputFile::new("version.go", version_file(&ctx).finish()),
            OutputFile::new("client.go", root_client_file(&ctx).finish()),
            OutputFile::new("types.go", types_file(&ctx).finish()),
        ];
        for contract in &ctx.contracts {
            let stem = file_stem(&contract.name);
            files.push(OutputFile::new(
                format!("client-{stem}.go"),
                contract_client_file(&ctx, contract).finish(),
            ));
            files.push(OutputFile::new(
                format!("exchange-{stem}.go"),
                exchange_file(&ctx, contract).finish(),
            ));
        }
        if ctx.has_json_rpc() {
            files.push(OutputFile::new("batch.go", batch_file(&ctx).finish()));
            for (name, file) in jsonrpc_files(&ctx) {
                files.push(OutputFile::new(Path::new("jsonrpc").join(name), file.finish()));
            }
        }
        if ctx.has_streams() {
            files.push(OutputFile::new("multipart.go", multipart_file(&ctx).finish()));
        }
        if ctx.has_metrics() {
            files.push(OutputFile::new("metrics.go", metrics_file(&ctx).finish()));
        }
        if self.config.docs {
            files.push(OutputFile::new("readme.md", readme(&ctx)?));
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::info!(
            files = files.len(),
            types = ctx.collected.len(),
            contracts = ctx.contracts.len(),
            "client rendered"
        );
        Ok(files)
    }

    /// Render, then write the tree under the configured output directory.
    pub fn write(&self) -> Result<Vec<OutputFile>> {
        let files = self.render()?;
        write_tree(self.config.out_dir(), &files)?;
        Ok(files)
    }
}

/// Write files under `out_dir`, creating directories as needed. Files
/// already written stay on disk when a later one fails.
pub fn write_tree(out_dir: &Path, files: &[OutputFile]) -> Result<()> {
    for file in files {
        let path = out_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RenderError::write(parent, e))?;
        }
        fs::write(&path, &file.content).map_err(|e| RenderError::write(&path, e))?;
        tracing::debug!(path = %path.display(), bytes = file.content.len(), "file written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::project_with;
    use pretty_assertions::assert_eq;

    fn paths(files: &[OutputFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn json_rpc_project_layout() {
        let project = project_with(&[]);
        let mut config = RenderConfig::new("/out/client", "example.com/app/client");
        config.metrics = false;
        let files = Renderer::new(&project, &config)
            .render()
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            paths(&files),
            vec![
                "batch.go",
                "client-users.go",
                "client.go",
                "exchange-users.go",
                "jsonrpc/client.go",
                "jsonrpc/options.go",
                "jsonrpc/types.go",
                "readme.md",
                "types.go",
                "version.go",
            ]
        );
    }

    #[test]
    fn docs_toggle_and_untagged_contracts() {
        let mut project = project_with(&[]);
        project.contracts[0].annotations = Default::default();
        let mut config = RenderConfig::new("/out/client", "");
        config.docs = false;
        let files = Renderer::new(&project, &config)
            .render()
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(paths(&files), vec!["client.go", "types.go", "version.go"]);
    }

    #[test]
    fn write_tree_creates_subdirectories() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let files = vec![
            OutputFile::new("a.go", "package a\n".to_string()),
            OutputFile::new(Path::new("jsonrpc").join("types.go"), "package jsonrpc\n".to_string()),
        ];
        write_tree(dir.path(), &files).unwrap_or_else(|e| panic!("{e}"));
        let text = fs::read_to_string(dir.path().join("jsonrpc/types.go")).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(text, "package jsonrpc\n");
    }

    #[test]
    fn write_failures_name_the_path() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let blocker = dir.path().join("jsonrpc");
        fs::write(&blocker, "").unwrap_or_else(|e| panic!("{e}"));
        let files = vec![OutputFile::new(Path::new("jsonrpc").join("types.go"), String::new())];
        match write_tree(dir.path(), &files) {
            Err(RenderError::Write { path, .. }) => assert_eq!(path, blocker),
            other => panic!("expected a write error, got {other:?}"),
        }
    }
}
