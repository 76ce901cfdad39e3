//! Settings of one driver run.

use std::path::{Component, Path, PathBuf};

use astg_analyzer::AnalyzerConfig;
use astg_render::RenderConfig;
use astg_syntax::BuildTags;

use crate::error::{DriverError, Result};

#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Module root, the directory holding `go.mod`.
    pub root: PathBuf,
    /// Output directory; relative paths are taken from `root`.
    pub out: PathBuf,
    /// Go import path of the output directory. Derived from the module
    /// path when the output lies inside the module.
    pub import_path: Option<String>,
    pub contracts_dir: String,
    /// Only these interfaces become contracts, when non-empty.
    pub ifaces: Vec<String>,
    pub excluded_dirs: Vec<String>,
    /// Build tags beyond the target OS and architecture.
    pub build_tags: Vec<String>,
    pub metrics: bool,
    pub docs: bool,
}

impl DriverConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DriverConfig {
            root: root.into(),
            out: PathBuf::from("client"),
            import_path: None,
            contracts_dir: "contracts".to_string(),
            ifaces: Vec::new(),
            excluded_dirs: Vec::new(),
            build_tags: Vec::new(),
            metrics: true,
            docs: true,
        }
    }

    pub fn out_dir(&self) -> PathBuf {
        if self.out.is_absolute() {
            self.out.clone()
        } else {
            self.root.join(&self.out)
        }
    }

    pub fn build_tags(&self) -> BuildTags {
        BuildTags::default().with_tags(self.build_tags.iter().cloned())
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        let mut config = AnalyzerConfig::new(&self.root);
        config.contracts_dir.clone_from(&self.contracts_dir);
        config.ifaces.clone_from(&self.ifaces);
        config.excluded_dirs.clone_from(&self.excluded_dirs);
        // Generated output is never analyzed.
        if let Some(rel) = self.out_relative() {
            let rel = slash_path(&rel);
            if !rel.is_empty() && !config.excluded_dirs.contains(&rel) {
                config.excluded_dirs.push(rel);
            }
        }
        config
    }

    pub fn render_config(&self, module_path: &str) -> Result<RenderConfig> {
        let mut config = RenderConfig::new(self.out_dir(), self.import_path(module_path)?);
        config.metrics = self.metrics;
        config.docs = self.docs;
        Ok(config)
    }

    /// The explicit import path, else the module path joined with the
    /// output directory relative to the root.
    pub fn import_path(&self, module_path: &str) -> Result<String> {
        if let Some(path) = self.import_path.as_ref().filter(|p| !p.is_empty()) {
            return Ok(path.trim_end_matches('/').to_string());
        }
        match self.out_relative() {
            Some(rel) if rel.as_os_str().is_empty() => Ok(module_path.to_string()),
            Some(rel) => Ok(format!("{module_path}/{}", slash_path(&rel))),
            None => Err(DriverError::ImportPath {
                out: self.out_dir(),
                root: self.root.clone(),
            }),
        }
    }

    /// The output directory relative to the root, when inside it.
    fn out_relative(&self) -> Option<PathBuf> {
        let out = normalize(&self.out_dir());
        let root = normalize(&self.root);
        out.strip_prefix(&root).ok().map(Path::to_path_buf)
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn import_path_follows_the_output_directory() {
        let mut config = DriverConfig::new("/src/shop");
        assert_eq!(
            config.import_path("example.com/shop").unwrap_or_else(|e| panic!("{e}")),
            "example.com/shop/client"
        );

        config.out = PathBuf::from("./pkg/../gen/users-client");
        assert_eq!(
            config.import_path("example.com/shop").unwrap_or_else(|e| panic!("{e}")),
            "example.com/shop/gen/users-client"
        );
        let render = config.render_config("example.com/shop").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(render.package_name, "usersclient");
        assert_eq!(config.analyzer_config().excluded_dirs, vec!["gen/users-client"]);
    }

    #[test]
    fn outside_the_module_needs_an_explicit_path() {
        let mut config = DriverConfig::new("/src/shop");
        config.out = PathBuf::from("/tmp/out");
        assert!(matches!(
            config.import_path("example.com/shop"),
            Err(DriverError::ImportPath { .. })
        ));
        config.import_path = Some("example.com/clients/shop/".to_string());
        assert_eq!(
            config.import_path("example.com/shop").unwrap_or_else(|e| panic!("{e}")),
            "example.com/clients/shop"
        );
        assert!(config.analyzer_config().excluded_dirs.is_empty());
    }
}
