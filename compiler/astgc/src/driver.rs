//! Driver operations: analyze, dump and generate.

use std::fs;
use std::path::Path;

use astg_analyzer::Analyzer;
use astg_ir::Project;
use astg_loader::{GoEnv, GoMod, PackageLoader, PackageResolver};
use astg_render::{OutputFile, Renderer};

use crate::config::DriverConfig;
use crate::error::{DriverError, Result};

/// Analyze the module at `config.root` with the process environment.
pub fn analyze(config: &DriverConfig) -> Result<Project> {
    analyze_with_env(config, GoEnv::from_env())
}

#[tracing::instrument(level = "info", skip_all, fields(root = %config.root.display()))]
pub fn analyze_with_env(config: &DriverConfig, env: GoEnv) -> Result<Project> {
    let gomod = GoMod::read(&config.root)?;
    let resolver = PackageResolver::new(&config.root, gomod, env);
    let loader = PackageLoader::new(resolver, config.build_tags());
    let project = Analyzer::new(config.analyzer_config(), &loader).analyze()?;
    Ok(project)
}

/// Render and write the client of an analyzed project.
#[tracing::instrument(level = "info", skip_all, fields(out = %config.out_dir().display()))]
pub fn generate(config: &DriverConfig, project: &Project) -> Result<Vec<OutputFile>> {
    let render = config.render_config(&project.module_path)?;
    let files = Renderer::new(project, &render).write()?;
    tracing::info!(files = files.len(), "client written");
    Ok(files)
}

/// Analyze, then generate.
pub fn client(config: &DriverConfig, env: GoEnv) -> Result<Vec<OutputFile>> {
    let project = analyze_with_env(config, env)?;
    generate(config, &project)
}

/// Generate from a project document written by [`dump`].
pub fn client_from_project(config: &DriverConfig, path: &Path) -> Result<Vec<OutputFile>> {
    let project = read_project(path)?;
    generate(config, &project)
}

pub fn read_project(path: &Path) -> Result<Project> {
    let text = fs::read_to_string(path).map_err(|e| DriverError::io(path, e))?;
    Project::from_json(&text).map_err(|source| DriverError::Project {
        path: path.to_path_buf(),
        source,
    })
}

/// The project document as JSON, also written to `output` when given.
pub fn dump(project: &Project, output: Option<&Path>) -> Result<String> {
    let text = project.to_json().map_err(DriverError::Encode)?;
    if let Some(path) = output {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DriverError::io(parent, e))?;
        }
        fs::write(path, &text).map_err(|e| DriverError::io(path, e))?;
        tracing::info!(path = %path.display(), "project written");
    }
    Ok(text)
}
