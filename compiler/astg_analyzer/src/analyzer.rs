//! The analysis pipeline from a module root to a complete [`Project`].

use astg_ir::Project;
use astg_loader::PackageLoader;

use crate::config::AnalyzerConfig;
use crate::contracts::ContractDiscovery;
use crate::convert::Converter;
use crate::error::{AnalyzeError, Result};
use crate::errors::{collect_errors, ErrorClassifier};
use crate::expand::{error_roots, Expander};
use crate::git::git_info;
use crate::implements::InterfaceDetector;
use crate::matching::ImplementationMatcher;
use crate::services::services;

pub struct Analyzer<'a> {
    config: AnalyzerConfig,
    loader: &'a PackageLoader,
}

impl<'a> Analyzer<'a> {
    pub fn new(config: AnalyzerConfig, loader: &'a PackageLoader) -> Self {
        Analyzer { config, loader }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run every stage: contracts, implementations, errors, expansion,
    /// services, interface detection, then the content marker.
    #[tracing::instrument(level = "debug", skip_all, fields(root = %self.config.root.display()))]
    pub fn analyze(&self) -> Result<Project> {
        let mut project = Project::new(
            &self.config.version,
            self.loader.module_path(),
            &self.config.contracts_dir,
        );
        project.excluded_dirs.clone_from(&self.config.excluded_dirs);
        project.git_info = git_info(&self.config.root);

        let mut conv = Converter::new(self.loader);
        let mut roots = ContractDiscovery::new(&self.config, self.loader, &mut conv)
            .discover_contracts(&mut project)?;
        if project.contracts.is_empty() {
            return Err(AnalyzeError::NoContracts {
                dir: self.config.contracts_path(),
            });
        }
        tracing::info!(contracts = project.contracts.len(), "contracts discovered");

        let classifier = ErrorClassifier::new(self.loader);
        ImplementationMatcher::new(&self.config, self.loader, &classifier)
            .match_implementations(&mut project);
        collect_errors(&mut project, &classifier);

        roots.extend(error_roots(&project));
        Expander::new(self.loader, &mut conv).expand(&mut project, &roots);

        project.services = services(&project);
        InterfaceDetector::new(self.loader, &self.config.eager_interfaces).detect_all(&mut project);

        let missing = project.missing_types();
        if !missing.is_empty() {
            tracing::debug!(?missing, "types referenced but not registered");
        }
        project.update_marker()?;
        tracing::info!(
            types = project.types.len(),
            services = project.services.len(),
            "analysis complete"
        );
        Ok(project)
    }
}
