//! Finding the concrete types of the module that implement each contract.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use astg_ir::{Implementation, ImplementationMethod, Project};
use astg_loader::{PackageLoader, Ty};
use astg_syntax::ast::SourceFile;
use astg_syntax::constraint::matches_file_name;
use astg_syntax::{file_included, parse_file};
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::config::AnalyzerConfig;
use crate::errors::ErrorClassifier;

/// `(pkg_path, type_name, contract_pkg_path, contract_name)`.
type JudgmentKey = (String, String, String, String);

/// One parsed package of the module walk.
struct ModulePackage {
    pkg_path: String,
    files: Vec<Arc<SourceFile>>,
    /// Receiver type name to the names of its declared methods.
    methods: BTreeMap<String, BTreeSet<String>>,
}

/// Contract identity and method names, detached from the project.
struct ContractShape {
    id: String,
    pkg_path: String,
    name: String,
    methods: Vec<String>,
}

/// Attaches implementations to the contracts of a project.
pub struct ImplementationMatcher<'a> {
    config: &'a AnalyzerConfig,
    loader: &'a PackageLoader,
    classifier: &'a ErrorClassifier<'a>,
    judgments: RwLock<FxHashMap<JudgmentKey, bool>>,
}

impl<'a> ImplementationMatcher<'a> {
    pub fn new(
        config: &'a AnalyzerConfig,
        loader: &'a PackageLoader,
        classifier: &'a ErrorClassifier<'a>,
    ) -> Self {
        ImplementationMatcher {
            config,
            loader,
            classifier,
            judgments: RwLock::new(FxHashMap::default()),
        }
    }

    /// Walk the module, then record for every contract each type whose
    /// method set satisfies it, sorted by package path and type name.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn match_implementations(&self, project: &mut Project) {
        let packages = self.module_packages();
        let shapes: Vec<ContractShape> = project
            .contracts
            .iter()
            .map(|c| ContractShape {
                id: c.id.clone(),
                pkg_path: c.pkg_path.clone(),
                name: c.name.clone(),
                methods: c.methods.iter().map(|m| m.name.clone()).collect(),
            })
            .collect();

        let mut candidates: Vec<(&ModulePackage, &str, &ContractShape)> = Vec::new();
        for package in &packages {
            for (type_name, methods) in &package.methods {
                for shape in &shapes {
                    if !shape.methods.is_empty()
                        && shape.methods.iter().all(|m| methods.contains(m))
                    {
                        candidates.push((package, type_name, shape));
                    }
                }
            }
        }
        tracing::debug!(
            packages = packages.len(),
            candidates = candidates.len(),
            "implementation candidates"
        );

        let mut found: Vec<(String, Implementation)> = candidates
            .par_iter()
            .filter_map(|(package, type_name, shape)| {
                self.judge(package, type_name, shape)
                    .then(|| (shape.id.clone(), self.implementation(package, type_name, shape)))
            })
            .collect();
        found.sort_by(|(a_id, a), (b_id, b)| {
            (a_id, &a.pkg_path, &a.struct_name).cmp(&(b_id, &b.pkg_path, &b.struct_name))
        });

        for (contract_id, implementation) in found {
            if let Some(contract) = project.contract_mut(&contract_id) {
                tracing::debug!(
                    contract = %contract_id,
                    implementation = %format!("{}.{}", implementation.pkg_path, implementation.struct_name),
                    "implementation found"
                );
                contract.implementations.push(implementation);
            }
        }
    }

    /// Whether `pkg.type_name` (or its pointer) satisfies the contract,
    /// memoized.
    fn judge(&self, package: &ModulePackage, type_name: &str, shape: &ContractShape) -> bool {
        let key = (
            package.pkg_path.clone(),
            type_name.to_string(),
            shape.pkg_path.clone(),
            shape.name.clone(),
        );
        if let Some(known) = self.judgments.read().get(&key) {
            return *known;
        }
        let verdict = self.check(package, type_name, shape);
        self.judgments.write().insert(key, verdict);
        verdict
    }

    fn check(&self, package: &ModulePackage, type_name: &str, shape: &ContractShape) -> bool {
        let loaded = self
            .loader
            .load_from_files(&package.pkg_path, &package.files)
            .or_else(|_| self.loader.load(&package.pkg_path));
        if let Err(err) = loaded {
            tracing::debug!(pkg_path = %package.pkg_path, %err, "candidate package not loaded");
            return false;
        }
        let ty = Ty::named(&package.pkg_path, type_name);
        let contract = Ty::named(&shape.pkg_path, &shape.name);
        match self.loader.implements(&ty, &contract) {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::debug!(ty = %ty, contract = %shape.id, %err, "implementation check failed");
                false
            }
        }
    }

    fn implementation(
        &self,
        package: &ModulePackage,
        type_name: &str,
        shape: &ContractShape,
    ) -> Implementation {
        let ty = Ty::pointer(Ty::named(&package.pkg_path, type_name));
        let method_set = self.loader.method_set(&ty).unwrap_or_default();
        let mut methods_map = BTreeMap::new();
        for name in &shape.methods {
            let Some(decl) = method_set
                .iter()
                .find(|m| m.name == *name)
                .and_then(|m| m.decl.as_ref())
            else {
                continue;
            };
            let file_path = self.relative(&decl.file_path);
            let error_types = match (&decl.body, self.owning_package(&decl.file_path)) {
                (Some(body), Some(pkg_path)) => match self.loader.load(&pkg_path) {
                    Ok(info) => self.classifier.errors_in_body(&info, decl.file_index, body),
                    Err(_) => Vec::new(),
                },
                _ => Vec::new(),
            };
            methods_map.insert(
                name.clone(),
                ImplementationMethod {
                    file_path,
                    error_types,
                },
            );
        }
        Implementation {
            pkg_path: package.pkg_path.clone(),
            struct_name: type_name.to_string(),
            methods_map,
        }
    }

    fn owning_package(&self, file: &Path) -> Option<String> {
        self.loader.resolver().local_pkg_path(file.parent()?)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.config.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Parse every buildable, non-generated file of the module, grouped by
    /// package.
    fn module_packages(&self) -> Vec<ModulePackage> {
        let mut paths = Vec::new();
        self.walk(&self.config.root, &mut paths);
        let tags = self.loader.build_tags();

        let parsed: Vec<Arc<SourceFile>> = paths
            .par_iter()
            .filter_map(|path| {
                let source = match std::fs::read_to_string(path) {
                    Ok(source) => source,
                    Err(err) => {
                        tracing::debug!(path = %path.display(), %err, "file not read");
                        return None;
                    }
                };
                match parse_file(path, &source) {
                    Ok(file) if !file.generated && file_included(&file, tags) => Some(Arc::new(file)),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::debug!(path = %path.display(), %err, "file skipped");
                        None
                    }
                }
            })
            .collect();

        let mut by_dir: BTreeMap<PathBuf, Vec<Arc<SourceFile>>> = BTreeMap::new();
        for file in parsed {
            let dir = file.path.parent().map(Path::to_path_buf).unwrap_or_default();
            by_dir.entry(dir).or_default().push(file);
        }

        by_dir
            .into_iter()
            .filter_map(|(dir, mut files)| {
                let pkg_path = self.loader.resolver().local_pkg_path(&dir)?;
                files.sort_by(|a, b| a.path.cmp(&b.path));
                let mut methods: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
                for file in &files {
                    for func in file.funcs() {
                        if let Some(recv) = &func.recv {
                            methods
                                .entry(recv.type_name.clone())
                                .or_default()
                                .insert(func.name.clone());
                        }
                    }
                }
                Some(ModulePackage {
                    pkg_path,
                    files,
                    methods,
                })
            })
            .collect()
    }

    fn walk(&self, dir: &Path, out: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir = %dir.display(), %err, "directory not read");
                return;
            }
        };
        let tags = self.loader.build_tags();
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                let rel = self.relative(&path);
                if name == "vendor"
                    || name == "testdata"
                    || self.config.is_excluded(&rel)
                    || path.join("go.mod").is_file()
                {
                    continue;
                }
                self.walk(&path, out);
            } else if name.ends_with(".go")
                && !name.ends_with("_test.go")
                && matches_file_name(&name, tags)
            {
                out.push(path);
            }
        }
    }
}

#[cfg(test)]
mod tests;
