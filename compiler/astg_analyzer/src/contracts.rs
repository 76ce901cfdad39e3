//! Discovering contracts: annotated interfaces of the contracts directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use astg_ir::{type_id, Contract, Method, Project};
use astg_loader::ty::{InterfaceTy, Signature};
use astg_loader::{is_exported, PackageInfo, PackageLoader, Ty};
use astg_syntax::ast::{Decl, TypeExpr};
use astg_tags::{names, parse_comments, Annotations};

use crate::config::AnalyzerConfig;
use crate::convert::Converter;
use crate::error::{AnalyzeError, Result};

/// Interface nesting beyond which embedded methods are ignored.
const MAX_EMBED_DEPTH: usize = 8;

/// Package directories below `dir` holding at least one Go source file,
/// sorted.
pub fn package_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    walk(dir, &mut out)?;
    out.sort();
    Ok(out)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| AnalyzeError::io(dir, e))?;
    let mut has_source = false;
    for entry in entries {
        let entry = entry.map_err(|e| AnalyzeError::io(dir, e))?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| AnalyzeError::io(&path, e))?;
        if file_type.is_dir() {
            if name != "testdata" && name != "vendor" {
                walk(&path, out)?;
            }
        } else if name.ends_with(".go") && !name.ends_with("_test.go") {
            has_source = true;
        }
    }
    if has_source {
        out.push(dir.to_path_buf());
    }
    Ok(())
}

/// Adds the contracts found in the contracts directory to a project.
pub struct ContractDiscovery<'a, 'c> {
    config: &'a AnalyzerConfig,
    loader: &'a PackageLoader,
    conv: &'c mut Converter<'a>,
}

impl<'a, 'c> ContractDiscovery<'a, 'c> {
    pub fn new(
        config: &'a AnalyzerConfig,
        loader: &'a PackageLoader,
        conv: &'c mut Converter<'a>,
    ) -> Self {
        ContractDiscovery {
            config,
            loader,
            conv,
        }
    }

    /// Load every contracts package, merge the package-clause tags into the
    /// project annotations and append one [`Contract`] per annotated
    /// exported interface.
    ///
    /// Returns the argument and result types of every method, in
    /// declaration order, as roots for expansion.
    #[tracing::instrument(level = "debug", skip_all, fields(dir = %self.config.contracts_dir))]
    pub fn discover_contracts(&mut self, project: &mut Project) -> Result<Vec<Ty>> {
        let dir = self.config.contracts_path();
        let mut packages = Vec::new();
        for pkg_dir in package_dirs(&dir)? {
            let Some(pkg_path) = self.loader.resolver().local_pkg_path(&pkg_dir) else {
                tracing::debug!(dir = %pkg_dir.display(), "contracts directory outside the module");
                continue;
            };
            packages.push(self.loader.load(&pkg_path)?);
        }

        for info in &packages {
            for file in &info.files {
                project
                    .annotations
                    .merge(&parse_comments(&file.package_docs).annotations);
            }
        }

        let mut roots = Vec::new();
        for info in &packages {
            for file in &info.files {
                for decl in &file.decls {
                    let Decl::Type(spec) = decl else {
                        continue;
                    };
                    if !is_exported(&spec.name)
                        || !spec.type_params.is_empty()
                        || !matches!(spec.ty, TypeExpr::Interface(_))
                        || !self.selected(&info.pkg_path, &spec.name)
                    {
                        continue;
                    }
                    let parsed = parse_comments(&spec.docs);
                    if parsed.annotations.is_empty() {
                        continue;
                    }
                    let contract = self.contract(project, info, &spec.name, &mut roots)?;
                    tracing::debug!(
                        contract = %contract.id,
                        methods = contract.methods.len(),
                        "contract discovered"
                    );
                    project.contracts.push(contract);
                }
            }
        }
        Ok(roots)
    }

    /// Whether the interface filter admits `pkg_path.name`.
    fn selected(&self, pkg_path: &str, name: &str) -> bool {
        self.config.ifaces.is_empty()
            || self
                .config
                .ifaces
                .iter()
                .any(|i| i == name || *i == type_id(pkg_path, name))
    }

    fn contract(
        &mut self,
        project: &mut Project,
        info: &PackageInfo,
        name: &str,
        roots: &mut Vec<Ty>,
    ) -> Result<Contract> {
        let decl = self.loader.named_decl(&info.pkg_path, name)?;
        let parsed = parse_comments(&decl.docs);
        let id = type_id(&info.pkg_path, name);
        let file_path = decl
            .file_path
            .strip_prefix(&self.config.root)
            .unwrap_or(&decl.file_path)
            .to_string_lossy()
            .replace('\\', "/");

        let mut contract = Contract {
            id: id.clone(),
            name: name.to_string(),
            pkg_path: info.pkg_path.clone(),
            file_path,
            docs: parsed.docs,
            annotations: parsed.annotations,
            ..Contract::default()
        };

        let mut specs = Vec::new();
        if let Ty::Interface(iface) = &decl.rhs {
            self.collect_methods(iface, 0, &mut specs);
        }
        for (method_name, sig, docs) in specs {
            let parsed = parse_comments(&docs);
            let (args, results) = self.conv.signature(project, &sig);
            roots.extend(sig.params.iter().chain(&sig.results).map(|v| v.ty.clone()));
            let mut method = Method {
                name: method_name,
                contract_id: id.clone(),
                args,
                results,
                docs: parsed.docs,
                annotations: parsed.annotations,
                ..Method::default()
            };
            method.handler = handler_of(&project.annotations, &contract.annotations, &method.annotations);
            contract.methods.push(method);
        }
        Ok(contract)
    }

    /// Methods of an interface in declaration order, followed by those of
    /// its embedded interfaces not already present.
    fn collect_methods(
        &self,
        iface: &InterfaceTy,
        depth: usize,
        out: &mut Vec<(String, Arc<Signature>, Vec<String>)>,
    ) {
        if depth > MAX_EMBED_DEPTH {
            return;
        }
        for m in &iface.methods {
            if !out.iter().any(|(name, ..)| *name == m.name) {
                out.push((m.name.clone(), Arc::clone(&m.sig), m.docs.clone()));
            }
        }
        for embed in &iface.embeds {
            match self.loader.underlying(embed) {
                Ok(Ty::Interface(inner)) => self.collect_methods(&inner, depth + 1, out),
                Ok(_) => {
                    for entry in self.loader.interface_method_set(embed).unwrap_or_default() {
                        if !out.iter().any(|(name, ..)| *name == entry.name) {
                            out.push((entry.name, entry.sig, Vec::new()));
                        }
                    }
                }
                Err(err) => tracing::debug!(embed = %embed, %err, "embedded interface not loaded"),
            }
        }
    }
}

/// `pkgPath:funcName` named by `handler` (or its alias `http-response`) at
/// the narrowest scope that sets either.
fn handler_of(project: &Annotations, contract: &Annotations, method: &Annotations) -> Option<String> {
    let tag = |scope: &Annotations, name: &str| {
        scope
            .value(name)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    [method, contract, project]
        .into_iter()
        .find_map(|scope| tag(scope, names::HANDLER).or_else(|| tag(scope, names::HTTP_RESPONSE)))
}

#[cfg(test)]
mod tests;
