//! Package loading.
//!
//! Packages are parsed whole and cached once per path. Imports are not
//! followed while a package is being built: identifiers from other packages
//! resolve to [`Ty::Named`] references and their declarations are loaded
//! when first asked for. A load strategy only decides which imports are
//! warmed right after the package itself is in the cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use astg_syntax::ast::{Decl, SourceFile, TypeExpr};
use astg_syntax::{file_included, BuildTags};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{LoadError, Result};
use crate::package::PackageInfo;
use crate::resolver::{PackageResolver, PackageSource};
use crate::ty::{Signature, Ty};

mod methods;
mod scope;

pub use methods::MethodEntry;

/// Which imports of a package are materialized after loading it.
#[derive(Copy, Clone, Debug)]
pub enum LoadMode<'a> {
    /// Imports used by exported declarations.
    Lazy,
    /// Pre-parsed files instead of the package directory; imports as `Lazy`.
    FromFiles(&'a [Arc<SourceFile>]),
    /// Exactly these import paths.
    Minimal(&'a [String]),
    /// Imports used by one type's definition.
    ForType(&'a str),
    /// Imports used by one type's definition and its `Error`/`Code` methods.
    ForErrorType(&'a str),
}

/// A declared type with its definition resolved.
#[derive(Debug)]
pub struct NamedDecl {
    pub pkg_path: String,
    pub pkg_name: String,
    pub name: String,
    pub type_params: Vec<String>,
    pub is_alias: bool,
    /// Right-hand side of the declaration.
    pub rhs: Ty,
    pub docs: Vec<String>,
    pub file_path: PathBuf,
    pub file_index: usize,
    pub methods: Vec<Arc<MethodDecl>>,
}

impl NamedDecl {
    pub fn method(&self, name: &str) -> Option<&Arc<MethodDecl>> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }

    /// Right-hand side with the type parameters replaced by `args`.
    pub fn instantiate(&self, args: &[Ty]) -> Ty {
        self.rhs.substitute(&self.type_params, args)
    }
}

/// A method declared on a named type.
#[derive(Debug)]
pub struct MethodDecl {
    pub name: String,
    pub pointer_recv: bool,
    /// Type parameter names as spelled in the receiver.
    pub recv_type_params: Vec<String>,
    pub sig: Arc<Signature>,
    pub docs: Vec<String>,
    pub file_index: usize,
    pub file_path: PathBuf,
    /// Body tokens; `None` for declarations without a body.
    pub body: Option<Arc<[astg_syntax::Token]>>,
    pub line: u32,
}

/// A package-level function.
#[derive(Debug)]
pub struct FuncInfo {
    pub pkg_path: String,
    pub name: String,
    pub sig: Arc<Signature>,
    pub docs: Vec<String>,
    pub file_index: usize,
    pub file_path: PathBuf,
    pub body: Option<Arc<[astg_syntax::Token]>>,
}

type PackageCell = Arc<OnceCell<Arc<PackageInfo>>>;

/// Loads and caches packages for one run.
pub struct PackageLoader {
    resolver: PackageResolver,
    tags: BuildTags,
    packages: RwLock<FxHashMap<String, PackageCell>>,
    named_cache: RwLock<FxHashMap<String, FxHashMap<String, Arc<NamedDecl>>>>,
    pkg_names: RwLock<FxHashMap<String, String>>,
}

impl PackageLoader {
    pub fn new(resolver: PackageResolver, tags: BuildTags) -> Self {
        PackageLoader {
            resolver,
            tags,
            packages: RwLock::new(FxHashMap::default()),
            named_cache: RwLock::new(FxHashMap::default()),
            pkg_names: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn resolver(&self) -> &PackageResolver {
        &self.resolver
    }

    pub fn build_tags(&self) -> &BuildTags {
        &self.tags
    }

    pub fn module_path(&self) -> &str {
        self.resolver.module_path()
    }

    pub fn load(&self, pkg_path: &str) -> Result<Arc<PackageInfo>> {
        self.load_with(pkg_path, LoadMode::Lazy)
    }

    pub fn load_from_files(
        &self,
        pkg_path: &str,
        files: &[Arc<SourceFile>],
    ) -> Result<Arc<PackageInfo>> {
        self.load_with(pkg_path, LoadMode::FromFiles(files))
    }

    pub fn load_minimal(&self, pkg_path: &str, imports: &[String]) -> Result<Arc<PackageInfo>> {
        self.load_with(pkg_path, LoadMode::Minimal(imports))
    }

    pub fn load_for_type(&self, pkg_path: &str, type_name: &str) -> Result<Arc<PackageInfo>> {
        self.load_with(pkg_path, LoadMode::ForType(type_name))
    }

    pub fn load_for_error_type(
        &self,
        pkg_path: &str,
        type_name: &str,
    ) -> Result<Arc<PackageInfo>> {
        self.load_with(pkg_path, LoadMode::ForErrorType(type_name))
    }

    #[tracing::instrument(level = "trace", skip(self, mode), fields(mode = mode.label()))]
    pub fn load_with(&self, pkg_path: &str, mode: LoadMode<'_>) -> Result<Arc<PackageInfo>> {
        let files = match mode {
            LoadMode::FromFiles(files) => Some(files),
            _ => None,
        };
        let mut info = self.load_package(pkg_path, files)?;

        if let LoadMode::ForType(name) | LoadMode::ForErrorType(name) = mode {
            if !info.has_type(name) {
                tracing::debug!(pkg_path, name, "type not in scope, reloading package");
                self.invalidate(pkg_path);
                info = self.load_package(pkg_path, None)?;
            }
        }

        let forced = forced_imports(&info, mode);
        for import in forced {
            if let Err(err) = self.load_package(&import, None) {
                tracing::debug!(pkg_path, import = %import, %err, "import left unresolved");
            }
        }
        Ok(info)
    }

    /// The cached package, loading it without warming imports.
    fn load_package(
        &self,
        pkg_path: &str,
        files: Option<&[Arc<SourceFile>]>,
    ) -> Result<Arc<PackageInfo>> {
        if pkg_path == "unsafe" || pkg_path == "C" {
            return Ok(Arc::new(PackageInfo {
                pkg_path: pkg_path.to_string(),
                name: pkg_path.to_string(),
                is_shim: true,
                ..PackageInfo::default()
            }));
        }

        let cell = {
            let cached = self.packages.read().get(pkg_path).cloned();
            match cached {
                Some(cell) => cell,
                None => self
                    .packages
                    .write()
                    .entry(pkg_path.to_string())
                    .or_default()
                    .clone(),
            }
        };

        let result = cell.get_or_try_init(|| self.build_package(pkg_path, files).map(Arc::new));
        match result {
            Ok(info) => Ok(Arc::clone(info)),
            Err(err) => {
                let mut packages = self.packages.write();
                if packages
                    .get(pkg_path)
                    .is_some_and(|current| Arc::ptr_eq(current, &cell))
                {
                    packages.remove(pkg_path);
                }
                Err(err)
            }
        }
    }

    /// Parse and index a package. Never loads other packages.
    fn build_package(
        &self,
        pkg_path: &str,
        files: Option<&[Arc<SourceFile>]>,
    ) -> Result<PackageInfo> {
        let (dir, is_shim, parsed) = if let Some(files) = files {
            let dir = files
                .first()
                .and_then(|f| f.path.parent())
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let kept = files
                .iter()
                .filter(|f| file_included(f, &self.tags))
                .cloned()
                .collect();
            (dir, false, kept)
        } else {
            match self.resolver.resolve(pkg_path)? {
                PackageSource::Dir(dir) => {
                    let parsed = self.parse_dir(&dir)?;
                    (dir, false, parsed)
                }
                PackageSource::Shim(sources) => (PathBuf::new(), true, parse_shim(sources)),
            }
        };

        if parsed.is_empty() {
            return Err(LoadError::TypeCheck {
                pkg_path: pkg_path.to_string(),
                message: format!("no buildable Go source files in {}", dir.display()),
            });
        }

        let mut info = PackageInfo::new(pkg_path, dir, is_shim, parsed);
        self.check_imports(&mut info);
        for problem in &info.type_errors {
            tracing::debug!(pkg_path, problem = %problem, "soft type error");
        }
        self.pkg_names
            .write()
            .insert(pkg_path.to_string(), info.name.clone());
        tracing::trace!(pkg_path, files = info.files.len(), "package loaded");
        Ok(info)
    }

    /// Parse every buildable `.go` file of `dir` in parallel.
    fn parse_dir(&self, dir: &Path) -> Result<Vec<Arc<SourceFile>>> {
        let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_candidate_file(p, &self.tags))
            .collect();
        paths.sort();

        let parsed: Vec<Option<Arc<SourceFile>>> = paths
            .par_iter()
            .map(|path| match parse_path(path) {
                Ok(file) => Some(Arc::new(file)),
                Err(err) => {
                    tracing::debug!(%err, "skipping file");
                    None
                }
            })
            .collect();

        Ok(parsed
            .into_iter()
            .flatten()
            .filter(|f| file_included(f, &self.tags))
            .collect())
    }

    /// Record imports that cannot be located. Resolution only; no loading.
    fn check_imports(&self, info: &mut PackageInfo) {
        let mut seen = FxHashSet::default();
        let mut problems = Vec::new();
        for file in &info.files {
            for imp in &file.imports {
                if imp.path == "unsafe" || imp.path == "C" || !seen.insert(imp.path.as_str()) {
                    continue;
                }
                if let Err(err) = self.resolver.resolve(&imp.path) {
                    problems.push(format!("could not import {}: {err}", imp.path));
                }
            }
        }
        info.type_errors.extend(problems);
    }

    /// Drop a package and every declaration derived from it.
    pub fn invalidate(&self, pkg_path: &str) {
        self.packages.write().remove(pkg_path);
        self.named_cache.write().remove(pkg_path);
    }

    /// Packages currently in the cache, sorted by path.
    pub fn loaded_packages(&self) -> Vec<Arc<PackageInfo>> {
        let mut out: Vec<Arc<PackageInfo>> = self
            .packages
            .read()
            .values()
            .filter_map(|cell| cell.get().cloned())
            .collect();
        out.sort_by(|a, b| a.pkg_path.cmp(&b.pkg_path));
        out
    }

    /// Name from the package clause, loading the package if needed.
    ///
    /// Falls back to the name guessed from the path when the package cannot
    /// be loaded.
    pub fn package_name(&self, pkg_path: &str) -> String {
        if let Some(name) = self.pkg_names.read().get(pkg_path) {
            return name.clone();
        }
        match self.load_package(pkg_path, None) {
            Ok(info) => info.name.clone(),
            Err(_) => astg_syntax::ast::default_package_name(pkg_path),
        }
    }

    /// Resolved declaration of `pkg_path.name`.
    ///
    /// A miss invalidates the package and retries once before failing.
    pub fn named_decl(&self, pkg_path: &str, name: &str) -> Result<Arc<NamedDecl>> {
        if let Some(decl) = self
            .named_cache
            .read()
            .get(pkg_path)
            .and_then(|types| types.get(name))
        {
            return Ok(Arc::clone(decl));
        }

        let info = self.load_for_type(pkg_path, name)?;
        let Some(decl) = self.build_named(&info, name) else {
            return Err(LoadError::UnknownType {
                pkg_path: pkg_path.to_string(),
                name: name.to_string(),
            });
        };
        let decl = Arc::new(decl);
        self.named_cache
            .write()
            .entry(pkg_path.to_string())
            .or_default()
            .entry(name.to_string())
            .or_insert_with(|| Arc::clone(&decl));
        Ok(decl)
    }

    /// Like [`named_decl`](Self::named_decl) but `None` for unknown types.
    pub fn lookup_type(&self, pkg_path: &str, name: &str) -> Result<Option<Arc<NamedDecl>>> {
        match self.named_decl(pkg_path, name) {
            Ok(decl) => Ok(Some(decl)),
            Err(LoadError::UnknownType { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn build_named(&self, info: &PackageInfo, name: &str) -> Option<NamedDecl> {
        let (at, spec) = info.type_spec(name)?;
        let file = info.file(at.file)?;
        let type_params: Vec<String> = spec
            .type_params
            .iter()
            .flat_map(|p| p.names.iter().cloned())
            .collect();
        let rhs = self.resolve_expr(info, at.file, &type_params, &spec.ty);

        let methods = info
            .methods_of(name)
            .filter_map(|(m_at, func)| {
                let recv = func.recv.as_ref()?;
                let m_file = info.file(m_at.file)?;
                let sig = self.resolve_signature(info, m_at.file, &recv.type_args, &func.sig);
                Some(Arc::new(MethodDecl {
                    name: func.name.clone(),
                    pointer_recv: recv.pointer,
                    recv_type_params: recv.type_args.clone(),
                    sig: Arc::new(sig),
                    docs: func.docs.clone(),
                    file_index: m_at.file,
                    file_path: m_file.path.clone(),
                    body: func.body.clone(),
                    line: func.line,
                }))
            })
            .collect();

        Some(NamedDecl {
            pkg_path: info.pkg_path.clone(),
            pkg_name: info.name.clone(),
            name: name.to_string(),
            type_params,
            is_alias: spec.is_alias,
            rhs,
            docs: spec.docs.clone(),
            file_path: file.path.clone(),
            file_index: at.file,
            methods,
        })
    }

    /// Package-level function `pkg_path.name`.
    pub fn lookup_func(&self, pkg_path: &str, name: &str) -> Result<FuncInfo> {
        let info = self.load(pkg_path)?;
        let Some((at, func)) = info.func(name) else {
            return Err(LoadError::UnknownFunc {
                pkg_path: pkg_path.to_string(),
                name: name.to_string(),
            });
        };
        let type_params: Vec<String> = func
            .type_params
            .iter()
            .flat_map(|p| p.names.iter().cloned())
            .collect();
        let sig = self.resolve_signature(&info, at.file, &type_params, &func.sig);
        Ok(FuncInfo {
            pkg_path: pkg_path.to_string(),
            name: name.to_string(),
            sig: Arc::new(sig),
            docs: func.docs.clone(),
            file_index: at.file,
            file_path: info
                .file(at.file)
                .map(|f| f.path.clone())
                .unwrap_or_default(),
            body: func.body.clone(),
        })
    }

    /// Follow alias declarations to the aliased type.
    pub fn unalias(&self, ty: &Ty) -> Result<Ty> {
        let mut current = ty.clone();
        for _ in 0..MAX_CHAIN {
            let Ty::Named(named) = &current else {
                break;
            };
            let decl = self.named_decl(&named.pkg, &named.name)?;
            if !decl.is_alias {
                break;
            }
            current = decl.instantiate(&named.args);
        }
        Ok(current)
    }

    /// The non-named type at the end of a named type's definition chain.
    pub fn underlying(&self, ty: &Ty) -> Result<Ty> {
        let mut current = ty.clone();
        for _ in 0..MAX_CHAIN {
            let Ty::Named(named) = &current else {
                return Ok(current);
            };
            let decl = self.named_decl(&named.pkg, &named.name)?;
            current = decl.instantiate(&named.args);
        }
        Ok(current)
    }
}

const MAX_CHAIN: usize = 32;

impl LoadMode<'_> {
    fn label(&self) -> &'static str {
        match self {
            LoadMode::Lazy => "lazy",
            LoadMode::FromFiles(_) => "from-files",
            LoadMode::Minimal(_) => "minimal",
            LoadMode::ForType(_) => "for-type",
            LoadMode::ForErrorType(_) => "for-error-type",
        }
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn is_candidate_file(path: &Path, tags: &BuildTags) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('_')
        && !name.starts_with('.')
        && astg_syntax::constraint::matches_file_name(name, tags)
}

fn parse_path(path: &Path) -> Result<SourceFile> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    astg_syntax::parse_file(path, &source).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_shim(sources: &[(&str, &str)]) -> Vec<Arc<SourceFile>> {
    sources
        .iter()
        .filter_map(|(name, source)| {
            match astg_syntax::parse_file(Path::new(name), source) {
                Ok(file) => Some(Arc::new(file)),
                Err(err) => {
                    tracing::debug!(name, %err, "built-in source failed to parse");
                    None
                }
            }
        })
        .collect()
}

/// Import paths warmed for `mode`.
fn forced_imports(info: &PackageInfo, mode: LoadMode<'_>) -> Vec<String> {
    let mut used: FxHashSet<(usize, String)> = FxHashSet::default();
    let mut note = |file: usize, expr: &TypeExpr| {
        let mut quals = FxHashSet::default();
        scope::qualifiers(expr, &mut quals);
        used.extend(quals.into_iter().map(|q| (file, q)));
    };

    match mode {
        LoadMode::Minimal(imports) => return imports.to_vec(),
        LoadMode::Lazy | LoadMode::FromFiles(_) => {
            for (file_idx, file) in info.files.iter().enumerate() {
                for decl in &file.decls {
                    match decl {
                        Decl::Type(spec) if is_exported(&spec.name) => note(file_idx, &spec.ty),
                        Decl::Func(func)
                            if is_exported(&func.name)
                                && func.recv.as_ref().map_or(true, |r| is_exported(&r.type_name)) =>
                        {
                            for p in func.sig.params.iter().chain(&func.sig.results) {
                                note(file_idx, &p.ty);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        LoadMode::ForType(name) | LoadMode::ForErrorType(name) => {
            if let Some((at, spec)) = info.type_spec(name) {
                note(at.file, &spec.ty);
            }
            if matches!(mode, LoadMode::ForErrorType(_)) {
                for (at, func) in info.methods_of(name) {
                    if func.name == "Error" || func.name == "Code" {
                        for p in func.sig.params.iter().chain(&func.sig.results) {
                            note(at.file, &p.ty);
                        }
                    }
                }
            }
        }
    }

    let mut out: Vec<String> = used
        .into_iter()
        .filter_map(|(file, qual)| {
            let file = info.file(file)?;
            file.imports
                .iter()
                .find(|imp| imp.qualifier().as_deref() == Some(qual.as_str()))
                .map(|imp| imp.path.clone())
        })
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests;
