//! Loaded packages and their declaration indices.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use astg_syntax::ast::{Decl, FuncDecl, SourceFile, TypeSpec};
use rustc_hash::FxHashMap;

/// Position of a declaration: file index, then declaration index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeclRef {
    pub file: usize,
    pub decl: usize,
}

/// Every buildable file of one package, indexed by declaration name.
#[derive(Debug, Default)]
pub struct PackageInfo {
    pub pkg_path: String,
    /// Name from the package clause.
    pub name: String,
    /// Source directory; empty for built-in shims.
    pub dir: PathBuf,
    pub is_shim: bool,
    pub files: Vec<Arc<SourceFile>>,
    /// Type declarations by name.
    pub types: FxHashMap<String, DeclRef>,
    /// Package-level functions by name.
    pub funcs: FxHashMap<String, DeclRef>,
    /// Methods by receiver base type name.
    pub methods: FxHashMap<String, Vec<DeclRef>>,
    /// Explicit import names, by import path.
    pub import_aliases: BTreeMap<String, String>,
    /// Problems that did not prevent loading.
    pub type_errors: Vec<String>,
}

impl PackageInfo {
    /// Index the declarations of `files`.
    ///
    /// Files declaring a different package than the first one are dropped
    /// and reported in `type_errors`, as are duplicate declarations.
    pub fn new(pkg_path: &str, dir: PathBuf, is_shim: bool, files: Vec<Arc<SourceFile>>) -> Self {
        let mut info = PackageInfo {
            pkg_path: pkg_path.to_string(),
            dir,
            is_shim,
            ..PackageInfo::default()
        };
        let Some(first) = files.first() else {
            return info;
        };
        info.name.clone_from(&first.package);

        for file in files {
            if file.package != info.name {
                info.type_errors.push(format!(
                    "{}: package {} conflicts with {}",
                    file.path.display(),
                    file.package,
                    info.name
                ));
                continue;
            }
            let file_idx = info.files.len();
            for (decl_idx, decl) in file.decls.iter().enumerate() {
                let at = DeclRef {
                    file: file_idx,
                    decl: decl_idx,
                };
                match decl {
                    Decl::Type(spec) => {
                        if info.types.insert(spec.name.clone(), at).is_some() {
                            info.type_errors
                                .push(format!("{} redeclared in this package", spec.name));
                        }
                    }
                    Decl::Func(func) => match &func.recv {
                        Some(recv) => info
                            .methods
                            .entry(recv.type_name.clone())
                            .or_default()
                            .push(at),
                        None if func.name == "init" || func.name == "_" => {}
                        None => {
                            if info.funcs.insert(func.name.clone(), at).is_some() {
                                info.type_errors
                                    .push(format!("{} redeclared in this package", func.name));
                            }
                        }
                    },
                }
            }
            for imp in &file.imports {
                if let Some(name) = imp.name.as_deref().filter(|n| *n != "_" && *n != ".") {
                    info.import_aliases
                        .insert(imp.path.clone(), name.to_string());
                }
            }
            info.files.push(file);
        }

        for recv in info.methods.keys() {
            if !info.types.contains_key(recv) {
                info.type_errors
                    .push(format!("method receiver {recv} is not declared"));
            }
        }
        info
    }

    pub fn type_spec(&self, name: &str) -> Option<(DeclRef, &TypeSpec)> {
        let at = *self.types.get(name)?;
        match self.decl(at)? {
            Decl::Type(spec) => Some((at, spec)),
            Decl::Func(_) => None,
        }
    }

    pub fn func(&self, name: &str) -> Option<(DeclRef, &FuncDecl)> {
        let at = *self.funcs.get(name)?;
        match self.decl(at)? {
            Decl::Func(func) => Some((at, func)),
            Decl::Type(_) => None,
        }
    }

    /// Methods declared with `name` as receiver base type.
    pub fn methods_of(&self, name: &str) -> impl Iterator<Item = (DeclRef, &FuncDecl)> {
        self.methods
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|at| match self.decl(*at)? {
                Decl::Func(func) => Some((*at, func)),
                Decl::Type(_) => None,
            })
    }

    pub fn decl(&self, at: DeclRef) -> Option<&Decl> {
        self.files.get(at.file)?.decls.get(at.decl)
    }

    pub fn file(&self, idx: usize) -> Option<&SourceFile> {
        self.files.get(idx).map(AsRef::as_ref)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Names of declared types, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether every file of the package carries a generated-code header.
    pub fn is_generated(&self) -> bool {
        !self.files.is_empty() && self.files.iter().all(|f| f.generated)
    }
}
