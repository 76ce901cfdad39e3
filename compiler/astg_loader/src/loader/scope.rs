//! Binding identifiers in type expressions.

use std::sync::Arc;

use astg_syntax::ast::{ArrayLen, FieldDecl, FuncType, InterfaceElem, TypeExpr};
use rustc_hash::FxHashSet;

use super::PackageLoader;
use crate::package::PackageInfo;
use crate::ty::{basic, Field, IfaceMethod, InterfaceTy, NamedRef, Signature, StructTy, Ty, Var};

impl PackageLoader {
    /// Resolve a type expression written in file `file` of `info`.
    ///
    /// Lookup order for a bare identifier: type parameters, package-level
    /// types, predeclared types, then dot imports.
    pub fn resolve_expr(
        &self,
        info: &PackageInfo,
        file: usize,
        tparams: &[String],
        expr: &TypeExpr,
    ) -> Ty {
        let go = |e: &TypeExpr| self.resolve_expr(info, file, tparams, e);
        match expr {
            TypeExpr::Ident(name) => self.resolve_ident(info, file, tparams, name),
            TypeExpr::Qualified { pkg, name } => self.resolve_qualified(info, file, pkg, name),
            TypeExpr::Generic { base, args } => match go(base) {
                Ty::Named(named) => Ty::Named(NamedRef {
                    args: args.iter().map(go).collect(),
                    ..named
                }),
                other => other,
            },
            TypeExpr::Pointer(elem) => Ty::Pointer(Box::new(go(elem))),
            TypeExpr::Slice(elem) => Ty::Slice(Box::new(go(elem))),
            TypeExpr::Array { len, elem } => {
                let len = match len {
                    ArrayLen::Literal(n) => Some(*n),
                    ArrayLen::Inferred | ArrayLen::Expr(_) => None,
                };
                Ty::Array(len, Box::new(go(elem)))
            }
            TypeExpr::Map { key, value } => Ty::Map(Box::new(go(key)), Box::new(go(value))),
            TypeExpr::Chan { dir, elem } => Ty::Chan(*dir, Box::new(go(elem))),
            TypeExpr::Func(sig) => {
                Ty::Func(Arc::new(self.resolve_signature(info, file, tparams, sig)))
            }
            TypeExpr::Struct(fields) => Ty::Struct(Arc::new(StructTy {
                fields: fields
                    .iter()
                    .flat_map(|f| self.resolve_fields(info, file, tparams, f))
                    .collect(),
            })),
            TypeExpr::Interface(elems) => {
                let mut iface = InterfaceTy::default();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method(m) => iface.methods.push(IfaceMethod {
                            name: m.name.clone(),
                            sig: Arc::new(self.resolve_signature(info, file, tparams, &m.sig)),
                            docs: m.docs.clone(),
                        }),
                        InterfaceElem::Embed(TypeExpr::Union(_) | TypeExpr::Tilde(_)) => {
                            iface.has_type_terms = true;
                        }
                        InterfaceElem::Embed(embed) => match go(embed) {
                            Ty::Basic("comparable") => iface.has_type_terms = true,
                            Ty::Basic(b) if b != "error" && b != "any" => {
                                iface.has_type_terms = true;
                            }
                            ty => iface.embeds.push(ty),
                        },
                    }
                }
                Ty::Interface(Arc::new(iface))
            }
            TypeExpr::Union(terms) => Ty::Union(terms.iter().map(go).collect()),
            TypeExpr::Tilde(elem) => go(elem),
        }
    }

    pub fn resolve_signature(
        &self,
        info: &PackageInfo,
        file: usize,
        tparams: &[String],
        sig: &FuncType,
    ) -> Signature {
        let var = |p: &astg_syntax::ast::Param| {
            let ty = self.resolve_expr(info, file, tparams, &p.ty);
            Var {
                name: p.name.clone().filter(|n| n != "_"),
                ty: if p.variadic { Ty::slice(ty) } else { ty },
                docs: p.docs.clone(),
            }
        };
        Signature {
            params: sig.params.iter().map(var).collect(),
            results: sig.results.iter().map(var).collect(),
            variadic: sig.is_variadic(),
        }
    }

    fn resolve_fields(
        &self,
        info: &PackageInfo,
        file: usize,
        tparams: &[String],
        decl: &FieldDecl,
    ) -> Vec<Field> {
        let ty = self.resolve_expr(info, file, tparams, &decl.ty);
        let mut docs = decl.docs.clone();
        docs.extend(decl.comment.iter().cloned());
        if decl.is_embedded() {
            let name = embedded_name(&decl.ty).unwrap_or_default();
            return vec![Field {
                name,
                ty,
                embedded: true,
                tag: decl.tag.clone(),
                docs,
            }];
        }
        decl.names
            .iter()
            .map(|name| Field {
                name: name.clone(),
                ty: ty.clone(),
                embedded: false,
                tag: decl.tag.clone(),
                docs: docs.clone(),
            })
            .collect()
    }

    fn resolve_ident(&self, info: &PackageInfo, file: usize, tparams: &[String], name: &str) -> Ty {
        if tparams.iter().any(|p| p == name) {
            return Ty::TypeParam(name.to_string());
        }
        if info.has_type(name) {
            return Ty::named(info.pkg_path.clone(), name);
        }
        if let Some(b) = basic(name) {
            return Ty::Basic(b);
        }
        let dot_imports: Vec<String> = info
            .file(file)
            .map(|f| f.dot_imports().map(|imp| imp.path.clone()).collect())
            .unwrap_or_default();
        for path in dot_imports {
            match self.load_package(&path, None) {
                Ok(imported) if imported.has_type(name) => return Ty::named(path, name),
                Ok(_) => {}
                Err(err) => tracing::debug!(import = %path, %err, "dot import not loaded"),
            }
        }
        Ty::Invalid(name.to_string())
    }

    fn resolve_qualified(&self, info: &PackageInfo, file: usize, qual: &str, name: &str) -> Ty {
        match self.import_path(info, file, qual) {
            Some(path) if path == "unsafe" => Ty::Invalid(format!("unsafe.{name}")),
            Some(path) => Ty::named(path, name),
            None => Ty::Invalid(format!("{qual}.{name}")),
        }
    }

    /// Import path a qualifier refers to in one file.
    ///
    /// Explicit names first, then names guessed from the path, then the
    /// package clause of each remaining unnamed import.
    pub fn import_path(&self, info: &PackageInfo, file: usize, qual: &str) -> Option<String> {
        let file = info.file(file)?;
        if let Some(imp) = file
            .imports
            .iter()
            .find(|imp| imp.name.as_deref() == Some(qual))
        {
            return Some(imp.path.clone());
        }
        let unnamed: Vec<_> = file.imports.iter().filter(|imp| imp.name.is_none()).collect();
        if let Some(imp) = unnamed.iter().find(|imp| imp.qualifier().as_deref() == Some(qual)) {
            return Some(imp.path.clone());
        }
        unnamed
            .iter()
            .find(|imp| self.package_name(&imp.path) == qual)
            .map(|imp| imp.path.clone())
    }
}

/// Field name of an embedded field: the type name without pointer,
/// qualifier or type arguments.
fn embedded_name(expr: &TypeExpr) -> Option<String> {
    match expr {
        TypeExpr::Pointer(elem) => embedded_name(elem),
        other => other.base_name().map(|(_, name)| name.to_string()),
    }
}

/// Package qualifiers used anywhere in `expr`.
pub(super) fn qualifiers(expr: &TypeExpr, out: &mut FxHashSet<String>) {
    let sig = |sig: &FuncType, out: &mut FxHashSet<String>| {
        for p in sig.params.iter().chain(&sig.results) {
            qualifiers(&p.ty, out);
        }
    };
    match expr {
        TypeExpr::Ident(_) => {}
        TypeExpr::Qualified { pkg, .. } => {
            out.insert(pkg.clone());
        }
        TypeExpr::Generic { base, args } => {
            qualifiers(base, out);
            for arg in args {
                qualifiers(arg, out);
            }
        }
        TypeExpr::Pointer(e)
        | TypeExpr::Slice(e)
        | TypeExpr::Array { elem: e, .. }
        | TypeExpr::Chan { elem: e, .. }
        | TypeExpr::Tilde(e) => qualifiers(e, out),
        TypeExpr::Map { key, value } => {
            qualifiers(key, out);
            qualifiers(value, out);
        }
        TypeExpr::Func(f) => sig(f, out),
        TypeExpr::Struct(fields) => {
            for field in fields {
                qualifiers(&field.ty, out);
            }
        }
        TypeExpr::Interface(elems) => {
            for elem in elems {
                match elem {
                    InterfaceElem::Method(m) => sig(&m.sig, out),
                    InterfaceElem::Embed(e) => qualifiers(e, out),
                }
            }
        }
        TypeExpr::Union(terms) => {
            for term in terms {
                qualifiers(term, out);
            }
        }
    }
}
