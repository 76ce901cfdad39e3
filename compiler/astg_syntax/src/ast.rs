//! Declaration-level syntax tree for Go sources.
//!
//! Only what the analyzer needs is modelled: the package clause, imports,
//! type declarations and function declarations. Function bodies are kept as
//! token streams; `var` and `const` declarations are skipped.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::token::Token;

/// A parsed Go source file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Package name from the package clause.
    pub package: String,
    /// Doc comment lines above the package clause.
    pub package_docs: Vec<String>,
    /// Build constraint expression (`//go:build` or joined `// +build`).
    pub build_constraint: Option<String>,
    /// Whether the file carries a `Code generated ... DO NOT EDIT.` header.
    pub generated: bool,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

impl SourceFile {
    pub fn type_specs(&self) -> impl Iterator<Item = &TypeSpec> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Type(spec) => Some(spec),
            Decl::Func(_) => None,
        })
    }

    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(func) => Some(func),
            Decl::Type(_) => None,
        })
    }

    /// Local name an import is referred to by in this file.
    ///
    /// Blank and dot imports have no qualifier and return `None`.
    pub fn import_by_qualifier(&self, qualifier: &str) -> Option<&ImportSpec> {
        self.imports
            .iter()
            .find(|imp| imp.qualifier().as_deref() == Some(qualifier))
    }

    pub fn dot_imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.imports.iter().filter(|imp| imp.name.as_deref() == Some("."))
    }
}

/// `import name "path"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit local name (`_`, `.`, or an identifier).
    pub name: Option<String>,
    pub path: String,
    pub line: u32,
}

impl ImportSpec {
    /// Qualifier used in this file for the import.
    ///
    /// Without an explicit name this is the last path element with a
    /// major-version suffix (`/v2`) and a `go-` prefix skipped.
    pub fn qualifier(&self) -> Option<String> {
        match self.name.as_deref() {
            Some("_" | ".") => None,
            Some(name) => Some(name.to_string()),
            None => Some(default_package_name(&self.path)),
        }
    }
}

/// Guess the package name of an import path from its last element.
pub fn default_package_name(path: &str) -> String {
    let mut parts = path.rsplit('/');
    let mut last = parts.next().unwrap_or(path);
    if is_major_version(last) {
        last = parts.next().unwrap_or(last);
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let last = last.split('.').next().unwrap_or(last);
    last.replace('-', "_")
}

fn is_major_version(elem: &str) -> bool {
    elem.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decl {
    Type(TypeSpec),
    Func(FuncDecl),
}

/// `type Name[TypeParams] Type` or `type Name = Type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub is_alias: bool,
    pub ty: TypeExpr,
    pub docs: Vec<String>,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParam {
    pub names: Vec<String>,
    pub constraint: TypeExpr,
}

/// Function or method declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncDecl {
    pub name: String,
    pub recv: Option<Receiver>,
    pub type_params: Vec<TypeParam>,
    pub sig: FuncType,
    /// Body tokens between (excluding) the outer braces.
    pub body: Option<Arc<[Token]>>,
    pub docs: Vec<String>,
    pub line: u32,
}

/// Method receiver: `(s *Service)` or `(List[T])`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receiver {
    pub name: Option<String>,
    pub type_name: String,
    pub pointer: bool,
    pub type_args: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FuncType {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

impl FuncType {
    /// Whether the last parameter is variadic.
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.variadic)
    }
}

/// A parameter or result. `ty` excludes the `...` of variadics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeExpr,
    pub variadic: bool,
    pub docs: Vec<String>,
}

/// Struct field declaration; several names may share one type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    /// Empty for embedded fields.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    /// Tag contents without the surrounding quotes.
    pub tag: Option<String>,
    pub docs: Vec<String>,
    /// Trailing comment on the field's line.
    pub comment: Option<String>,
}

impl FieldDecl {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InterfaceElem {
    Method(MethodSpec),
    /// Embedded interface or a constraint term (`~int | string`).
    Embed(TypeExpr),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: String,
    pub sig: FuncType,
    pub docs: Vec<String>,
    pub line: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayLen {
    Literal(u64),
    /// `[...]T`
    Inferred,
    /// A named constant or expression, kept as text.
    Expr(String),
}

/// Syntactic type expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeExpr {
    Ident(String),
    Qualified {
        pkg: String,
        name: String,
    },
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        len: ArrayLen,
        elem: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr>,
    },
    Func(FuncType),
    Struct(Vec<FieldDecl>),
    Interface(Vec<InterfaceElem>),
    Union(Vec<TypeExpr>),
    Tilde(Box<TypeExpr>),
}

impl TypeExpr {
    /// Base type name of a (possibly qualified or instantiated) named type.
    pub fn base_name(&self) -> Option<(Option<&str>, &str)> {
        match self {
            TypeExpr::Ident(name) => Some((None, name)),
            TypeExpr::Qualified { pkg, name } => Some((Some(pkg), name)),
            TypeExpr::Generic { base, .. } => base.base_name(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Ident(name) => f.write_str(name),
            TypeExpr::Qualified { pkg, name } => write!(f, "{pkg}.{name}"),
            TypeExpr::Generic { base, args } => {
                write!(f, "{base}[")?;
                write_list(f, args, ", ")?;
                f.write_str("]")
            }
            TypeExpr::Pointer(elem) => write!(f, "*{elem}"),
            TypeExpr::Slice(elem) => write!(f, "[]{elem}"),
            TypeExpr::Array { len, elem } => match len {
                ArrayLen::Literal(n) => write!(f, "[{n}]{elem}"),
                ArrayLen::Inferred => write!(f, "[...]{elem}"),
                ArrayLen::Expr(e) => write!(f, "[{e}]{elem}"),
            },
            TypeExpr::Map { key, value } => write!(f, "map[{key}]{value}"),
            TypeExpr::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {elem}"),
                ChanDir::Send => write!(f, "chan<- {elem}"),
                ChanDir::Recv => write!(f, "<-chan {elem}"),
            },
            TypeExpr::Func(sig) => write!(f, "func{sig}"),
            TypeExpr::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if !field.names.is_empty() {
                        write!(f, "{} ", field.names.join(", "))?;
                    }
                    write!(f, "{}", field.ty)?;
                    if let Some(tag) = &field.tag {
                        write!(f, " `{tag}`")?;
                    }
                }
                f.write_str("}")
            }
            TypeExpr::Interface(elems) => {
                f.write_str("interface{")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    match elem {
                        InterfaceElem::Method(m) => write!(f, "{}{}", m.name, m.sig)?,
                        InterfaceElem::Embed(t) => write!(f, "{t}")?,
                    }
                }
                f.write_str("}")
            }
            TypeExpr::Union(terms) => write_list(f, terms, " | "),
            TypeExpr::Tilde(elem) => write!(f, "~{elem}"),
        }
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if let Some(name) = &p.name {
                write!(f, "{name} ")?;
            }
            if p.variadic {
                f.write_str("...")?;
            }
            write!(f, "{}", p.ty)?;
        }
        f.write_str(")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] if single.name.is_none() => write!(f, " {}", single.ty),
            results => {
                f.write_str(" (")?;
                for (i, p) in results.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(name) = &p.name {
                        write!(f, "{name} ")?;
                    }
                    write!(f, "{}", p.ty)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeExpr], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
