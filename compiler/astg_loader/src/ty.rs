//! Resolved types.
//!
//! A [`Ty`] is a type expression with every identifier bound to its
//! declaring package. Named types are references; their definitions are
//! fetched from the loader on demand, so cyclic graphs need no special
//! handling here.

use std::fmt;
use std::sync::Arc;

pub use astg_syntax::ast::ChanDir;

/// Reference to a declared type, possibly instantiated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamedRef {
    pub pkg: String,
    pub name: String,
    pub args: Vec<Ty>,
}

impl NamedRef {
    pub fn new(pkg: impl Into<String>, name: impl Into<String>) -> Self {
        NamedRef {
            pkg: pkg.into(),
            name: name.into(),
            args: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Predeclared type: `int`, `string`, `error`, `any`, ...
    Basic(&'static str),
    Named(NamedRef),
    Pointer(Box<Ty>),
    Slice(Box<Ty>),
    /// Length is `None` when it is not a literal.
    Array(Option<u64>, Box<Ty>),
    Map(Box<Ty>, Box<Ty>),
    Chan(ChanDir, Box<Ty>),
    Func(Arc<Signature>),
    Struct(Arc<StructTy>),
    Interface(Arc<InterfaceTy>),
    /// Constraint union; only appears inside interfaces.
    Union(Vec<Ty>),
    TypeParam(String),
    /// Unresolvable expression, kept as text.
    Invalid(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Var {
    pub name: Option<String>,
    pub ty: Ty,
    pub docs: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<Var>,
    pub results: Vec<Var>,
    /// Last parameter is `...T`; its `ty` is `[]T`.
    pub variadic: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    /// Type name for embedded fields.
    pub name: String,
    pub ty: Ty,
    pub embedded: bool,
    pub tag: Option<String>,
    pub docs: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StructTy {
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IfaceMethod {
    pub name: String,
    pub sig: Arc<Signature>,
    pub docs: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InterfaceTy {
    pub methods: Vec<IfaceMethod>,
    pub embeds: Vec<Ty>,
    /// Contains type terms, so it is a constraint and not a method set.
    pub has_type_terms: bool,
}

impl Default for Ty {
    fn default() -> Self {
        Ty::Invalid(String::new())
    }
}

/// Predeclared type names, interned.
pub const BASIC_TYPES: &[&str] = &[
    "bool",
    "string",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "float32",
    "float64",
    "complex64",
    "complex128",
    "byte",
    "rune",
    "error",
    "any",
    "comparable",
];

/// Interned name of a predeclared type.
pub fn basic(name: &str) -> Option<&'static str> {
    BASIC_TYPES.iter().copied().find(|b| *b == name)
}

impl Ty {
    pub fn named(pkg: impl Into<String>, name: impl Into<String>) -> Ty {
        Ty::Named(NamedRef::new(pkg, name))
    }

    pub fn pointer(elem: Ty) -> Ty {
        Ty::Pointer(Box::new(elem))
    }

    pub fn slice(elem: Ty) -> Ty {
        Ty::Slice(Box::new(elem))
    }

    pub fn as_named(&self) -> Option<&NamedRef> {
        match self {
            Ty::Named(named) => Some(named),
            _ => None,
        }
    }

    /// Strip every pointer, returning the base and the pointer count.
    pub fn deref_all(&self) -> (&Ty, usize) {
        let mut ty = self;
        let mut count = 0;
        while let Ty::Pointer(elem) = ty {
            ty = elem;
            count += 1;
        }
        (ty, count)
    }

    pub fn is_basic(&self, name: &str) -> bool {
        matches!(self, Ty::Basic(b) if *b == name)
    }

    /// `interface{}` or `any`.
    pub fn is_empty_interface(&self) -> bool {
        match self {
            Ty::Basic("any") => true,
            Ty::Interface(iface) => iface.methods.is_empty() && iface.embeds.is_empty(),
            _ => false,
        }
    }

    /// Signed integer basic type (`int`, `int8` ... `int64`, `rune`).
    pub fn is_signed_int(&self) -> bool {
        matches!(
            self,
            Ty::Basic("int" | "int8" | "int16" | "int32" | "int64" | "rune")
        )
    }

    /// Replace type parameters by the matching arguments.
    pub fn substitute(&self, params: &[String], args: &[Ty]) -> Ty {
        if params.is_empty() || args.is_empty() {
            return self.clone();
        }
        let sub = |t: &Ty| t.substitute(params, args);
        match self {
            Ty::TypeParam(name) => params
                .iter()
                .position(|p| p == name)
                .and_then(|i| args.get(i))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Ty::Named(named) => Ty::Named(NamedRef {
                pkg: named.pkg.clone(),
                name: named.name.clone(),
                args: named.args.iter().map(sub).collect(),
            }),
            Ty::Pointer(e) => Ty::Pointer(Box::new(sub(e))),
            Ty::Slice(e) => Ty::Slice(Box::new(sub(e))),
            Ty::Array(n, e) => Ty::Array(*n, Box::new(sub(e))),
            Ty::Map(k, v) => Ty::Map(Box::new(sub(k)), Box::new(sub(v))),
            Ty::Chan(d, e) => Ty::Chan(*d, Box::new(sub(e))),
            Ty::Func(sig) => Ty::Func(Arc::new(sig.substitute(params, args))),
            Ty::Struct(st) => Ty::Struct(Arc::new(StructTy {
                fields: st
                    .fields
                    .iter()
                    .map(|f| Field {
                        ty: sub(&f.ty),
                        ..f.clone()
                    })
                    .collect(),
            })),
            Ty::Interface(iface) => Ty::Interface(Arc::new(InterfaceTy {
                methods: iface
                    .methods
                    .iter()
                    .map(|m| IfaceMethod {
                        sig: Arc::new(m.sig.substitute(params, args)),
                        ..m.clone()
                    })
                    .collect(),
                embeds: iface.embeds.iter().map(sub).collect(),
                has_type_terms: iface.has_type_terms,
            })),
            Ty::Union(terms) => Ty::Union(terms.iter().map(sub).collect()),
            Ty::Basic(_) | Ty::Invalid(_) => self.clone(),
        }
    }
}

impl Signature {
    pub fn substitute(&self, params: &[String], args: &[Ty]) -> Signature {
        let vars = |vs: &[Var]| {
            vs.iter()
                .map(|v| Var {
                    ty: v.ty.substitute(params, args),
                    ..v.clone()
                })
                .collect()
        };
        Signature {
            params: vars(&self.params),
            results: vars(&self.results),
            variadic: self.variadic,
        }
    }
}

/// Structural identity of two types.
///
/// `byte`/`uint8`, `rune`/`int32` and `any`/`interface{}` are the same type.
/// Parameter names and docs do not matter.
pub fn identical(a: &Ty, b: &Ty) -> bool {
    if a.is_empty_interface() && b.is_empty_interface() {
        return true;
    }
    match (a, b) {
        (Ty::Basic(x), Ty::Basic(y)) => canonical_basic(x) == canonical_basic(y),
        (Ty::Named(x), Ty::Named(y)) => {
            x.pkg == y.pkg
                && x.name == y.name
                && x.args.len() == y.args.len()
                && x.args.iter().zip(&y.args).all(|(l, r)| identical(l, r))
        }
        (Ty::Pointer(x), Ty::Pointer(y)) | (Ty::Slice(x), Ty::Slice(y)) => identical(x, y),
        (Ty::Array(n, x), Ty::Array(m, y)) => n == m && identical(x, y),
        (Ty::Map(k1, v1), Ty::Map(k2, v2)) => identical(k1, k2) && identical(v1, v2),
        (Ty::Chan(d1, x), Ty::Chan(d2, y)) => d1 == d2 && identical(x, y),
        (Ty::Func(x), Ty::Func(y)) => identical_signatures(x, y),
        (Ty::Struct(x), Ty::Struct(y)) => {
            x.fields.len() == y.fields.len()
                && x.fields.iter().zip(&y.fields).all(|(f, g)| {
                    f.name == g.name
                        && f.embedded == g.embedded
                        && f.tag == g.tag
                        && identical(&f.ty, &g.ty)
                })
        }
        (Ty::Interface(x), Ty::Interface(y)) => {
            x.methods.len() == y.methods.len()
                && x.methods.iter().all(|m| {
                    y.methods
                        .iter()
                        .any(|n| n.name == m.name && identical_signatures(&m.sig, &n.sig))
                })
                && x.embeds.len() == y.embeds.len()
        }
        (Ty::TypeParam(x), Ty::TypeParam(y)) => x == y,
        (x, y) => x.to_string() == y.to_string(),
    }
}

pub fn identical_signatures(a: &Signature, b: &Signature) -> bool {
    a.variadic == b.variadic
        && a.params.len() == b.params.len()
        && a.results.len() == b.results.len()
        && a.params.iter().zip(&b.params).all(|(x, y)| identical(&x.ty, &y.ty))
        && a.results.iter().zip(&b.results).all(|(x, y)| identical(&x.ty, &y.ty))
}

fn canonical_basic(name: &str) -> &str {
    match name {
        "byte" => "uint8",
        "rune" => "int32",
        other => other,
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Basic(name) => f.write_str(name),
            Ty::Named(named) => write!(f, "{named}"),
            Ty::Pointer(elem) => write!(f, "*{elem}"),
            Ty::Slice(elem) => write!(f, "[]{elem}"),
            Ty::Array(Some(n), elem) => write!(f, "[{n}]{elem}"),
            Ty::Array(None, elem) => write!(f, "[?]{elem}"),
            Ty::Map(key, value) => write!(f, "map[{key}]{value}"),
            Ty::Chan(ChanDir::Both, elem) => write!(f, "chan {elem}"),
            Ty::Chan(ChanDir::Send, elem) => write!(f, "chan<- {elem}"),
            Ty::Chan(ChanDir::Recv, elem) => write!(f, "<-chan {elem}"),
            Ty::Func(sig) => write!(f, "func{sig}"),
            Ty::Struct(st) => {
                f.write_str("struct{")?;
                for (i, field) in st.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                    if let Some(tag) = &field.tag {
                        write!(f, " {tag:?}")?;
                    }
                }
                f.write_str("}")
            }
            Ty::Interface(iface) => {
                f.write_str("interface{")?;
                let mut first = true;
                for embed in &iface.embeds {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    write!(f, "{embed}")?;
                }
                for method in &iface.methods {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    write!(f, "{}{}", method.name, method.sig)?;
                }
                f.write_str("}")
            }
            Ty::Union(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
            Ty::TypeParam(name) => f.write_str(name),
            Ty::Invalid(text) => write!(f, "invalid({text})"),
        }
    }
}

impl fmt::Display for NamedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pkg.is_empty() {
            f.write_str(&self.name)?;
        } else {
            write!(f, "{}.{}", self.pkg, self.name)?;
        }
        if !self.args.is_empty() {
            f.write_str("[")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match (&param.ty, self.variadic && i == last) {
                (Ty::Slice(elem), true) => write!(f, "...{elem}")?,
                (ty, _) => write!(f, "{ty}")?,
            }
        }
        f.write_str(")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {}", single.ty),
            results => {
                f.write_str(" (")?;
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", result.ty)?;
                }
                f.write_str(")")
            }
        }
    }
}
