//! Error types: classification, body scanning and per-method collection.

use astg_ir::{split_type_id, type_id, ErrorInfo, Method, Project};
use astg_loader::ty::basic;
use astg_loader::{is_exported, PackageInfo, PackageLoader, Ty};
use astg_syntax::{Token, TokenKind};
use astg_tags::{names, Annotations};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Decides whether a named type is an error type, caching by TypeID.
///
/// `T` is an error type when it is not an interface and `*T` has
/// `Error() string` and a `Code()` returning a signed integer.
pub struct ErrorClassifier<'a> {
    loader: &'a PackageLoader,
    cache: RwLock<FxHashMap<String, bool>>,
}

impl<'a> ErrorClassifier<'a> {
    pub fn new(loader: &'a PackageLoader) -> Self {
        ErrorClassifier {
            loader,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn classify_error(&self, pkg_path: &str, name: &str) -> bool {
        let key = type_id(pkg_path, name);
        if let Some(known) = self.cache.read().get(&key) {
            return *known;
        }
        let verdict = self.check(pkg_path, name);
        self.cache.write().insert(key, verdict);
        verdict
    }

    fn check(&self, pkg_path: &str, name: &str) -> bool {
        if let Err(err) = self.loader.load_for_error_type(pkg_path, name) {
            tracing::debug!(pkg_path, name, %err, "error candidate not loaded");
            return false;
        }
        let ty = Ty::named(pkg_path, name);
        if !matches!(self.loader.is_interface(&ty), Ok(false)) {
            return false;
        }
        let Ok(methods) = self.loader.method_set(&Ty::pointer(ty)) else {
            return false;
        };
        let has_error = methods.iter().any(|m| {
            m.name == "Error"
                && m.sig.params.is_empty()
                && matches!(m.sig.results.as_slice(), [r] if r.ty.is_basic("string"))
        });
        let has_code = methods.iter().any(|m| {
            m.name == "Code"
                && m.sig.params.is_empty()
                && matches!(m.sig.results.as_slice(), [r] if self.is_signed_int(&r.ty))
        });
        has_error && has_code
    }

    fn is_signed_int(&self, ty: &Ty) -> bool {
        ty.is_signed_int()
            || self
                .loader
                .underlying(ty)
                .is_ok_and(|u| u.is_signed_int())
    }

    /// Type names mentioned in a function body that might be error types.
    ///
    /// `pkg.Name` resolves through the imports of the body's file; a bare
    /// `Name` must be declared in the body's package. Predeclared names and
    /// selectors (`x.Name` after a value) are ignored. Candidates are
    /// returned once each, in order of first appearance.
    pub fn scan_body(&self, info: &PackageInfo, file: usize, body: &[Token]) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = Vec::new();
        let mut push = |pkg: String, name: String| {
            if !out.iter().any(|(p, n)| *p == pkg && *n == name) {
                out.push((pkg, name));
            }
        };
        let mut i = 0;
        while i < body.len() {
            let tok = &body[i];
            let after_dot = i > 0 && body[i - 1].kind == TokenKind::Dot;
            if tok.kind != TokenKind::Ident || after_dot {
                i += 1;
                continue;
            }
            let qualified = matches!(
                (body.get(i + 1), body.get(i + 2)),
                (Some(dot), Some(name)) if dot.kind == TokenKind::Dot && name.kind == TokenKind::Ident
            );
            if qualified {
                let name = &body[i + 2].text;
                if is_exported(name) && !info.has_type(&tok.text) {
                    if let Some(path) = self.loader.import_path(info, file, &tok.text) {
                        push(path, name.to_string());
                    }
                }
                i += 3;
                continue;
            }
            if info.has_type(&tok.text) && basic(&tok.text).is_none() {
                push(info.pkg_path.clone(), tok.text.to_string());
            }
            i += 1;
        }
        out
    }

    /// Error types constructed or referenced in a function body.
    pub fn errors_in_body(&self, info: &PackageInfo, file: usize, body: &[Token]) -> Vec<ErrorInfo> {
        self.scan_body(info, file, body)
            .into_iter()
            .filter(|(pkg, name)| self.classify_error(pkg, name))
            .map(|(pkg, name)| ErrorInfo::new(&pkg, &name, None))
            .collect()
    }

    /// Error types raised by the package-level function `pkg_path:func`.
    pub fn errors_in_func(&self, reference: &str) -> Vec<ErrorInfo> {
        let (pkg_path, func) = split_type_id(reference);
        if pkg_path.is_empty() || func.is_empty() {
            tracing::debug!(reference, "malformed handler reference");
            return Vec::new();
        }
        let found = self
            .loader
            .lookup_func(pkg_path, func)
            .and_then(|f| Ok((self.loader.load(pkg_path)?, f)));
        match found {
            Ok((info, f)) => match &f.body {
                Some(body) => self.errors_in_body(&info, f.file_index, body),
                None => Vec::new(),
            },
            Err(err) => {
                tracing::debug!(reference, %err, "handler not loaded");
                Vec::new()
            }
        }
    }
}

/// Errors mapped by `@<code> pkg:Type` tags, narrowest scope first.
///
/// A scope can disable a code set by a broader one with `@<code> skip`.
fn annotated_errors(scopes: &[&Annotations]) -> Vec<ErrorInfo> {
    let mut codes: Vec<u16> = scopes
        .iter()
        .flat_map(|s| s.error_codes().map(|(code, _)| code))
        .collect();
    codes.sort_unstable();
    codes.dedup();

    let mut out = Vec::new();
    for code in codes {
        let tag = code.to_string();
        let Some(value) = scopes.iter().find_map(|s| s.value(&tag).filter(|v| !v.is_empty())) else {
            continue;
        };
        if value == names::SKIP {
            continue;
        }
        match value.rsplit_once(':') {
            Some((pkg, name)) if !pkg.is_empty() && !name.is_empty() => {
                out.push(ErrorInfo::new(pkg, name, Some(code)));
            }
            _ => tracing::debug!(code, value, "malformed error mapping"),
        }
    }
    out
}

/// Fill `errors` of every method from annotations, implementation bodies
/// and the handler.
#[tracing::instrument(level = "debug", skip_all)]
pub fn collect_errors(project: &mut Project, classifier: &ErrorClassifier<'_>) {
    let project_tags = project.annotations.clone();
    for contract in &mut project.contracts {
        let mut per_method: Vec<Vec<ErrorInfo>> = Vec::with_capacity(contract.methods.len());
        for method in &contract.methods {
            let mut errors =
                annotated_errors(&[&method.annotations, &contract.annotations, &project_tags]);
            for implementation in &contract.implementations {
                if let Some(found) = implementation.methods_map.get(&method.name) {
                    errors.extend(found.error_types.iter().cloned());
                }
            }
            if let Some(handler) = &method.handler {
                errors.extend(classifier.errors_in_func(handler));
            }
            per_method.push(errors);
        }
        for (method, errors) in contract.methods.iter_mut().zip(per_method) {
            add_unique(method, errors);
        }
    }
}

/// Add errors, keeping one entry per type unless it carries a code.
fn add_unique(method: &mut Method, errors: Vec<ErrorInfo>) {
    for err in errors {
        let known = method.errors.iter().any(|e| {
            e.pkg_path == err.pkg_path
                && e.type_name == err.type_name
                && (err.http_code.is_none() || e.http_code == err.http_code)
        });
        if !known {
            method.add_errors([err]);
        }
    }
}
