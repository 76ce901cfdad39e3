//! Registering every type reachable from contract signatures.

use astg_ir::{is_anonymous, is_builtin, split_type_id, type_id, Project};
use astg_loader::{PackageLoader, Ty};
use astg_tags::{names, TagChain};
use rustc_hash::FxHashSet;

use crate::convert::Converter;
use crate::error::{AnalyzeError, Result};
use crate::stack::ensure_sufficient_stack;

/// Depth-first walk over the type graph below a set of roots.
///
/// Nodes are keyed by their canonical text, so every node is visited once
/// however often it is reachable; recursive types terminate on the second
/// visit.
pub struct Expander<'a, 'c> {
    loader: &'a PackageLoader,
    conv: &'c mut Converter<'a>,
    seen: FxHashSet<String>,
}

impl<'a, 'c> Expander<'a, 'c> {
    pub fn new(loader: &'a PackageLoader, conv: &'c mut Converter<'a>) -> Self {
        Expander {
            loader,
            conv,
            seen: FxHashSet::default(),
        }
    }

    /// Make sure the declaration behind `type_id` can be loaded, retrying
    /// once on a fresh copy of its package. Aliases also load their base.
    pub fn ensure_type_loaded(&self, type_id: &str) -> Result<()> {
        self.ensure_loaded(type_id, 0)
    }

    fn ensure_loaded(&self, id: &str, depth: usize) -> Result<()> {
        if is_builtin(id) || is_anonymous(id) || depth > 32 {
            return Ok(());
        }
        let (pkg, name) = split_type_id(id);
        let decl = match self.loader.named_decl(pkg, name) {
            Ok(decl) => decl,
            Err(first) => {
                tracing::debug!(type_id = id, err = %first, "type missing, reloading its package");
                self.loader.invalidate(pkg);
                self.loader
                    .named_decl(pkg, name)
                    .map_err(|source| AnalyzeError::TypeMissing {
                        type_id: id.to_string(),
                        source,
                    })?
            }
        };
        if decl.is_alias {
            if let Ty::Named(base) = &decl.rhs {
                self.ensure_loaded(&type_id(&base.pkg, &base.name), depth + 1)?;
            }
        }
        Ok(())
    }

    /// Walk every root, registering what it reaches. A root whose named
    /// base cannot be loaded is skipped.
    #[tracing::instrument(level = "debug", skip_all, fields(roots = roots.len()))]
    pub fn expand(&mut self, project: &mut Project, roots: &[Ty]) {
        for root in roots {
            if let (Ty::Named(named), _) = root.deref_all() {
                let id = type_id(&named.pkg, &named.name);
                if let Err(err) = self.ensure_type_loaded(&id) {
                    tracing::debug!(%err, "expansion root skipped");
                    continue;
                }
            }
            self.walk(project, root);
        }
        tracing::debug!(visited = self.seen.len(), types = project.types.len(), "expanded");
    }

    fn walk(&mut self, project: &mut Project, ty: &Ty) {
        if !self.seen.insert(ty.to_string()) {
            return;
        }
        ensure_sufficient_stack(|| match ty {
            Ty::Basic(_) | Ty::TypeParam(_) | Ty::Invalid(_) | Ty::Union(_) | Ty::Interface(_) => {}
            Ty::Pointer(elem) | Ty::Slice(elem) | Ty::Array(_, elem) | Ty::Chan(_, elem) => {
                self.walk(project, elem);
            }
            Ty::Map(key, value) => {
                self.walk(project, key);
                self.walk(project, value);
            }
            Ty::Func(sig) => {
                for var in sig.params.iter().chain(&sig.results) {
                    self.walk(project, &var.ty);
                }
            }
            Ty::Struct(st) => {
                for field in &st.fields {
                    self.walk(project, &field.ty);
                }
            }
            Ty::Named(named) => {
                self.conv.convert_named(project, named);
                self.seen.insert(Ty::pointer(ty.clone()).to_string());
                match self.loader.named_decl(&named.pkg, &named.name) {
                    Ok(decl) => {
                        let underlying = decl.instantiate(&named.args);
                        self.walk(project, &underlying);
                    }
                    Err(err) => tracing::debug!(ty = %ty, %err, "underlying type not expanded"),
                }
            }
        });
    }
}

/// Expansion roots beyond the method signatures: declared error types and
/// the `defaultError` of each contract.
pub fn error_roots(project: &Project) -> Vec<Ty> {
    let mut out = Vec::new();
    let mut push = |id: &str| {
        let (pkg, name) = split_type_id(id);
        if !pkg.is_empty() && !name.is_empty() {
            let ty = Ty::named(pkg, name);
            if !out.contains(&ty) {
                out.push(ty);
            }
        }
    };
    for contract in &project.contracts {
        for method in &contract.methods {
            for err in &method.errors {
                push(&err.type_id);
            }
        }
        let chain = TagChain::root(&project.annotations).narrow(&contract.annotations);
        if let Some(default) = chain.value(names::DEFAULT_ERROR) {
            push(default);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{pkg, Module};
    use astg_ir::{Contract, ErrorInfo, Method};
    use pretty_assertions::assert_eq;

    const DTO: &str = r#"package dto

type Tree struct {
	Root  *Node
	Index map[string][]*Node
}

type Node struct {
	Value    Value
	Children []*Node
	Parent   *Node
}

type Value = Inner

type Inner struct{ N int }

type Callback func(ev Event) error

type Event struct{ Name string }
"#;

    #[test]
    fn walks_to_every_reachable_type() {
        let module = Module::new(&[("dto/dto.go", DTO)]);
        let loader = module.loader();
        let mut project = Project::default();
        let mut conv = Converter::new(&loader);
        let dto = pkg("dto");
        let roots = vec![
            Ty::pointer(Ty::named(&dto, "Tree")),
            Ty::named(&dto, "Callback"),
            Ty::named(&dto, "Absent"),
        ];
        Expander::new(&loader, &mut conv).expand(&mut project, &roots);

        let mut ids: Vec<_> = project
            .types
            .keys()
            .filter(|id| !is_anonymous(id))
            .cloned()
            .collect();
        ids.sort();
        let expected: Vec<String> = ["Callback", "Event", "Inner", "Node", "Tree", "Value"]
            .iter()
            .map(|n| format!("{dto}:{n}"))
            .collect();
        assert_eq!(ids, expected);
        assert_eq!(
            project.types[&format!("{dto}:Value")].alias_of,
            format!("{dto}:Inner")
        );
    }

    #[test]
    fn ensure_loaded_reports_missing_types() {
        let module = Module::new(&[("dto/dto.go", DTO)]);
        let loader = module.loader();
        let mut conv = Converter::new(&loader);
        let expander = Expander::new(&loader, &mut conv);
        let dto = pkg("dto");

        assert!(expander.ensure_type_loaded("string").is_ok());
        assert!(expander.ensure_type_loaded(&format!("{dto}:Value")).is_ok());
        let err = expander.ensure_type_loaded(&format!("{dto}:Absent"));
        assert!(matches!(err, Err(AnalyzeError::TypeMissing { .. })));
    }

    #[test]
    fn ensure_loaded_sees_types_added_later() {
        let module = Module::new(&[("dto/dto.go", DTO)]);
        let loader = module.loader();
        let dto = pkg("dto");
        assert!(loader.named_decl(&dto, "Late").is_err());
        module.write("dto/late.go", "package dto\n\ntype Late struct{}\n");

        let mut conv = Converter::new(&loader);
        let expander = Expander::new(&loader, &mut conv);
        assert!(expander.ensure_type_loaded(&format!("{dto}:Late")).is_ok());
    }

    #[test]
    fn error_roots_include_default_error() {
        let mut project = Project::default();
        project
            .annotations
            .insert(names::DEFAULT_ERROR, "example.com/app/errs:Internal");
        project.contracts.push(Contract {
            methods: vec![Method {
                errors: vec![
                    ErrorInfo::new("example.com/app/errs", "NotFound", Some(404)),
                    ErrorInfo::new("example.com/app/errs", "NotFound", None),
                ],
                ..Method::default()
            }],
            ..Contract::default()
        });
        let roots: Vec<_> = error_roots(&project).iter().map(ToString::to_string).collect();
        assert_eq!(
            roots,
            vec!["example.com/app/errs.NotFound", "example.com/app/errs.Internal"]
        );
    }
}
