//! The set of types a client must declare.
//!
//! Starting from every wire argument, wire result, declared error and
//! `defaultError` of the rendered contracts, the closure over struct
//! fields, containers, aliases and interface signatures is collected.
//! Built-ins, pass-through external types and JSON-marshaler implementors
//! are referenced through their own package and never redeclared;
//! anonymous composites are walked but rendered inline.

use std::collections::{BTreeMap, BTreeSet};

use astg_ir::{is_anonymous, is_builtin, Contract, Function, Project, Type, Variable};
use astg_tags::names;
use rustc_hash::FxHashSet;

use crate::names::upper_first;

/// Interface whose implementors keep their own wire format.
pub const JSON_MARSHALER: &str = "encoding/json:Marshaler";

/// External types the generated code imports instead of redeclaring.
pub const PASS_THROUGH_TYPES: &[&str] = &[
    "context:Context",
    "database/sql:NullBool",
    "database/sql:NullByte",
    "database/sql:NullFloat64",
    "database/sql:NullInt16",
    "database/sql:NullInt32",
    "database/sql:NullInt64",
    "database/sql:NullString",
    "database/sql:NullTime",
    "encoding/json:Number",
    "encoding/json:RawMessage",
    "github.com/gofrs/uuid:UUID",
    "github.com/google/uuid:UUID",
    "github.com/satori/go.uuid:UUID",
    "github.com/shopspring/decimal:Decimal",
    "github.com/shopspring/decimal:NullDecimal",
    "io:ReadCloser",
    "io:Reader",
    "math/big:Float",
    "math/big:Int",
    "math/big:Rat",
    "time:Duration",
    "time:Location",
    "time:Month",
    "time:Time",
    "time:Weekday",
];

/// Packages whose every type is passed through (nullable wrappers).
pub const PASS_THROUGH_PACKAGES: &[&str] = &[
    "github.com/guregu/null",
    "github.com/guregu/null/v5",
    "gopkg.in/guregu/null.v3",
    "gopkg.in/guregu/null.v4",
];

/// Whether a type is referenced through its original package.
pub fn is_pass_through(project: &Project, type_id: &str) -> bool {
    if PASS_THROUGH_TYPES.contains(&type_id) {
        return true;
    }
    let pkg = type_id.rsplit_once(':').map_or("", |(pkg, _)| pkg);
    if PASS_THROUGH_PACKAGES.contains(&pkg) {
        return true;
    }
    project
        .get_type(type_id)
        .is_some_and(|ty| ty.implements(JSON_MARSHALER))
}

/// Types to declare, each with a unique Go name.
#[derive(Debug, Default)]
pub struct CollectedTypes {
    ids: BTreeSet<String>,
    names: BTreeMap<String, String>,
}

impl CollectedTypes {
    /// Collect from every contract of the project.
    pub fn collect(project: &Project) -> Self {
        let contracts: Vec<&Contract> = project.contracts.iter().collect();
        Self::collect_from(project, &contracts)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(contracts = contracts.len()))]
    pub fn collect_from(project: &Project, contracts: &[&Contract]) -> Self {
        let mut walk = Walk {
            project,
            seen: FxHashSet::default(),
            ids: BTreeSet::new(),
        };
        for contract in contracts {
            for method in &contract.methods {
                for var in method.wire_args().iter().chain(method.wire_results()) {
                    walk.var(var);
                }
                for err in &method.errors {
                    walk.visit(&err.type_id);
                }
                if let Some(default) = contract
                    .method_tags(&project.annotations, method)
                    .value(names::DEFAULT_ERROR)
                {
                    walk.visit(default.trim());
                }
            }
        }
        let ids = walk.ids;
        let names = assign_names(project, &ids);
        tracing::debug!(types = ids.len(), "types collected");
        CollectedTypes { ids, names }
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.ids.contains(type_id)
    }

    /// Go name the type is declared under.
    pub fn go_name(&self, type_id: &str) -> Option<&str> {
        self.names.get(type_id).map(String::as_str)
    }

    /// Collected TypeIDs ordered by Go name.
    pub fn by_name(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = self
            .names
            .iter()
            .map(|(id, name)| (name.as_str(), id.as_str()))
            .collect();
        out.sort_unstable();
        out
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

struct Walk<'a> {
    project: &'a Project,
    seen: FxHashSet<String>,
    ids: BTreeSet<String>,
}

impl Walk<'_> {
    fn var(&mut self, var: &Variable) {
        for id in var.type_ref.type_ids() {
            self.visit(id);
        }
    }

    fn function(&mut self, func: &Function) {
        for var in func.args.iter().chain(&func.results) {
            self.var(var);
        }
    }

    fn visit(&mut self, type_id: &str) {
        if type_id.is_empty() || is_builtin(type_id) || !self.seen.insert(type_id.to_string()) {
            return;
        }
        if is_pass_through(self.project, type_id) {
            return;
        }
        let Some(ty) = self.project.get_type(type_id) else {
            tracing::debug!(type_id, "referenced type not in registry");
            return;
        };
        if !is_anonymous(type_id) {
            self.ids.insert(type_id.to_string());
        }
        self.children(ty);
    }

    fn children(&mut self, ty: &Type) {
        for id in [&ty.alias_of, &ty.underlying_type_id, &ty.array_of_id, &ty.chan_of_id] {
            self.visit(id);
        }
        for side in [&ty.map_key, &ty.map_value].into_iter().flatten() {
            for id in side.type_ids() {
                self.visit(id);
            }
        }
        for field in &ty.struct_fields {
            for id in field.type_ref.type_ids() {
                self.visit(id);
            }
        }
        for id in &ty.embedded_interfaces {
            self.visit(id);
        }
        for method in &ty.interface_methods {
            self.function(method);
        }
        for var in ty.function_args.iter().chain(&ty.function_results) {
            self.var(var);
        }
    }
}

/// Type names, prefixed with the package name where two packages clash.
fn assign_names(project: &Project, ids: &BTreeSet<String>) -> BTreeMap<String, String> {
    let mut by_name: BTreeMap<&str, Vec<&String>> = BTreeMap::new();
    for id in ids {
        let name = project.get_type(id).map_or("", |t| t.type_name.as_str());
        by_name.entry(name).or_default().push(id);
    }
    let mut taken: BTreeSet<String> = by_name
        .iter()
        .filter(|(_, ids)| ids.len() == 1)
        .map(|(name, _)| (*name).to_string())
        .collect();
    let mut out = BTreeMap::new();
    for (name, group) in by_name {
        if group.len() == 1 {
            out.insert(group[0].clone(), name.to_string());
            continue;
        }
        for id in group {
            let pkg_name = project.get_type(id).map_or("", |t| t.pkg_name.as_str());
            let base = format!("{}{name}", upper_first(pkg_name));
            let mut candidate = base.clone();
            let mut n = 1;
            while !taken.insert(candidate.clone()) {
                n += 1;
                candidate = format!("{base}{n}");
            }
            out.insert(id.clone(), candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{named, project_with, struct_type};
    use astg_ir::{ErrorInfo, Kind, Method, TypeRef};
    use pretty_assertions::assert_eq;

    #[test]
    fn closure_skips_builtins_and_pass_through() {
        let mut project = project_with(&[
            ("app/dto:User", struct_type("app/dto", "User", &[("ID", "app/dto:UserID"), ("At", "time:Time"), ("Tags", ":map:anonymous:00000001")])),
            ("app/dto:UserID", {
                let mut t = named(Kind::Alias, "app/dto", "UserID");
                t.underlying_kind = Some(Kind::Int64);
                t.underlying_type_id = "int64".to_string();
                t
            }),
            (":map:anonymous:00000001", {
                let mut t = Type { kind: Kind::Map, ..Type::default() };
                t.map_key = Some(Box::new(TypeRef::new("string")));
                t.map_value = Some(Box::new(TypeRef::new("app/dto:Label")));
                t
            }),
            ("app/dto:Label", named(Kind::String, "app/dto", "Label")),
            ("app/dto:Raw", {
                let mut t = named(Kind::Struct, "app/dto", "Raw");
                t.add_implements([JSON_MARSHALER]);
                t
            }),
            ("app/errs:NotFound", struct_type("app/errs", "NotFound", &[])),
        ]);
        project.contracts[0].methods.push(Method {
            name: "Get".to_string(),
            args: vec![
                Variable::new("ctx", TypeRef::new("context:Context")),
                Variable::new("raw", TypeRef::new("app/dto:Raw")),
            ],
            results: vec![
                Variable::new("user", TypeRef::new("app/dto:User")),
                Variable::new("err", TypeRef::new("error")),
            ],
            errors: vec![ErrorInfo::new("app/errs", "NotFound", Some(404))],
            ..Method::default()
        });

        let collected = CollectedTypes::collect(&project);
        let ids: Vec<_> = collected.by_name().into_iter().map(|(_, id)| id).collect();
        assert_eq!(
            ids,
            vec!["app/dto:Label", "app/errs:NotFound", "app/dto:User", "app/dto:UserID"]
        );
        assert!(!collected.contains(":map:anonymous:00000001"));
        assert!(!collected.contains("app/dto:Raw"));
    }

    #[test]
    fn default_error_is_collected() {
        let mut project = project_with(&[("app/errs:Fault", struct_type("app/errs", "Fault", &[]))]);
        project.annotations.insert(names::DEFAULT_ERROR, "app/errs:Fault");
        project.contracts[0].methods.push(Method {
            name: "Ping".to_string(),
            ..Method::default()
        });
        let collected = CollectedTypes::collect(&project);
        assert_eq!(collected.go_name("app/errs:Fault"), Some("Fault"));
    }

    #[test]
    fn clashing_names_take_package_prefix() {
        let mut project = project_with(&[
            ("app/a:Item", struct_type("app/a", "Item", &[])),
            ("app/b:Item", struct_type("app/b", "Item", &[])),
        ]);
        project.contracts[0].methods.push(Method {
            name: "Both".to_string(),
            results: vec![
                Variable::new("a", TypeRef::new("app/a:Item")),
                Variable::new("b", TypeRef::new("app/b:Item")),
            ],
            ..Method::default()
        });
        let collected = CollectedTypes::collect(&project);
        assert_eq!(collected.go_name("app/a:Item"), Some("AItem"));
        assert_eq!(collected.go_name("app/b:Item"), Some("BItem"));
    }

    #[test]
    fn pass_through_rules() {
        let project = Project::default();
        assert!(is_pass_through(&project, "time:Time"));
        assert!(is_pass_through(&project, "gopkg.in/guregu/null.v4:String"));
        assert!(!is_pass_through(&project, "app/dto:User"));
    }
}
