//! Go spelling of TypeRefs and registry types.

use astg_ir::{
    is_anonymous, is_builtin, package_base, split_type_id, ChanDirection, Kind, Project, Type,
    TypeRef, Variable,
};

use crate::collect::CollectedTypes;
use crate::writer::Imports;

/// Renders types for one generated file, adding imports as needed.
pub struct GoTypes<'a> {
    project: &'a Project,
    collected: &'a CollectedTypes,
}

impl<'a> GoTypes<'a> {
    pub fn new(project: &'a Project, collected: &'a CollectedTypes) -> Self {
        GoTypes { project, collected }
    }

    /// Type of a parameter; a variadic last parameter is spelled `...T`.
    pub fn param(&self, r: &TypeRef, imports: &mut Imports) -> String {
        self.render_ref(r, r.is_ellipsis, imports)
    }

    /// Type of a field or value, where a variadic is a plain slice.
    pub fn value(&self, r: &TypeRef, imports: &mut Imports) -> String {
        self.render_ref(r, false, imports)
    }

    fn render_ref(&self, r: &TypeRef, ellipsis: bool, imports: &mut Imports) -> String {
        let mut out = "*".repeat(r.pointer_count);
        if let (Some(key), Some(value)) = (&r.map_key, &r.map_value) {
            out.push_str(&format!(
                "map[{}]{}",
                self.value(key, imports),
                self.value(value, imports)
            ));
            return out;
        }
        if r.is_slice {
            out.push_str(if ellipsis { "..." } else { "[]" });
        } else if r.array_len > 0 {
            out.push_str(&format!("[{}]", r.array_len));
        }
        if r.is_container() {
            out.push_str(&"*".repeat(r.element_pointers));
        }
        out.push_str(&self.type_id(&r.type_id, imports));
        out
    }

    /// Go expression naming a TypeID.
    pub fn type_id(&self, type_id: &str, imports: &mut Imports) -> String {
        if type_id.is_empty() {
            return "any".to_string();
        }
        if is_builtin(type_id) {
            return type_id.to_string();
        }
        if let Some(name) = self.collected.go_name(type_id) {
            return name.to_string();
        }
        let record = self.project.get_type(type_id);
        if is_anonymous(type_id) {
            return match record {
                Some(ty) => self.shape(ty, imports),
                None => "any".to_string(),
            };
        }
        let (pkg, name) = split_type_id(type_id);
        if pkg.is_empty() {
            return name.to_string();
        }
        let preferred = record
            .map(|t| t.import_alias.as_str())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| package_base(pkg));
        let alias = imports.add_named(pkg, preferred);
        format!("{alias}.{name}")
    }

    /// Structural Go type of a registry record, ignoring its name.
    pub fn shape(&self, ty: &Type, imports: &mut Imports) -> String {
        match ty.kind {
            Kind::Array | Kind::Map => {
                let r = TypeRef {
                    type_id: ty.array_of_id.clone(),
                    is_slice: ty.is_slice,
                    array_len: ty.array_len,
                    element_pointers: ty.element_pointers,
                    map_key: ty.map_key.clone(),
                    map_value: ty.map_value.clone(),
                    ..TypeRef::default()
                };
                self.value(&r, imports)
            }
            Kind::Chan => {
                let elem = self.type_id(&ty.chan_of_id, imports);
                match ty.chan_direction.unwrap_or_default() {
                    ChanDirection::Send => format!("chan<- {elem}"),
                    ChanDirection::Recv => format!("<-chan {elem}"),
                    ChanDirection::Both => format!("chan {elem}"),
                }
            }
            Kind::Function => format!(
                "func({}){}",
                self.params(&ty.function_args, "arg", imports),
                self.results(&ty.function_results, imports)
            ),
            Kind::Struct => {
                if ty.struct_fields.is_empty() {
                    return "struct{}".to_string();
                }
                let fields: Vec<String> = ty
                    .struct_fields
                    .iter()
                    .map(|f| {
                        let mut field = self.value(&f.type_ref, imports);
                        if !f.is_embedded() {
                            field = format!("{} {field}", f.name);
                        }
                        if !f.tags.is_empty() {
                            field = format!("{field} `{}`", f.tag_string());
                        }
                        field
                    })
                    .collect();
                format!("struct {{ {} }}", fields.join("; "))
            }
            Kind::Interface => {
                let mut elems: Vec<String> = ty
                    .embedded_interfaces
                    .iter()
                    .map(|id| self.type_id(id, imports))
                    .collect();
                elems.extend(ty.interface_methods.iter().map(|m| {
                    format!(
                        "{}({}){}",
                        m.name,
                        self.params(&m.args, "arg", imports),
                        self.results(&m.results, imports)
                    )
                }));
                if elems.is_empty() {
                    "any".to_string()
                } else {
                    format!("interface {{ {} }}", elems.join("; "))
                }
            }
            Kind::Alias => {
                if ty.alias_of.is_empty() {
                    self.type_id(&ty.underlying_type_id, imports)
                } else {
                    self.type_id(&ty.alias_of, imports)
                }
            }
            Kind::Any => "any".to_string(),
            basic => basic.as_str().to_string(),
        }
    }

    /// Parameter list; names are kept unless any was synthesized.
    pub fn params(&self, vars: &[Variable], prefix: &str, imports: &mut Imports) -> String {
        let named = !has_synthesized_names(vars, prefix);
        vars.iter()
            .map(|v| {
                let ty = self.param(&v.type_ref, imports);
                if named {
                    format!("{} {ty}", v.name)
                } else {
                    ty
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Result list with its leading space: ` T` or ` (a T, b U)`.
    pub fn results(&self, vars: &[Variable], imports: &mut Imports) -> String {
        match vars {
            [] => String::new(),
            [single] if has_synthesized_names(vars, "result") => {
                format!(" {}", self.value(&single.type_ref, imports))
            }
            _ => format!(" ({})", self.params(vars, "result", imports)),
        }
    }
}

/// Whether a name was made up for an unnamed parameter or result.
fn has_synthesized_names(vars: &[Variable], prefix: &str) -> bool {
    vars.iter()
        .enumerate()
        .any(|(i, v)| v.name.is_empty() || v.name == format!("{prefix}{i}"))
}
