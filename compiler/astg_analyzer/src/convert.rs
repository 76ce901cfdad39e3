//! Conversion of loader types into project [`Type`] records.
//!
//! Named types are registered under their TypeID before their definition is
//! converted, so a recursive reference finds the forming record and stops.
//! An in-flight set covers the window where a record is not yet visible.

use std::hash::{Hash, Hasher};

use astg_ir::{
    anonymous_type_id, parse_struct_tag, type_id, ChanDirection, Function, Kind, Project,
    StructField, Type, TypeRef, Variable, ANY_TYPE_ID,
};
use astg_loader::ty::{ChanDir, Field, InterfaceTy, Signature, Var};
use astg_loader::{NamedDecl, NamedRef, PackageLoader, Ty};
use astg_tags::parse_comments;
use rustc_hash::{FxHashSet, FxHasher};

use crate::stack::ensure_sufficient_stack;

/// Converts [`Ty`] values into TypeRefs and registry records.
pub struct Converter<'a> {
    loader: &'a PackageLoader,
    in_flight: FxHashSet<String>,
    /// TypeIDs registered as bare skeletons.
    skeletons: FxHashSet<String>,
}

impl<'a> Converter<'a> {
    pub fn new(loader: &'a PackageLoader) -> Self {
        Converter {
            loader,
            in_flight: FxHashSet::default(),
            skeletons: FxHashSet::default(),
        }
    }

    pub fn loader(&self) -> &'a PackageLoader {
        self.loader
    }

    /// Whether a TypeID is only registered as a skeleton.
    pub fn is_skeleton(&self, type_id: &str) -> bool {
        self.skeletons.contains(type_id)
    }

    /// Use-site description of `ty`, registering every type it mentions.
    ///
    /// Pointers collapse into `pointer_count`; slices and arrays record their
    /// shape and the pointer depth of their element.
    pub fn type_ref(&mut self, project: &mut Project, ty: &Ty) -> TypeRef {
        ensure_sufficient_stack(|| {
            let (base, pointers) = ty.deref_all();
            let mut out = TypeRef {
                pointer_count: pointers,
                ..TypeRef::default()
            };
            match base {
                Ty::Slice(elem) => {
                    let (elem, elem_pointers) = elem.deref_all();
                    out.is_slice = true;
                    out.element_pointers = elem_pointers;
                    out.type_id = self.type_id_of(project, elem);
                }
                Ty::Array(len, elem) => {
                    let (elem, elem_pointers) = elem.deref_all();
                    match len {
                        Some(n) => out.array_len = usize::try_from(*n).unwrap_or(usize::MAX),
                        None => out.is_slice = true,
                    }
                    out.element_pointers = elem_pointers;
                    out.type_id = self.type_id_of(project, elem);
                }
                Ty::Map(key, value) => {
                    out.map_key = Some(Box::new(self.type_ref(project, key)));
                    out.map_value = Some(Box::new(self.type_ref(project, value)));
                }
                other => out.type_id = self.type_id_of(project, other),
            }
            out
        })
    }

    /// TypeID of a pointer-free type, registering it when needed.
    pub fn type_id_of(&mut self, project: &mut Project, ty: &Ty) -> String {
        match ty {
            Ty::Basic(name) => (*name).to_string(),
            Ty::Named(named) => self.convert_named(project, named),
            Ty::Pointer(_) => {
                let (base, _) = ty.deref_all();
                self.type_id_of(project, base)
            }
            Ty::Interface(iface) if iface.methods.is_empty() && iface.embeds.is_empty() => {
                ANY_TYPE_ID.to_string()
            }
            Ty::Slice(_)
            | Ty::Array(..)
            | Ty::Map(..)
            | Ty::Chan(..)
            | Ty::Func(_)
            | Ty::Struct(_)
            | Ty::Interface(_) => self.convert_anonymous(project, ty),
            Ty::TypeParam(_) | Ty::Union(_) | Ty::Invalid(_) => ANY_TYPE_ID.to_string(),
        }
    }

    /// Register an unnamed composite under a TypeID derived from its shape.
    pub fn convert_anonymous(&mut self, project: &mut Project, ty: &Ty) -> String {
        let id = anonymous_id(ty);
        if project.has_type(&id) {
            return id;
        }
        let mut record = Type::default();
        project.insert_type(id.clone(), record.clone());
        self.fill_shape(project, &mut record, ty);
        if let Some(slot) = project.get_type_mut(&id) {
            *slot = record;
        }
        id
    }

    /// Register a named type and everything its definition mentions.
    ///
    /// Type arguments do not take part in identity: `Page[User]` and
    /// `Page[Order]` share the record of `Page`, whose type parameters
    /// convert as `any`.
    pub fn convert_named(&mut self, project: &mut Project, named: &NamedRef) -> String {
        let id = type_id(&named.pkg, &named.name);
        if project.has_type(&id) && !self.skeletons.contains(&id) {
            return id;
        }
        if self.in_flight.contains(&id) {
            if !project.has_type(&id) {
                let pkg_name = self.loader.package_name(&named.pkg);
                project.insert_type(
                    id.clone(),
                    Type::skeleton(Kind::Any, &named.pkg, &pkg_name, &named.name),
                );
                self.skeletons.insert(id.clone());
            }
            return id;
        }

        let decl = match self.loader.named_decl(&named.pkg, &named.name) {
            Ok(decl) => decl,
            Err(err) => {
                tracing::debug!(type_id = %id, %err, "type not converted");
                return id;
            }
        };

        ensure_sufficient_stack(|| {
            self.in_flight.insert(id.clone());
            let mut record = Type::skeleton(Kind::Any, &decl.pkg_path, &decl.pkg_name, &decl.name);
            record.docs = parse_comments(&decl.docs).docs;
            if project.has_type(&id) {
                // A skeleton from an earlier cycle is being completed.
                record
                    .implements_interfaces
                    .clone_from(&project.types[&id].implements_interfaces);
            }
            project.types.insert(id.clone(), record.clone());

            self.fill_named(project, &mut record, &decl);

            if let Some(slot) = project.get_type_mut(&id) {
                let implements = std::mem::take(&mut slot.implements_interfaces);
                *slot = record;
                slot.add_implements(implements);
            }
            self.in_flight.remove(&id);
            self.skeletons.remove(&id);
            tracing::trace!(type_id = %id, "converted");
        });
        id
    }

    fn fill_named(&mut self, project: &mut Project, record: &mut Type, decl: &NamedDecl) {
        match &decl.rhs {
            Ty::Named(base) => {
                record.kind = Kind::Alias;
                record.alias_of = self.convert_named(project, base);
                self.fill_underlying(record, &decl.rhs);
            }
            Ty::Basic(name) if decl.is_alias => {
                record.kind = Kind::from_basic_name(name).unwrap_or(Kind::Any);
                record.underlying_kind = Some(record.kind);
                record.underlying_type_id = (*name).to_string();
            }
            Ty::Basic(name) => {
                record.kind = Kind::Alias;
                record.underlying_kind = Some(Kind::from_basic_name(name).unwrap_or(Kind::Any));
                record.underlying_type_id = (*name).to_string();
            }
            Ty::Pointer(_) => record.kind = Kind::Any,
            rhs => self.fill_shape(project, record, rhs),
        }
    }

    /// Record the kind and TypeID at the end of an alias chain.
    fn fill_underlying(&self, record: &mut Type, rhs: &Ty) {
        let mut last_named = String::new();
        let mut current = rhs.clone();
        for _ in 0..32 {
            let Ty::Named(named) = &current else {
                break;
            };
            last_named = type_id(&named.pkg, &named.name);
            match self.loader.named_decl(&named.pkg, &named.name) {
                Ok(decl) => current = decl.rhs.clone(),
                Err(_) => {
                    record.underlying_type_id = last_named;
                    return;
                }
            }
        }
        match &current {
            Ty::Basic(name) => {
                record.underlying_kind = Kind::from_basic_name(name);
                record.underlying_type_id = (*name).to_string();
            }
            other => {
                record.underlying_kind = Some(shape_kind(other));
                record.underlying_type_id = last_named;
            }
        }
    }

    /// Fill kind and shape fields from a structural type.
    fn fill_shape(&mut self, project: &mut Project, record: &mut Type, ty: &Ty) {
        record.kind = shape_kind(ty);
        match ty {
            Ty::Slice(elem) => {
                let (elem, pointers) = elem.deref_all();
                record.is_slice = true;
                record.element_pointers = pointers;
                record.array_of_id = self.type_id_of(project, elem);
            }
            Ty::Array(len, elem) => {
                let (elem, pointers) = elem.deref_all();
                match len {
                    Some(n) => record.array_len = usize::try_from(*n).unwrap_or(usize::MAX),
                    None => record.is_slice = true,
                }
                record.element_pointers = pointers;
                record.array_of_id = self.type_id_of(project, elem);
            }
            Ty::Map(key, value) => {
                record.map_key = Some(Box::new(self.type_ref(project, key)));
                record.map_value = Some(Box::new(self.type_ref(project, value)));
            }
            Ty::Chan(dir, elem) => {
                record.chan_direction = Some(match dir {
                    ChanDir::Send => ChanDirection::Send,
                    ChanDir::Recv => ChanDirection::Recv,
                    ChanDir::Both => ChanDirection::Both,
                });
                record.chan_of_id = self.type_id_of(project, elem);
            }
            Ty::Func(sig) => {
                record.function_args = self.variables(project, &sig.params, sig.variadic, "arg");
                record.function_results = self.variables(project, &sig.results, false, "result");
            }
            Ty::Struct(st) => {
                record.struct_fields = st
                    .fields
                    .iter()
                    .map(|field| self.struct_field(project, field))
                    .collect();
            }
            Ty::Interface(iface) => self.fill_interface(project, record, iface),
            Ty::Basic(name) => {
                record.underlying_kind = Kind::from_basic_name(name);
                record.underlying_type_id = (*name).to_string();
            }
            Ty::Named(_) | Ty::Pointer(_) | Ty::TypeParam(_) | Ty::Union(_) | Ty::Invalid(_) => {}
        }
    }

    fn struct_field(&mut self, project: &mut Project, field: &Field) -> StructField {
        StructField {
            type_ref: self.type_ref(project, &field.ty),
            name: if field.embedded {
                String::new()
            } else {
                field.name.clone()
            },
            tags: field
                .tag
                .as_deref()
                .map(parse_struct_tag)
                .unwrap_or_default(),
            docs: parse_comments(&field.docs).docs,
        }
    }

    fn fill_interface(&mut self, project: &mut Project, record: &mut Type, iface: &InterfaceTy) {
        if iface.has_type_terms {
            record.kind = Kind::Any;
            return;
        }
        record.interface_methods = iface
            .methods
            .iter()
            .map(|m| Function {
                name: m.name.clone(),
                args: self.variables(project, &m.sig.params, m.sig.variadic, "arg"),
                results: self.variables(project, &m.sig.results, false, "result"),
                docs: parse_comments(&m.docs).docs,
            })
            .collect();
        record.embedded_interfaces = iface
            .embeds
            .iter()
            .map(|embed| self.type_id_of(project, embed))
            .collect();
    }

    /// Parameters or results as variables. Unnamed entries are called
    /// `<prefix><index>`; a variadic last entry is marked as an ellipsis.
    pub fn variables(
        &mut self,
        project: &mut Project,
        vars: &[Var],
        variadic: bool,
        prefix: &str,
    ) -> Vec<Variable> {
        let last = vars.len().saturating_sub(1);
        vars.iter()
            .enumerate()
            .map(|(i, var)| {
                let mut type_ref = self.type_ref(project, &var.ty);
                if variadic && i == last {
                    type_ref.is_ellipsis = true;
                }
                let parsed = parse_comments(&var.docs);
                Variable {
                    type_ref,
                    name: var.name.clone().unwrap_or_else(|| format!("{prefix}{i}")),
                    docs: parsed.docs,
                    annotations: parsed.annotations,
                }
            })
            .collect()
    }

    /// Variables of a signature's parameters and results.
    pub fn signature(&mut self, project: &mut Project, sig: &Signature) -> (Vec<Variable>, Vec<Variable>) {
        let args = self.variables(project, &sig.params, sig.variadic, "arg");
        let results = self.variables(project, &sig.results, false, "result");
        (args, results)
    }
}

/// Kind of a structural type.
fn shape_kind(ty: &Ty) -> Kind {
    match ty {
        Ty::Basic(name) => Kind::from_basic_name(name).unwrap_or(Kind::Any),
        Ty::Slice(_) | Ty::Array(..) => Kind::Array,
        Ty::Map(..) => Kind::Map,
        Ty::Chan(..) => Kind::Chan,
        Ty::Func(_) => Kind::Function,
        Ty::Struct(_) => Kind::Struct,
        Ty::Interface(iface) if iface.has_type_terms => Kind::Any,
        Ty::Interface(_) => Kind::Interface,
        Ty::Named(_) => Kind::Alias,
        Ty::Pointer(_) | Ty::TypeParam(_) | Ty::Union(_) | Ty::Invalid(_) => Kind::Any,
    }
}

fn anonymous_id(ty: &Ty) -> String {
    let shape = match ty {
        Ty::Slice(_) | Ty::Array(..) => "array",
        Ty::Map(..) => "map",
        Ty::Chan(..) => "chan",
        Ty::Func(_) => "function",
        Ty::Struct(_) => "struct",
        _ => "interface",
    };
    let mut hasher = FxHasher::default();
    ty.to_string().hash(&mut hasher);
    anonymous_type_id(shape, hasher.finish())
}
