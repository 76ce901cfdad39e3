//! Method sets and interface satisfaction.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::{MethodDecl, PackageLoader};
use crate::error::Result;
use crate::ty::{identical_signatures, Signature, Ty, Var};

/// Embedding depth beyond which promoted methods are ignored.
const MAX_EMBED_DEPTH: usize = 8;

/// One method of a method set.
#[derive(Clone, Debug)]
pub struct MethodEntry {
    pub name: String,
    pub sig: Arc<Signature>,
    pub pointer_recv: bool,
    /// Declaration for concrete methods; `None` for interface methods.
    pub decl: Option<Arc<MethodDecl>>,
    /// Embedding depth the method was promoted from.
    pub depth: usize,
}

struct Collector<'a> {
    loader: &'a PackageLoader,
    out: Vec<MethodEntry>,
    visiting: FxHashSet<String>,
}

impl Collector<'_> {
    fn add(&mut self, entry: MethodEntry) {
        match self.out.iter_mut().find(|m| m.name == entry.name) {
            Some(existing) if existing.depth > entry.depth => *existing = entry,
            Some(_) => {}
            None => self.out.push(entry),
        }
    }

    fn collect(&mut self, ty: &Ty, addressable: bool, depth: usize) -> Result<()> {
        if depth > MAX_EMBED_DEPTH {
            return Ok(());
        }
        match ty {
            Ty::Pointer(elem) => self.collect(elem, true, depth),
            Ty::Named(named) => {
                let key = format!("{}:{}:{depth}", named.pkg, named.name);
                if !self.visiting.insert(key.clone()) {
                    return Ok(());
                }
                let decl = match self.loader.named_decl(&named.pkg, &named.name) {
                    Ok(decl) => decl,
                    Err(err) => {
                        tracing::debug!(ty = %ty, %err, "no method set for unresolved type");
                        self.visiting.remove(&key);
                        return Ok(());
                    }
                };
                let rhs = decl.instantiate(&named.args);
                if decl.is_alias {
                    let result = self.collect(&rhs, addressable, depth);
                    self.visiting.remove(&key);
                    return result;
                }
                for method in &decl.methods {
                    if method.pointer_recv && !addressable {
                        continue;
                    }
                    let sig = if method.recv_type_params.is_empty() {
                        Arc::clone(&method.sig)
                    } else {
                        Arc::new(method.sig.substitute(&method.recv_type_params, &named.args))
                    };
                    self.add(MethodEntry {
                        name: method.name.clone(),
                        sig,
                        pointer_recv: method.pointer_recv,
                        decl: Some(Arc::clone(method)),
                        depth,
                    });
                }
                // A defined type keeps the fields and interface methods of its
                // underlying type but not the methods of a named base.
                let underlying = self.loader.underlying(&rhs).unwrap_or(rhs);
                let result = match &underlying {
                    Ty::Struct(_) | Ty::Interface(_) | Ty::Basic("error") => {
                        self.collect(&underlying, addressable, depth)
                    }
                    _ => Ok(()),
                };
                self.visiting.remove(&key);
                result
            }
            Ty::Struct(st) => {
                for field in st.fields.iter().filter(|f| f.embedded) {
                    self.collect(&field.ty, addressable, depth + 1)?;
                }
                Ok(())
            }
            Ty::Interface(iface) => {
                for method in &iface.methods {
                    self.add(MethodEntry {
                        name: method.name.clone(),
                        sig: Arc::clone(&method.sig),
                        pointer_recv: false,
                        decl: None,
                        depth,
                    });
                }
                for embed in &iface.embeds {
                    self.collect(embed, addressable, depth)?;
                }
                Ok(())
            }
            Ty::Basic("error") => {
                self.add(error_method(depth));
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn error_method(depth: usize) -> MethodEntry {
    MethodEntry {
        name: "Error".to_string(),
        sig: Arc::new(Signature {
            params: Vec::new(),
            results: vec![Var {
                name: None,
                ty: Ty::Basic("string"),
                docs: Vec::new(),
            }],
            variadic: false,
        }),
        pointer_recv: false,
        decl: None,
        depth,
    }
}

impl PackageLoader {
    /// Methods callable on a value of `ty`, sorted by name.
    ///
    /// Pointer-receiver methods are included only when `ty` is a pointer.
    /// Promoted methods from embedded fields are included; a shallower
    /// method shadows a deeper one of the same name.
    pub fn method_set(&self, ty: &Ty) -> Result<Vec<MethodEntry>> {
        let mut collector = Collector {
            loader: self,
            out: Vec::new(),
            visiting: FxHashSet::default(),
        };
        collector.collect(ty, false, 0)?;
        let mut out = collector.out;
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Methods of an interface type, including embedded interfaces.
    ///
    /// Empty for non-interface types.
    pub fn interface_method_set(&self, ty: &Ty) -> Result<Vec<MethodEntry>> {
        if self.is_interface(ty)? {
            self.method_set(ty)
        } else {
            Ok(Vec::new())
        }
    }

    pub fn is_interface(&self, ty: &Ty) -> Result<bool> {
        Ok(matches!(
            self.underlying(ty)?,
            Ty::Interface(_) | Ty::Basic("error" | "any")
        ))
    }

    /// Whether `ty` is an interface usable only as a constraint.
    pub fn is_constraint(&self, ty: &Ty) -> Result<bool> {
        match self.underlying(ty)? {
            Ty::Interface(iface) => {
                if iface.has_type_terms {
                    return Ok(true);
                }
                for embed in &iface.embeds {
                    if self.is_constraint(embed)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Ty::Basic("comparable") => Ok(true),
            _ => Ok(false),
        }
    }

    /// Whether `ty` or `*ty` satisfies interface `iface`.
    ///
    /// Signatures are compared structurally, falling back to their textual
    /// form.
    pub fn implements(&self, ty: &Ty, iface: &Ty) -> Result<bool> {
        if !self.is_interface(iface)? || self.is_constraint(iface)? {
            return Ok(false);
        }
        let wanted = self.interface_method_set(iface)?;
        let have = if self.is_interface(ty)? {
            self.method_set(ty)?
        } else {
            let (base, _) = ty.deref_all();
            self.method_set(&Ty::pointer(base.clone()))?
        };
        Ok(wanted.iter().all(|w| {
            have.iter().any(|h| {
                h.name == w.name
                    && (identical_signatures(&h.sig, &w.sig) || h.sig.to_string() == w.sig.to_string())
            })
        }))
    }

    /// Names of the methods callable on `*ty`.
    pub fn method_names(&self, ty: &Ty) -> Result<Vec<String>> {
        let (base, _) = ty.deref_all();
        Ok(self
            .method_set(&Ty::pointer(base.clone()))?
            .into_iter()
            .map(|m| m.name)
            .collect())
    }
}
