//! Recording which interfaces each registered type satisfies.

use astg_ir::{split_type_id, Project, ERROR_TYPE_ID};
use astg_loader::{identical_signatures, MethodEntry, PackageLoader, Ty};
use rayon::prelude::*;

/// Checks registered named types against every known interface.
///
/// Known interfaces are the exported, non-empty, non-constraint interfaces
/// of every package loaded so far, plus a fixed list of well-known ones.
pub struct InterfaceDetector<'a> {
    loader: &'a PackageLoader,
    eager: &'a [String],
}

struct Candidate {
    id: String,
    methods: Vec<MethodEntry>,
}

impl<'a> InterfaceDetector<'a> {
    pub fn new(loader: &'a PackageLoader, eager: &'a [String]) -> Self {
        InterfaceDetector { loader, eager }
    }

    /// Add every satisfied interface to `implements_interfaces` of each
    /// named type in `project`. Returns the number of links added.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn detect_all(&self, project: &mut Project) -> usize {
        let candidates = self.candidates();
        let named: Vec<(String, Ty)> = project
            .types
            .iter()
            .filter_map(|(id, ty)| {
                let own = ty.type_id()?;
                (own == *id).then(|| (own, Ty::named(&ty.import_pkg_path, &ty.type_name)))
            })
            .collect();

        let found: Vec<(String, Vec<String>)> = named
            .par_iter()
            .filter_map(|(id, ty)| {
                let have = self.methods_of(ty)?;
                let ifaces: Vec<String> = candidates
                    .iter()
                    .filter(|c| c.id != *id && satisfies(&have, &c.methods))
                    .map(|c| c.id.clone())
                    .collect();
                (!ifaces.is_empty()).then(|| (id.clone(), ifaces))
            })
            .collect();

        let mut added = 0;
        for (id, ifaces) in found {
            if let Some(ty) = project.get_type_mut(&id) {
                let before = ty.implements_interfaces.len();
                ty.add_implements(ifaces);
                added += ty.implements_interfaces.len() - before;
            }
        }
        tracing::debug!(
            candidates = candidates.len(),
            types = named.len(),
            added,
            "interfaces detected"
        );
        added
    }

    fn candidates(&self) -> Vec<Candidate> {
        for id in self.eager {
            let (pkg, _) = split_type_id(id);
            if pkg.is_empty() {
                continue;
            }
            if let Err(err) = self.loader.load(pkg) {
                tracing::debug!(pkg, %err, "well-known interface package unavailable");
            }
        }

        let mut ids: Vec<(String, Ty)> = Vec::new();
        for info in self.loader.loaded_packages() {
            for name in info.type_names() {
                if !astg_loader::is_exported(name) {
                    continue;
                }
                ids.push((
                    astg_ir::type_id(&info.pkg_path, name),
                    Ty::named(&info.pkg_path, name),
                ));
            }
        }
        for id in self.eager {
            let ty = if id == ERROR_TYPE_ID {
                Ty::Basic("error")
            } else {
                let (pkg, name) = split_type_id(id);
                Ty::named(pkg, name)
            };
            if !ids.iter().any(|(known, _)| known == id) {
                ids.push((id.clone(), ty));
            }
        }

        let mut out: Vec<Candidate> = ids
            .into_iter()
            .filter_map(|(id, ty)| {
                if !self.loader.is_interface(&ty).ok()? || self.loader.is_constraint(&ty).ok()? {
                    return None;
                }
                let methods = self.loader.interface_method_set(&ty).ok()?;
                (!methods.is_empty()).then_some(Candidate { id, methods })
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Method set of `*T`, or of `T` itself for interfaces.
    fn methods_of(&self, ty: &Ty) -> Option<Vec<MethodEntry>> {
        let result = match self.loader.is_interface(ty) {
            Ok(true) => self.loader.method_set(ty),
            Ok(false) => self.loader.method_set(&Ty::pointer(ty.clone())),
            Err(err) => Err(err),
        };
        match result {
            Ok(methods) => Some(methods),
            Err(err) => {
                tracing::debug!(ty = %ty, %err, "method set unavailable");
                None
            }
        }
    }
}

/// Whether `have` contains every method of `wanted` with an identical
/// signature.
fn satisfies(have: &[MethodEntry], wanted: &[MethodEntry]) -> bool {
    wanted.iter().all(|w| {
        have.iter().any(|h| {
            h.name == w.name
                && (identical_signatures(&h.sig, &w.sig) || h.sig.to_string() == w.sig.to_string())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Converter;
    use crate::testutil::{pkg, Module};
    use pretty_assertions::assert_eq;

    const SRC: &str = r#"package dto

import "fmt"

type Shape interface {
	Area() float64
	fmt.Stringer
}

type Square struct{ Side float64 }

func (s *Square) Area() float64 { return s.Side * s.Side }

func (s Square) String() string { return "square" }

type Circle struct{}

func (Circle) Area() int { return 0 }

type Failure struct{}

func (f *Failure) Error() string { return "" }

type Number interface{ ~int | ~float64 }
"#;

    #[test]
    fn detects_local_and_well_known_interfaces() {
        let module = Module::new(&[("dto/dto.go", SRC)]);
        let loader = module.loader();
        let mut project = Project::default();
        let mut conv = Converter::new(&loader);
        for name in ["Square", "Circle", "Failure", "Shape"] {
            conv.type_id_of(&mut project, &Ty::named(pkg("dto"), name));
        }

        let eager = vec!["error".to_string(), "fmt:Stringer".to_string()];
        let detector = InterfaceDetector::new(&loader, &eager);
        assert!(detector.detect_all(&mut project) > 0);

        let of = |name: &str| {
            project
                .get_type(&format!("{}:{name}", pkg("dto")))
                .map(|t| t.implements_interfaces.clone())
                .unwrap_or_default()
        };
        let shape = format!("{}:Shape", pkg("dto"));
        assert_eq!(of("Square"), vec![shape.clone(), "fmt:Stringer".to_string()]);
        assert!(of("Circle").is_empty());
        assert_eq!(of("Failure"), vec!["error".to_string()]);
        assert_eq!(of("Shape"), vec!["fmt:Stringer".to_string()]);
        assert!(!of("Square").iter().any(|i| i.ends_with(":Number")));

        // A second pass adds nothing.
        assert_eq!(detector.detect_all(&mut project), 0);
    }

    #[test]
    fn signature_mismatch_is_rejected() {
        let module = Module::new(&[("dto/dto.go", SRC)]);
        let loader = module.loader();
        let ty = Ty::named(pkg("dto"), "Circle");
        let iface = Ty::named(pkg("dto"), "Shape");
        let have = loader
            .method_set(&Ty::pointer(ty))
            .unwrap_or_else(|e| panic!("{e}"));
        let wanted = loader
            .interface_method_set(&iface)
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(!satisfies(&have, &wanted));
    }
}
