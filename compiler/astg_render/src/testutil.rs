//! Hand-built projects for renderer unit tests.

use astg_ir::{package_base, Contract, Kind, Project, StructField, Type, TypeRef};
use astg_tags::names;

/// A project with one JSON-RPC contract `app/api:Users` and `types`.
pub fn project_with(types: &[(&str, Type)]) -> Project {
    let mut project = Project::new("1.2.3", "app", "contracts");
    let mut contract = Contract {
        id: "app/api:Users".to_string(),
        name: "Users".to_string(),
        pkg_path: "app/api".to_string(),
        file_path: "contracts/api/users.go".to_string(),
        ..Contract::default()
    };
    contract.annotations.insert(names::JSON_RPC_SERVER, "");
    project.contracts.push(contract);
    for (id, ty) in types {
        project.types.insert((*id).to_string(), ty.clone());
    }
    project
}

pub fn named(kind: Kind, pkg: &str, name: &str) -> Type {
    Type::skeleton(kind, pkg, package_base(pkg), name)
}

pub fn struct_type(pkg: &str, name: &str, fields: &[(&str, &str)]) -> Type {
    let mut ty = named(Kind::Struct, pkg, name);
    ty.struct_fields = fields
        .iter()
        .map(|(field, type_id)| StructField {
            type_ref: TypeRef::new(*type_id),
            name: (*field).to_string(),
            ..StructField::default()
        })
        .collect();
    ty
}
