use pretty_assertions::assert_eq;

use super::*;
use crate::contract::{Method, Variable};
use crate::types::{StructField, TypeRef};

fn sample() -> Project {
    let mut project = Project::new("v1.2.0", "example.com/app", "contracts");
    let mut contract = Contract {
        id: "example.com/app/contracts:Users".into(),
        name: "Users".into(),
        pkg_path: "example.com/app/contracts".into(),
        ..Contract::default()
    };
    contract.annotations.insert("jsonRPC-server", "");
    contract.methods.push(Method {
        name: "Get".into(),
        contract_id: contract.id.clone(),
        args: vec![Variable::new("id", TypeRef::new("example.com/app/dto:UserID"))],
        results: vec![Variable::new("user", TypeRef::new("example.com/app/dto:User"))],
        ..Method::default()
    });
    project.contracts.push(contract);

    let mut user = Type::skeleton(Kind::Struct, "example.com/app/dto", "dto", "User");
    user.struct_fields.push(StructField {
        type_ref: TypeRef::new("string"),
        name: "Name".into(),
        ..StructField::default()
    });
    project.insert_type("example.com/app/dto:User", user);
    project
}

#[test]
fn project_id_is_stable_and_short() {
    let id = project_id_for("example.com/app");
    assert_eq!(id.len(), 12);
    assert_eq!(id, project_id_for("example.com/app"));
    assert_ne!(id, project_id_for("example.com/other"));
    assert_eq!(sample().project_id, id);
}

#[test]
fn insert_type_keeps_first() {
    let mut project = sample();
    let replacement = Type::skeleton(Kind::Any, "example.com/app/dto", "dto", "User");
    assert!(!project.insert_type("example.com/app/dto:User", replacement));
    assert_eq!(
        project.get_type("example.com/app/dto:User").map(|t| t.kind),
        Some(Kind::Struct)
    );
}

#[test]
fn reports_missing_types() {
    let project = sample();
    assert_eq!(project.missing_types(), vec!["example.com/app/dto:UserID"]);
}

#[test]
fn json_round_trip_preserves_project() {
    let mut project = sample();
    let _ = project.update_marker();
    let text = project.to_json().unwrap_or_default();
    assert!(text.contains("\"typeID\": \"example.com/app/dto:User\""));
    let back = Project::from_json(&text);
    assert_eq!(back.ok(), Some(project));
}

#[test]
fn marker_tracks_content() {
    let mut project = sample();
    let _ = project.update_marker();
    let first = project.marker.clone();
    assert_eq!(first.len(), 64);

    project.contracts[0].methods[0].name = "Fetch".into();
    let _ = project.update_marker();
    assert_ne!(project.marker, first);
}

#[test]
fn resolves_alias_chains() {
    let mut project = sample();
    let mut a = Type::skeleton(Kind::Alias, "p", "p", "A");
    a.alias_of = "p:B".into();
    let mut b = Type::skeleton(Kind::Alias, "p", "p", "B");
    b.alias_of = "example.com/app/dto:User".into();
    project.insert_type("p:A", a);
    project.insert_type("p:B", b);
    assert_eq!(project.resolve_alias("p:A"), "example.com/app/dto:User");
    assert_eq!(project.kind_of("int64"), Some(Kind::Int64));
    assert_eq!(project.kind_of("p:A"), Some(Kind::Alias));
}
