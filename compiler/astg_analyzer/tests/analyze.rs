//! End-to-end analysis of small Go modules.

use std::fs;
use std::path::Path;

use astg_analyzer::{AnalyzeError, Analyzer, AnalyzerConfig};
use astg_ir::{Kind, Project};
use astg_loader::{GoEnv, GoMod, PackageLoader, PackageResolver};
use astg_syntax::BuildTags;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const MODULE: &str = "example.com/shop";

fn module(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    write(dir.path(), "go.mod", &format!("module {MODULE}\n\ngo 1.22\n"));
    for (rel, source) in files {
        write(dir.path(), rel, source);
    }
    dir
}

fn write(root: &Path, rel: &str, source: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir: {e}"));
    }
    fs::write(&path, source).unwrap_or_else(|e| panic!("write {rel}: {e}"));
}

fn analyze(root: &Path) -> Result<Project, AnalyzeError> {
    let gomod = GoMod::read(root).unwrap_or_else(|e| panic!("go.mod: {e}"));
    let resolver = PackageResolver::new(root, gomod, GoEnv::isolated());
    let loader = PackageLoader::new(resolver, BuildTags::default());
    Analyzer::new(AnalyzerConfig::new(root), &loader).analyze()
}

fn must(root: &Path) -> Project {
    analyze(root).unwrap_or_else(|e| panic!("analyze: {e}"))
}

fn id(rel: &str, name: &str) -> String {
    format!("{MODULE}/{rel}:{name}")
}

const PINGER: &str = r#"package api

import "context"

// Pinger checks liveness.
// @jsonRPC-server
type Pinger interface {
	Ping(ctx context.Context) (pong string, err error)
}
"#;

const PINGER_IMPL: &str = r#"package ping

import "context"

type Service struct{}

func (s *Service) Ping(ctx context.Context) (string, error) { return "pong", nil }
"#;

#[test]
fn json_rpc_minimum() {
    let dir = module(&[("contracts/api/pinger.go", PINGER), ("ping/ping.go", PINGER_IMPL)]);
    let project = must(dir.path());

    assert_eq!(project.module_path, MODULE);
    assert_eq!(project.contracts_dir, "contracts");
    assert_eq!(project.project_id.len(), 12);
    assert_eq!(project.marker.len(), 64);

    assert_eq!(project.contracts.len(), 1);
    let pinger = &project.contracts[0];
    assert_eq!(pinger.id, id("contracts/api", "Pinger"));
    assert!(pinger.is_json_rpc());
    assert_eq!(pinger.implementations.len(), 1);
    assert_eq!(pinger.implementations[0].struct_name, "Service");
    assert_eq!(pinger.implementations[0].methods_map["Ping"].file_path, "ping/ping.go");

    assert_eq!(project.services.len(), 1);
    assert_eq!(project.services[0].name, "Service");
    assert_eq!(project.services[0].contract_ids, vec![pinger.id.clone()]);
    assert!(project.missing_types().is_empty());
}

const USERS: &str = r#"// @http-prefix /api/v1
package api

import (
	"context"
	"io"

	"example.com/shop/dto"
)

// Users is the account API.
// @http-server
// @404 example.com/shop/errs:NotFound
type Users interface {
	// @http-method GET
	// @http-path /users/:id
	// @http-args search|q
	// @http-headers token|Authorization
	Get(ctx context.Context, id dto.UserID, search string, token string) (user *dto.User, err error)
	// @409 example.com/shop/errs:Conflict
	Create(ctx context.Context, user dto.User) (id dto.UserID, err error)
	Tag(ctx context.Context, tags ...string) (err error)
	List(ctx context.Context) (users []*dto.User, err error)
	Tree(ctx context.Context) (root *dto.Node, pair dto.A, err error)
	// @http-multipart
	Upload(ctx context.Context, avatar io.Reader, cover io.Reader) (size int64, err error)
	Absent(ctx context.Context) (err error)
}
"#;

const DTO: &str = r#"package dto

type UserID int64

type User struct {
	ID      UserID   `json:"id"`
	Name    string   `json:"name"`
	Friends []*User  `json:"friends,omitempty"`
	Roles   []Role   `json:"roles"`
	Meta    map[string]string
}

type Role string

func (r Role) String() string { return string(r) }

type Node struct {
	Value int
	Next  *Node
}

type A struct{ B *B }

type B struct{ A *A }
"#;

const ERRS: &str = r#"package errs

type NotFound struct{ What string }

func (e NotFound) Error() string { return e.What + " not found" }

func (e NotFound) Code() int { return 404 }

type Conflict struct{}

func (*Conflict) Error() string { return "conflict" }

func (*Conflict) Code() int { return 409 }

type Internal struct{}

func (*Internal) Error() string { return "internal" }

func (*Internal) Code() int { return 500 }
"#;

const USERS_IMPL: &str = r#"package users

import (
	"context"
	"io"

	"example.com/shop/dto"
	"example.com/shop/errs"
)

type Service struct{}

func (s *Service) Get(ctx context.Context, id dto.UserID, search string, token string) (*dto.User, error) {
	return nil, errs.NotFound{What: "user"}
}

func (s *Service) Create(ctx context.Context, user dto.User) (dto.UserID, error) {
	if user.Name == "" {
		return 0, &errs.Internal{}
	}
	return 1, nil
}

func (s *Service) Tag(ctx context.Context, tags ...string) error { return nil }

func (s *Service) List(ctx context.Context) ([]*dto.User, error) { return nil, nil }

func (s *Service) Tree(ctx context.Context) (*dto.Node, dto.A, error) { return nil, dto.A{}, nil }

func (s *Service) Upload(ctx context.Context, avatar io.Reader, cover io.Reader) (int64, error) {
	return 0, nil
}

func (s *Service) Absent(ctx context.Context) error { return nil }
"#;

const PARTIAL_IMPL: &str = r#"package partial

import "context"

type Only struct{}

func (Only) Absent(ctx context.Context) error { return nil }
"#;

fn shop() -> TempDir {
    module(&[
        ("contracts/api/users.go", USERS),
        ("dto/dto.go", DTO),
        ("errs/errs.go", ERRS),
        ("users/service.go", USERS_IMPL),
        ("partial/partial.go", PARTIAL_IMPL),
    ])
}

#[test]
fn rest_contract_with_errors() {
    let dir = shop();
    let project = must(dir.path());
    assert_eq!(project.annotations.value("http-prefix"), Some("/api/v1"));

    let users = &project.contracts[0];
    assert!(users.is_http());
    let impls: Vec<_> = users.implementations.iter().map(|i| i.struct_name.as_str()).collect();
    assert_eq!(impls, vec!["Service"]);

    let get = users.method("Get").unwrap_or_else(|| panic!("no Get"));
    let get_errors: Vec<_> = get
        .errors
        .iter()
        .map(|e| (e.type_name.as_str(), e.http_code))
        .collect();
    assert_eq!(get_errors, vec![("NotFound", Some(404))]);
    assert_eq!(get.errors[0].http_code_text, "Not Found");
    let wire: Vec<_> = get.wire_args().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(wire, vec!["id", "search", "token"]);

    let create = users.method("Create").unwrap_or_else(|| panic!("no Create"));
    let mut create_errors: Vec<_> = create
        .sorted_errors()
        .into_iter()
        .map(|e| (e.type_name.clone(), e.http_code))
        .collect();
    create_errors.sort();
    assert_eq!(
        create_errors,
        vec![
            ("Conflict".to_string(), Some(409)),
            ("Internal".to_string(), None),
            ("NotFound".to_string(), Some(404)),
        ]
    );
    assert!(project.has_type(&id("errs", "Internal")));
    assert!(project.has_type(&id("errs", "Conflict")));
}

#[test]
fn type_shapes_survive_analysis() {
    let dir = shop();
    let project = must(dir.path());
    let users = &project.contracts[0];

    let user_id = &project.types[&id("dto", "UserID")];
    assert_eq!(user_id.kind, Kind::Alias);
    assert_eq!(user_id.underlying_kind, Some(Kind::Int64));

    let list = users.method("List").unwrap_or_else(|| panic!("no List"));
    let users_ref = &list.results[0].type_ref;
    assert!(users_ref.is_slice);
    assert_eq!(users_ref.element_pointers, 1);
    assert_eq!(users_ref.type_id, id("dto", "User"));

    let tag = users.method("Tag").unwrap_or_else(|| panic!("no Tag"));
    let tags = &tag.args[1].type_ref;
    assert!(tags.is_ellipsis);
    assert!(tags.is_slice);

    let node_ids: Vec<_> = project.types.keys().filter(|k| k.ends_with(":Node")).collect();
    assert_eq!(node_ids.len(), 1);
    assert!(project.has_type(&id("dto", "A")));
    assert!(project.has_type(&id("dto", "B")));
    assert_eq!(project.types[&id("dto", "B")].struct_fields.len(), 1);

    let role = &project.types[&id("dto", "Role")];
    assert!(role.implements("fmt:Stringer"));
    assert!(project.types[&id("errs", "Conflict")].implements("error"));

    assert!(project.missing_types().is_empty());
}

#[test]
fn absent_methods_yield_no_implementation() {
    let dir = shop();
    let project = must(dir.path());
    assert!(!project.contracts[0]
        .implementations
        .iter()
        .any(|i| i.struct_name == "Only"));
}

#[test]
fn project_round_trips_through_json() {
    let dir = shop();
    let project = must(dir.path());
    let text = project.to_json().unwrap_or_else(|e| panic!("{e}"));
    let back = Project::from_json(&text).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(back, project);
}

#[test]
fn analysis_is_deterministic() {
    let dir = shop();
    let first = must(dir.path());
    let second = must(dir.path());
    assert_eq!(first.marker, second.marker);
    assert_eq!(first.types, second.types);
}

#[test]
fn empty_contracts_dir_is_an_error() {
    let dir = module(&[("contracts/api/api.go", "package api\n\ntype Plain interface{ X() }\n")]);
    let err = analyze(dir.path());
    assert!(matches!(err, Err(AnalyzeError::NoContracts { .. })));
}
