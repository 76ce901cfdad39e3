use super::*;
use crate::testutil::{pkg, Module};
use pretty_assertions::assert_eq;

const API: &str = r#"// Package api holds the service contracts.
//
// @http-prefix /api/v1
package api

import (
	"context"

	"example.com/app/dto"
)

// Pinger answers pings.
// @jsonRPC-server
type Pinger interface {
	// Ping replies with pong.
	// @desc liveness check
	Ping(ctx context.Context) (pong string, err error)
}

// Users manages accounts.
// @http-server
// @handler example.com/app/contracts/api:respond
type Users interface {
	Closer
	// @http-method GET
	Get(ctx context.Context, id dto.UserID) (user *dto.User, err error)
	// @http-response example.com/app/contracts/api:custom
	Tag(ctx context.Context, names ...string) error
}

// Closer is embedded.
type Closer interface {
	Close(ctx context.Context) error
}

type internal interface {
	// @jsonRPC-server
	Hidden() error
}
"#;

const DTO: &str = r#"package dto

type UserID int64

type User struct {
	ID   UserID
	Name string
}
"#;

fn module() -> Module {
    Module::new(&[
        ("contracts/api/api.go", API),
        ("contracts/api/api_test.go", "package api\n\n// @jsonRPC-server\ntype Testing interface{}\n"),
        ("dto/dto.go", DTO),
    ])
}

fn discover(module: &Module, ifaces: &[&str]) -> (Project, Vec<Ty>) {
    let loader = module.loader();
    let mut config = AnalyzerConfig::new(module.root());
    config.ifaces = ifaces.iter().map(|s| (*s).to_string()).collect();
    let mut project = Project::default();
    let mut conv = Converter::new(&loader);
    let roots = ContractDiscovery::new(&config, &loader, &mut conv)
        .discover_contracts(&mut project)
        .unwrap_or_else(|e| panic!("{e}"));
    (project, roots)
}

#[test]
fn finds_annotated_exported_interfaces() {
    let module = module();
    let (project, roots) = discover(&module, &[]);

    let ids: Vec<_> = project.contracts.iter().map(|c| c.id.as_str()).collect();
    let api = pkg("contracts/api");
    assert_eq!(ids, vec![format!("{api}:Pinger"), format!("{api}:Users")]);
    assert_eq!(project.annotations.value("http-prefix"), Some("/api/v1"));

    let pinger = &project.contracts[0];
    assert!(pinger.is_json_rpc());
    assert_eq!(pinger.file_path, "contracts/api/api.go");
    assert_eq!(pinger.docs, vec!["Pinger answers pings."]);
    let ping = &pinger.methods[0];
    assert_eq!(ping.name, "Ping");
    assert_eq!(ping.contract_id, pinger.id);
    assert_eq!(ping.docs, vec!["Ping replies with pong."]);
    assert_eq!(ping.annotations.value("desc"), Some("liveness check"));
    assert!(ping.has_context());
    assert!(ping.returns_error());
    assert_eq!(ping.wire_results()[0].name, "pong");

    // Pinger: ctx, pong, err. Users: Get, Tag, then the embedded Close.
    assert_eq!(roots.len(), 3 + 4 + 3 + 2);
}

#[test]
fn embedded_methods_follow_own_methods() {
    let module = module();
    let (project, _) = discover(&module, &[]);
    let users = &project.contracts[1];
    let names: Vec<_> = users.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Get", "Tag", "Close"]);

    let get = &users.methods[0];
    assert_eq!(get.args[1].type_ref.type_id, format!("{}:UserID", pkg("dto")));
    assert_eq!(get.results[0].type_ref.pointer_count, 1);
    assert!(project.has_type(&format!("{}:User", pkg("dto"))));

    let tag = &users.methods[1];
    assert!(tag.args[1].type_ref.is_ellipsis);
    assert!(tag.args[1].type_ref.is_slice);
}

#[test]
fn handler_resolves_through_scopes() {
    let module = module();
    let (project, _) = discover(&module, &[]);
    let users = &project.contracts[1];
    let api = pkg("contracts/api");
    assert_eq!(users.methods[0].handler, Some(format!("{api}:respond")));
    assert_eq!(users.methods[1].handler, Some(format!("{api}:custom")));
    assert_eq!(project.contracts[0].methods[0].handler, None);
}

#[test]
fn interface_filter_limits_discovery() {
    let module = module();
    let (project, _) = discover(&module, &["Users"]);
    assert_eq!(project.contracts.len(), 1);
    assert_eq!(project.contracts[0].name, "Users");

    let by_id = format!("{}:Pinger", pkg("contracts/api"));
    let (project, _) = discover(&module, &[by_id.as_str()]);
    assert_eq!(project.contracts.len(), 1);
    assert_eq!(project.contracts[0].name, "Pinger");
}

#[test]
fn package_dirs_skip_hidden_and_testdata() {
    let module = Module::new(&[
        ("contracts/a/a.go", "package a\n"),
        ("contracts/a/b/b.go", "package b\n"),
        ("contracts/.hidden/h.go", "package h\n"),
        ("contracts/testdata/t.go", "package t\n"),
        ("contracts/only_test/x_test.go", "package x\n"),
    ]);
    let dirs = package_dirs(&module.root().join("contracts")).unwrap_or_else(|e| panic!("{e}"));
    let rel: Vec<_> = dirs
        .iter()
        .filter_map(|d| d.strip_prefix(module.root()).ok())
        .map(|d| d.to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(rel, vec!["contracts/a", "contracts/a/b"]);
}
