use super::*;
use crate::contracts::ContractDiscovery;
use crate::convert::Converter;
use crate::testutil::{pkg, Module};
use pretty_assertions::assert_eq;

const API: &str = r#"package api

import "context"

// @jsonRPC-server
type Users interface {
	Get(ctx context.Context, id string) (name string, err error)
	Close() error
}
"#;

const ERRS: &str = r#"package errs

type NotFound struct{}

func (*NotFound) Error() string { return "not found" }

func (*NotFound) Code() int { return 404 }
"#;

const SVC: &str = r#"package svc

import (
	"context"

	"example.com/app/errs"
)

type Server struct{ base }

func (s *Server) Get(ctx context.Context, id string) (string, error) {
	if id == "" {
		return "", &errs.NotFound{}
	}
	return id, nil
}
"#;

const SVC_BASE: &str = r#"package svc

type base struct{}

func (base) Close() error { return nil }

// Server also declares Close so the name prefilter admits it.
func (s *Server) Close() error { return s.base.Close() }
"#;

const OTHER: &str = r#"package other

import "context"

type Partial struct{}

func (Partial) Get(ctx context.Context, id string) (string, error) { return "", nil }

type Mismatch struct{}

func (Mismatch) Get(ctx context.Context, id int) (string, error) { return "", nil }

func (Mismatch) Close() error { return nil }
"#;

const GENERATED: &str = r#"// Code generated by mockgen. DO NOT EDIT.

package mocks

import "context"

type MockUsers struct{}

func (MockUsers) Get(ctx context.Context, id string) (string, error) { return "", nil }

func (MockUsers) Close() error { return nil }
"#;

const VALUE: &str = r#"package value

import "context"

type Users struct{}

func (Users) Get(ctx context.Context, id string) (string, error) { return "", nil }

func (Users) Close() error { return nil }
"#;

fn module() -> Module {
    Module::new(&[
        ("contracts/api/api.go", API),
        ("errs/errs.go", ERRS),
        ("svc/svc.go", SVC),
        ("svc/base.go", SVC_BASE),
        ("other/other.go", OTHER),
        ("mocks/mocks.go", GENERATED),
        ("value/value.go", VALUE),
        ("vendor/example.com/x/value.go", VALUE),
        ("skipped/value.go", VALUE),
        ("nested/go.mod", "module example.com/nested\n"),
        ("nested/value.go", VALUE),
    ])
}

fn analyze(module: &Module) -> Project {
    let loader = module.loader();
    let mut config = AnalyzerConfig::new(module.root());
    config.excluded_dirs = vec!["skipped".to_string()];
    let mut project = Project::default();
    let mut conv = Converter::new(&loader);
    ContractDiscovery::new(&config, &loader, &mut conv)
        .discover_contracts(&mut project)
        .unwrap_or_else(|e| panic!("{e}"));
    let classifier = ErrorClassifier::new(&loader);
    ImplementationMatcher::new(&config, &loader, &classifier).match_implementations(&mut project);
    project
}

#[test]
fn matches_pointer_and_value_receivers() {
    let module = module();
    let project = analyze(&module);
    let users = &project.contracts[0];
    let found: Vec<_> = users
        .implementations
        .iter()
        .map(|i| (i.pkg_path.clone(), i.struct_name.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![(pkg("svc"), "Server"), (pkg("value"), "Users")]
    );
}

#[test]
fn records_files_and_error_types() {
    let module = module();
    let project = analyze(&module);
    let server = &project.contracts[0].implementations[0];

    let get = &server.methods_map["Get"];
    assert_eq!(get.file_path, "svc/svc.go");
    let errors: Vec<_> = get.error_types.iter().map(|e| e.type_id.as_str()).collect();
    assert_eq!(errors, vec![format!("{}:NotFound", pkg("errs"))]);

    let close = &server.methods_map["Close"];
    assert_eq!(close.file_path, "svc/base.go");
    assert!(close.error_types.is_empty());
}

#[test]
fn partial_and_mismatched_types_are_rejected() {
    let module = module();
    let project = analyze(&module);
    let other = pkg("other");
    assert!(!project.contracts[0]
        .implementations
        .iter()
        .any(|i| i.pkg_path == other));
}

#[test]
fn judgments_are_memoized() {
    let module = module();
    let loader = module.loader();
    let config = AnalyzerConfig::new(module.root());
    let classifier = ErrorClassifier::new(&loader);
    let matcher = ImplementationMatcher::new(&config, &loader, &classifier);
    let packages = matcher.module_packages();
    let value = packages
        .iter()
        .find(|p| p.pkg_path == pkg("value"))
        .unwrap_or_else(|| panic!("value package not walked"));
    let shape = ContractShape {
        id: format!("{}:Users", pkg("contracts/api")),
        pkg_path: pkg("contracts/api"),
        name: "Users".to_string(),
        methods: vec!["Get".to_string(), "Close".to_string()],
    };
    assert!(matcher.judge(value, "Users", &shape));
    assert_eq!(matcher.judgments.read().len(), 1);
    assert!(matcher.judge(value, "Users", &shape));
    assert_eq!(matcher.judgments.read().len(), 1);

    let walked: Vec<_> = packages.iter().map(|p| p.pkg_path.as_str()).collect();
    assert!(!walked.iter().any(|p| p.contains("vendor") || p.contains("nested")));
    assert!(!walked.contains(&pkg("mocks").as_str()));
}
