use std::path::Path;

use pretty_assertions::assert_eq;

use super::{parse_file, unquote};
use crate::ast::{ArrayLen, ChanDir, Decl, InterfaceElem, SourceFile, TypeExpr};
use crate::error::SyntaxError;

fn parse(source: &str) -> SourceFile {
    match parse_file(Path::new("test.go"), source) {
        Ok(file) => file,
        Err(err) => panic!("parse failed: {err}"),
    }
}

fn ident(name: &str) -> TypeExpr {
    TypeExpr::Ident(name.to_string())
}

fn qualified(pkg: &str, name: &str) -> TypeExpr {
    TypeExpr::Qualified {
        pkg: pkg.to_string(),
        name: name.to_string(),
    }
}

#[test]
fn package_clause_and_imports() {
    let file = parse(
        r#"// Package api is documented.
// @jsonRPC-server
package api

import "context"

import (
	dto "example.com/app/dto"
	_ "embed"
	. "strings"
	"github.com/google/uuid/v2"
)
"#,
    );
    assert_eq!(file.package, "api");
    assert_eq!(
        file.package_docs,
        vec!["Package api is documented.", "@jsonRPC-server"]
    );
    let paths: Vec<_> = file.imports.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "context",
            "example.com/app/dto",
            "embed",
            "strings",
            "github.com/google/uuid/v2"
        ]
    );
    assert_eq!(file.imports[1].qualifier().as_deref(), Some("dto"));
    assert_eq!(file.imports[2].qualifier(), None);
    assert_eq!(file.imports[4].qualifier().as_deref(), Some("uuid"));
    assert_eq!(file.dot_imports().count(), 1);
}

#[test]
fn missing_package_is_an_error() {
    assert_eq!(
        parse_file(Path::new("x.go"), "type A int\n"),
        Err(SyntaxError::MissingPackage)
    );
}

#[test]
fn generated_header_and_build_constraint() {
    let file = parse("// Code generated by astg. DO NOT EDIT.\n\n//go:build linux && !race\n\npackage x\n");
    assert!(file.generated);
    assert_eq!(file.build_constraint.as_deref(), Some("linux && !race"));
}

#[test]
fn interface_with_docs_and_variable_annotations() {
    let file = parse(
        r"package api

// UserService manages users.
// @http-prefix api/v1
type UserService interface {
	// GetUser returns a user.
	// @http-method GET
	GetUser(ctx context.Context, id int) (user *User, err error)
	Delete(
		ctx context.Context,
		// @http-headers requestID|X-Request-Id
		requestID string,
	) error
	io.Closer
}
",
    );
    let spec = file.type_specs().next().map(Clone::clone);
    let Some(spec) = spec else {
        panic!("no type spec");
    };
    assert_eq!(spec.name, "UserService");
    assert_eq!(
        spec.docs,
        vec!["UserService manages users.", "@http-prefix api/v1"]
    );
    let TypeExpr::Interface(elems) = &spec.ty else {
        panic!("not an interface: {:?}", spec.ty);
    };
    assert_eq!(elems.len(), 3);

    let InterfaceElem::Method(get) = &elems[0] else {
        panic!("expected method");
    };
    assert_eq!(get.name, "GetUser");
    assert_eq!(get.docs, vec!["GetUser returns a user.", "@http-method GET"]);
    assert_eq!(get.sig.params.len(), 2);
    assert_eq!(get.sig.params[0].name.as_deref(), Some("ctx"));
    assert_eq!(get.sig.params[0].ty, qualified("context", "Context"));
    assert_eq!(get.sig.results[0].name.as_deref(), Some("user"));
    assert_eq!(get.sig.results[0].ty, TypeExpr::Pointer(Box::new(ident("User"))));
    assert!(get.sig.params[1].docs.is_empty());

    let InterfaceElem::Method(delete) = &elems[1] else {
        panic!("expected method");
    };
    assert_eq!(delete.sig.params[1].docs, vec!["@http-headers requestID|X-Request-Id"]);
    assert_eq!(delete.sig.results.len(), 1);
    assert_eq!(delete.sig.results[0].name, None);

    assert_eq!(elems[2], InterfaceElem::Embed(qualified("io", "Closer")));
}

#[test]
fn struct_fields_tags_and_embedding() {
    let file = parse(
        r#"package dto

type User struct {
	// ID is the key.
	ID        int    `json:"id"`
	First, Last string // names
	*Base
	meta.Info
	Items []Item `json:"items,omitempty"`
	Grid [3][4]float64
	List[int]
	Raw  string "json:\"raw\""
}
"#,
    );
    let Some(spec) = file.type_specs().next() else {
        panic!("no type spec");
    };
    let TypeExpr::Struct(fields) = &spec.ty else {
        panic!("not a struct");
    };
    assert_eq!(fields.len(), 8);
    assert_eq!(fields[0].names, vec!["ID"]);
    assert_eq!(fields[0].docs, vec!["ID is the key."]);
    assert_eq!(fields[0].tag.as_deref(), Some(r#"json:"id""#));
    assert_eq!(fields[1].names, vec!["First", "Last"]);
    assert_eq!(fields[1].comment.as_deref(), Some("names"));
    assert!(fields[2].is_embedded());
    assert_eq!(fields[2].ty, TypeExpr::Pointer(Box::new(ident("Base"))));
    assert_eq!(fields[3].ty, qualified("meta", "Info"));
    assert_eq!(fields[4].ty, TypeExpr::Slice(Box::new(ident("Item"))));
    assert_eq!(
        fields[5].ty,
        TypeExpr::Array {
            len: ArrayLen::Literal(3),
            elem: Box::new(TypeExpr::Array {
                len: ArrayLen::Literal(4),
                elem: Box::new(ident("float64")),
            }),
        }
    );
    assert!(fields[6].is_embedded());
    assert_eq!(
        fields[6].ty,
        TypeExpr::Generic {
            base: Box::new(ident("List")),
            args: vec![ident("int")],
        }
    );
    assert_eq!(fields[7].tag.as_deref(), Some(r#"json:"raw""#));
}

#[test]
fn grouped_types_aliases_and_generics() {
    let file = parse(
        r"package x

type (
	// ID doc.
	ID = string
	Pair[K comparable, V any] struct {
		Key K
		Val V
	}
	Num interface{ ~int | ~float64 }
	Fixed [N]byte
	Both[A, B any] map[A]B
)
",
    );
    let specs: Vec<_> = file.type_specs().collect();
    assert_eq!(specs.len(), 5);
    assert!(specs[0].is_alias);
    assert_eq!(specs[0].docs, vec!["ID doc."]);
    assert_eq!(specs[1].type_params.len(), 2);
    assert_eq!(specs[1].type_params[0].names, vec!["K"]);
    assert_eq!(specs[1].type_params[1].constraint, ident("any"));
    let TypeExpr::Interface(elems) = &specs[2].ty else {
        panic!("not an interface");
    };
    assert_eq!(
        elems[0],
        InterfaceElem::Embed(TypeExpr::Union(vec![
            TypeExpr::Tilde(Box::new(ident("int"))),
            TypeExpr::Tilde(Box::new(ident("float64"))),
        ]))
    );
    assert!(specs[3].type_params.is_empty());
    assert_eq!(
        specs[3].ty,
        TypeExpr::Array {
            len: ArrayLen::Expr("N".to_string()),
            elem: Box::new(ident("byte")),
        }
    );
    assert_eq!(specs[4].type_params[0].names, vec!["A", "B"]);
}

#[test]
fn functions_methods_and_bodies() {
    let file = parse(
        r#"package svc

var errNotFound = errors.New("x")

const (
	a = iota
	b
)

// New builds a service.
func New() *Service { return &Service{} }

func (s *Service) Get(ctx context.Context, ids ...int) (int, error) {
	if len(ids) == 0 {
		return 0, &NotFound{}
	}
	return ids[0], nil
}

func (List[T]) Len() int { return 0 }

func Map[T, U any](in []T, f func(T) U) []U
"#,
    );
    let funcs: Vec<_> = file.funcs().collect();
    assert_eq!(funcs.len(), 4);
    assert_eq!(funcs[0].docs, vec!["New builds a service."]);
    assert!(funcs[0].recv.is_none());

    let get = funcs[1];
    let Some(recv) = &get.recv else {
        panic!("missing receiver");
    };
    assert_eq!(recv.name.as_deref(), Some("s"));
    assert!(recv.pointer);
    assert_eq!(recv.type_name, "Service");
    assert!(get.sig.is_variadic());
    assert_eq!(get.sig.params[1].ty, ident("int"));
    assert_eq!(get.sig.results.len(), 2);
    let body = get.body.as_deref().unwrap_or_default();
    assert!(body.iter().any(|t| t.is_ident("NotFound")));

    let Some(recv) = &funcs[2].recv else {
        panic!("missing receiver");
    };
    assert_eq!(recv.name, None);
    assert_eq!(recv.type_args, vec!["T"]);

    assert_eq!(funcs[3].type_params[0].names, vec!["T", "U"]);
    assert!(funcs[3].body.is_none());
    assert_eq!(
        funcs[3].sig.params[1].ty.to_string(),
        "func(T) U"
    );
}

#[test]
fn unnamed_parameters_are_types() {
    let file = parse("package x\ntype F func(context.Context, int, []string) (bool, error)\n");
    let Some(spec) = file.type_specs().next() else {
        panic!("no type spec");
    };
    let TypeExpr::Func(sig) = &spec.ty else {
        panic!("not a func");
    };
    assert!(sig.params.iter().all(|p| p.name.is_none()));
    assert_eq!(sig.params[1].ty, ident("int"));
    assert_eq!(sig.results[1].ty, ident("error"));
}

#[test]
fn shared_parameter_types() {
    let file = parse("package x\ntype F func(a, b int, c []byte, l List[int])\n");
    let Some(spec) = file.type_specs().next() else {
        panic!("no type spec");
    };
    let TypeExpr::Func(sig) = &spec.ty else {
        panic!("not a func");
    };
    let names: Vec<_> = sig.params.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(names, vec!["a", "b", "c", "l"]);
    assert_eq!(sig.params[1].ty, ident("int"));
    assert_eq!(sig.params[2].ty, TypeExpr::Slice(Box::new(ident("byte"))));
}

#[test]
fn channel_directions() {
    let file = parse("package x\ntype C struct {\n\tIn <-chan int\n\tOut chan<- string\n\tAll chan bool\n}\n");
    let Some(spec) = file.type_specs().next() else {
        panic!("no type spec");
    };
    let TypeExpr::Struct(fields) = &spec.ty else {
        panic!("not a struct");
    };
    let dirs: Vec<_> = fields
        .iter()
        .map(|f| match &f.ty {
            TypeExpr::Chan { dir, .. } => *dir,
            other => panic!("not a chan: {other:?}"),
        })
        .collect();
    assert_eq!(dirs, vec![ChanDir::Recv, ChanDir::Send, ChanDir::Both]);
}

#[test]
fn display_round_trips_common_forms() {
    let file = parse("package x\ntype M map[string][]*pkg.Item\n");
    let Some(Decl::Type(spec)) = file.decls.first() else {
        panic!("no decl");
    };
    assert_eq!(spec.ty.to_string(), "map[string][]*pkg.Item");
}

#[test]
fn reports_line_of_unexpected_token() {
    let err = parse_file(Path::new("x.go"), "package x\n\ntype A struct {\n\t1\n}\n");
    assert!(matches!(err, Err(SyntaxError::Expected { line: 4, .. })));
}

#[test]
fn unquotes_literals() {
    assert_eq!(unquote(r#""a\"b\\c\n""#), "a\"b\\c\n");
    assert_eq!(unquote("`raw\\n`"), "raw\\n");
}

#[test]
fn licensed_contract_file() {
    let file = parse(
        "/*
Copyright 2024 Acme
*/

// Package api holds the contracts.
package api

import \"context\"

/* Pinger checks liveness. */
// @jsonRPC-server
type Pinger interface {
	Ping(ctx context.Context) (pong string, err error) /* no body */
}
",
    );
    assert_eq!(file.package, "api");
    assert_eq!(file.package_docs, vec!["Package api holds the contracts."]);
    let Some(spec) = file.type_specs().next() else {
        panic!("no type spec");
    };
    assert_eq!(spec.name, "Pinger");
    assert_eq!(spec.docs, vec!["Pinger checks liveness.", "@jsonRPC-server"]);
    let TypeExpr::Interface(elems) = &spec.ty else {
        panic!("not an interface: {:?}", spec.ty);
    };
    assert_eq!(elems.len(), 1);
}
