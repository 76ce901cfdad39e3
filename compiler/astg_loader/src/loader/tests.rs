use super::*;
use crate::env::GoEnv;
use crate::gomod::GoMod;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let fixture = Fixture { dir };
        fixture.write("go.mod", "module example.com/app\n\ngo 1.22\n");
        for (path, source) in files {
            fixture.write(path, source);
        }
        fixture
    }

    fn write(&self, rel: &str, source: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir: {e}"));
        }
        fs::write(&path, source).unwrap_or_else(|e| panic!("write {rel}: {e}"));
    }

    fn loader(&self) -> PackageLoader {
        let gomod = GoMod::read(self.dir.path()).unwrap_or_else(|e| panic!("go.mod: {e}"));
        let resolver = PackageResolver::new(self.dir.path(), gomod, GoEnv::isolated());
        PackageLoader::new(resolver, BuildTags::default())
    }
}

fn must<T>(result: Result<T>) -> T {
    result.unwrap_or_else(|e| panic!("{e}"))
}

const DTO: &str = r#"package dto

import (
	"io"
	"time"
)

// User is a user.
type User struct {
	ID      UserID    `json:"id"`
	Created time.Time `json:"created"`
	Friends []*User
	Base
}

type UserID int64

type ID = UserID

type Base struct{}

func (Base) Kind() string { return "base" }

func (u User) Name() string { return "" }

func (u *User) SetName(name string) {}

type Stream struct{}

func (s *Stream) Read(p []byte) (n int, err error) { return 0, nil }

type Page[T any] struct {
	Items []T
	Next  *Page[T]
}

type Body io.ReadCloser
"#;

#[test]
fn loads_and_indexes_package() {
    let fx = Fixture::new(&[
        ("dto/dto.go", DTO),
        ("dto/dto_test.go", "package dto\n\ntype Hidden struct{}\n"),
        ("dto/dto_windows.go", "package dto\n\ntype WinOnly struct{}\n"),
        ("dto/broken.go", "package dto\n\ntype ( Broken\n"),
        ("dto/_skip.go", "package dto\n\ntype Skipped struct{}\n"),
    ]);
    let loader = fx.loader();
    let info = must(loader.load("example.com/app/dto"));
    assert_eq!(info.name, "dto");
    assert_eq!(info.files.len(), 1);
    assert_eq!(
        info.type_names(),
        vec!["Base", "Body", "ID", "Page", "Stream", "User", "UserID"]
    );
    assert_eq!(info.methods_of("User").count(), 2);
    assert!(info.type_errors.is_empty(), "{:?}", info.type_errors);
    // time and io resolve through the built-in shims and were warmed.
    let loaded: Vec<String> = loader
        .loaded_packages()
        .iter()
        .map(|p| p.pkg_path.clone())
        .collect();
    assert!(loaded.contains(&"time".to_string()), "{loaded:?}");
    assert!(loaded.contains(&"io".to_string()), "{loaded:?}");
}

#[test]
fn resolves_named_declarations() {
    let fx = Fixture::new(&[("dto/dto.go", DTO)]);
    let loader = fx.loader();
    let user = must(loader.named_decl("example.com/app/dto", "User"));
    assert_eq!(user.docs, vec!["User is a user."]);
    assert_eq!(
        user.rhs.to_string(),
        "struct{ID example.com/app/dto.UserID \"json:\\\"id\\\"\"; \
         Created time.Time \"json:\\\"created\\\"\"; \
         Friends []*example.com/app/dto.User; example.com/app/dto.Base}"
    );

    let alias = must(loader.named_decl("example.com/app/dto", "ID"));
    assert!(alias.is_alias);
    assert_eq!(alias.rhs, Ty::named("example.com/app/dto", "UserID"));
    assert_eq!(
        must(loader.unalias(&Ty::named("example.com/app/dto", "ID"))),
        Ty::named("example.com/app/dto", "UserID")
    );
    assert_eq!(
        must(loader.underlying(&Ty::named("example.com/app/dto", "ID"))),
        Ty::Basic("int64")
    );

    let page = must(loader.named_decl("example.com/app/dto", "Page"));
    assert_eq!(page.type_params, vec!["T"]);
    assert_eq!(
        page.instantiate(&[Ty::Basic("string")]).to_string(),
        "struct{Items []string; Next *example.com/app/dto.Page[string]}"
    );

    assert!(matches!(
        loader.named_decl("example.com/app/dto", "Nope"),
        Err(LoadError::UnknownType { .. })
    ));
    assert!(must(loader.lookup_type("example.com/app/dto", "Nope")).is_none());
}

#[test]
fn method_sets_follow_receivers_and_embedding() {
    let fx = Fixture::new(&[("dto/dto.go", DTO)]);
    let loader = fx.loader();
    let user = Ty::named("example.com/app/dto", "User");

    let names = |ty: &Ty| -> Vec<String> {
        must(loader.method_set(ty)).into_iter().map(|m| m.name).collect()
    };
    assert_eq!(names(&user), vec!["Kind", "Name"]);
    assert_eq!(names(&Ty::pointer(user.clone())), vec!["Kind", "Name", "SetName"]);
    let promoted = must(loader.method_set(&user));
    assert_eq!(promoted[0].depth, 1);
    assert_eq!(promoted[1].depth, 0);

    // A defined type over an interface keeps its methods.
    let body = names(&Ty::named("example.com/app/dto", "Body"));
    assert_eq!(body, vec!["Close", "Read"]);
}

#[test]
fn implements_checks_pointer_method_set() {
    let fx = Fixture::new(&[("dto/dto.go", DTO)]);
    let loader = fx.loader();
    let stream = Ty::named("example.com/app/dto", "Stream");
    let reader = Ty::named("io", "Reader");
    let closer = Ty::named("io", "ReadCloser");
    assert!(must(loader.implements(&stream, &reader)));
    assert!(!must(loader.implements(&stream, &closer)));
    assert!(must(loader.implements(&Ty::named("example.com/app/dto", "Body"), &reader)));
    assert!(!must(loader.implements(&stream, &Ty::Basic("error"))));
    assert!(must(loader.is_interface(&closer)));
    assert!(!must(loader.is_interface(&stream)));
}

#[test]
fn error_interface_is_structural() {
    let fx = Fixture::new(&[(
        "errs/errs.go",
        r#"package errs

type NotFound struct{ What string }

func (e *NotFound) Error() string { return e.What }

func (e *NotFound) Code() int { return 404 }

type Ordered interface {
	~int | ~string
}
"#,
    )]);
    let loader = fx.loader();
    let not_found = Ty::named("example.com/app/errs", "NotFound");
    assert!(must(loader.implements(&not_found, &Ty::Basic("error"))));
    assert!(must(loader.is_constraint(&Ty::named("example.com/app/errs", "Ordered"))));
    assert!(!must(loader.implements(
        &not_found,
        &Ty::named("example.com/app/errs", "Ordered")
    )));
    let code = must(loader.method_set(&Ty::pointer(not_found)))
        .into_iter()
        .find(|m| m.name == "Code");
    let Some(code) = code else {
        panic!("Code method missing");
    };
    assert!(code.sig.results[0].ty.is_signed_int());
    assert!(code.decl.is_some_and(|d| d.pointer_recv && d.body.is_some()));
}

#[test]
fn qualifier_falls_back_to_package_clause() {
    let fx = Fixture::new(&[
        (
            "internal/v2api/api.go",
            "package api\n\ntype Token string\n",
        ),
        (
            "svc/svc.go",
            "package svc\n\nimport \"example.com/app/internal/v2api\"\n\ntype Session struct {\n\tToken api.Token\n}\n",
        ),
    ]);
    let loader = fx.loader();
    let session = must(loader.named_decl("example.com/app/svc", "Session"));
    assert_eq!(
        session.rhs.to_string(),
        "struct{Token example.com/app/internal/v2api.Token}"
    );
}

#[test]
fn failed_load_is_not_cached() {
    let fx = Fixture::new(&[]);
    let loader = fx.loader();
    let err = loader.load("example.com/app/later");
    assert!(matches!(err, Err(ref e) if e.is_not_found()), "{err:?}");

    fx.write("later/later.go", "package later\n\ntype Later struct{}\n");
    let info = must(loader.load("example.com/app/later"));
    assert!(info.has_type("Later"));
}

#[test]
fn empty_package_is_a_type_check_error() {
    let fx = Fixture::new(&[("empty/doc_test.go", "package empty\n")]);
    let loader = fx.loader();
    assert!(matches!(
        loader.load("example.com/app/empty"),
        Err(LoadError::TypeCheck { .. })
    ));
}

#[test]
fn for_type_reloads_stale_package_once() {
    let fx = Fixture::new(&[("dto/a.go", "package dto\n\ntype A struct{}\n")]);
    let loader = fx.loader();
    assert!(!must(loader.load("example.com/app/dto")).has_type("B"));

    fx.write("dto/b.go", "package dto\n\ntype B struct{ A A }\n");
    let decl = must(loader.named_decl("example.com/app/dto", "B"));
    assert_eq!(decl.rhs.to_string(), "struct{A example.com/app/dto.A}");
}

#[test]
fn soft_errors_keep_the_package() {
    let fx = Fixture::new(&[(
        "svc/svc.go",
        "package svc\n\nimport \"example.com/missing/dep\"\n\ntype S struct{ D dep.Thing }\n\nfunc (o *Orphan) M() {}\n",
    )]);
    let loader = fx.loader();
    let info = must(loader.load("example.com/app/svc"));
    assert_eq!(info.type_errors.len(), 2, "{:?}", info.type_errors);
    assert!(info.has_type("S"));
}

#[test]
fn from_files_uses_given_sources() {
    let fx = Fixture::new(&[("impl/impl.go", "package impl\n\ntype OnDisk struct{}\n")]);
    let loader = fx.loader();
    let parsed = astg_syntax::parse_file(
        &fx.dir.path().join("impl/impl.go"),
        "package impl\n\ntype InMemory struct{}\n\nfunc Handle() error { return nil }\n",
    )
    .unwrap_or_else(|e| panic!("{e}"));
    let info = must(loader.load_from_files("example.com/app/impl", &[Arc::new(parsed)]));
    assert!(info.has_type("InMemory"));
    assert!(!info.has_type("OnDisk"));
    let handle = must(loader.lookup_func("example.com/app/impl", "Handle"));
    assert_eq!(handle.sig.to_string(), "() error");
    assert!(matches!(
        loader.lookup_func("example.com/app/impl", "Missing"),
        Err(LoadError::UnknownFunc { .. })
    ));
}
