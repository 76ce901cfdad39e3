use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::fs;

fn mkdir(path: &Path) {
    if let Err(e) = fs::create_dir_all(path) {
        panic!("mkdir {}: {e}", path.display());
    }
}

fn gomod(text: &str) -> GoMod {
    match GoMod::parse(text) {
        Ok(m) => m,
        Err(e) => panic!("go.mod: {e}"),
    }
}

#[test]
fn escapes_uppercase() {
    assert_eq!(escape_path("github.com/BurntSushi/toml"), "github.com/!burnt!sushi/toml");
    assert_eq!(unescape_path("github.com/!burnt!sushi/toml"), "github.com/BurntSushi/toml");
    assert_eq!(escape_path("v1.2.3"), "v1.2.3");
}

#[test]
fn resolves_module_local_packages() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    mkdir(&dir.path().join("contracts"));
    let resolver = PackageResolver::new(
        dir.path(),
        gomod("module example.com/app\n"),
        GoEnv::isolated(),
    );
    assert!(resolver.is_local("example.com/app/contracts"));
    assert!(!resolver.is_local("example.com/application"));
    assert_eq!(
        resolver.resolve("example.com/app/contracts").ok(),
        Some(PackageSource::Dir(dir.path().join("contracts")))
    );
    assert!(matches!(
        resolver.resolve("example.com/app/missing"),
        Err(ResolveError::NotFound { .. })
    ));
    assert_eq!(
        resolver.local_pkg_path(&dir.path().join("contracts")),
        Some("example.com/app/contracts".to_string())
    );
}

#[test]
fn replace_wins_over_module_cache() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let app = dir.path().join("app");
    let lib = dir.path().join("lib");
    mkdir(&app);
    mkdir(&lib.join("errs"));
    let resolver = PackageResolver::new(
        &app,
        gomod("module example.com/app\nrequire example.com/lib v1.0.0\nreplace example.com/lib => ../lib\n"),
        GoEnv::isolated(),
    );
    assert_eq!(
        resolver.resolve("example.com/lib/errs").ok(),
        Some(PackageSource::Dir(app.join("../lib").join("errs")))
    );
}

#[test]
fn vendor_is_consulted() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    mkdir(&dir.path().join("vendor/github.com/acme/kit"));
    let resolver = PackageResolver::new(
        dir.path(),
        gomod("module example.com/app\n"),
        GoEnv::isolated(),
    );
    assert_eq!(
        resolver.resolve("github.com/acme/kit").ok(),
        Some(PackageSource::Dir(dir.path().join("vendor/github.com/acme/kit")))
    );
}

#[test]
fn module_cache_uses_required_version_then_latest() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let cache = dir.path().join("cache");
    mkdir(&cache.join("github.com/!acme/kit@v1.2.0/errs"));
    mkdir(&cache.join("github.com/other/util@v0.1.0"));
    mkdir(&cache.join("github.com/other/util@v0.3.0/sub"));
    let env = GoEnv {
        goroot: None,
        gomodcache: Some(cache.clone()),
        gopath: None,
    };
    let resolver = PackageResolver::new(
        dir.path(),
        gomod("module example.com/app\nrequire github.com/Acme/kit v1.2.0\n"),
        env,
    );
    assert_eq!(
        resolver.resolve("github.com/Acme/kit/errs").ok(),
        Some(PackageSource::Dir(cache.join("github.com/!acme/kit@v1.2.0/errs")))
    );
    assert_eq!(
        resolver.resolve("github.com/other/util/sub").ok(),
        Some(PackageSource::Dir(cache.join("github.com/other/util@v0.3.0/sub")))
    );
}

#[test]
fn latest_module_dir_follows_semver() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let cache = dir.path().join("cache");
    for version in ["v1.9.0", "v1.10.0", "v1.10.1-rc.1", "v2.0.0-beta", "vbad"] {
        mkdir(&cache.join(format!("example.org/lib@{version}")));
    }
    let env = GoEnv {
        goroot: None,
        gomodcache: Some(cache.clone()),
        gopath: None,
    };
    let resolver = PackageResolver::new(dir.path(), gomod("module example.com/app\n"), env);
    assert_eq!(
        resolver.resolve("example.org/lib").ok(),
        Some(PackageSource::Dir(cache.join("example.org/lib@v2.0.0-beta")))
    );
}

#[test]
fn module_versions_order_by_precedence() {
    let v = |s: &str| ModuleVersion::parse(s).unwrap_or_else(|| panic!("version {s}"));
    assert!(v("v1.10.0") > v("v1.9.9"));
    assert!(v("v1.0.0") > v("v1.0.0-rc.1"));
    assert!(v("v1.0.0-rc.10") > v("v1.0.0-rc.2"));
    assert!(v("v1.0.0-beta") > v("v1.0.0-alpha.1"));
    assert!(v("v1.0.0-alpha.1") > v("v1.0.0-alpha"));
    assert!(v("v1.0.0-alpha.beta") > v("v1.0.0-alpha.1"));
    assert_eq!(v("v2.0.0+incompatible"), v("v2.0.0"));
    assert!(ModuleVersion::parse("1.0.0").is_none());
    assert!(ModuleVersion::parse("v1.0").is_none());
    assert!(ModuleVersion::parse("v1.0.0.0").is_none());
}

#[test]
fn std_falls_back_to_shims() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let resolver = PackageResolver::new(
        dir.path(),
        gomod("module example.com/app\n"),
        GoEnv::isolated(),
    );
    assert!(matches!(resolver.resolve("context"), Ok(PackageSource::Shim(_))));
    assert!(matches!(
        resolver.resolve("encoding/xml"),
        Err(ResolveError::NotFound { .. })
    ));
}

#[test]
fn goroot_wins_over_shims() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let goroot = dir.path().join("go");
    mkdir(&goroot.join("src/context"));
    let env = GoEnv {
        goroot: Some(goroot.clone()),
        gomodcache: None,
        gopath: None,
    };
    let resolver = PackageResolver::new(dir.path(), gomod("module example.com/app\n"), env);
    assert_eq!(
        resolver.resolve("context").ok(),
        Some(PackageSource::Dir(goroot.join("src/context")))
    );
}

proptest! {
    #[test]
    fn escape_round_trips(path in "[a-zA-Z0-9./_-]{0,40}") {
        let escaped = escape_path(&path);
        prop_assert!(!escaped.chars().any(|c| c.is_ascii_uppercase()));
        prop_assert_eq!(unescape_path(&escaped), path);
    }
}
