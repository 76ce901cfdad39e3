//! Temporary Go modules for unit tests.

use std::fs;
use std::path::Path;

use astg_loader::{GoEnv, GoMod, PackageLoader, PackageResolver};
use astg_syntax::BuildTags;
use tempfile::TempDir;

pub const MODULE: &str = "example.com/app";

pub struct Module {
    dir: TempDir,
}

impl Module {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let module = Module { dir };
        module.write("go.mod", &format!("module {MODULE}\n\ngo 1.22\n"));
        for (path, source) in files {
            module.write(path, source);
        }
        module
    }

    pub fn write(&self, rel: &str, source: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir: {e}"));
        }
        fs::write(&path, source).unwrap_or_else(|e| panic!("write {rel}: {e}"));
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn loader(&self) -> PackageLoader {
        let gomod = GoMod::read(self.root()).unwrap_or_else(|e| panic!("go.mod: {e}"));
        let resolver = PackageResolver::new(self.root(), gomod, GoEnv::isolated());
        PackageLoader::new(resolver, BuildTags::default())
    }
}

/// Package path of a directory of the test module.
pub fn pkg(rel: &str) -> String {
    format!("{MODULE}/{rel}")
}
