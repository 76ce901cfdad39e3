//! Package path to source location resolution.
//!
//! Order: `replace` directives, the main module, `vendor/`, the standard
//! library root, the module cache, then the embedded shims.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::env::GoEnv;
use crate::error::ResolveError;
use crate::gomod::{GoMod, ReplaceTarget};
use crate::shims;

/// Where the sources of a package come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackageSource {
    Dir(PathBuf),
    Shim(&'static [(&'static str, &'static str)]),
}

/// Maps package paths to source locations. Memoized.
pub struct PackageResolver {
    root: PathBuf,
    gomod: GoMod,
    env: GoEnv,
    resolve_cache: RwLock<FxHashMap<String, PackageSource>>,
    module_dir_cache: RwLock<FxHashMap<String, Option<PathBuf>>>,
}

impl PackageResolver {
    pub fn new(root: impl Into<PathBuf>, gomod: GoMod, env: GoEnv) -> Self {
        PackageResolver {
            root: root.into(),
            gomod,
            env,
            resolve_cache: RwLock::new(FxHashMap::default()),
            module_dir_cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Resolver for the module rooted at `root`, reading its `go.mod`.
    pub fn for_module(root: impl Into<PathBuf>, env: GoEnv) -> Result<Self, ResolveError> {
        let root = root.into();
        let gomod = GoMod::read(&root)?;
        Ok(PackageResolver::new(root, gomod, env))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module_path(&self) -> &str {
        &self.gomod.module
    }

    pub fn gomod(&self) -> &GoMod {
        &self.gomod
    }

    /// Whether a package path belongs to the main module.
    pub fn is_local(&self, pkg_path: &str) -> bool {
        module_relative(&self.gomod.module, pkg_path).is_some()
    }

    /// Whether a path looks like a standard library package.
    pub fn is_std(pkg_path: &str) -> bool {
        let first = pkg_path.split('/').next().unwrap_or(pkg_path);
        !first.contains('.')
    }

    pub fn resolve(&self, pkg_path: &str) -> Result<PackageSource, ResolveError> {
        if let Some(found) = self.resolve_cache.read().get(pkg_path) {
            return Ok(found.clone());
        }
        let found = self.locate(pkg_path)?;
        tracing::trace!(pkg_path, source = ?found, "resolved package");
        self.resolve_cache
            .write()
            .insert(pkg_path.to_string(), found.clone());
        Ok(found)
    }

    /// Package directory inside the project root, if it is module-local.
    pub fn local_dir(&self, pkg_path: &str) -> Option<PathBuf> {
        module_relative(&self.gomod.module, pkg_path).map(|rest| join_rel(&self.root, rest))
    }

    /// Package path of a directory inside the project root.
    pub fn local_pkg_path(&self, dir: &Path) -> Option<String> {
        let rel = dir.strip_prefix(&self.root).ok()?;
        let mut path = self.gomod.module.clone();
        for part in rel.components() {
            path.push('/');
            path.push_str(&part.as_os_str().to_string_lossy());
        }
        Some(path)
    }

    fn locate(&self, pkg_path: &str) -> Result<PackageSource, ResolveError> {
        if pkg_path.is_empty() {
            return Err(ResolveError::not_found(pkg_path));
        }
        if let Some(dir) = self.replaced_dir(pkg_path) {
            return existing(dir, pkg_path);
        }
        if let Some(dir) = self.local_dir(pkg_path) {
            return existing(dir, pkg_path);
        }

        let vendored = self.root.join("vendor").join(pkg_path);
        if vendored.is_dir() {
            return Ok(PackageSource::Dir(vendored));
        }

        if Self::is_std(pkg_path) {
            if let Some(std_root) = self.env.std_root() {
                let dir = std_root.join(pkg_path);
                if dir.is_dir() {
                    return Ok(PackageSource::Dir(dir));
                }
            }
            return shims::shim_files(pkg_path)
                .map(PackageSource::Shim)
                .ok_or_else(|| ResolveError::not_found(pkg_path));
        }

        if let Some(dir) = self.cached_dir(pkg_path) {
            return Ok(PackageSource::Dir(dir));
        }
        Err(ResolveError::not_found(pkg_path))
    }

    fn replaced_dir(&self, pkg_path: &str) -> Option<PathBuf> {
        let (replace, rest) = self
            .gomod
            .replaces
            .iter()
            .filter_map(|r| module_relative(&r.old_path, pkg_path).map(|rest| (r, rest)))
            .max_by_key(|(r, _)| r.old_path.len())?;
        match &replace.target {
            ReplaceTarget::Local(dir) => {
                let base = if dir.is_absolute() {
                    dir.clone()
                } else {
                    self.root.join(dir)
                };
                Some(join_rel(&base, rest))
            }
            ReplaceTarget::Module { path, version } => self
                .module_dir(path, version)
                .map(|base| join_rel(&base, rest)),
        }
    }

    /// Package directory inside the module cache.
    ///
    /// Required modules are matched by longest prefix; otherwise the path is
    /// shortened on `/` until a `<module>@<version>` directory exists, taking
    /// the greatest version.
    fn cached_dir(&self, pkg_path: &str) -> Option<PathBuf> {
        let required = self
            .gomod
            .requires
            .iter()
            .filter_map(|r| module_relative(&r.path, pkg_path).map(|rest| (r, rest)))
            .max_by_key(|(r, _)| r.path.len());
        if let Some((req, rest)) = required {
            if let Some(base) = self.module_dir(&req.path, &req.version) {
                let dir = join_rel(&base, rest);
                if dir.is_dir() {
                    return Some(dir);
                }
            }
        }

        let mut prefix = pkg_path;
        loop {
            if let Some(base) = self.latest_module_dir(prefix) {
                let rest = &pkg_path[prefix.len()..];
                let dir = join_rel(&base, rest.trim_start_matches('/'));
                if dir.is_dir() {
                    return Some(dir);
                }
            }
            prefix = &prefix[..prefix.rfind('/')?];
        }
    }

    /// `<cache>/<escaped module>@<escaped version>` when it exists.
    pub fn module_dir(&self, module_path: &str, version: &str) -> Option<PathBuf> {
        let key = format!("{module_path}@{version}");
        if let Some(found) = self.module_dir_cache.read().get(&key) {
            return found.clone();
        }
        let name = format!("{}@{}", escape_path(module_path), escape_path(version));
        let found = self
            .env
            .mod_cache_roots()
            .into_iter()
            .map(|root| root.join(&name))
            .find(|dir| dir.is_dir());
        self.module_dir_cache.write().insert(key, found.clone());
        found
    }

    fn latest_module_dir(&self, module_path: &str) -> Option<PathBuf> {
        let key = format!("{module_path}@latest");
        if let Some(found) = self.module_dir_cache.read().get(&key) {
            return found.clone();
        }
        let escaped = escape_path(module_path);
        let (parent, last) = match escaped.rsplit_once('/') {
            Some((parent, last)) => (Some(parent), last),
            None => (None, escaped.as_str()),
        };
        let wanted = format!("{last}@");
        let found = self
            .env
            .mod_cache_roots()
            .into_iter()
            .filter_map(|root| {
                let dir = parent.map_or_else(|| root.clone(), |p| root.join(p));
                std::fs::read_dir(&dir).ok()
            })
            .flatten()
            .filter_map(std::result::Result::ok)
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                let version = ModuleVersion::parse(name.strip_prefix(&wanted)?)?;
                let path = e.path();
                path.is_dir().then_some((version, path))
            })
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, path)| path);
        self.module_dir_cache.write().insert(key, found.clone());
        found
    }
}

/// Remainder of `pkg_path` below `module`, `""` for the module itself.
/// A module version `vMAJOR.MINOR.PATCH[-pre][+build]`, ordered by semver
/// precedence. Build metadata such as `+incompatible` is ignored.
#[derive(Debug, PartialEq, Eq)]
struct ModuleVersion {
    core: [u64; 3],
    pre: Vec<String>,
}

impl ModuleVersion {
    fn parse(text: &str) -> Option<Self> {
        let text = text.strip_prefix('v')?;
        let text = text.split_once('+').map_or(text, |(v, _)| v);
        let (core, pre) = match text.split_once('-') {
            Some((core, pre)) => (core, pre.split('.').map(str::to_string).collect()),
            None => (text, Vec::new()),
        };
        let mut numbers = core.split('.').map(|n| n.parse::<u64>().ok());
        let version = ModuleVersion {
            core: [numbers.next()??, numbers.next()??, numbers.next()??],
            pre,
        };
        numbers.next().is_none().then_some(version)
    }
}

impl Ord for ModuleVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        self.core.cmp(&other.core).then_with(|| {
            match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    for (a, b) in self.pre.iter().zip(&other.pre) {
                        let ord = match (a.parse::<u64>(), b.parse::<u64>()) {
                            (Ok(x), Ok(y)) => x.cmp(&y),
                            (Ok(_), Err(_)) => Ordering::Less,
                            (Err(_), Ok(_)) => Ordering::Greater,
                            (Err(_), Err(_)) => a.cmp(b),
                        };
                        if ord != Ordering::Equal {
                            return ord;
                        }
                    }
                    self.pre.len().cmp(&other.pre.len())
                }
            }
        })
    }
}

impl PartialOrd for ModuleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn module_relative<'a>(module: &str, pkg_path: &'a str) -> Option<&'a str> {
    if module.is_empty() {
        return None;
    }
    let rest = pkg_path.strip_prefix(module)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

fn join_rel(base: &Path, rest: &str) -> PathBuf {
    if rest.is_empty() {
        base.to_path_buf()
    } else {
        base.join(rest)
    }
}

fn existing(dir: PathBuf, pkg_path: &str) -> Result<PackageSource, ResolveError> {
    if dir.is_dir() {
        Ok(PackageSource::Dir(dir))
    } else {
        Err(ResolveError::not_found(pkg_path))
    }
}

/// Module cache escaping: every uppercase letter becomes `!` plus its
/// lowercase form.
pub fn escape_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Inverse of [`escape_path`].
pub fn unescape_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        if c == '!' {
            if let Some(next) = chars.next() {
                out.push(next.to_ascii_uppercase());
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests;
