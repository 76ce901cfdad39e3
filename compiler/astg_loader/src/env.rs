//! Go toolchain locations.

use std::path::PathBuf;

/// Where standard library sources and downloaded modules live.
///
/// Every location is optional: without `GOROOT` the embedded standard
/// library shims are used, and without a module cache only module-local,
/// replaced and vendored packages resolve.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GoEnv {
    pub goroot: Option<PathBuf>,
    pub gomodcache: Option<PathBuf>,
    pub gopath: Option<PathBuf>,
}

impl GoEnv {
    /// Read `GOROOT`, `GOMODCACHE` and `GOPATH`, falling back to `$HOME/go`
    /// for the latter.
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        let gopath = var("GOPATH").or_else(|| var("HOME").map(|home| home.join("go")));
        GoEnv {
            goroot: var("GOROOT"),
            gomodcache: var("GOMODCACHE"),
            gopath,
        }
    }

    /// An environment with nothing configured.
    pub fn isolated() -> Self {
        GoEnv::default()
    }

    /// Standard library source root (`$GOROOT/src`).
    pub fn std_root(&self) -> Option<PathBuf> {
        self.goroot.as_ref().map(|root| root.join("src"))
    }

    /// Module cache roots, primary first.
    pub fn mod_cache_roots(&self) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if let Some(cache) = &self.gomodcache {
            roots.push(cache.clone());
        }
        if let Some(gopath) = &self.gopath {
            // GOPATH may list several entries.
            for entry in std::env::split_paths(gopath) {
                let candidate = entry.join("pkg").join("mod");
                if !roots.contains(&candidate) {
                    roots.push(candidate);
                }
            }
        }
        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_roots_prefer_gomodcache() {
        let env = GoEnv {
            goroot: None,
            gomodcache: Some(PathBuf::from("/cache")),
            gopath: Some(PathBuf::from("/gopath")),
        };
        assert_eq!(
            env.mod_cache_roots(),
            vec![PathBuf::from("/cache"), PathBuf::from("/gopath/pkg/mod")]
        );
        assert_eq!(env.std_root(), None);
        assert!(GoEnv::isolated().mod_cache_roots().is_empty());
    }
}
