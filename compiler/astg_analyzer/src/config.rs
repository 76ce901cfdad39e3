//! Analyzer settings.

use std::path::PathBuf;

/// Interfaces always considered by implementation detection, whether or
/// not the analyzed code imports their packages.
pub const EAGER_INTERFACES: &[&str] = &[
    "context:Context",
    "database/sql/driver:Valuer",
    "database/sql:Scanner",
    "encoding/json:Marshaler",
    "encoding/json:Unmarshaler",
    "encoding:BinaryMarshaler",
    "encoding:BinaryUnmarshaler",
    "encoding:TextMarshaler",
    "encoding:TextUnmarshaler",
    "error",
    "fmt:Stringer",
    "io:Closer",
    "io:ReadCloser",
    "io:Reader",
    "io:WriteCloser",
    "io:Writer",
    "net:Addr",
    "sort:Interface",
];

#[derive(Clone, Debug)]
pub struct AnalyzerConfig {
    /// Module root (directory holding `go.mod`).
    pub root: PathBuf,
    /// Contracts directory, relative to `root`.
    pub contracts_dir: String,
    /// Directories skipped by the module walk, relative to `root`.
    pub excluded_dirs: Vec<String>,
    /// When non-empty, only these interfaces become contracts.
    pub ifaces: Vec<String>,
    /// TypeIDs of interfaces checked for every type.
    pub eager_interfaces: Vec<String>,
    /// Generator version recorded in the project.
    pub version: String,
}

impl AnalyzerConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        AnalyzerConfig {
            root: root.into(),
            contracts_dir: "contracts".to_string(),
            excluded_dirs: Vec::new(),
            ifaces: Vec::new(),
            eager_interfaces: EAGER_INTERFACES.iter().map(|s| (*s).to_string()).collect(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn contracts_path(&self) -> PathBuf {
        self.root.join(&self.contracts_dir)
    }

    /// Whether a directory, relative to `root`, is excluded from the walk.
    pub fn is_excluded(&self, rel: &str) -> bool {
        self.excluded_dirs.iter().any(|ex| {
            let ex = ex.trim_matches('/');
            !ex.is_empty() && (rel == ex || rel.starts_with(&format!("{ex}/")))
        })
    }
}
