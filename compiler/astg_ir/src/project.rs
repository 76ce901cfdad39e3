//! The project registry.

use std::collections::BTreeMap;

use astg_tags::{Annotations, TagChain};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::builtin::is_builtin;
use crate::contract::Contract;
use crate::types::{Kind, Type};

/// Branch and commit of the analyzed source tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    pub branch: String,
    pub commit: String,
}

/// A deployable implementation type serving one or more contracts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    pub pkg_path: String,
    #[serde(rename = "contractIDs")]
    pub contract_ids: Vec<String>,
}

/// Root registry: owns every contract and every type.
///
/// Types are keyed by TypeID in a `BTreeMap` so iteration and serialization
/// are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub version: String,
    pub module_path: String,
    pub contracts_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_info: Option<GitInfo>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub types: BTreeMap<String, Type>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_dirs: Vec<String>,
    #[serde(rename = "projectID", default)]
    pub project_id: String,
    #[serde(default)]
    pub marker: String,
}

impl Project {
    pub fn new(version: &str, module_path: &str, contracts_dir: &str) -> Self {
        Project {
            version: version.to_string(),
            module_path: module_path.to_string(),
            contracts_dir: contracts_dir.to_string(),
            project_id: project_id_for(module_path),
            ..Project::default()
        }
    }

    pub fn contract(&self, id: &str) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.id == id)
    }

    pub fn contract_mut(&mut self, id: &str) -> Option<&mut Contract> {
        self.contracts.iter_mut().find(|c| c.id == id)
    }

    pub fn get_type(&self, type_id: &str) -> Option<&Type> {
        self.types.get(type_id)
    }

    pub fn get_type_mut(&mut self, type_id: &str) -> Option<&mut Type> {
        self.types.get_mut(type_id)
    }

    pub fn has_type(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    /// Insert a type unless one is already registered under `type_id`.
    ///
    /// Returns whether the record was inserted.
    pub fn insert_type(&mut self, type_id: impl Into<String>, ty: Type) -> bool {
        match self.types.entry(type_id.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(ty);
                true
            }
        }
    }

    /// Kind of a TypeID: built-ins by name, others from the registry.
    pub fn kind_of(&self, type_id: &str) -> Option<Kind> {
        Kind::from_basic_name(type_id).or_else(|| self.types.get(type_id).map(|t| t.kind))
    }

    /// Follow `alias_of` links to the first non-alias record.
    pub fn resolve_alias<'a>(&'a self, type_id: &'a str) -> &'a str {
        let mut current = type_id;
        for _ in 0..32 {
            match self.types.get(current) {
                Some(ty) if ty.kind == Kind::Alias && !ty.alias_of.is_empty() => {
                    current = &ty.alias_of;
                }
                _ => break,
            }
        }
        current
    }

    /// TypeIDs referenced by contracts but missing from the registry.
    pub fn missing_types(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = self
            .contracts
            .iter()
            .flat_map(|c| &c.methods)
            .flat_map(|m| m.args.iter().chain(&m.results))
            .flat_map(|v| v.type_ref.type_ids())
            .filter(|id| !is_builtin(id) && !self.types.contains_key(*id))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Tag chain rooted at the project scope.
    pub fn tags(&self) -> TagChain<'_> {
        TagChain::root(&self.annotations)
    }

    /// Recompute the content marker from contracts and types.
    pub fn update_marker(&mut self) -> serde_json::Result<()> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(&self.contracts)?);
        hasher.update(serde_json::to_vec(&self.types)?);
        self.marker = hex::encode(hasher.finalize());
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Project> {
        serde_json::from_str(text)
    }
}

/// Stable short identifier of a module: 12 hex chars of its SHA-256.
pub fn project_id_for(module_path: &str) -> String {
    let digest = Sha256::digest(module_path.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(12);
    id
}

#[cfg(test)]
mod tests;
