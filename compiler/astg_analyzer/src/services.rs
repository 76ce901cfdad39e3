//! Grouping implementations into deployable services.

use std::collections::BTreeMap;

use astg_ir::{Project, Service};

/// One service per implementation type of a server contract (one carrying
/// `jsonRPC-server` or `http-server`), listing the contracts it serves.
///
/// Services are sorted by package path, then name; contract ids are sorted.
pub fn services(project: &Project) -> Vec<Service> {
    let mut by_impl: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
    for contract in project
        .contracts
        .iter()
        .filter(|c| c.is_json_rpc() || c.is_http())
    {
        for implementation in &contract.implementations {
            by_impl
                .entry((
                    implementation.pkg_path.clone(),
                    implementation.struct_name.clone(),
                ))
                .or_default()
                .push(contract.id.clone());
        }
    }
    by_impl
        .into_iter()
        .map(|((pkg_path, name), mut contract_ids)| {
            contract_ids.sort();
            contract_ids.dedup();
            Service {
                name,
                pkg_path,
                contract_ids,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use astg_ir::{Contract, Implementation};
    use astg_tags::Annotations;
    use pretty_assertions::assert_eq;

    fn contract(id: &str, tag: Option<&str>, impls: &[(&str, &str)]) -> Contract {
        let annotations: Annotations = tag.into_iter().map(|t| (t, "")).collect();
        Contract {
            id: id.to_string(),
            annotations,
            implementations: impls
                .iter()
                .map(|(pkg, name)| Implementation {
                    pkg_path: (*pkg).to_string(),
                    struct_name: (*name).to_string(),
                    ..Implementation::default()
                })
                .collect(),
            ..Contract::default()
        }
    }

    #[test]
    fn groups_contracts_by_implementation() {
        let project = Project {
            contracts: vec![
                contract("api:Users", Some("http-server"), &[("svc", "Server"), ("alt", "Users")]),
                contract("api:Pinger", Some("jsonRPC-server"), &[("svc", "Server")]),
                contract("api:Internal", Some("desc"), &[("svc", "Other")]),
            ],
            ..Project::default()
        };
        let services = services(&project);
        assert_eq!(
            services,
            vec![
                Service {
                    name: "Users".into(),
                    pkg_path: "alt".into(),
                    contract_ids: vec!["api:Users".into()],
                },
                Service {
                    name: "Server".into(),
                    pkg_path: "svc".into(),
                    contract_ids: vec!["api:Pinger".into(), "api:Users".into()],
                },
            ]
        );
    }
}
