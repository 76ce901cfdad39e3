//! State shared by every emitter of one rendering run.

use astg_ir::{Contract, Project};
use astg_tags::names;

use crate::collect::CollectedTypes;
use crate::config::RenderConfig;
use crate::gotype::GoTypes;
use crate::plan::{Codec, MethodPlan};
use crate::writer::Imports;

pub struct RenderContext<'a> {
    pub project: &'a Project,
    pub config: &'a RenderConfig,
    pub collected: CollectedTypes,
    /// Contracts with a transport, in declaration order.
    pub contracts: Vec<&'a Contract>,
}

impl<'a> RenderContext<'a> {
    pub fn new(project: &'a Project, config: &'a RenderConfig) -> Self {
        let contracts: Vec<&Contract> = project
            .contracts
            .iter()
            .filter(|c| {
                let served = c.is_json_rpc() || c.is_http();
                if !served {
                    tracing::debug!(contract = %c.id, "contract has no transport tag");
                }
                served
            })
            .collect();
        let collected = CollectedTypes::collect_from(project, &contracts);
        RenderContext {
            project,
            config,
            collected,
            contracts,
        }
    }

    pub fn types(&self) -> GoTypes<'_> {
        GoTypes::new(self.project, &self.collected)
    }

    pub fn has_json_rpc(&self) -> bool {
        self.contracts.iter().any(|c| c.is_json_rpc())
    }

    pub fn has_http(&self) -> bool {
        self.contracts.iter().any(|c| !c.is_json_rpc() && c.is_http())
    }

    /// Whether a contract is instrumented.
    pub fn metrics_for(&self, contract: &Contract) -> bool {
        self.config.metrics
            && astg_tags::TagChain::root(&self.project.annotations)
                .narrow(&contract.annotations)
                .is_set(names::METRICS)
    }

    pub fn has_metrics(&self) -> bool {
        self.contracts.iter().any(|c| self.metrics_for(c))
    }

    /// Plans of every method of a contract.
    pub fn plans(&self, contract: &'a Contract) -> Vec<MethodPlan<'a>> {
        contract
            .methods
            .iter()
            .map(|m| MethodPlan::new(self.project, contract, m))
            .collect()
    }

    /// Whether any HTTP method streams a body in either direction.
    pub fn has_streams(&self) -> bool {
        self.contracts
            .iter()
            .filter(|c| !c.is_json_rpc())
            .flat_map(|c| self.plans(c))
            .any(|p| p.uses_streams())
    }

    /// Import the JSON package, honoring `packageJSON` at project scope.
    pub fn import_json(&self, imports: &mut Imports) -> String {
        Codec::Json.import(self.json_package(), imports)
    }

    pub fn json_package(&self) -> Option<&'a str> {
        self.project
            .annotations
            .value(names::PACKAGE_JSON)
            .filter(|v| !v.is_empty())
    }
}
