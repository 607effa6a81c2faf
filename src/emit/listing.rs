use serde::{Deserialize, Serialize};

use crate::plan::chains::{self, Chain};
use crate::plan::{TestCase, TestPlan};
use crate::registry::entry::Home;

/// A plan in run order, for machine-readable output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanListing {
    pub cases_total: usize,
    pub cases: Vec<CaseListing>,
}

/// One case of a [`PlanListing`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseListing {
    pub order: usize,
    pub case: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub always_run: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs_after: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs_after_groups: Vec<String>,
}

/// The independent chains of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainListing {
    pub best_count: usize,
    pub chains: Vec<ChainEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainEntry {
    pub index: usize,
    pub cases: Vec<String>,
}

fn case_listing(order: usize, case: &TestCase) -> CaseListing {
    let entry = case.entry();
    let info = entry.info();
    let homes = |list: &[Home]| list.iter().map(ToString::to_string).collect();
    CaseListing {
        order,
        case: case.label(),
        class: entry.class_home().map(ToString::to_string),
        description: info.description.clone(),
        enabled: info.is_enabled(),
        always_run: info.always_run,
        groups: info.groups.clone(),
        depends_on: homes(&info.depends_on),
        depends_on_groups: info.depends_on_groups.clone(),
        runs_after: homes(&info.runs_after),
        runs_after_groups: info.runs_after_groups.clone(),
    }
}

/// List the plan's cases in run order.
pub fn plan_listing(plan: &TestPlan) -> PlanListing {
    let cases: Vec<CaseListing> = plan
        .tests()
        .enumerate()
        .map(|(i, case)| case_listing(i + 1, case))
        .collect();
    PlanListing {
        cases_total: cases.len(),
        cases,
    }
}

/// List the plan's chains, each with its runnable cases in order.
pub fn chain_listing(plan: &TestPlan, chains: &[Chain]) -> ChainListing {
    ChainListing {
        best_count: chains.len(),
        chains: chains
            .iter()
            .enumerate()
            .map(|(index, chain)| ChainEntry {
                index,
                cases: chain.cases().iter().map(|&id| plan.case(id).label()).collect(),
            })
            .collect(),
    }
}

/// Text rendering of the chains: one numbered block per chain.
pub fn chains_text(plan: &TestPlan, chains: &[Chain]) -> String {
    let mut out = format!("{} chain(s)\n", chains.len());
    for (index, chain) in chains.iter().enumerate() {
        out.push_str(&format!("\nchain {index}:\n"));
        for &id in chain.cases() {
            out.push_str(&format!("  {}\n", plan.case(id).label()));
        }
    }
    out
}

/// The first case of each chain, one per line.
pub fn shallow_text(plan: &TestPlan) -> String {
    chains::shallow(plan)
        .into_iter()
        .map(|id| format!("{}\n", plan.case(id).label()))
        .collect()
}

/// Emit any listing as YAML.
///
/// # Errors
///
/// Returns an error if YAML serialization fails.
pub fn emit_yaml<T: Serialize>(listing: &T) -> Result<String, String> {
    serde_yaml::to_string(listing).map_err(|e| format!("yaml serialization failed: {e}"))
}

/// Emit any listing as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn emit_json<T: Serialize>(listing: &T) -> Result<String, String> {
    serde_json::to_string_pretty(listing).map_err(|e| format!("json serialization failed: {e}"))
}
