// SPDX-License-Identifier: MIT

//! The workflow variants
//!
//! Each submodule wires one research strategy out of the shared node pool
//! and registers it under a stable name via [`bootstrap`]. State schemas
//! are composed here: every variant extends [`research_base_schema`] with
//! the fields its extra nodes write.

pub mod causal;
pub mod code_exec;
pub mod comparative;
pub mod deep;
pub mod fact_check;
pub mod quick;

use crate::error::GraphError;
use crate::scout::graph::registry::WorkflowRegistry;
use crate::scout::graph::state::StateSchema;
use crate::scout::research::types::keys;
use crate::scout::research::Collaborators;
use serde_json::json;
use std::sync::Arc;

/// Fields of the core refinement loop, shared by every variant
pub fn research_base_schema() -> StateSchema {
    StateSchema::new()
        .replace(keys::PLANNED_QUERIES)
        .accumulate(keys::QUERY_HISTORY)
        .replace_with_default(keys::LOOP_COUNT, json!(0))
        .accumulate(keys::SEARCH_RESULTS)
        .accumulate(keys::RAG_RESULTS)
        .accumulate(keys::ANALYZED_DATA)
        .replace(keys::EVALUATION)
        .replace(keys::REFLECTION)
        .replace(keys::REPORT)
}

/// Base plus claim decomposition and per-claim verdicts
pub fn fact_check_schema() -> StateSchema {
    research_base_schema()
        .accumulate(keys::CLAIMS)
        .accumulate(keys::CLAIM_VERDICTS)
}

/// Base plus the comparison matrix fields
pub fn comparative_schema() -> StateSchema {
    research_base_schema()
        .replace(keys::COMPARISON_PLAN)
        .accumulate(keys::COMPARISON_ROWS)
}

/// Base plus hypothesis tracking and the cause-effect chain
pub fn causal_schema() -> StateSchema {
    research_base_schema()
        .replace(keys::HYPOTHESES)
        .accumulate(keys::EVIDENCE_FOR)
        .replace(keys::CAUSAL_GRAPH)
}

/// Base plus code experiments and their outputs
pub fn code_schema() -> StateSchema {
    research_base_schema()
        .replace(keys::CODE_PLAN)
        .accumulate(keys::CODE_OUTPUTS)
}

/// Base plus hierarchical planning fields
pub fn deep_schema() -> StateSchema {
    research_base_schema()
        .replace(keys::EXECUTION_MODE)
        .replace(keys::MASTER_PLAN)
        .replace(keys::PENDING_SUBTASKS)
        .accumulate(keys::SUBTASK_RESULTS)
        .accumulate(keys::PLAN_REVISIONS)
        .replace_with_default(keys::REVISION_COUNT, json!(0))
        .replace(keys::REVISION_CHECK)
}

/// Build a registry holding every workflow variant
pub fn bootstrap(collab: Arc<Collaborators>) -> Result<WorkflowRegistry, GraphError> {
    let mut registry = WorkflowRegistry::new();

    let c = collab.clone();
    registry.register(
        quick::NAME,
        "Single-pass research for simple factual questions",
        move |depth| quick::build(c.clone(), depth),
    )?;

    let c = collab.clone();
    registry.register(
        deep::NAME,
        "Iterative research with reflection and hierarchical decomposition",
        move |depth| deep::build(c.clone(), depth),
    )?;

    let c = collab.clone();
    registry.register(
        fact_check::NAME,
        "Decomposes a statement into claims and verifies each one",
        move |depth| fact_check::build(c.clone(), depth),
    )?;

    let c = collab.clone();
    registry.register(
        comparative::NAME,
        "Structured comparison of entities along shared dimensions",
        move |depth| comparative::build(c.clone(), depth),
    )?;

    let c = collab.clone();
    registry.register(
        causal::NAME,
        "Root-cause analysis through hypothesis validation",
        move |depth| causal::build(c.clone(), depth),
    )?;

    let c = collab;
    registry.register(
        code_exec::NAME,
        "Research requiring code experiments alongside web evidence",
        move |depth| code_exec::build(c.clone(), depth),
    )?;

    Ok(registry)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::research::depth::DepthConfig;
    use crate::scout::research::workflows::testing::{collaborators_with_model, StubModel};

    #[test]
    fn test_bootstrap_registers_all_variants() {
        let collab = collaborators_with_model(StubModel::always(""));
        let registry = bootstrap(collab).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "causal_research",
                "code_research",
                "comparative_research",
                "deep_research",
                "fact_check",
                "quick_research",
            ]
        );
    }

    #[test]
    fn test_every_variant_builds_at_every_depth() {
        let collab = collaborators_with_model(StubModel::always(""));
        let registry = bootstrap(collab).unwrap();
        let depths = [
            DepthConfig::quick(),
            DepthConfig::standard(),
            DepthConfig::deep(),
            DepthConfig::comprehensive(),
        ];
        for name in registry.names() {
            for depth in depths {
                registry
                    .get(&name, depth)
                    .unwrap_or_else(|e| panic!("{} failed to build: {}", name, e));
            }
        }
    }
}
