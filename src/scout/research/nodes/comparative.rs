// SPDX-License-Identifier: MIT

//! Comparative-analysis nodes: plan the entities/dimensions under
//! comparison, then fill in findings per entity-dimension pair.

use crate::error::ScoutError;
use crate::llm::invoke_structured;
use crate::scout::graph::node::Node;
use crate::scout::graph::state::{ResearchState, StatePatch};
use crate::scout::research::types::{keys, ComparisonPlan, ComparisonRow};
use crate::scout::research::Collaborators;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
struct RowSet {
    rows: Vec<ComparisonRow>,
}

/// Identifies what is being compared along which dimensions. Runs once.
pub struct ComparisonPlanNode {
    collab: Arc<Collaborators>,
}

impl ComparisonPlanNode {
    pub const ID: &'static str = "comparison_plan";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }

    /// Crude split used when the model cannot produce a plan
    fn fallback_plan(query: &str) -> ComparisonPlan {
        let lowered = query.to_lowercase();
        let entities: Vec<String> = if lowered.contains(" vs ") {
            query.split(" vs ").map(|s| s.trim().to_string()).collect()
        } else if lowered.contains("versus") {
            query.split("versus").map(|s| s.trim().to_string()).collect()
        } else {
            vec![query.to_string()]
        };
        ComparisonPlan {
            entities,
            dimensions: vec!["overview".to_string()],
        }
    }
}

#[async_trait]
impl Node for ComparisonPlanNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        if state.get(keys::COMPARISON_PLAN).is_some_and(|v| !v.is_null()) {
            return Ok(StatePatch::new());
        }

        let prompt = format!(
            "For the comparison question \"{}\", name the entities being \
             compared and the dimensions a fair comparison should cover.",
            state.query()
        );

        let plan = invoke_structured::<ComparisonPlan>(&self.collab.model, &prompt)
            .await
            .unwrap_or_else(|e| {
                log::warn!("Comparison planning degraded: {}", e);
                Self::fallback_plan(state.query())
            });

        log::info!(
            "Comparing {:?} across {:?}",
            plan.entities,
            plan.dimensions
        );
        Ok(StatePatch::new().set(keys::COMPARISON_PLAN, json!(plan)))
    }
}

/// Fills in comparison findings from this iteration's evidence
pub struct CompareNode {
    collab: Arc<Collaborators>,
}

impl CompareNode {
    pub const ID: &'static str = "compare";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }
}

#[async_trait]
impl Node for CompareNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let plan: Option<ComparisonPlan> = state.get_as(keys::COMPARISON_PLAN);
        let plan_text = plan
            .map(|p| {
                format!(
                    "Entities: {}. Dimensions: {}.",
                    p.entities.join(", "),
                    p.dimensions.join(", ")
                )
            })
            .unwrap_or_else(|| "Derive entities and dimensions from the question.".to_string());

        let prompt = format!(
            "Comparison question: {query}\n{plan}\n\n{evidence}\n\n\
             Produce one finding per entity-dimension pair the evidence \
             covers.",
            query = state.query(),
            plan = plan_text,
            evidence = super::evidence_digest(state, 20),
        );

        let rows = match invoke_structured::<RowSet>(&self.collab.model, &prompt).await {
            Ok(set) => set.rows,
            Err(e) => {
                log::warn!("Comparison degraded to empty rows: {}", e);
                vec![ComparisonRow {
                    entity: "comparison".to_string(),
                    dimension: "error".to_string(),
                    finding: format!("comparison unavailable: {}", e),
                }]
            }
        };

        Ok(StatePatch::new().set(keys::COMPARISON_ROWS, json!(rows)))
    }
}
