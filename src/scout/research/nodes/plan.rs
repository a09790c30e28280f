// SPDX-License-Identifier: MIT

//! Planner node - turns the query plus evaluator feedback into this
//! iteration's search queries, and bumps the loop counter.

use crate::error::ScoutError;
use crate::llm::invoke_structured;
use crate::scout::graph::node::Node;
use crate::scout::graph::state::{ResearchState, StatePatch};
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::types::{keys, Evaluation, QueryPlan};
use crate::scout::research::Collaborators;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct PlannerNode {
    collab: Arc<Collaborators>,
    depth: DepthConfig,
}

impl PlannerNode {
    pub const ID: &'static str = "plan";

    pub fn new(collab: Arc<Collaborators>, depth: DepthConfig) -> Self {
        Self { collab, depth }
    }

    fn prompt(&self, state: &ResearchState) -> String {
        let feedback = state
            .get_as::<Evaluation>(keys::EVALUATION)
            .filter(|e| !e.missing.is_empty())
            .map(|e| format!("Previous evaluation flagged gaps: {}", e.missing.join("; ")))
            .unwrap_or_else(|| "First iteration; cover the core of the question.".to_string());

        format!(
            "You are planning research for: {query}\n\
             {feedback}\n\
             Findings so far:\n{analysis}\n\
             Plan between {min} and {max} web/knowledge-base search queries \
             that close the remaining gaps.",
            query = state.query(),
            feedback = feedback,
            analysis = super::analysis_digest(state),
            min = self.depth.min_queries,
            max = self.depth.max_queries,
        )
    }
}

#[async_trait]
impl Node for PlannerNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let queries = match invoke_structured::<QueryPlan>(&self.collab.model, &self.prompt(state))
            .await
        {
            Ok(plan) if !plan.queries.is_empty() => plan
                .queries
                .into_iter()
                .take(self.depth.max_queries)
                .collect(),
            Ok(_) => vec![state.query().to_string()],
            Err(e) => {
                // Degrade to searching the raw query rather than stalling
                // the loop.
                log::warn!("Planner fell back to the raw query: {}", e);
                vec![state.query().to_string()]
            }
        };

        log::info!("Planned {} queries: {:?}", queries.len(), queries);

        Ok(StatePatch::new()
            .set(keys::PLANNED_QUERIES, json!(queries))
            .set(keys::QUERY_HISTORY, json!(queries))
            .set(keys::LOOP_COUNT, json!(state.get_u64(keys::LOOP_COUNT) + 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::research::workflows::testing::{collaborators_with_model, StubModel};
    use crate::scout::research::workflows::research_base_schema;

    #[tokio::test]
    async fn test_planner_emits_queries_and_bumps_loop_count() {
        let model = StubModel::always(r#"{"queries": ["a", "b"], "rationale": ""}"#);
        let collab = collaborators_with_model(model);
        let node = PlannerNode::new(collab, DepthConfig::standard());

        let state = ResearchState::new(Arc::new(research_base_schema()), "q");
        let patch = node.run(&state).await.unwrap();
        let mut state = state;
        state.merge(PlannerNode::ID, &patch).unwrap();

        assert_eq!(state.get_u64(keys::LOOP_COUNT), 1);
        assert_eq!(
            state.get_as::<Vec<String>>(keys::PLANNED_QUERIES).unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(state.len_of(keys::QUERY_HISTORY), 2);
    }

    #[tokio::test]
    async fn test_planner_degrades_to_raw_query() {
        let model = StubModel::always("not json at all");
        let collab = collaborators_with_model(model);
        let node = PlannerNode::new(collab, DepthConfig::standard());

        let state = ResearchState::new(Arc::new(research_base_schema()), "what is rust?");
        let patch = node.run(&state).await.unwrap();
        let mut state = state;
        state.merge(PlannerNode::ID, &patch).unwrap();

        assert_eq!(
            state.get_as::<Vec<String>>(keys::PLANNED_QUERIES).unwrap(),
            vec!["what is rust?"]
        );
    }
}
