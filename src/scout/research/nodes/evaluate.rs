// SPDX-License-Identifier: MIT

//! Evaluate and reflect nodes
//!
//! The evaluator judges evidence sufficiency; the reflection step (quick
//! workflow) can overrule a "sufficient" verdict by setting
//! `should_continue_research`. Both degrade on malformed model output:
//! structured parse, then free-text interpretation, then a hardcoded
//! default - never a crash, since parse failures occur at a nonzero rate.

use crate::error::{ModelError, ScoutError};
use crate::llm::invoke_structured;
use crate::scout::graph::node::Node;
use crate::scout::graph::state::{ResearchState, StatePatch};
use crate::scout::research::types::{keys, Evaluation, Reflection};
use crate::scout::research::Collaborators;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct EvaluateNode {
    collab: Arc<Collaborators>,
}

impl EvaluateNode {
    pub const ID: &'static str = "evaluate";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }
}

#[async_trait]
impl Node for EvaluateNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let prompt = format!(
            "Research question: {query}\nIteration {loops}.\n\
             Findings so far:\n{analysis}\n\
             Judge whether the findings are sufficient to answer the \
             question, listing what is still missing.",
            query = state.query(),
            loops = state.get_u64(keys::LOOP_COUNT),
            analysis = super::analysis_digest(state),
        );

        let evaluation = match invoke_structured::<Evaluation>(&self.collab.model, &prompt).await {
            Ok(eval) => eval,
            Err(ModelError::InvalidResponse(text)) => {
                // Free-text fallback: the reply was prose, not JSON.
                log::warn!("Evaluator output was not structured; interpreting free text");
                Evaluation::from_free_text(&text)
            }
            Err(e) => {
                log::warn!("Evaluator unavailable, defaulting to insufficient: {}", e);
                Evaluation {
                    sufficient: false,
                    missing: vec![],
                    reasoning: format!("evaluator unavailable: {}", e),
                }
            }
        };

        Ok(StatePatch::new().set(keys::EVALUATION, json!(evaluation)))
    }
}

/// Reflection step: a second look at the evaluator's verdict
pub struct ReflectNode {
    collab: Arc<Collaborators>,
}

impl ReflectNode {
    pub const ID: &'static str = "reflect";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }
}

#[async_trait]
impl Node for ReflectNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let evaluation = state
            .get_as::<Evaluation>(keys::EVALUATION)
            .map(|e| e.reasoning)
            .unwrap_or_default();

        let prompt = format!(
            "Research question: {query}\n\
             The evaluator concluded: {evaluation}\n\
             Findings so far:\n{analysis}\n\
             Reflect critically: is there a blind spot or unexplored angle \
             that warrants another research round?",
            query = state.query(),
            evaluation = evaluation,
            analysis = super::analysis_digest(state),
        );

        let reflection = invoke_structured::<Reflection>(&self.collab.model, &prompt)
            .await
            .unwrap_or_else(|e| {
                log::warn!("Reflection degraded to no-op: {}", e);
                Reflection {
                    should_continue_research: false,
                    gaps: vec![],
                }
            });

        Ok(StatePatch::new().set(keys::REFLECTION, json!(reflection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::research::workflows::research_base_schema;
    use crate::scout::research::workflows::testing::{collaborators_with_model, StubModel};

    #[tokio::test]
    async fn test_evaluate_parses_structured_verdict() {
        let collab = collaborators_with_model(StubModel::always(
            r#"{"sufficient": true, "missing": [], "reasoning": "covered"}"#,
        ));
        let node = EvaluateNode::new(collab);

        let mut state = ResearchState::new(Arc::new(research_base_schema()), "q");
        let patch = node.run(&state).await.unwrap();
        state.merge(EvaluateNode::ID, &patch).unwrap();

        let eval: Evaluation = state.get_as(keys::EVALUATION).unwrap();
        assert!(eval.sufficient);
    }

    #[tokio::test]
    async fn test_evaluate_free_text_fallback() {
        let collab = collaborators_with_model(StubModel::always(
            "The gathered evidence looks sufficient to me.",
        ));
        let node = EvaluateNode::new(collab);

        let mut state = ResearchState::new(Arc::new(research_base_schema()), "q");
        let patch = node.run(&state).await.unwrap();
        state.merge(EvaluateNode::ID, &patch).unwrap();

        let eval: Evaluation = state.get_as(keys::EVALUATION).unwrap();
        assert!(eval.sufficient);
    }

    #[tokio::test]
    async fn test_reflect_degrades_to_noop() {
        let collab = collaborators_with_model(StubModel::always("just prose"));
        let node = ReflectNode::new(collab);

        let mut state = ResearchState::new(Arc::new(research_base_schema()), "q");
        let patch = node.run(&state).await.unwrap();
        state.merge(ReflectNode::ID, &patch).unwrap();

        let reflection: Reflection = state.get_as(keys::REFLECTION).unwrap();
        assert!(!reflection.should_continue_research);
    }
}
