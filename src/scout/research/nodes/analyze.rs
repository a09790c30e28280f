// SPDX-License-Identifier: MIT

//! Analyzer node - distills this iteration's evidence into a summary.

use crate::error::ScoutError;
use crate::scout::graph::node::Node;
use crate::scout::graph::state::{ResearchState, StatePatch};
use crate::scout::research::types::{keys, Analysis};
use crate::scout::research::Collaborators;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const EVIDENCE_LIMIT: usize = 20;

pub struct AnalyzeNode {
    collab: Arc<Collaborators>,
}

impl AnalyzeNode {
    pub const ID: &'static str = "analyze";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }
}

#[async_trait]
impl Node for AnalyzeNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let evidence = super::evidence_digest(state, EVIDENCE_LIMIT);
        let prompt = format!(
            "Research question: {query}\n\n{evidence}\n\n\
             Summarize what this evidence establishes about the question, \
             noting conflicts and open gaps.",
            query = state.query(),
            evidence = evidence,
        );

        let iteration = state.get_u64(keys::LOOP_COUNT);
        let summary = match self.collab.model.invoke(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                // Keep the loop moving; the raw evidence is still in state
                // for synthesis.
                log::warn!("Analyzer degraded to raw evidence: {}", e);
                format!("analysis unavailable ({}); raw evidence:\n{}", e, evidence)
            }
        };

        Ok(StatePatch::new().set(
            keys::ANALYZED_DATA,
            json!(Analysis { iteration, summary }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::research::workflows::research_base_schema;
    use crate::scout::research::workflows::testing::{collaborators_with_model, StubModel};

    #[tokio::test]
    async fn test_analyze_appends_one_summary_per_iteration() {
        let collab = collaborators_with_model(StubModel::always("evidence says X"));
        let node = AnalyzeNode::new(collab);

        let mut state = ResearchState::new(Arc::new(research_base_schema()), "q");
        for _ in 0..2 {
            let patch = node.run(&state).await.unwrap();
            state.merge(AnalyzeNode::ID, &patch).unwrap();
        }

        let analyses: Vec<Analysis> = state.get_as(keys::ANALYZED_DATA).unwrap();
        assert_eq!(analyses.len(), 2);
        assert_eq!(analyses[0].summary, "evidence says X");
    }
}
