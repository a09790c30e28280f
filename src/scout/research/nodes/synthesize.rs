// SPDX-License-Identifier: MIT

//! Synthesizer node - writes the final report from everything the run
//! accumulated. An empty report is impossible: if the model is down, the
//! report is assembled directly from the accumulated analyses.

use crate::error::ScoutError;
use crate::scout::graph::node::Node;
use crate::scout::graph::state::{ResearchState, StatePatch};
use crate::scout::research::types::{keys, Analysis, ClaimVerdict, ComparisonRow};
use crate::scout::research::Collaborators;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct SynthesizeNode {
    collab: Arc<Collaborators>,
}

impl SynthesizeNode {
    pub const ID: &'static str = "synthesize";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }

    /// Variant-specific material present in state, if any
    fn extra_sections(state: &ResearchState) -> String {
        let mut sections = Vec::new();

        let verdicts: Vec<ClaimVerdict> = state.get_as(keys::CLAIM_VERDICTS).unwrap_or_default();
        if !verdicts.is_empty() {
            let lines: Vec<String> = verdicts
                .iter()
                .map(|v| format!("- {} -> {} ({})", v.claim, v.verdict, v.evidence))
                .collect();
            sections.push(format!("Claim verdicts:\n{}", lines.join("\n")));
        }

        let rows: Vec<ComparisonRow> = state.get_as(keys::COMPARISON_ROWS).unwrap_or_default();
        if !rows.is_empty() {
            let lines: Vec<String> = rows
                .iter()
                .map(|r| format!("- {} / {}: {}", r.entity, r.dimension, r.finding))
                .collect();
            sections.push(format!("Comparison findings:\n{}", lines.join("\n")));
        }

        if let Some(graph) = state.get_str(keys::CAUSAL_GRAPH) {
            sections.push(format!("Causal chain:\n{}", graph));
        }

        if state.len_of(keys::CODE_OUTPUTS) > 0 {
            if let Some(outputs) = state.get(keys::CODE_OUTPUTS) {
                sections.push(format!("Computation outputs:\n{}", outputs));
            }
        }

        sections.join("\n\n")
    }

    /// Report assembled without the model, used when synthesis itself
    /// fails
    fn degraded_report(state: &ResearchState) -> String {
        let analyses: Vec<Analysis> = state.get_as(keys::ANALYZED_DATA).unwrap_or_default();
        let body = if analyses.is_empty() {
            "No analysis was produced before synthesis.".to_string()
        } else {
            analyses
                .iter()
                .map(|a| format!("## Iteration {}\n{}", a.iteration, a.summary))
                .collect::<Vec<_>>()
                .join("\n\n")
        };
        format!(
            "# {}\n\n(report assembled from partial evidence; synthesis model unavailable)\n\n{}",
            state.query(),
            body
        )
    }
}

#[async_trait]
impl Node for SynthesizeNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let prompt = format!(
            "Write a final research report answering: {query}\n\n\
             Analysis across iterations:\n{analysis}\n\n{extra}\n\n\
             Structure the report with a summary, findings, and open \
             questions. Ground every claim in the material above.",
            query = state.query(),
            analysis = super::analysis_digest(state),
            extra = Self::extra_sections(state),
        );

        let report = match self.collab.model.invoke(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Synthesis degraded to assembled evidence: {}", e);
                Self::degraded_report(state)
            }
        };

        Ok(StatePatch::new().set(keys::REPORT, json!(report)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::graph::state::StateSchema;
    use crate::scout::research::workflows::research_base_schema;
    use crate::scout::research::workflows::testing::{
        collaborators_with_model, FailingModel, StubModel,
    };

    fn schema() -> StateSchema {
        research_base_schema()
    }

    #[tokio::test]
    async fn test_synthesize_writes_report() {
        let collab = collaborators_with_model(StubModel::always("the report"));
        let node = SynthesizeNode::new(collab);

        let mut state = ResearchState::new(Arc::new(schema()), "q");
        let patch = node.run(&state).await.unwrap();
        state.merge(SynthesizeNode::ID, &patch).unwrap();

        assert_eq!(state.get_str(keys::REPORT), Some("the report"));
    }

    #[tokio::test]
    async fn test_synthesize_never_produces_empty_report() {
        let collab = collaborators_with_model(Arc::new(FailingModel));
        let node = SynthesizeNode::new(collab);

        let mut state = ResearchState::new(Arc::new(schema()), "q");
        state
            .merge(
                "analyze",
                &StatePatch::new().set(
                    keys::ANALYZED_DATA,
                    json!(Analysis {
                        iteration: 1,
                        summary: "partial finding".to_string()
                    }),
                ),
            )
            .unwrap();

        let patch = node.run(&state).await.unwrap();
        state.merge(SynthesizeNode::ID, &patch).unwrap();

        let report = state.get_str(keys::REPORT).unwrap();
        assert!(!report.is_empty());
        assert!(report.contains("partial finding"));
    }
}
