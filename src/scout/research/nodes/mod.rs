// SPDX-License-Identifier: MIT

//! The shared node library
//!
//! Each workflow variant assembles its graph from this pool. Every node
//! follows the same failure discipline: recoverable collaborator failures
//! degrade to a valid patch with the problem recorded in-band, so the
//! workflow always continues on whatever evidence exists.

mod analyze;
mod causal;
mod code;
mod comparative;
mod evaluate;
mod factcheck;
mod hierarchy;
mod plan;
mod retrieve;
mod search;
mod synthesize;

pub use analyze::AnalyzeNode;
pub use causal::{CausalGraphNode, HypothesisNode, ValidateHypothesesNode};
pub use code::{CodePlanNode, CodeRunNode};
pub use comparative::{CompareNode, ComparisonPlanNode};
pub use evaluate::{EvaluateNode, ReflectNode};
pub use factcheck::{ClaimDecomposeNode, VerifyClaimsNode};
pub use hierarchy::{
    HierarchicalSynthesizeNode, MasterPlanNode, PlanReviseNode, RevisionCheckNode,
    SubtaskExecuteNode, MODE_HIERARCHICAL, MODE_SIMPLE,
};
pub use plan::PlannerNode;
pub use retrieve::KbRetrieveNode;
pub use search::WebSearchNode;
pub use synthesize::SynthesizeNode;

use crate::scout::graph::state::ResearchState;
use crate::scout::research::types::{keys, Analysis, RagHit, SearchHit};
use std::collections::HashSet;

/// Compile the accumulated evidence into prompt text, deduplicating web
/// hits by url. Duplicate suppression lives here in the node layer, not in
/// the state merge.
pub(crate) fn evidence_digest(state: &ResearchState, limit: usize) -> String {
    let mut sections = Vec::new();
    let mut seen_urls = HashSet::new();

    let web: Vec<SearchHit> = state.get_as(keys::SEARCH_RESULTS).unwrap_or_default();
    let web_lines: Vec<String> = web
        .iter()
        .filter(|h| !h.is_error() && seen_urls.insert(h.url.clone()))
        .take(limit)
        .map(|h| format!("- [{}]({}): {}", h.title, h.url, h.content))
        .collect();
    if !web_lines.is_empty() {
        sections.push(format!("Web evidence:\n{}", web_lines.join("\n")));
    }

    let rag: Vec<RagHit> = state.get_as(keys::RAG_RESULTS).unwrap_or_default();
    let rag_lines: Vec<String> = rag
        .iter()
        .filter(|h| h.relevance > 0.0)
        .take(limit)
        .map(|h| format!("- ({:.2}) {}: {}", h.relevance, h.source, h.content))
        .collect();
    if !rag_lines.is_empty() {
        sections.push(format!("Knowledge-base evidence:\n{}", rag_lines.join("\n")));
    }

    if sections.is_empty() {
        "No evidence gathered yet.".to_string()
    } else {
        sections.join("\n\n")
    }
}

/// Prior analysis summaries, oldest first
pub(crate) fn analysis_digest(state: &ResearchState) -> String {
    let analyses: Vec<Analysis> = state.get_as(keys::ANALYZED_DATA).unwrap_or_default();
    if analyses.is_empty() {
        return "None yet.".to_string();
    }
    analyses
        .iter()
        .map(|a| format!("Iteration {}: {}", a.iteration, a.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The queries planned for this iteration, falling back to the raw query
pub(crate) fn planned_queries(state: &ResearchState) -> Vec<String> {
    let planned: Vec<String> = state.get_as(keys::PLANNED_QUERIES).unwrap_or_default();
    if planned.is_empty() {
        vec![state.query().to_string()]
    } else {
        planned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::graph::state::{StatePatch, StateSchema};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_evidence_digest_dedupes_urls_and_skips_errors() {
        let schema = Arc::new(
            StateSchema::new()
                .accumulate(keys::SEARCH_RESULTS)
                .accumulate(keys::RAG_RESULTS),
        );
        let mut state = ResearchState::new(schema, "q");
        let hits = vec![
            SearchHit {
                title: "a".into(),
                url: "https://x".into(),
                content: "first".into(),
                score: None,
                source: "tavily".into(),
            },
            SearchHit {
                title: "dup".into(),
                url: "https://x".into(),
                content: "second".into(),
                score: None,
                source: "brave".into(),
            },
            SearchHit::error("q", "all providers down"),
        ];
        state
            .merge(
                "web_search",
                &StatePatch::new().set(keys::SEARCH_RESULTS, json!(hits)),
            )
            .unwrap();

        let digest = evidence_digest(&state, 10);
        assert_eq!(digest.matches("https://x").count(), 1);
        assert!(!digest.contains("all providers down"));
    }

    #[test]
    fn test_planned_queries_falls_back_to_query() {
        let schema = Arc::new(StateSchema::new().replace(keys::PLANNED_QUERIES));
        let state = ResearchState::new(schema, "what is rust?");
        assert_eq!(planned_queries(&state), vec!["what is rust?"]);
    }
}
