// SPDX-License-Identifier: MIT

//! Web search node - runs this iteration's planned queries through the
//! provider fallback chain.

use crate::error::ScoutError;
use crate::scout::graph::node::Node;
use crate::scout::graph::state::{ResearchState, StatePatch};
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::types::{keys, SearchHit};
use crate::scout::research::Collaborators;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct WebSearchNode {
    collab: Arc<Collaborators>,
    depth: DepthConfig,
}

impl WebSearchNode {
    pub const ID: &'static str = "web_search";

    pub fn new(collab: Arc<Collaborators>, depth: DepthConfig) -> Self {
        Self { collab, depth }
    }
}

#[async_trait]
impl Node for WebSearchNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let queries = super::planned_queries(state);
        let mut hits: Vec<SearchHit> = Vec::new();

        for query in queries.iter().take(self.depth.max_queries) {
            match self
                .collab
                .web
                .search(query, self.depth.results_per_query)
                .await
            {
                Ok(mut found) => hits.append(&mut found),
                Err(e) => {
                    // Recorded in-band so the failure is visible in the
                    // final report instead of swallowed.
                    log::warn!("Web search failed for '{}': {}", query, e);
                    hits.push(SearchHit::error(query, &e.to_string()));
                }
            }
        }

        Ok(StatePatch::new().set(keys::SEARCH_RESULTS, json!(hits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::research::workflows::research_base_schema;
    use crate::scout::research::workflows::testing::{
        collaborators_with_model, collaborators_with_search, StubModel,
    };

    #[tokio::test]
    async fn test_search_accumulates_hits() {
        let collab = collaborators_with_search(
            StubModel::always(""),
            vec![("rust", "https://rust-lang.org", "the rust site")],
        );
        let node = WebSearchNode::new(collab, DepthConfig::quick());

        let state = ResearchState::new(Arc::new(research_base_schema()), "rust");
        let patch = node.run(&state).await.unwrap();
        let mut state = state;
        state.merge(WebSearchNode::ID, &patch).unwrap();

        let hits: Vec<SearchHit> = state.get_as(keys::SEARCH_RESULTS).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://rust-lang.org");
    }

    #[tokio::test]
    async fn test_no_providers_records_error_in_band() {
        // No providers configured: the accumulator still receives an
        // entry describing the failure.
        let collab = collaborators_with_model(StubModel::always(""));
        let node = WebSearchNode::new(collab, DepthConfig::quick());

        let state = ResearchState::new(Arc::new(research_base_schema()), "rust");
        let patch = node.run(&state).await.unwrap();
        let mut state = state;
        state.merge(WebSearchNode::ID, &patch).unwrap();

        let hits: Vec<SearchHit> = state.get_as(keys::SEARCH_RESULTS).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].is_error());
    }
}
