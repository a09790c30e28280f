// SPDX-License-Identifier: MIT

//! Knowledge-base retrieval node - similarity search over the local
//! vector store for each planned query.

use crate::error::ScoutError;
use crate::scout::graph::node::Node;
use crate::scout::graph::state::{ResearchState, StatePatch};
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::types::{keys, RagHit};
use crate::scout::research::Collaborators;
use crate::scout::retrieval::relevance_from_distance;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct KbRetrieveNode {
    collab: Arc<Collaborators>,
    depth: DepthConfig,
}

impl KbRetrieveNode {
    pub const ID: &'static str = "kb_retrieve";

    pub fn new(collab: Arc<Collaborators>, depth: DepthConfig) -> Self {
        Self { collab, depth }
    }
}

#[async_trait]
impl Node for KbRetrieveNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let queries = super::planned_queries(state);
        let mut hits: Vec<RagHit> = Vec::new();

        for query in queries.iter().take(self.depth.max_queries) {
            match self
                .collab
                .store
                .similarity_search_with_score(query, self.depth.results_per_query)
                .await
            {
                Ok(found) => {
                    for (doc, distance) in found {
                        hits.push(RagHit {
                            content: doc.content,
                            source: doc
                                .metadata
                                .get("source")
                                .cloned()
                                .unwrap_or_else(|| "knowledge-base".to_string()),
                            relevance: relevance_from_distance(distance),
                        });
                    }
                }
                Err(e) => {
                    log::warn!("Knowledge-base lookup failed for '{}': {}", query, e);
                    hits.push(RagHit {
                        content: format!("retrieval failed: {}", e),
                        source: "error".to_string(),
                        relevance: 0.0,
                    });
                }
            }
        }

        Ok(StatePatch::new().set(keys::RAG_RESULTS, json!(hits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::research::workflows::research_base_schema;
    use crate::scout::research::workflows::testing::{collaborators_with_kb, StubModel};

    #[tokio::test]
    async fn test_retrieve_converts_distance_to_relevance() {
        let collab = collaborators_with_kb(
            StubModel::always(""),
            vec![("rust ownership borrowing model", "kb/rust.md")],
        );
        let node = KbRetrieveNode::new(collab, DepthConfig::quick());

        let state = ResearchState::new(Arc::new(research_base_schema()), "rust ownership");
        let patch = node.run(&state).await.unwrap();
        let mut state = state;
        state.merge(KbRetrieveNode::ID, &patch).unwrap();

        let hits: Vec<RagHit> = state.get_as(keys::RAG_RESULTS).unwrap();
        assert!(!hits.is_empty());
        assert!(hits[0].relevance > 0.0);
        assert!(hits[0].relevance <= 1.0);
        assert_eq!(hits[0].source, "kb/rust.md");
    }
}
