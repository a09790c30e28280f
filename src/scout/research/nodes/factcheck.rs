// SPDX-License-Identifier: MIT

//! Fact-checking nodes: decompose the query into checkable claims, then
//! verify each claim against the gathered evidence.

use crate::error::ScoutError;
use crate::llm::invoke_structured;
use crate::scout::graph::node::Node;
use crate::scout::graph::state::{ResearchState, StatePatch};
use crate::scout::research::types::{keys, ClaimVerdict};
use crate::scout::research::Collaborators;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
struct ClaimSet {
    claims: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct VerdictSet {
    verdicts: Vec<ClaimVerdict>,
}

/// Splits the query into independently checkable claims. Runs once: on
/// loop-back iterations the existing claims are kept.
pub struct ClaimDecomposeNode {
    collab: Arc<Collaborators>,
}

impl ClaimDecomposeNode {
    pub const ID: &'static str = "decompose_claims";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }
}

#[async_trait]
impl Node for ClaimDecomposeNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        if state.len_of(keys::CLAIMS) > 0 {
            return Ok(StatePatch::new());
        }

        let prompt = format!(
            "Decompose this statement into independently verifiable factual \
             claims: {}",
            state.query()
        );

        let claims = match invoke_structured::<ClaimSet>(&self.collab.model, &prompt).await {
            Ok(set) if !set.claims.is_empty() => set.claims,
            Ok(_) | Err(_) => {
                // The whole query becomes the single claim.
                vec![state.query().to_string()]
            }
        };

        log::info!("Decomposed into {} claims", claims.len());
        Ok(StatePatch::new().set(keys::CLAIMS, json!(claims)))
    }
}

/// Judges each claim against the evidence gathered so far
pub struct VerifyClaimsNode {
    collab: Arc<Collaborators>,
}

impl VerifyClaimsNode {
    pub const ID: &'static str = "verify_claims";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }
}

#[async_trait]
impl Node for VerifyClaimsNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let claims: Vec<String> = state.get_as(keys::CLAIMS).unwrap_or_default();
        let prompt = format!(
            "Claims under verification:\n{claims}\n\n{evidence}\n\n\
             For each claim return a verdict of supported, refuted, or \
             unverified, with the evidence that decided it.",
            claims = claims
                .iter()
                .map(|c| format!("- {}", c))
                .collect::<Vec<_>>()
                .join("\n"),
            evidence = super::evidence_digest(state, 20),
        );

        let verdicts = match invoke_structured::<VerdictSet>(&self.collab.model, &prompt).await {
            Ok(set) => set.verdicts,
            Err(e) => {
                log::warn!("Verifier degraded to unverified verdicts: {}", e);
                claims
                    .iter()
                    .map(|c| ClaimVerdict {
                        claim: c.clone(),
                        verdict: "unverified".to_string(),
                        evidence: format!("verifier unavailable: {}", e),
                    })
                    .collect()
            }
        };

        Ok(StatePatch::new().set(keys::CLAIM_VERDICTS, json!(verdicts)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::research::workflows::fact_check_schema;
    use crate::scout::research::workflows::testing::{collaborators_with_model, StubModel};

    #[tokio::test]
    async fn test_decompose_runs_once() {
        let collab = collaborators_with_model(StubModel::always(
            r#"{"claims": ["claim one", "claim two"]}"#,
        ));
        let node = ClaimDecomposeNode::new(collab);

        let mut state = ResearchState::new(Arc::new(fact_check_schema()), "q");
        let patch = node.run(&state).await.unwrap();
        state.merge(ClaimDecomposeNode::ID, &patch).unwrap();
        assert_eq!(state.len_of(keys::CLAIMS), 2);

        // Second pass (loop-back) leaves claims untouched.
        let patch = node.run(&state).await.unwrap();
        assert!(patch.is_empty());
    }

    #[tokio::test]
    async fn test_verify_degrades_to_unverified() {
        let collab = collaborators_with_model(StubModel::always("no json"));
        let node = VerifyClaimsNode::new(collab);

        let mut state = ResearchState::new(Arc::new(fact_check_schema()), "q");
        state
            .merge(
                ClaimDecomposeNode::ID,
                &StatePatch::new().set(keys::CLAIMS, json!(["c1"])),
            )
            .unwrap();

        let patch = node.run(&state).await.unwrap();
        state.merge(VerifyClaimsNode::ID, &patch).unwrap();

        let verdicts: Vec<ClaimVerdict> = state.get_as(keys::CLAIM_VERDICTS).unwrap();
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].verdict, "unverified");
    }
}
