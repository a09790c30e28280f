// SPDX-License-Identifier: MIT

//! Domain records shared by the research nodes
//!
//! Everything here is plain serde data that lives inside workflow state,
//! plus the `keys` module naming the state fields the node pool reads and
//! writes. Types the model fills in via structured output also derive
//! `JsonSchema` so the schema can be embedded in the prompt.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State field names used across the workflow variants
pub mod keys {
    /// Current iteration's planned search queries (replace)
    pub const PLANNED_QUERIES: &str = "planned_queries";
    /// Every query ever planned (accumulate)
    pub const QUERY_HISTORY: &str = "query_history";
    /// Iteration counter, bumped by the planner (replace)
    pub const LOOP_COUNT: &str = "loop_count";
    /// Web evidence (accumulate)
    pub const SEARCH_RESULTS: &str = "search_results";
    /// Knowledge-base evidence (accumulate)
    pub const RAG_RESULTS: &str = "rag_results";
    /// Per-iteration analysis summaries (accumulate)
    pub const ANALYZED_DATA: &str = "analyzed_data";
    /// Latest evaluator verdict (replace)
    pub const EVALUATION: &str = "evaluation";
    /// Latest reflection (replace)
    pub const REFLECTION: &str = "reflection";
    /// Final output, write-once at the terminal node (replace)
    pub const REPORT: &str = "report";

    /// Fact-check: decomposed claims (accumulate)
    pub const CLAIMS: &str = "claims";
    /// Fact-check: per-claim verdicts (accumulate)
    pub const CLAIM_VERDICTS: &str = "claim_verdicts";

    /// Comparative: entities and dimensions under comparison (replace)
    pub const COMPARISON_PLAN: &str = "comparison_plan";
    /// Comparative: filled-in comparison entries (accumulate)
    pub const COMPARISON_ROWS: &str = "comparison_rows";

    /// Causal: current hypothesis set with evidence strengths (replace)
    pub const HYPOTHESES: &str = "hypotheses";
    /// Causal: supporting evidence items (accumulate)
    pub const EVIDENCE_FOR: &str = "evidence_for";
    /// Causal: synthesized cause-effect chain (replace)
    pub const CAUSAL_GRAPH: &str = "causal_graph";

    /// Computational: planned code experiment (replace)
    pub const CODE_PLAN: &str = "code_plan";
    /// Computational: sandbox outputs (accumulate)
    pub const CODE_OUTPUTS: &str = "code_outputs";

    /// Deep: simple vs hierarchical (replace)
    pub const EXECUTION_MODE: &str = "execution_mode";
    /// Deep: the decomposed plan (replace)
    pub const MASTER_PLAN: &str = "master_plan";
    /// Deep: subtask ids still to execute (replace)
    pub const PENDING_SUBTASKS: &str = "pending_subtasks";
    /// Deep: completed subtask findings (accumulate)
    pub const SUBTASK_RESULTS: &str = "subtask_results";
    /// Deep: mid-execution plan revisions (accumulate)
    pub const PLAN_REVISIONS: &str = "plan_revisions";
    /// Deep: revisions applied so far (replace)
    pub const REVISION_COUNT: &str = "revision_count";
    /// Deep: latest revision-trigger check (replace)
    pub const REVISION_CHECK: &str = "revision_check";
}

/// One web search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Provider that produced the hit, or "error" for in-band failures
    pub source: String,
}

impl SearchHit {
    /// In-band failure record: kept in the accumulator so downstream
    /// synthesis sees that (and why) a search came up empty
    pub fn error(query: &str, message: &str) -> Self {
        Self {
            title: format!("search failed: {}", query),
            url: String::new(),
            content: message.to_string(),
            score: None,
            source: "error".to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.source == "error"
    }
}

/// One knowledge-base hit with distance converted to 0-1 relevance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagHit {
    pub content: String,
    pub source: String,
    pub relevance: f32,
}

/// Search queries planned for one iteration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryPlan {
    pub queries: Vec<String>,
    #[serde(default)]
    pub rationale: String,
}

/// One iteration's analysis of the gathered evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub iteration: u64,
    pub summary: String,
}

/// Evaluator verdict on evidence sufficiency
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Evaluation {
    pub sufficient: bool,
    #[serde(default)]
    pub missing: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

impl Evaluation {
    /// Degraded verdict recovered from free text when structured output
    /// fails to parse
    pub fn from_free_text(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let sufficient =
            lowered.contains("sufficient") && !lowered.contains("insufficient");
        Self {
            sufficient,
            missing: vec![],
            reasoning: text.to_string(),
        }
    }
}

/// Reflection step output; can force continued research even when the
/// evaluator says sufficient
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Reflection {
    pub should_continue_research: bool,
    #[serde(default)]
    pub gaps: Vec<String>,
}

/// Fact-check verdict for a single claim
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClaimVerdict {
    pub claim: String,
    /// supported | refuted | unverified
    pub verdict: String,
    #[serde(default)]
    pub evidence: String,
}

/// Comparative: what is being compared along which dimensions
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonPlan {
    pub entities: Vec<String>,
    pub dimensions: Vec<String>,
}

/// Comparative: one entity/dimension finding
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonRow {
    pub entity: String,
    pub dimension: String,
    pub finding: String,
}

/// Causal evidence strength for a hypothesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceStrength {
    None,
    Weak,
    Contributing,
    Strong,
}

impl EvidenceStrength {
    /// Strong or contributing evidence counts toward the quorum
    pub fn counts_toward_quorum(self) -> bool {
        matches!(self, Self::Strong | Self::Contributing)
    }
}

/// One causal hypothesis under investigation
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Hypothesis {
    pub id: String,
    pub statement: String,
    pub strength: EvidenceStrength,
}

/// Computational: a planned code experiment
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CodeExperiment {
    pub description: String,
    pub language: String,
    pub code: String,
}

/// Computational: what running (or estimating) an experiment produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeOutput {
    pub description: String,
    pub output: String,
    /// False when no sandbox was available and the output is a model
    /// estimate
    pub executed: bool,
}

/// One decomposed unit of hierarchical research
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Subtask {
    pub subtask_id: String,
    pub description: String,
    pub focus_area: String,
    pub priority: u32,
    pub estimated_importance: f32,
}

/// Subtask fields the model proposes; ids are assigned by the planner so
/// they can never collide
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubtaskDraft {
    pub description: String,
    pub focus_area: String,
    pub priority: u32,
    pub estimated_importance: f32,
}

impl SubtaskDraft {
    /// Promote to a [`Subtask`] with a freshly generated unique id
    pub fn assign_id(self, seq: usize) -> Subtask {
        Subtask {
            subtask_id: fresh_subtask_id(seq),
            description: self.description,
            focus_area: self.focus_area,
            priority: self.priority,
            estimated_importance: self.estimated_importance,
        }
    }
}

/// `st-<seq>-<uuid8>`: unique even across revisions and resumed runs
pub fn fresh_subtask_id(seq: usize) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("st-{}-{}", seq, &uuid[..8])
}

/// The hierarchical decomposition of a complex query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterPlan {
    pub subtasks: Vec<Subtask>,
    pub complexity_reasoning: String,
}

/// The result text of one executed subtask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskResult {
    pub subtask_id: String,
    pub findings: String,
}

/// Revision-trigger check over the latest subtask findings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RevisionCheck {
    pub trigger: bool,
    #[serde(default)]
    pub trigger_type: String,
    #[serde(default)]
    pub reasoning: String,
    /// Model's 0-1 estimate of how much the revision changes the outcome;
    /// falls back to 0.5 when the model omits it
    #[serde(default = "default_estimated_impact")]
    pub estimated_impact: f32,
    #[serde(default)]
    pub proposed: Vec<SubtaskDraft>,
}

fn default_estimated_impact() -> f32 {
    0.5
}

impl RevisionCheck {
    pub fn none() -> Self {
        Self {
            trigger: false,
            trigger_type: String::new(),
            reasoning: String::new(),
            estimated_impact: 0.0,
            proposed: vec![],
        }
    }
}

/// A bounded mid-execution injection of new subtasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRevision {
    pub trigger_type: String,
    pub revision_reasoning: String,
    pub new_subtasks: Vec<Subtask>,
    pub estimated_impact: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fresh_subtask_ids_are_unique() {
        let ids: HashSet<String> = (0..100).map(fresh_subtask_id).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_evaluation_from_free_text() {
        assert!(Evaluation::from_free_text("The evidence is sufficient.").sufficient);
        assert!(!Evaluation::from_free_text("Insufficient coverage so far").sufficient);
        assert!(!Evaluation::from_free_text("needs more work").sufficient);
    }

    #[test]
    fn test_evidence_strength_quorum() {
        assert!(EvidenceStrength::Strong.counts_toward_quorum());
        assert!(EvidenceStrength::Contributing.counts_toward_quorum());
        assert!(!EvidenceStrength::Weak.counts_toward_quorum());
        assert!(!EvidenceStrength::None.counts_toward_quorum());
    }
}
