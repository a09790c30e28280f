// SPDX-License-Identifier: MIT

//! Hierarchical planning nodes for deep research
//!
//! A master planner decomposes the query into subtasks, an executor works
//! through them one per graph step, a revision checker watches the latest
//! findings for surprises, and a reviser injects bounded mid-run plan
//! changes. The final synthesizer consolidates per-subtask findings into
//! the report.

use crate::error::ScoutError;
use crate::llm::invoke_structured;
use crate::scout::graph::node::Node;
use crate::scout::graph::state::{ResearchState, StatePatch};
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::types::{
    keys, MasterPlan, PlanRevision, RevisionCheck, SearchHit, Subtask, SubtaskDraft,
    SubtaskResult,
};
use crate::scout::research::Collaborators;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub const MODE_SIMPLE: &str = "simple";
pub const MODE_HIERARCHICAL: &str = "hierarchical";

#[derive(Debug, Deserialize, JsonSchema)]
struct PlanDraft {
    /// Empty means the query is simple enough for the flat pipeline
    subtasks: Vec<SubtaskDraft>,
    #[serde(default)]
    complexity_reasoning: String,
}

/// Decomposes the query into prioritized subtasks, or declares it simple
pub struct MasterPlanNode {
    collab: Arc<Collaborators>,
    depth: DepthConfig,
}

impl MasterPlanNode {
    pub const ID: &'static str = "master_plan";

    pub fn new(collab: Arc<Collaborators>, depth: DepthConfig) -> Self {
        Self { collab, depth }
    }
}

#[async_trait]
impl Node for MasterPlanNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let prompt = format!(
            "Research question: {query}\n\
             If the question is complex enough to warrant decomposition, \
             break it into at most {max} prioritized subtasks, each with a \
             description, focus_area, priority (1 = highest), and \
             estimated_importance in [0, 1]. If the question is simple, \
             return an empty subtask list and explain why.",
            query = state.query(),
            max = self.depth.max_subtasks,
        );

        let draft = match invoke_structured::<PlanDraft>(&self.collab.model, &prompt).await {
            Ok(draft) => draft,
            Err(e) => {
                // Planning failure falls back to the flat pipeline rather
                // than aborting the run.
                log::warn!("Master planning degraded to simple mode: {}", e);
                PlanDraft {
                    subtasks: vec![],
                    complexity_reasoning: format!("planner unavailable: {}", e),
                }
            }
        };

        if draft.subtasks.is_empty() {
            log::info!("Query judged simple, skipping decomposition");
            return Ok(StatePatch::new().set(keys::EXECUTION_MODE, json!(MODE_SIMPLE)));
        }

        let mut subtasks: Vec<Subtask> = draft
            .subtasks
            .into_iter()
            .take(self.depth.max_subtasks)
            .enumerate()
            .map(|(i, d)| d.assign_id(i))
            .collect();
        subtasks.sort_by_key(|s| s.priority);

        let pending: Vec<String> = subtasks.iter().map(|s| s.subtask_id.clone()).collect();
        let plan = MasterPlan {
            subtasks,
            complexity_reasoning: draft.complexity_reasoning,
        };
        log::info!("Decomposed into {} subtasks", pending.len());

        Ok(StatePatch::new()
            .set(keys::EXECUTION_MODE, json!(MODE_HIERARCHICAL))
            .set(keys::MASTER_PLAN, json!(plan))
            .set(keys::PENDING_SUBTASKS, json!(pending))
            .set(keys::REVISION_COUNT, json!(0)))
    }
}

/// Executes exactly one pending subtask per graph step: search, then
/// summarize the findings. One step per subtask keeps the step ceiling an
/// honest bound on work done.
pub struct SubtaskExecuteNode {
    collab: Arc<Collaborators>,
    depth: DepthConfig,
}

impl SubtaskExecuteNode {
    pub const ID: &'static str = "subtask_execute";

    pub fn new(collab: Arc<Collaborators>, depth: DepthConfig) -> Self {
        Self { collab, depth }
    }

    async fn research(&self, subtask: &Subtask) -> String {
        let query = format!("{} {}", subtask.focus_area, subtask.description);
        let evidence = match self
            .collab
            .web
            .search(&query, self.depth.results_per_query)
            .await
        {
            Ok(hits) => hits
                .iter()
                .map(|h| format!("- [{}]({}): {}", h.title, h.url, h.content))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                log::warn!("Subtask search failed for '{}': {}", query, e);
                SearchHit::error(&query, &e.to_string()).content
            }
        };

        let prompt = format!(
            "Subtask: {}\nFocus area: {}\n\nEvidence:\n{}\n\n\
             Summarize the findings for this subtask, noting anything \
             surprising or contradictory.",
            subtask.description, subtask.focus_area, evidence
        );
        match self.collab.model.invoke(&prompt).await {
            Ok(text) => text,
            Err(e) => format!("findings unavailable: {}\nraw evidence:\n{}", e, evidence),
        }
    }
}

#[async_trait]
impl Node for SubtaskExecuteNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let pending: Vec<String> = state.get_as(keys::PENDING_SUBTASKS).unwrap_or_default();
        let Some(next_id) = pending.first().cloned() else {
            return Ok(StatePatch::new());
        };

        let plan: MasterPlan = state
            .get_as(keys::MASTER_PLAN)
            .ok_or_else(|| ScoutError::config("hierarchical execution without a master plan"))?;
        let subtask = plan
            .subtasks
            .iter()
            .find(|s| s.subtask_id == next_id)
            .ok_or_else(|| {
                ScoutError::config(format!("pending subtask '{}' not in plan", next_id))
            })?;

        log::info!("Executing subtask {} ({})", subtask.subtask_id, subtask.focus_area);
        let findings = self.research(subtask).await;

        let remaining: Vec<String> = pending.into_iter().skip(1).collect();
        Ok(StatePatch::new()
            .set(keys::PENDING_SUBTASKS, json!(remaining))
            .set(
                keys::SUBTASK_RESULTS,
                json!([SubtaskResult {
                    subtask_id: next_id,
                    findings,
                }]),
            ))
    }
}

/// Checks the latest subtask findings for a revision trigger: a discovery
/// worth chasing, a contradiction, or a dead end
pub struct RevisionCheckNode {
    collab: Arc<Collaborators>,
    depth: DepthConfig,
}

impl RevisionCheckNode {
    pub const ID: &'static str = "revision_check";

    pub fn new(collab: Arc<Collaborators>, depth: DepthConfig) -> Self {
        Self { collab, depth }
    }
}

#[async_trait]
impl Node for RevisionCheckNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let revision_count = state.get_u64(keys::REVISION_COUNT);
        if revision_count >= self.depth.max_plan_revisions {
            // Budget spent; no point asking.
            return Ok(StatePatch::new().set(keys::REVISION_CHECK, json!(RevisionCheck::none())));
        }

        let results: Vec<SubtaskResult> = state.get_as(keys::SUBTASK_RESULTS).unwrap_or_default();
        let Some(latest) = results.last() else {
            return Ok(StatePatch::new().set(keys::REVISION_CHECK, json!(RevisionCheck::none())));
        };

        let prompt = format!(
            "Overall research question: {query}\n\
             Latest subtask findings:\n{findings}\n\n\
             Should the research plan be revised? Set trigger true only for \
             a significant discovery, a contradiction with earlier findings, \
             or a dead end. When triggering, set trigger_type to one of \
             discovery, contradiction, dead_end, estimate the revision's \
             impact on the final answer as estimated_impact in [0, 1], and \
             propose replacement subtasks.",
            query = state.query(),
            findings = latest.findings,
        );

        let check = match invoke_structured::<RevisionCheck>(&self.collab.model, &prompt).await {
            Ok(check) => check,
            Err(e) => {
                // An unparseable check never triggers a revision.
                log::warn!("Revision check degraded to no-revision: {}", e);
                RevisionCheck::none()
            }
        };

        Ok(StatePatch::new().set(keys::REVISION_CHECK, json!(check)))
    }
}

/// Applies a triggered revision: appends the proposed subtasks (fresh ids)
/// to the plan and the pending queue, bounded by the revision budget
pub struct PlanReviseNode {
    depth: DepthConfig,
}

impl PlanReviseNode {
    pub const ID: &'static str = "plan_revise";

    pub fn new(depth: DepthConfig) -> Self {
        Self { depth }
    }
}

#[async_trait]
impl Node for PlanReviseNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let check: RevisionCheck = state
            .get_as(keys::REVISION_CHECK)
            .unwrap_or_else(RevisionCheck::none);
        let revision_count = state.get_u64(keys::REVISION_COUNT);

        if !check.trigger
            || check.proposed.is_empty()
            || revision_count >= self.depth.max_plan_revisions
        {
            return Ok(StatePatch::new());
        }

        let mut plan: MasterPlan = state
            .get_as(keys::MASTER_PLAN)
            .ok_or_else(|| ScoutError::config("plan revision without a master plan"))?;
        let mut pending: Vec<String> = state.get_as(keys::PENDING_SUBTASKS).unwrap_or_default();

        let headroom = self.depth.max_subtasks.saturating_sub(plan.subtasks.len());
        let seq_base = plan.subtasks.len();
        let new_subtasks: Vec<Subtask> = check
            .proposed
            .into_iter()
            .take(headroom)
            .enumerate()
            .map(|(i, d)| d.assign_id(seq_base + i))
            .collect();
        if new_subtasks.is_empty() {
            log::info!("Revision triggered but subtask budget exhausted");
            return Ok(StatePatch::new());
        }

        for subtask in &new_subtasks {
            pending.push(subtask.subtask_id.clone());
        }
        plan.subtasks.extend(new_subtasks.iter().cloned());

        let revision = PlanRevision {
            trigger_type: check.trigger_type,
            revision_reasoning: check.reasoning,
            new_subtasks,
            estimated_impact: check.estimated_impact,
        };
        log::info!(
            "Plan revision {} applied ({} new subtasks)",
            revision_count + 1,
            revision.new_subtasks.len()
        );

        Ok(StatePatch::new()
            .set(keys::MASTER_PLAN, json!(plan))
            .set(keys::PENDING_SUBTASKS, json!(pending))
            .set(keys::PLAN_REVISIONS, json!([revision]))
            .set(keys::REVISION_COUNT, json!(revision_count + 1)))
    }
}

/// Consolidates per-subtask findings into the final report
pub struct HierarchicalSynthesizeNode {
    collab: Arc<Collaborators>,
}

impl HierarchicalSynthesizeNode {
    pub const ID: &'static str = "synthesize_hierarchical";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }
}

#[async_trait]
impl Node for HierarchicalSynthesizeNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let results: Vec<SubtaskResult> = state.get_as(keys::SUBTASK_RESULTS).unwrap_or_default();
        let plan: Option<MasterPlan> = state.get_as(keys::MASTER_PLAN);

        let sections = results
            .iter()
            .map(|r| {
                let focus = plan
                    .as_ref()
                    .and_then(|p| p.subtasks.iter().find(|s| s.subtask_id == r.subtask_id))
                    .map(|s| s.focus_area.clone())
                    .unwrap_or_else(|| r.subtask_id.clone());
                format!("## {}\n{}", focus, r.findings)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Research question: {query}\n\nSubtask findings:\n{sections}\n\n\
             Write a consolidated research report answering the question, \
             weaving the subtask findings together and flagging anything \
             unresolved.",
            query = state.query(),
            sections = sections,
        );

        let report = match self.collab.model.invoke(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Hierarchical synthesis degraded to raw sections: {}", e);
                format!(
                    "# Research findings (consolidation unavailable: {})\n\n{}",
                    e, sections
                )
            }
        };

        Ok(StatePatch::new().set(keys::REPORT, json!(report)))
    }
}
