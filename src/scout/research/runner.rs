// SPDX-License-Identifier: MIT

//! Runner - the surface the CLI and server drive
//!
//! Owns the workflow registry and the per-thread session table. A run that
//! hits the step ceiling is parked under its thread id; the caller can
//! resume it with an extended ceiling or accept the partial state.

use crate::error::{GraphError, ScoutError};
use crate::scout::graph::executor::{Executor, Frontier, NodeEvent, RunOutcome};
use crate::scout::graph::registry::{WorkflowInfo, WorkflowRegistry};
use crate::scout::graph::state::ResearchState;
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::selector;
use crate::scout::research::types::keys;
use crate::scout::research::workflows;
use crate::scout::research::Collaborators;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// A ceiling-interrupted run parked for resumption
struct Suspended {
    workflow: String,
    state: ResearchState,
    frontier: Frontier,
    steps_taken: u32,
}

/// The ceiling notice attached to an interrupted run
#[derive(Debug, Clone, Serialize)]
pub struct CeilingNotice {
    pub steps_taken: u32,
    pub current_ceiling: u32,
    pub suggested_extension: u32,
    /// Where execution would continue
    pub next_nodes: String,
}

/// What one invocation produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub workflow: String,
    pub selection_reason: String,
    /// The final report, or the partial state's report-so-far if any
    pub report: Option<String>,
    /// Full state snapshot, for callers that want more than the report
    pub state: Value,
    /// Present when the run was interrupted by the step ceiling
    pub ceiling: Option<CeilingNotice>,
}

impl RunSummary {
    pub fn completed(&self) -> bool {
        self.ceiling.is_none()
    }
}

/// Drives workflow invocations for the CLI and server
pub struct Runner {
    registry: WorkflowRegistry,
    depth: DepthConfig,
    sessions: Mutex<HashMap<String, Suspended>>,
}

impl Runner {
    pub fn new(
        collab: std::sync::Arc<Collaborators>,
        depth: DepthConfig,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            registry: workflows::bootstrap(collab)?,
            depth,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn list_workflows(&self) -> Vec<WorkflowInfo> {
        self.registry.list()
    }

    pub fn depth(&self) -> DepthConfig {
        self.depth
    }

    /// Resolve the workflow: an explicit name must exist, otherwise the
    /// selector picks one
    fn resolve(&self, query: &str, workflow: Option<&str>) -> Result<(String, String), GraphError> {
        match workflow {
            Some(name) => {
                if !self.registry.contains(name) {
                    return Err(GraphError::UnknownWorkflow {
                        name: name.to_string(),
                        known: self.registry.names(),
                    });
                }
                Ok((name.to_string(), "requested explicitly".to_string()))
            }
            None => {
                let decision = selector::select(query);
                Ok((decision.workflow, decision.reason))
            }
        }
    }

    /// Run a query to completion or to the step ceiling
    pub async fn run(
        &self,
        query: &str,
        workflow: Option<&str>,
        thread_id: &str,
    ) -> Result<RunSummary, ScoutError> {
        self.run_inner(query, workflow, thread_id, None).await
    }

    /// Run a query, streaming per-node events as they occur
    pub async fn run_streaming(
        &self,
        query: &str,
        workflow: Option<&str>,
        thread_id: &str,
        events: mpsc::Sender<NodeEvent>,
    ) -> Result<RunSummary, ScoutError> {
        self.run_inner(query, workflow, thread_id, Some(events))
            .await
    }

    async fn run_inner(
        &self,
        query: &str,
        workflow: Option<&str>,
        thread_id: &str,
        events: Option<mpsc::Sender<NodeEvent>>,
    ) -> Result<RunSummary, ScoutError> {
        let (name, reason) = self.resolve(query, workflow)?;
        let wf = self.registry.get(&name, self.depth)?;
        let state = ResearchState::new(wf.schema.clone(), query);
        let executor = Executor::new(self.depth.recursion_limit);

        log::info!("Running '{}' for thread '{}'", name, thread_id);
        let outcome = match events {
            Some(tx) => executor.run_streaming(&wf, state, tx).await?,
            None => executor.run(&wf, state).await?,
        };
        Ok(self.summarize(name, reason, thread_id, outcome))
    }

    /// Resume a parked run with an extended ceiling
    ///
    /// `ceiling` defaults to the suspension's suggested extension (double
    /// the ceiling that was hit).
    pub async fn resume(
        &self,
        thread_id: &str,
        ceiling: Option<u32>,
    ) -> Result<RunSummary, ScoutError> {
        let suspended = self
            .sessions
            .lock()
            .map_err(|_| ScoutError::other("session table poisoned"))?
            .remove(thread_id)
            .ok_or_else(|| {
                ScoutError::config(format!("no interrupted run for thread '{}'", thread_id))
            })?;

        let wf = self.registry.get(&suspended.workflow, self.depth)?;
        let ceiling = ceiling.unwrap_or(self.depth.recursion_limit * 2);
        log::info!(
            "Resuming '{}' for thread '{}' with ceiling {}",
            suspended.workflow,
            thread_id,
            ceiling
        );

        let outcome = Executor::new(ceiling)
            .resume(&wf, suspended.state, suspended.frontier, suspended.steps_taken)
            .await?;
        Ok(self.summarize(
            suspended.workflow,
            "resumed".to_string(),
            thread_id,
            outcome,
        ))
    }

    /// Whether a thread has a parked run awaiting resumption
    pub fn has_suspended(&self, thread_id: &str) -> bool {
        self.sessions
            .lock()
            .map(|s| s.contains_key(thread_id))
            .unwrap_or(false)
    }

    fn summarize(
        &self,
        workflow: String,
        reason: String,
        thread_id: &str,
        outcome: RunOutcome,
    ) -> RunSummary {
        match outcome {
            RunOutcome::Complete(state) => RunSummary {
                workflow,
                selection_reason: reason,
                report: state.get_str(keys::REPORT).map(str::to_string),
                state: state.to_json(),
                ceiling: None,
            },
            RunOutcome::CeilingReached {
                state,
                resume_from,
                steps_taken,
                current_ceiling,
                suggested_extension,
            } => {
                let notice = CeilingNotice {
                    steps_taken,
                    current_ceiling,
                    suggested_extension,
                    next_nodes: resume_from.describe(),
                };
                let summary = RunSummary {
                    workflow: workflow.clone(),
                    selection_reason: reason,
                    report: state.get_str(keys::REPORT).map(str::to_string),
                    state: state.to_json(),
                    ceiling: Some(notice),
                };
                if let Ok(mut sessions) = self.sessions.lock() {
                    sessions.insert(
                        thread_id.to_string(),
                        Suspended {
                            workflow,
                            state,
                            frontier: resume_from,
                            steps_taken,
                        },
                    );
                }
                summary
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::research::workflows::testing::{collaborators_with_model, StubModel};

    fn runner(reply: &str, depth: DepthConfig) -> Runner {
        Runner::new(collaborators_with_model(StubModel::always(reply)), depth).unwrap()
    }

    #[tokio::test]
    async fn test_explicit_unknown_workflow_rejected() {
        let r = runner("", DepthConfig::quick());
        let err = r.run("q", Some("ghost"), "t1").await.unwrap_err();
        assert!(matches!(
            err,
            ScoutError::Graph(GraphError::UnknownWorkflow { .. })
        ));
    }

    #[tokio::test]
    async fn test_quick_run_completes_with_report() {
        let r = runner("findings", DepthConfig::quick());
        let summary = r
            .run("what is rust?", Some("quick_research"), "t1")
            .await
            .unwrap();
        assert!(summary.completed());
        assert!(summary.report.is_some());
        assert!(!r.has_suspended("t1"));
    }

    #[tokio::test]
    async fn test_resume_without_suspension_is_config_error() {
        let r = runner("", DepthConfig::quick());
        let err = r.resume("nobody", None).await.unwrap_err();
        assert!(matches!(err, ScoutError::Config(_)));
    }

    #[test]
    fn test_list_workflows_is_nonempty() {
        let r = runner("", DepthConfig::quick());
        assert_eq!(r.list_workflows().len(), 6);
    }
}
