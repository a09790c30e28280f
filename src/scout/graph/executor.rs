// SPDX-License-Identifier: MIT

//! Workflow executor
//!
//! Executes a workflow node-by-node against a single state, with:
//! - parallel fan-out groups run concurrently and merged commutatively
//!   (branches write disjoint accumulator fields)
//! - per-node `(node_id, patch)` events over an mpsc channel, in execution
//!   order, for streaming callers
//! - a hard step ceiling: exceeding the maximum total node executions
//!   returns [`RunOutcome::CeilingReached`] - a typed control signal, not
//!   an error - with the fully-merged state and a resume point, so the
//!   caller decides between extending and accepting a partial result.

use crate::error::{GraphError, ScoutError};
use crate::scout::graph::state::ResearchState;
use crate::scout::graph::workflow::{Edge, Workflow};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// The next execution position - serializable so a ceiling-interrupted run
/// can be resumed from persisted state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frontier {
    /// About to execute one node
    Single(String),
    /// About to execute a fan-out group
    Parallel { branches: Vec<String>, join: String },
}

impl Frontier {
    fn cost(&self) -> u32 {
        match self {
            Frontier::Single(_) => 1,
            Frontier::Parallel { branches, .. } => branches.len() as u32,
        }
    }

    /// Human-readable position, for logs and prompts
    pub fn describe(&self) -> String {
        match self {
            Frontier::Single(id) => id.clone(),
            Frontier::Parallel { branches, .. } => branches.join("+"),
        }
    }
}

/// One node execution, streamed to progressive-rendering callers
#[derive(Debug, Clone, Serialize)]
pub struct NodeEvent {
    pub node_id: String,
    pub patch: Value,
}

/// How a workflow invocation ended
pub enum RunOutcome {
    /// Terminal node reached; `report` is populated
    Complete(ResearchState),
    /// The step ceiling was hit first. State is fully merged and
    /// resumable; the caller chooses between `Executor::resume` with an
    /// extended ceiling and accepting a partial result from the state.
    CeilingReached {
        state: ResearchState,
        resume_from: Frontier,
        steps_taken: u32,
        current_ceiling: u32,
        suggested_extension: u32,
    },
}

impl RunOutcome {
    /// The state, however the run ended
    pub fn state(&self) -> &ResearchState {
        match self {
            RunOutcome::Complete(state) => state,
            RunOutcome::CeilingReached { state, .. } => state,
        }
    }
}

/// Executes workflows under a step ceiling
pub struct Executor {
    ceiling: u32,
}

impl Executor {
    /// `ceiling` is the maximum total node executions per invocation
    pub fn new(ceiling: u32) -> Self {
        Self { ceiling }
    }

    /// Run from the workflow entry point
    pub async fn run(
        &self,
        workflow: &Workflow,
        state: ResearchState,
    ) -> Result<RunOutcome, ScoutError> {
        let entry = Frontier::Single(workflow.entry().to_string());
        self.drive(workflow, state, entry, 0, None).await
    }

    /// Run from the entry point, streaming node events as they occur
    pub async fn run_streaming(
        &self,
        workflow: &Workflow,
        state: ResearchState,
        events: mpsc::Sender<NodeEvent>,
    ) -> Result<RunOutcome, ScoutError> {
        let entry = Frontier::Single(workflow.entry().to_string());
        self.drive(workflow, state, entry, 0, Some(&events)).await
    }

    /// Continue a ceiling-interrupted run
    ///
    /// Replay-safe: state is the single source of truth and nodes are pure
    /// functions of it. `steps_taken` carries over so the new ceiling
    /// bounds the whole invocation, not just the continuation.
    pub async fn resume(
        &self,
        workflow: &Workflow,
        state: ResearchState,
        from: Frontier,
        steps_taken: u32,
    ) -> Result<RunOutcome, ScoutError> {
        self.drive(workflow, state, from, steps_taken, None).await
    }

    async fn drive(
        &self,
        workflow: &Workflow,
        mut state: ResearchState,
        mut frontier: Frontier,
        mut steps: u32,
        events: Option<&mpsc::Sender<NodeEvent>>,
    ) -> Result<RunOutcome, ScoutError> {
        loop {
            if steps + frontier.cost() > self.ceiling {
                log::warn!(
                    "Workflow '{}' hit step ceiling {} before node(s) '{}'",
                    workflow.name,
                    self.ceiling,
                    frontier.describe()
                );
                return Ok(RunOutcome::CeilingReached {
                    state,
                    resume_from: frontier,
                    steps_taken: steps,
                    current_ceiling: self.ceiling,
                    suggested_extension: self.ceiling * 2,
                });
            }

            let after = match &frontier {
                Frontier::Single(id) => {
                    self.execute_one(workflow, id, &mut state, events).await?;
                    steps += 1;
                    id.clone()
                }
                Frontier::Parallel { branches, join } => {
                    self.execute_group(workflow, branches, &mut state, events)
                        .await?;
                    steps += branches.len() as u32;
                    frontier = Frontier::Single(join.clone());
                    continue;
                }
            };

            let edge = workflow
                .edges
                .get(&after)
                .ok_or_else(|| GraphError::InvalidGraph {
                    workflow: workflow.name.clone(),
                    reason: format!("node '{}' has no outgoing edge", after),
                })?;

            frontier = match edge {
                Edge::To(next) => Frontier::Single(next.clone()),
                Edge::FanOut { branches, join } => Frontier::Parallel {
                    branches: branches.clone(),
                    join: join.clone(),
                },
                Edge::Route(router) => {
                    match router.decide(&state) {
                        crate::scout::graph::router::RouteTarget::Next(next) => {
                            log::info!("Router '{}' routed to '{}'", router.id(), next);
                            Frontier::Single(next)
                        }
                        crate::scout::graph::router::RouteTarget::End => {
                            log::info!("Router '{}' ended workflow", router.id());
                            return Ok(RunOutcome::Complete(state));
                        }
                    }
                }
                Edge::End => return Ok(RunOutcome::Complete(state)),
            };
        }
    }

    async fn execute_one(
        &self,
        workflow: &Workflow,
        id: &str,
        state: &mut ResearchState,
        events: Option<&mpsc::Sender<NodeEvent>>,
    ) -> Result<(), ScoutError> {
        let node = workflow.node(id).ok_or_else(|| GraphError::InvalidGraph {
            workflow: workflow.name.clone(),
            reason: format!("unknown node '{}'", id),
        })?;

        log::info!("Executing node: {}", id);
        let patch = node.run(state).await?;
        state.merge(id, &patch)?;

        if let Some(tx) = events {
            let _ = tx
                .send(NodeEvent {
                    node_id: id.to_string(),
                    patch: patch.to_json(),
                })
                .await;
        }
        Ok(())
    }

    /// Run fan-out branches concurrently. Patches are merged in declared
    /// branch order; branches contribute disjoint accumulator fields, so
    /// the order is not observable in the merged state.
    async fn execute_group(
        &self,
        workflow: &Workflow,
        branches: &[String],
        state: &mut ResearchState,
        events: Option<&mpsc::Sender<NodeEvent>>,
    ) -> Result<(), ScoutError> {
        log::info!("Executing fan-out group: {:?}", branches);

        let mut futures = Vec::with_capacity(branches.len());
        for id in branches {
            let node = workflow.node(id).ok_or_else(|| GraphError::InvalidGraph {
                workflow: workflow.name.clone(),
                reason: format!("unknown node '{}'", id),
            })?;
            let snapshot: &ResearchState = state;
            futures.push(async move { (id.clone(), node.run(snapshot).await) });
        }

        let results = join_all(futures).await;
        for (id, result) in results {
            let patch = result?;
            state.merge(&id, &patch)?;
            if let Some(tx) = events {
                let _ = tx
                    .send(NodeEvent {
                        node_id: id,
                        patch: patch.to_json(),
                    })
                    .await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::graph::node::testing::FixedNode;
    use crate::scout::graph::node::Node;
    use crate::scout::graph::router::{RouteTarget, Router};
    use crate::scout::graph::state::{StatePatch, StateSchema};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    /// Appends one marker per execution and bumps loop_count
    struct CountingNode {
        id: String,
    }

    #[async_trait]
    impl Node for CountingNode {
        fn id(&self) -> &str {
            &self.id
        }

        async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
            Ok(StatePatch::new()
                .set("trace", json!([self.id.clone()]))
                .set("loop_count", json!(state.get_u64("loop_count") + 1)))
        }
    }

    struct LoopUntil {
        limit: u64,
    }

    impl Router for LoopUntil {
        fn id(&self) -> &str {
            "loop_until"
        }
        fn decide(&self, state: &ResearchState) -> RouteTarget {
            if state.get_u64("loop_count") >= self.limit {
                RouteTarget::next("finish")
            } else {
                RouteTarget::next("work")
            }
        }
        fn targets(&self) -> Vec<String> {
            vec!["work".to_string(), "finish".to_string()]
        }
    }

    fn schema() -> StateSchema {
        StateSchema::new()
            .accumulate("trace")
            .accumulate("search_results")
            .accumulate("rag_results")
            .replace_with_default("loop_count", json!(0))
            .replace("report")
    }

    fn looped_workflow() -> Workflow {
        Workflow::builder("looped")
            .schema(schema())
            .node(Arc::new(CountingNode {
                id: "work".to_string(),
            }))
            .node(Arc::new(FixedNode::new(
                "finish",
                vec![("report", json!("done"))],
            )))
            .entry("work")
            .route("work", Arc::new(LoopUntil { limit: 3 }))
            .end("finish")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_loop_runs_until_router_exits() {
        let wf = looped_workflow();
        let state = ResearchState::new(wf.schema.clone(), "q");
        let outcome = Executor::new(50).run(&wf, state).await.unwrap();

        match outcome {
            RunOutcome::Complete(state) => {
                assert_eq!(state.get_u64("loop_count"), 3);
                assert_eq!(state.len_of("trace"), 3);
                assert_eq!(state.get_str("report"), Some("done"));
            }
            _ => panic!("expected completion"),
        }
    }

    #[tokio::test]
    async fn test_ceiling_reached_preserves_state_and_resumes() {
        let wf = looped_workflow();
        let state = ResearchState::new(wf.schema.clone(), "q");
        let outcome = Executor::new(2).run(&wf, state).await.unwrap();

        let (state, resume_from, steps) = match outcome {
            RunOutcome::CeilingReached {
                state,
                resume_from,
                steps_taken,
                current_ceiling,
                suggested_extension,
            } => {
                assert_eq!(steps_taken, 2);
                assert_eq!(current_ceiling, 2);
                assert_eq!(suggested_extension, 4);
                // Evidence accumulated before the ceiling is intact.
                assert_eq!(state.len_of("trace"), 2);
                (state, resume_from, steps_taken)
            }
            _ => panic!("expected ceiling"),
        };

        // Extending the ceiling and resuming finishes the run.
        let outcome = Executor::new(8)
            .resume(&wf, state, resume_from, steps)
            .await
            .unwrap();
        match outcome {
            RunOutcome::Complete(state) => {
                assert_eq!(state.get_u64("loop_count"), 3);
                assert_eq!(state.get_str("report"), Some("done"));
            }
            _ => panic!("expected completion after resume"),
        }
    }

    #[tokio::test]
    async fn test_fan_out_merges_both_branches() {
        let wf = Workflow::builder("fan")
            .schema(schema())
            .node(Arc::new(FixedNode::new("plan", vec![])))
            .node(Arc::new(FixedNode::new(
                "web",
                vec![("search_results", json!(["w"]))],
            )))
            .node(Arc::new(FixedNode::new(
                "kb",
                vec![("rag_results", json!(["k"]))],
            )))
            .node(Arc::new(FixedNode::new(
                "analyze",
                vec![("report", json!("r"))],
            )))
            .entry("plan")
            .fan_out("plan", &["web", "kb"], "analyze")
            .end("analyze")
            .build()
            .unwrap();

        let state = ResearchState::new(wf.schema.clone(), "q");
        let outcome = Executor::new(10).run(&wf, state).await.unwrap();
        let state = outcome.state();
        assert_eq!(state.len_of("search_results"), 1);
        assert_eq!(state.len_of("rag_results"), 1);
        assert_eq!(state.get_str("report"), Some("r"));
    }

    #[tokio::test]
    async fn test_events_stream_in_execution_order() {
        let wf = Workflow::builder("seq")
            .schema(schema())
            .node(Arc::new(FixedNode::new("a", vec![("trace", json!(["a"]))])))
            .node(Arc::new(FixedNode::new("b", vec![("trace", json!(["b"]))])))
            .entry("a")
            .edge("a", "b")
            .end("b")
            .build()
            .unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let state = ResearchState::new(wf.schema.clone(), "q");
        Executor::new(10)
            .run_streaming(&wf, state, tx)
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.node_id, "a");
        assert_eq!(second.node_id, "b");
        assert_eq!(first.patch["trace"], json!(["a"]));
    }
}
