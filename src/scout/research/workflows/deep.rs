// SPDX-License-Identifier: MIT

//! Deep research: a master planner decides between the flat reflective
//! loop and hierarchical subtask execution with bounded mid-run plan
//! revision.

use crate::error::GraphError;
use crate::scout::graph::workflow::Workflow;
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::nodes::{
    AnalyzeNode, EvaluateNode, HierarchicalSynthesizeNode, KbRetrieveNode, MasterPlanNode,
    PlanReviseNode, PlannerNode, ReflectNode, RevisionCheckNode, SubtaskExecuteNode,
    SynthesizeNode, WebSearchNode,
};
use crate::scout::research::routers::{ModeRouter, PendingSubtasksRouter, ReflectionRouter};
use crate::scout::research::workflows::deep_schema;
use crate::scout::research::Collaborators;
use std::sync::Arc;

pub const NAME: &str = "deep_research";

pub fn build(collab: Arc<Collaborators>, depth: DepthConfig) -> Result<Workflow, GraphError> {
    Workflow::builder(NAME)
        .description("Iterative research with reflection and hierarchical decomposition")
        .schema(deep_schema())
        .node(Arc::new(MasterPlanNode::new(collab.clone(), depth)))
        // Flat pipeline, taken when decomposition is not worth it.
        .node(Arc::new(PlannerNode::new(collab.clone(), depth)))
        .node(Arc::new(WebSearchNode::new(collab.clone(), depth)))
        .node(Arc::new(KbRetrieveNode::new(collab.clone(), depth)))
        .node(Arc::new(AnalyzeNode::new(collab.clone())))
        .node(Arc::new(EvaluateNode::new(collab.clone())))
        .node(Arc::new(ReflectNode::new(collab.clone())))
        .node(Arc::new(SynthesizeNode::new(collab.clone())))
        // Hierarchical pipeline: one subtask per step with replanning.
        .node(Arc::new(SubtaskExecuteNode::new(collab.clone(), depth)))
        .node(Arc::new(RevisionCheckNode::new(collab.clone(), depth)))
        .node(Arc::new(PlanReviseNode::new(depth)))
        .node(Arc::new(HierarchicalSynthesizeNode::new(collab)))
        .entry(MasterPlanNode::ID)
        .route(
            MasterPlanNode::ID,
            Arc::new(ModeRouter::new(PlannerNode::ID, SubtaskExecuteNode::ID)),
        )
        .fan_out(
            PlannerNode::ID,
            &[WebSearchNode::ID, KbRetrieveNode::ID],
            AnalyzeNode::ID,
        )
        .edge(AnalyzeNode::ID, EvaluateNode::ID)
        .edge(EvaluateNode::ID, ReflectNode::ID)
        .route(
            ReflectNode::ID,
            Arc::new(ReflectionRouter::new(
                depth,
                PlannerNode::ID,
                SynthesizeNode::ID,
            )),
        )
        .end(SynthesizeNode::ID)
        .edge(SubtaskExecuteNode::ID, RevisionCheckNode::ID)
        .edge(RevisionCheckNode::ID, PlanReviseNode::ID)
        .route(
            PlanReviseNode::ID,
            Arc::new(PendingSubtasksRouter::new(
                SubtaskExecuteNode::ID,
                HierarchicalSynthesizeNode::ID,
            )),
        )
        .end(HierarchicalSynthesizeNode::ID)
        .build()
}
