// SPDX-License-Identifier: MIT

//! Comparative research: fix the entities and dimensions up front, gather
//! evidence in a bounded loop, then fill in the comparison matrix.

use crate::error::GraphError;
use crate::scout::graph::workflow::Workflow;
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::nodes::{
    AnalyzeNode, CompareNode, ComparisonPlanNode, EvaluateNode, PlannerNode, SynthesizeNode,
    WebSearchNode,
};
use crate::scout::research::routers::StandardLoopRouter;
use crate::scout::research::workflows::comparative_schema;
use crate::scout::research::Collaborators;
use std::sync::Arc;

pub const NAME: &str = "comparative_research";

pub fn build(collab: Arc<Collaborators>, depth: DepthConfig) -> Result<Workflow, GraphError> {
    Workflow::builder(NAME)
        .description("Structured comparison of entities along shared dimensions")
        .schema(comparative_schema())
        .node(Arc::new(ComparisonPlanNode::new(collab.clone())))
        .node(Arc::new(PlannerNode::new(collab.clone(), depth)))
        .node(Arc::new(WebSearchNode::new(collab.clone(), depth)))
        .node(Arc::new(AnalyzeNode::new(collab.clone())))
        .node(Arc::new(EvaluateNode::new(collab.clone())))
        .node(Arc::new(CompareNode::new(collab.clone())))
        .node(Arc::new(SynthesizeNode::new(collab)))
        .entry(ComparisonPlanNode::ID)
        .edge(ComparisonPlanNode::ID, PlannerNode::ID)
        .edge(PlannerNode::ID, WebSearchNode::ID)
        .edge(WebSearchNode::ID, AnalyzeNode::ID)
        .edge(AnalyzeNode::ID, EvaluateNode::ID)
        .route(
            EvaluateNode::ID,
            Arc::new(StandardLoopRouter::new(
                depth,
                PlannerNode::ID,
                CompareNode::ID,
            )),
        )
        .edge(CompareNode::ID, SynthesizeNode::ID)
        .end(SynthesizeNode::ID)
        .build()
}
