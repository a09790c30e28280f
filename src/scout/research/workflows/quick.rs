// SPDX-License-Identifier: MIT

//! Quick research: one bounded refinement loop over parallel web and
//! knowledge-base evidence gathering, with a reflection step that can
//! overrule a satisfied evaluator.

use crate::error::GraphError;
use crate::scout::graph::workflow::Workflow;
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::nodes::{
    AnalyzeNode, EvaluateNode, KbRetrieveNode, PlannerNode, ReflectNode, SynthesizeNode,
    WebSearchNode,
};
use crate::scout::research::routers::ReflectionRouter;
use crate::scout::research::workflows::research_base_schema;
use crate::scout::research::Collaborators;
use std::sync::Arc;

pub const NAME: &str = "quick_research";

pub fn build(collab: Arc<Collaborators>, depth: DepthConfig) -> Result<Workflow, GraphError> {
    Workflow::builder(NAME)
        .description("Single-pass research for simple factual questions")
        .schema(research_base_schema())
        .node(Arc::new(PlannerNode::new(collab.clone(), depth)))
        .node(Arc::new(WebSearchNode::new(collab.clone(), depth)))
        .node(Arc::new(KbRetrieveNode::new(collab.clone(), depth)))
        .node(Arc::new(AnalyzeNode::new(collab.clone())))
        .node(Arc::new(EvaluateNode::new(collab.clone())))
        .node(Arc::new(ReflectNode::new(collab.clone())))
        .node(Arc::new(SynthesizeNode::new(collab)))
        .entry(PlannerNode::ID)
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
        .build()
}
