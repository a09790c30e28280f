// SPDX-License-Identifier: MIT

//! Code research: gather background evidence under the standard refinement
//! loop, then plan code experiments, run them through the sandbox, and
//! synthesize the results.

use crate::error::GraphError;
use crate::scout::graph::workflow::Workflow;
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::nodes::{
    AnalyzeNode, CodePlanNode, CodeRunNode, EvaluateNode, PlannerNode, SynthesizeNode,
    WebSearchNode,
};
use crate::scout::research::routers::StandardLoopRouter;
use crate::scout::research::workflows::code_schema;
use crate::scout::research::Collaborators;
use std::sync::Arc;

pub const NAME: &str = "code_research";

pub fn build(collab: Arc<Collaborators>, depth: DepthConfig) -> Result<Workflow, GraphError> {
    Workflow::builder(NAME)
        .description("Research requiring code experiments alongside web evidence")
        .schema(code_schema())
        .node(Arc::new(PlannerNode::new(collab.clone(), depth)))
        .node(Arc::new(WebSearchNode::new(collab.clone(), depth)))
        .node(Arc::new(AnalyzeNode::new(collab.clone())))
        .node(Arc::new(EvaluateNode::new(collab.clone())))
        .node(Arc::new(CodePlanNode::new(collab.clone())))
        .node(Arc::new(CodeRunNode::new(collab.clone())))
        .node(Arc::new(SynthesizeNode::new(collab)))
        .entry(PlannerNode::ID)
        .edge(PlannerNode::ID, WebSearchNode::ID)
        .edge(WebSearchNode::ID, AnalyzeNode::ID)
        .edge(AnalyzeNode::ID, EvaluateNode::ID)
        .route(
            EvaluateNode::ID,
            Arc::new(StandardLoopRouter::new(
                depth,
                PlannerNode::ID,
                CodePlanNode::ID,
            )),
        )
        .edge(CodePlanNode::ID, CodeRunNode::ID)
        .edge(CodeRunNode::ID, SynthesizeNode::ID)
        .end(SynthesizeNode::ID)
        .build()
}
