// SPDX-License-Identifier: MIT

//! Fact check: decompose the statement into atomic claims, gather
//! evidence in a bounded loop, then issue per-claim verdicts.

use crate::error::GraphError;
use crate::scout::graph::workflow::Workflow;
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::nodes::{
    ClaimDecomposeNode, EvaluateNode, KbRetrieveNode, PlannerNode, SynthesizeNode,
    VerifyClaimsNode, WebSearchNode,
};
use crate::scout::research::routers::StandardLoopRouter;
use crate::scout::research::workflows::fact_check_schema;
use crate::scout::research::Collaborators;
use std::sync::Arc;

pub const NAME: &str = "fact_check";

pub fn build(collab: Arc<Collaborators>, depth: DepthConfig) -> Result<Workflow, GraphError> {
    Workflow::builder(NAME)
        .description("Decomposes a statement into claims and verifies each one")
        .schema(fact_check_schema())
        .node(Arc::new(ClaimDecomposeNode::new(collab.clone())))
        .node(Arc::new(PlannerNode::new(collab.clone(), depth)))
        .node(Arc::new(WebSearchNode::new(collab.clone(), depth)))
        .node(Arc::new(KbRetrieveNode::new(collab.clone(), depth)))
        .node(Arc::new(EvaluateNode::new(collab.clone())))
        .node(Arc::new(VerifyClaimsNode::new(collab.clone())))
        .node(Arc::new(SynthesizeNode::new(collab)))
        .entry(ClaimDecomposeNode::ID)
        .edge(ClaimDecomposeNode::ID, PlannerNode::ID)
        .fan_out(
            PlannerNode::ID,
            &[WebSearchNode::ID, KbRetrieveNode::ID],
            EvaluateNode::ID,
        )
        .route(
            EvaluateNode::ID,
            Arc::new(StandardLoopRouter::new(
                depth,
                PlannerNode::ID,
                VerifyClaimsNode::ID,
            )),
        )
        .edge(VerifyClaimsNode::ID, SynthesizeNode::ID)
        .end(SynthesizeNode::ID)
        .build()
}
