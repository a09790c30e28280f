// SPDX-License-Identifier: MIT

//! Causal research: generate hypotheses, gather evidence until a quorum
//! carries support (or the iteration floor is hit), then lay out the
//! cause-effect chain.

use crate::error::GraphError;
use crate::scout::graph::workflow::Workflow;
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::nodes::{
    AnalyzeNode, CausalGraphNode, HypothesisNode, PlannerNode, SynthesizeNode,
    ValidateHypothesesNode, WebSearchNode,
};
use crate::scout::research::routers::EvidenceQuorumRouter;
use crate::scout::research::workflows::causal_schema;
use crate::scout::research::Collaborators;
use std::sync::Arc;

pub const NAME: &str = "causal_research";

pub fn build(collab: Arc<Collaborators>, depth: DepthConfig) -> Result<Workflow, GraphError> {
    Workflow::builder(NAME)
        .description("Root-cause analysis through hypothesis validation")
        .schema(causal_schema())
        .node(Arc::new(HypothesisNode::new(collab.clone())))
        .node(Arc::new(PlannerNode::new(collab.clone(), depth)))
        .node(Arc::new(WebSearchNode::new(collab.clone(), depth)))
        .node(Arc::new(AnalyzeNode::new(collab.clone())))
        .node(Arc::new(ValidateHypothesesNode::new(collab.clone())))
        .node(Arc::new(CausalGraphNode::new(collab.clone())))
        .node(Arc::new(SynthesizeNode::new(collab)))
        .entry(HypothesisNode::ID)
        .edge(HypothesisNode::ID, PlannerNode::ID)
        .edge(PlannerNode::ID, WebSearchNode::ID)
        .edge(WebSearchNode::ID, AnalyzeNode::ID)
        .edge(AnalyzeNode::ID, ValidateHypothesesNode::ID)
        .route(
            ValidateHypothesesNode::ID,
            Arc::new(EvidenceQuorumRouter::new(
                depth,
                PlannerNode::ID,
                CausalGraphNode::ID,
            )),
        )
        .edge(CausalGraphNode::ID, SynthesizeNode::ID)
        .end(SynthesizeNode::ID)
        .build()
}
