// SPDX-License-Identifier: MIT

//! Node contract - one workflow step
//!
//! A node wraps one externally-supplied computation (an LLM call, a
//! retrieval call, a web search) as a `State -> PartialState` step. Nodes
//! read the full current state and return only the keys they produce; they
//! never mutate shared structures. A node that hits a recoverable
//! collaborator failure must degrade to a valid patch (recording the
//! failure in-band in the accumulator it would otherwise have populated)
//! rather than erroring, so the workflow can continue on partial evidence.

use crate::error::ScoutError;
use crate::scout::graph::state::{ResearchState, StatePatch};
use async_trait::async_trait;

/// One stateless unit of work in a workflow graph
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique node identifier within a workflow
    fn id(&self) -> &str;

    /// Execute against the current state, returning a partial-state patch
    ///
    /// An `Err` here means a programmer error or an unrecoverable condition
    /// with no safe degraded output; collaborator hiccups are handled
    /// inside the node.
    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use serde_json::Value;

    /// Node returning a fixed patch, for graph tests
    pub struct FixedNode {
        id: String,
        patch: Vec<(String, Value)>,
    }

    impl FixedNode {
        pub fn new(id: &str, patch: Vec<(&str, Value)>) -> Self {
            Self {
                id: id.to_string(),
                patch: patch
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl Node for FixedNode {
        fn id(&self) -> &str {
            &self.id
        }

        async fn run(&self, _state: &ResearchState) -> Result<StatePatch, ScoutError> {
            let mut patch = StatePatch::new();
            for (k, v) in &self.patch {
                patch = patch.set(k, v.clone());
            }
            Ok(patch)
        }
    }
}
