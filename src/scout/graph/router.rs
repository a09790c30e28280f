// SPDX-License-Identifier: MIT

//! Router contract - loop and branch policy
//!
//! A router is a pure, total decision function from state to the next node.
//! Every router must guarantee that each branch eventually reaches a
//! ceiling-triggered exit; routers are the only thing allowed to close a
//! cycle in a workflow graph, which is checked at construction time.

use crate::scout::graph::state::ResearchState;

/// Where a router sends execution next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// Continue at the named node
    Next(String),
    /// Terminate the workflow
    End,
}

impl RouteTarget {
    pub fn next(id: &str) -> Self {
        Self::Next(id.to_string())
    }
}

/// A named, stateless decision function
pub trait Router: Send + Sync {
    /// Router identifier, for logs and graph validation messages
    fn id(&self) -> &str;

    /// Decide the next node from the current state. Must be total: a valid
    /// target for any reachable state, including ceiling conditions.
    fn decide(&self, state: &ResearchState) -> RouteTarget;

    /// The finite set of nodes this router can route to, for static
    /// validation of the graph
    fn targets(&self) -> Vec<String>;
}
