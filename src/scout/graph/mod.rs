// SPDX-License-Identifier: MIT

//! Graph execution core: state with merge policies, node and router
//! contracts, validated workflow graphs, the ceiling-bounded executor,
//! and the workflow registry.

pub mod executor;
pub mod node;
pub mod registry;
pub mod router;
pub mod state;
pub mod workflow;
