// SPDX-License-Identifier: MIT

//! scout-rs: a multi-workflow research agent built on a graph execution
//! core. State flows through validated workflow graphs of pure nodes and
//! routers under a hard step ceiling; LLM, web search, and retrieval
//! backends plug in as collaborators.

pub mod error;
pub mod llm;
pub mod scout;
