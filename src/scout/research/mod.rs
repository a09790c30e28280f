// SPDX-License-Identifier: MIT

//! Research domain: node library, routers, workflow variants, and the
//! runner surface

pub mod depth;
pub mod nodes;
pub mod report;
pub mod routers;
pub mod runner;
pub mod selector;
pub mod types;
pub mod workflows;

use crate::llm::Model;
use crate::scout::retrieval::VectorStore;
use crate::scout::search::SearchRouter;
use async_trait::async_trait;
use std::sync::Arc;

/// Execution sandbox for code-assisted research. External collaborator;
/// absent by default, in which case the code-run node degrades to a
/// model-estimated trace recorded as such.
#[async_trait]
pub trait CodeSandbox: Send + Sync {
    async fn run(&self, language: &str, code: &str) -> Result<String, crate::error::ScoutError>;
}

/// The external collaborators every node pool shares
pub struct Collaborators {
    pub model: Arc<dyn Model>,
    pub web: Arc<SearchRouter>,
    pub store: Arc<dyn VectorStore>,
    pub sandbox: Option<Arc<dyn CodeSandbox>>,
}

impl Collaborators {
    pub fn new(
        model: Arc<dyn Model>,
        web: Arc<SearchRouter>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            model,
            web,
            store,
            sandbox: None,
        }
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn CodeSandbox>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }
}
