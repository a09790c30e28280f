// SPDX-License-Identifier: MIT

//! Workflow registry - named workflow builders
//!
//! Workflows are depth-parameterized, so the registry stores builder
//! functions rather than built graphs: `get` constructs a fresh validated
//! workflow for the requested depth. Registration of a duplicate name is a
//! programmer error and fails fast.

use crate::error::GraphError;
use crate::scout::graph::workflow::Workflow;
use crate::scout::research::depth::DepthConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

type BuilderFn = Arc<dyn Fn(DepthConfig) -> Result<Workflow, GraphError> + Send + Sync>;

/// Descriptive metadata for one registered workflow
#[derive(Debug, Clone, serde::Serialize)]
pub struct WorkflowInfo {
    pub name: String,
    pub description: String,
}

/// Named collection of workflow builders
///
/// A `BTreeMap` keeps listings and error messages in stable name order.
#[derive(Default)]
pub struct WorkflowRegistry {
    builders: BTreeMap<String, (String, BuilderFn)>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workflow builder under a unique name
    pub fn register<F>(&mut self, name: &str, description: &str, builder: F) -> Result<(), GraphError>
    where
        F: Fn(DepthConfig) -> Result<Workflow, GraphError> + Send + Sync + 'static,
    {
        if self.builders.contains_key(name) {
            return Err(GraphError::DuplicateWorkflow(name.to_string()));
        }
        log::debug!("Registered workflow: {}", name);
        self.builders
            .insert(name.to_string(), (description.to_string(), Arc::new(builder)));
        Ok(())
    }

    /// Build the named workflow for the given depth
    pub fn get(&self, name: &str, depth: DepthConfig) -> Result<Workflow, GraphError> {
        let (_, builder) = self
            .builders
            .get(name)
            .ok_or_else(|| GraphError::UnknownWorkflow {
                name: name.to_string(),
                known: self.names(),
            })?;
        builder(depth)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.builders.keys().cloned().collect()
    }

    /// Name and description of every registered workflow
    pub fn list(&self) -> Vec<WorkflowInfo> {
        self.builders
            .iter()
            .map(|(name, (description, _))| WorkflowInfo {
                name: name.clone(),
                description: description.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::graph::node::testing::FixedNode;
    use crate::scout::graph::state::StateSchema;
    use serde_json::json;

    fn trivial(depth: DepthConfig) -> Result<Workflow, GraphError> {
        let _ = depth;
        Workflow::builder("trivial")
            .description("single node")
            .schema(StateSchema::new().replace("report"))
            .node(Arc::new(FixedNode::new("only", vec![("report", json!("r"))])))
            .entry("only")
            .end("only")
            .build()
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = WorkflowRegistry::new();
        registry.register("trivial", "single node", trivial).unwrap();
        let wf = registry.get("trivial", DepthConfig::quick()).unwrap();
        assert_eq!(wf.entry(), "only");
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = WorkflowRegistry::new();
        registry.register("trivial", "a", trivial).unwrap();
        let err = registry.register("trivial", "b", trivial).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateWorkflow(name) if name == "trivial"));
    }

    #[test]
    fn test_unknown_workflow_lists_known_names() {
        let mut registry = WorkflowRegistry::new();
        registry.register("trivial", "a", trivial).unwrap();
        let err = registry.get("ghost", DepthConfig::quick()).unwrap_err();
        match err {
            GraphError::UnknownWorkflow { name, known } => {
                assert_eq!(name, "ghost");
                assert_eq!(known, vec!["trivial"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
