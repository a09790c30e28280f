// SPDX-License-Identifier: MIT

//! Workflow definition - an immutable directed graph of nodes and routers
//!
//! Workflows are built in code through [`WorkflowBuilder`], which validates
//! the wiring at construction time: the entry and every edge target must
//! exist, every node needs an outgoing edge (fan-out branches excepted, the
//! executor joins them), and any cycle must pass through a router - a cycle
//! made only of static edges has nothing to bound it and is rejected.

use crate::error::GraphError;
use crate::scout::graph::node::Node;
use crate::scout::graph::router::Router;
use crate::scout::graph::state::StateSchema;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Outgoing edge of a node
#[derive(Clone)]
pub enum Edge {
    /// Fixed next node
    To(String),
    /// Parallel fan-out: branches run concurrently, then execution
    /// continues at `join`
    FanOut { branches: Vec<String>, join: String },
    /// Conditional edge decided by a router
    Route(Arc<dyn Router>),
    /// Terminal node
    End,
}

/// An immutable, validated workflow graph
pub struct Workflow {
    pub name: String,
    pub description: String,
    pub schema: Arc<StateSchema>,
    pub(crate) nodes: HashMap<String, Arc<dyn Node>>,
    pub(crate) edges: HashMap<String, Edge>,
    pub(crate) entry: String,
}

impl Workflow {
    pub fn builder(name: &str) -> WorkflowBuilder {
        WorkflowBuilder {
            name: name.to_string(),
            description: String::new(),
            schema: None,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            fan_out_branches: HashSet::new(),
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn node(&self, id: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &String> {
        self.nodes.keys()
    }
}

// Manual impl: node and router trait objects carry no Debug bound.
impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nodes: Vec<&String> = self.nodes.keys().collect();
        nodes.sort();
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("entry", &self.entry)
            .field("nodes", &nodes)
            .finish()
    }
}

/// Builder for [`Workflow`] with construction-time validation
pub struct WorkflowBuilder {
    name: String,
    description: String,
    schema: Option<Arc<StateSchema>>,
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry: Option<String>,
    fan_out_branches: HashSet<String>,
}

impl WorkflowBuilder {
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn schema(mut self, schema: StateSchema) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    pub fn node(mut self, node: Arc<dyn Node>) -> Self {
        self.nodes.insert(node.id().to_string(), node);
        self
    }

    pub fn entry(mut self, id: &str) -> Self {
        self.entry = Some(id.to_string());
        self
    }

    pub fn edge(mut self, from: &str, to: &str) -> Self {
        self.edges.insert(from.to_string(), Edge::To(to.to_string()));
        self
    }

    pub fn fan_out(mut self, from: &str, branches: &[&str], join: &str) -> Self {
        for b in branches {
            self.fan_out_branches.insert((*b).to_string());
        }
        self.edges.insert(
            from.to_string(),
            Edge::FanOut {
                branches: branches.iter().map(|s| s.to_string()).collect(),
                join: join.to_string(),
            },
        );
        self
    }

    pub fn route(mut self, from: &str, router: Arc<dyn Router>) -> Self {
        self.edges.insert(from.to_string(), Edge::Route(router));
        self
    }

    pub fn end(mut self, from: &str) -> Self {
        self.edges.insert(from.to_string(), Edge::End);
        self
    }

    /// Validate the wiring and freeze the graph
    pub fn build(self) -> Result<Workflow, GraphError> {
        let invalid = |reason: String| GraphError::InvalidGraph {
            workflow: self.name.clone(),
            reason,
        };

        let entry = self
            .entry
            .clone()
            .ok_or_else(|| invalid("no entry point declared".to_string()))?;
        if !self.nodes.contains_key(&entry) {
            return Err(invalid(format!("entry '{}' is not a node", entry)));
        }
        let schema = self
            .schema
            .clone()
            .ok_or_else(|| invalid("no state schema declared".to_string()))?;

        // Every edge endpoint must be a node we know about.
        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(invalid(format!("edge declared from unknown node '{}'", from)));
            }
            let targets: Vec<String> = match edge {
                Edge::To(to) => vec![to.clone()],
                Edge::FanOut { branches, join } => {
                    let mut t = branches.clone();
                    t.push(join.clone());
                    t
                }
                Edge::Route(router) => router.targets(),
                Edge::End => vec![],
            };
            for to in targets {
                if !self.nodes.contains_key(&to) {
                    return Err(GraphError::UnknownNode {
                        from: from.clone(),
                        to,
                    });
                }
            }
        }

        // Every node needs a way out, except fan-out branches (the
        // executor joins those).
        for id in self.nodes.keys() {
            if !self.edges.contains_key(id) && !self.fan_out_branches.contains(id) {
                return Err(invalid(format!("node '{}' has no outgoing edge", id)));
            }
        }

        // Cycles are only legal through routers: the static-edge subgraph
        // must be acyclic, otherwise nothing bounds the loop.
        self.check_static_cycles()?;

        log::info!(
            "Built workflow '{}' with {} nodes",
            self.name,
            self.nodes.len()
        );

        Ok(Workflow {
            name: self.name,
            description: self.description,
            schema,
            nodes: self.nodes,
            edges: self.edges,
            entry,
        })
    }

    fn static_successors(&self, id: &str) -> Vec<String> {
        match self.edges.get(id) {
            Some(Edge::To(to)) => vec![to.clone()],
            Some(Edge::FanOut { branches, join }) => {
                let mut next = branches.clone();
                next.push(join.clone());
                next
            }
            // Routers bound their cycles; End has no successor.
            _ => vec![],
        }
    }

    fn check_static_cycles(&self) -> Result<(), GraphError> {
        fn visit(
            builder: &WorkflowBuilder,
            id: &str,
            in_progress: &mut HashSet<String>,
            done: &mut HashSet<String>,
            stack: &mut Vec<String>,
        ) -> Result<(), GraphError> {
            in_progress.insert(id.to_string());
            stack.push(id.to_string());
            for next in builder.static_successors(id) {
                if done.contains(&next) {
                    continue;
                }
                if in_progress.contains(&next) {
                    let mut cycle: Vec<String> = stack
                        .iter()
                        .skip_while(|n| **n != next)
                        .cloned()
                        .collect();
                    cycle.push(next);
                    return Err(GraphError::UnboundedCycle(cycle));
                }
                visit(builder, &next, in_progress, done, stack)?;
            }
            stack.pop();
            in_progress.remove(id);
            done.insert(id.to_string());
            Ok(())
        }

        let mut in_progress = HashSet::new();
        let mut done = HashSet::new();
        let ids: Vec<String> = self.nodes.keys().cloned().collect();
        for id in &ids {
            if !done.contains(id) {
                let mut stack = Vec::new();
                visit(self, id, &mut in_progress, &mut done, &mut stack)?;
            }
        }
        Ok(())
    }
}
