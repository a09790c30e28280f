// SPDX-License-Identifier: MIT

//! Depth configuration - per-run research budgets
//!
//! An externally-injected parameter bundle consumed by routers and planners
//! as configuration, never hardcoded. Ships four presets and can be
//! overridden from a YAML profile file.

use crate::error::ScoutError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Research budgets for one invocation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DepthConfig {
    /// Refinement-loop ceiling for the standard router
    pub max_iterations: u64,
    /// Subtask cap for hierarchical decomposition
    pub max_subtasks: usize,
    /// Minimum queries per planning round
    pub min_queries: usize,
    /// Maximum queries per planning round
    pub max_queries: usize,
    /// Step ceiling: maximum total node executions per invocation
    pub recursion_limit: u32,
    /// Ceiling on mid-execution plan revisions
    pub max_plan_revisions: u64,
    /// Results requested per search/retrieval call
    pub results_per_query: usize,
    /// Fraction of hypotheses needing strong/contributing evidence before
    /// the causal router proceeds. Heuristic tuned by trial; kept as
    /// configuration rather than a constant.
    pub evidence_quorum: f64,
    /// Iteration floor after which the causal router proceeds regardless
    pub causal_min_iterations: u64,
}

impl DepthConfig {
    pub fn quick() -> Self {
        Self {
            max_iterations: 1,
            max_subtasks: 3,
            min_queries: 1,
            max_queries: 2,
            recursion_limit: 25,
            max_plan_revisions: 1,
            results_per_query: 3,
            evidence_quorum: 0.5,
            causal_min_iterations: 2,
        }
    }

    pub fn standard() -> Self {
        Self {
            max_iterations: 2,
            max_subtasks: 5,
            min_queries: 2,
            max_queries: 3,
            recursion_limit: 50,
            max_plan_revisions: 2,
            results_per_query: 5,
            evidence_quorum: 0.5,
            causal_min_iterations: 2,
        }
    }

    pub fn deep() -> Self {
        Self {
            max_iterations: 3,
            max_subtasks: 7,
            min_queries: 2,
            max_queries: 4,
            recursion_limit: 75,
            max_plan_revisions: 3,
            results_per_query: 7,
            evidence_quorum: 0.5,
            causal_min_iterations: 2,
        }
    }

    pub fn comprehensive() -> Self {
        Self {
            max_iterations: 4,
            max_subtasks: 10,
            min_queries: 3,
            max_queries: 5,
            recursion_limit: 100,
            max_plan_revisions: 4,
            results_per_query: 10,
            evidence_quorum: 0.5,
            causal_min_iterations: 2,
        }
    }

    /// Load a profile from YAML, e.g.
    ///
    /// ```yaml
    /// max_iterations: 2
    /// max_subtasks: 5
    /// min_queries: 2
    /// max_queries: 3
    /// recursion_limit: 50
    /// max_plan_revisions: 2
    /// results_per_query: 5
    /// evidence_quorum: 0.5
    /// causal_min_iterations: 2
    /// ```
    pub fn from_yaml_file(path: &Path) -> Result<Self, ScoutError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl FromStr for DepthConfig {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quick" => Ok(Self::quick()),
            "standard" => Ok(Self::standard()),
            "deep" => Ok(Self::deep()),
            "comprehensive" => Ok(Self::comprehensive()),
            other => Err(ScoutError::config(format!(
                "Unknown depth '{}'. Valid depths: quick, standard, deep, comprehensive",
                other
            ))),
        }
    }
}
