// SPDX-License-Identifier: MIT

//! Code-research nodes: plan computational experiments, then execute
//! them in a sandbox (or ask the model to estimate the output when no
//! sandbox is wired up).

use crate::error::ScoutError;
use crate::llm::invoke_structured;
use crate::scout::graph::node::Node;
use crate::scout::graph::state::{ResearchState, StatePatch};
use crate::scout::research::types::{keys, CodeExperiment, CodeOutput};
use crate::scout::research::Collaborators;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
struct ExperimentPlan {
    experiments: Vec<CodeExperiment>,
}

/// Plans the code experiments that would answer the computational question
pub struct CodePlanNode {
    collab: Arc<Collaborators>,
}

impl CodePlanNode {
    pub const ID: &'static str = "code_plan";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }
}

#[async_trait]
impl Node for CodePlanNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let prompt = format!(
            "Question requiring computation: {}\n\
             Plan small self-contained code experiments (language plus \
             complete source) whose outputs would answer it. Prefer \
             python.",
            state.query()
        );

        let experiments =
            match invoke_structured::<ExperimentPlan>(&self.collab.model, &prompt).await {
                Ok(plan) if !plan.experiments.is_empty() => plan.experiments,
                Ok(_) | Err(_) => {
                    log::warn!("Experiment planning degraded to a single print stub");
                    vec![CodeExperiment {
                        description: state.query().to_string(),
                        language: "python".to_string(),
                        code: format!("# unable to plan code for: {}", state.query()),
                    }]
                }
            };

        log::info!("Planned {} code experiments", experiments.len());
        Ok(StatePatch::new().set(keys::CODE_PLAN, json!(experiments)))
    }
}

/// Runs the planned experiments and records their outputs
pub struct CodeRunNode {
    collab: Arc<Collaborators>,
}

impl CodeRunNode {
    pub const ID: &'static str = "code_run";

    pub fn new(collab: Arc<Collaborators>) -> Self {
        Self { collab }
    }

    async fn execute(&self, experiment: &CodeExperiment) -> CodeOutput {
        if let Some(sandbox) = &self.collab.sandbox {
            match sandbox.run(&experiment.language, &experiment.code).await {
                Ok(output) => {
                    return CodeOutput {
                        description: experiment.description.clone(),
                        output,
                        executed: true,
                    }
                }
                Err(e) => log::warn!("Sandbox run failed, estimating instead: {}", e),
            }
        }

        // No sandbox (or it failed): the model estimates the output, and
        // the report marks it as unexecuted.
        let prompt = format!(
            "Predict the likely stdout of this {} program. Reply with the \
             output only.\n\n{}",
            experiment.language, experiment.code
        );
        let output = match self.collab.model.invoke(&prompt).await {
            Ok(text) => text,
            Err(e) => format!("output unavailable: {}", e),
        };
        CodeOutput {
            description: experiment.description.clone(),
            output,
            executed: false,
        }
    }
}

#[async_trait]
impl Node for CodeRunNode {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, state: &ResearchState) -> Result<StatePatch, ScoutError> {
        let experiments: Vec<CodeExperiment> = state.get_as(keys::CODE_PLAN).unwrap_or_default();
        let mut outputs = Vec::with_capacity(experiments.len());
        for experiment in &experiments {
            outputs.push(self.execute(experiment).await);
        }
        Ok(StatePatch::new().set(keys::CODE_OUTPUTS, json!(outputs)))
    }
}
