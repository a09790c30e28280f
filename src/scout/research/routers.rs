// SPDX-License-Identifier: MIT

//! Loop policies for the workflow variants
//!
//! Each router is total: it returns a valid target for any reachable
//! state, and every looping branch is bounded by an iteration ceiling so
//! the step ceiling is never the only thing stopping a run.

use crate::scout::graph::router::{RouteTarget, Router};
use crate::scout::graph::state::ResearchState;
use crate::scout::research::depth::DepthConfig;
use crate::scout::research::nodes::MODE_HIERARCHICAL;
use crate::scout::research::types::{keys, Evaluation, Hypothesis, Reflection};

/// The refine-or-finish decision of the standard research loop. The
/// iteration ceiling outranks the evaluator: once spent, the loop closes
/// even on insufficient evidence.
pub struct StandardLoopRouter {
    depth: DepthConfig,
    back_to: String,
    forward_to: String,
}

impl StandardLoopRouter {
    pub fn new(depth: DepthConfig, back_to: &str, forward_to: &str) -> Self {
        Self {
            depth,
            back_to: back_to.to_string(),
            forward_to: forward_to.to_string(),
        }
    }
}

impl Router for StandardLoopRouter {
    fn id(&self) -> &str {
        "standard_loop"
    }

    fn decide(&self, state: &ResearchState) -> RouteTarget {
        let loops = state.get_u64(keys::LOOP_COUNT);
        if loops >= self.depth.max_iterations {
            log::info!("Iteration ceiling reached after {} loops", loops);
            return RouteTarget::next(&self.forward_to);
        }
        let sufficient = state
            .get_as::<Evaluation>(keys::EVALUATION)
            .map(|e| e.sufficient)
            .unwrap_or(false);
        if sufficient {
            RouteTarget::next(&self.forward_to)
        } else {
            RouteTarget::next(&self.back_to)
        }
    }

    fn targets(&self) -> Vec<String> {
        vec![self.back_to.clone(), self.forward_to.clone()]
    }
}

/// Reflection-aware loop policy: the ceiling outranks everything, then a
/// reflection that wants more research outranks the evaluator's verdict.
pub struct ReflectionRouter {
    depth: DepthConfig,
    back_to: String,
    forward_to: String,
}

impl ReflectionRouter {
    pub fn new(depth: DepthConfig, back_to: &str, forward_to: &str) -> Self {
        Self {
            depth,
            back_to: back_to.to_string(),
            forward_to: forward_to.to_string(),
        }
    }
}

impl Router for ReflectionRouter {
    fn id(&self) -> &str {
        "reflection_loop"
    }

    fn decide(&self, state: &ResearchState) -> RouteTarget {
        let loops = state.get_u64(keys::LOOP_COUNT);
        if loops >= self.depth.max_iterations {
            log::info!("Iteration ceiling reached after {} loops", loops);
            return RouteTarget::next(&self.forward_to);
        }
        if let Some(reflection) = state.get_as::<Reflection>(keys::REFLECTION) {
            if reflection.should_continue_research {
                return RouteTarget::next(&self.back_to);
            }
        }
        let sufficient = state
            .get_as::<Evaluation>(keys::EVALUATION)
            .map(|e| e.sufficient)
            .unwrap_or(false);
        if sufficient {
            RouteTarget::next(&self.forward_to)
        } else {
            RouteTarget::next(&self.back_to)
        }
    }

    fn targets(&self) -> Vec<String> {
        vec![self.back_to.clone(), self.forward_to.clone()]
    }
}

/// Causal loop policy: proceed once enough hypotheses carry strong or
/// contributing evidence, or once the iteration floor is hit; the
/// iteration ceiling always closes the loop.
pub struct EvidenceQuorumRouter {
    depth: DepthConfig,
    back_to: String,
    forward_to: String,
}

impl EvidenceQuorumRouter {
    pub fn new(depth: DepthConfig, back_to: &str, forward_to: &str) -> Self {
        Self {
            depth,
            back_to: back_to.to_string(),
            forward_to: forward_to.to_string(),
        }
    }

    fn quorum_met(&self, state: &ResearchState) -> bool {
        let hypotheses: Vec<Hypothesis> = state.get_as(keys::HYPOTHESES).unwrap_or_default();
        if hypotheses.is_empty() {
            return false;
        }
        let supported = hypotheses
            .iter()
            .filter(|h| h.strength.counts_toward_quorum())
            .count();
        supported as f64 / hypotheses.len() as f64 >= self.depth.evidence_quorum
    }
}

impl Router for EvidenceQuorumRouter {
    fn id(&self) -> &str {
        "evidence_quorum"
    }

    fn decide(&self, state: &ResearchState) -> RouteTarget {
        let loops = state.get_u64(keys::LOOP_COUNT);
        if loops >= self.depth.max_iterations
            || loops >= self.depth.causal_min_iterations
            || self.quorum_met(state)
        {
            RouteTarget::next(&self.forward_to)
        } else {
            RouteTarget::next(&self.back_to)
        }
    }

    fn targets(&self) -> Vec<String> {
        vec![self.back_to.clone(), self.forward_to.clone()]
    }
}

/// Hierarchical loop policy: keep executing while subtasks remain
pub struct PendingSubtasksRouter {
    back_to: String,
    forward_to: String,
}

impl PendingSubtasksRouter {
    pub fn new(back_to: &str, forward_to: &str) -> Self {
        Self {
            back_to: back_to.to_string(),
            forward_to: forward_to.to_string(),
        }
    }
}

impl Router for PendingSubtasksRouter {
    fn id(&self) -> &str {
        "pending_subtasks"
    }

    fn decide(&self, state: &ResearchState) -> RouteTarget {
        if state.len_of(keys::PENDING_SUBTASKS) > 0 {
            RouteTarget::next(&self.back_to)
        } else {
            RouteTarget::next(&self.forward_to)
        }
    }

    fn targets(&self) -> Vec<String> {
        vec![self.back_to.clone(), self.forward_to.clone()]
    }
}

/// Dispatches between the flat pipeline and hierarchical execution on the
/// master planner's verdict. Anything other than an explicit hierarchical
/// mode falls through to the flat pipeline.
pub struct ModeRouter {
    simple_to: String,
    hierarchical_to: String,
}

impl ModeRouter {
    pub fn new(simple_to: &str, hierarchical_to: &str) -> Self {
        Self {
            simple_to: simple_to.to_string(),
            hierarchical_to: hierarchical_to.to_string(),
        }
    }
}

impl Router for ModeRouter {
    fn id(&self) -> &str {
        "execution_mode"
    }

    fn decide(&self, state: &ResearchState) -> RouteTarget {
        match state.get_str(keys::EXECUTION_MODE) {
            Some(MODE_HIERARCHICAL) => RouteTarget::next(&self.hierarchical_to),
            _ => RouteTarget::next(&self.simple_to),
        }
    }

    fn targets(&self) -> Vec<String> {
        vec![self.simple_to.clone(), self.hierarchical_to.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout::graph::state::StatePatch;
    use crate::scout::research::types::EvidenceStrength;
    use crate::scout::research::workflows::{causal_schema, deep_schema, research_base_schema};
    use serde_json::json;
    use std::sync::Arc;

    fn base_state() -> ResearchState {
        ResearchState::new(Arc::new(research_base_schema()), "q")
    }

    fn with_loop_count(state: &mut ResearchState, n: u64) {
        state
            .merge("plan", &StatePatch::new().set(keys::LOOP_COUNT, json!(n)))
            .unwrap();
    }

    #[test]
    fn test_standard_router_loops_until_sufficient() {
        let router = StandardLoopRouter::new(DepthConfig::standard(), "plan", "synthesize");
        let mut state = base_state();
        with_loop_count(&mut state, 1);
        assert_eq!(router.decide(&state), RouteTarget::next("plan"));

        state
            .merge(
                "evaluate",
                &StatePatch::new().set(
                    keys::EVALUATION,
                    json!({"sufficient": true, "missing": [], "reasoning": ""}),
                ),
            )
            .unwrap();
        assert_eq!(router.decide(&state), RouteTarget::next("synthesize"));
    }

    #[test]
    fn test_standard_router_ceiling_outranks_insufficient() {
        let depth = DepthConfig::standard();
        let router = StandardLoopRouter::new(depth, "plan", "synthesize");
        let mut state = base_state();
        with_loop_count(&mut state, depth.max_iterations);
        // No evaluation at all: the ceiling still closes the loop.
        assert_eq!(router.decide(&state), RouteTarget::next("synthesize"));
    }

    #[test]
    fn test_standard_router_is_total() {
        let depth = DepthConfig::standard();
        let router = StandardLoopRouter::new(depth, "plan", "synthesize");
        let targets = router.targets();
        for loops in 0..depth.max_iterations + 5 {
            let mut state = base_state();
            with_loop_count(&mut state, loops);
            let RouteTarget::Next(chosen) = router.decide(&state) else {
                panic!("router must route to a node");
            };
            assert!(targets.contains(&chosen));
        }
    }

    #[test]
    fn test_reflection_router_is_total() {
        // A reflection that always wants more research must still be
        // overruled by the ceiling on every branch.
        let depth = DepthConfig::standard();
        let router = ReflectionRouter::new(depth, "plan", "synthesize");
        let targets = router.targets();
        for loops in 0..depth.max_iterations + 5 {
            let mut state = base_state();
            with_loop_count(&mut state, loops);
            state
                .merge(
                    "reflect",
                    &StatePatch::new().set(
                        keys::REFLECTION,
                        json!({"should_continue_research": true, "gaps": []}),
                    ),
                )
                .unwrap();
            let RouteTarget::Next(chosen) = router.decide(&state) else {
                panic!("router must route to a node");
            };
            assert!(targets.contains(&chosen));
            if loops >= depth.max_iterations {
                assert_eq!(chosen, "synthesize");
            }
        }
    }

    #[test]
    fn test_quorum_router_is_total() {
        let depth = DepthConfig::deep();
        let router = EvidenceQuorumRouter::new(depth, "plan", "build_causal_graph");
        let targets = router.targets();
        for loops in 0..depth.max_iterations + 5 {
            // With and without any hypotheses on record.
            for seed_hypotheses in [false, true] {
                let mut state = ResearchState::new(Arc::new(causal_schema()), "q");
                with_loop_count(&mut state, loops);
                if seed_hypotheses {
                    state
                        .merge(
                            "validate_hypotheses",
                            &StatePatch::new().set(
                                keys::HYPOTHESES,
                                json!([Hypothesis {
                                    id: "h1".into(),
                                    statement: "a".into(),
                                    strength: EvidenceStrength::None,
                                }]),
                            ),
                        )
                        .unwrap();
                }
                let RouteTarget::Next(chosen) = router.decide(&state) else {
                    panic!("router must route to a node");
                };
                assert!(targets.contains(&chosen));
                if loops >= depth.max_iterations {
                    assert_eq!(chosen, "build_causal_graph");
                }
            }
        }
    }

    #[test]
    fn test_reflection_outranks_sufficient_evaluation() {
        let router = ReflectionRouter::new(DepthConfig::standard(), "plan", "synthesize");
        let mut state = base_state();
        with_loop_count(&mut state, 1);
        state
            .merge(
                "evaluate",
                &StatePatch::new()
                    .set(
                        keys::EVALUATION,
                        json!({"sufficient": true, "missing": [], "reasoning": ""}),
                    )
                    .set(
                        keys::REFLECTION,
                        json!({"should_continue_research": true, "gaps": ["pricing"]}),
                    ),
            )
            .unwrap();
        assert_eq!(router.decide(&state), RouteTarget::next("plan"));
    }

    #[test]
    fn test_ceiling_outranks_reflection() {
        let depth = DepthConfig::standard();
        let router = ReflectionRouter::new(depth, "plan", "synthesize");
        let mut state = base_state();
        with_loop_count(&mut state, depth.max_iterations);
        state
            .merge(
                "reflect",
                &StatePatch::new().set(
                    keys::REFLECTION,
                    json!({"should_continue_research": true, "gaps": []}),
                ),
            )
            .unwrap();
        assert_eq!(router.decide(&state), RouteTarget::next("synthesize"));
    }

    #[test]
    fn test_quorum_router_exits_early_on_quorum() {
        let router =
            EvidenceQuorumRouter::new(DepthConfig::deep(), "plan", "build_causal_graph");
        let mut state = ResearchState::new(Arc::new(causal_schema()), "q");
        with_loop_count(&mut state, 1);
        let hypotheses = vec![
            Hypothesis {
                id: "h1".into(),
                statement: "a".into(),
                strength: EvidenceStrength::Strong,
            },
            Hypothesis {
                id: "h2".into(),
                statement: "b".into(),
                strength: EvidenceStrength::Weak,
            },
        ];
        state
            .merge(
                "validate_hypotheses",
                &StatePatch::new().set(keys::HYPOTHESES, json!(hypotheses)),
            )
            .unwrap();
        // 1 of 2 supported meets the 0.5 quorum before the iteration floor.
        assert_eq!(router.decide(&state), RouteTarget::next("build_causal_graph"));
    }

    #[test]
    fn test_quorum_router_iteration_floor() {
        let depth = DepthConfig::deep();
        let router = EvidenceQuorumRouter::new(depth, "plan", "build_causal_graph");
        let mut state = ResearchState::new(Arc::new(causal_schema()), "q");

        with_loop_count(&mut state, 1);
        assert_eq!(router.decide(&state), RouteTarget::next("plan"));

        with_loop_count(&mut state, depth.causal_min_iterations);
        assert_eq!(router.decide(&state), RouteTarget::next("build_causal_graph"));
    }

    #[test]
    fn test_pending_subtasks_router() {
        let router = PendingSubtasksRouter::new("subtask_execute", "synthesize_hierarchical");
        let mut state = ResearchState::new(Arc::new(deep_schema()), "q");
        state
            .merge(
                "master_plan",
                &StatePatch::new().set(keys::PENDING_SUBTASKS, json!(["st-1"])),
            )
            .unwrap();
        assert_eq!(router.decide(&state), RouteTarget::next("subtask_execute"));

        state
            .merge(
                "subtask_execute",
                &StatePatch::new().set(keys::PENDING_SUBTASKS, json!([])),
            )
            .unwrap();
        assert_eq!(
            router.decide(&state),
            RouteTarget::next("synthesize_hierarchical")
        );
    }

    #[test]
    fn test_mode_router_defaults_to_simple() {
        let router = ModeRouter::new("plan", "subtask_execute");
        let state = ResearchState::new(Arc::new(deep_schema()), "q");
        assert_eq!(router.decide(&state), RouteTarget::next("plan"));
    }
}
