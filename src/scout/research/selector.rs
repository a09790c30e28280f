// SPDX-License-Identifier: MIT

//! Workflow auto-selection
//!
//! Keyword detectors applied in a fixed priority order; the first match
//! wins. Computational intent outranks causal, causal outranks
//! comparative, and so on down to the deep-research default, so a query
//! like "why does X perform better than Y" goes to causal analysis even
//! though it also compares.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::scout::research::workflows;

/// One detector in the priority chain
struct Detector {
    workflow: &'static str,
    reason: &'static str,
    matches: fn(&str) -> bool,
}

/// The chosen workflow and why, surfaced to CLI and API callers
#[derive(Debug, Clone, Serialize)]
pub struct SelectorDecision {
    pub workflow: String,
    pub reason: String,
}

fn any(query: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| query.contains(n))
}

fn computational(query: &str) -> bool {
    any(
        query,
        &[
            "calculate",
            "compute",
            "simulate",
            "benchmark",
            "algorithm",
            "big-o",
            "time complexity",
        ],
    )
}

fn causal(query: &str) -> bool {
    any(
        query,
        &["why does", "why is", "why are", "root cause", "caused by", "what causes"],
    )
}

fn comparative(query: &str) -> bool {
    any(
        query,
        &[" vs ", " versus ", "compare", "comparison", "difference between", "better than"],
    )
}

fn verification(query: &str) -> bool {
    any(
        query,
        &["is it true", "fact check", "fact-check", "verify that", "did really", "true that"],
    )
}

fn simple(query: &str) -> bool {
    query.split_whitespace().count() <= 8
        && any(
            query,
            &["what is", "who is", "when was", "when did", "where is", "define "],
        )
}

static DETECTORS: Lazy<Vec<Detector>> = Lazy::new(|| {
    vec![
        Detector {
            workflow: workflows::code_exec::NAME,
            reason: "query asks for computation or simulation",
            matches: computational,
        },
        Detector {
            workflow: workflows::causal::NAME,
            reason: "query asks for an explanation of a cause",
            matches: causal,
        },
        Detector {
            workflow: workflows::comparative::NAME,
            reason: "query compares entities",
            matches: comparative,
        },
        Detector {
            workflow: workflows::fact_check::NAME,
            reason: "query asks to verify a statement",
            matches: verification,
        },
        Detector {
            workflow: workflows::quick::NAME,
            reason: "short factual question",
            matches: simple,
        },
    ]
});

/// Pick a workflow for the query
pub fn select(query: &str) -> SelectorDecision {
    let lowered = query.to_lowercase();
    for detector in DETECTORS.iter() {
        if (detector.matches)(&lowered) {
            log::info!("Selected workflow '{}': {}", detector.workflow, detector.reason);
            return SelectorDecision {
                workflow: detector.workflow.to_string(),
                reason: detector.reason.to_string(),
            };
        }
    }
    SelectorDecision {
        workflow: workflows::deep::NAME.to_string(),
        reason: "no specialized pattern matched; defaulting to deep research".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_computational_outranks_everything() {
        let decision = select("Benchmark quicksort vs mergesort and explain why one wins");
        assert_eq!(decision.workflow, "code_research");
    }

    #[test]
    fn test_causal_outranks_comparative() {
        let decision = select("Why does React perform better than Vue?");
        assert_eq!(decision.workflow, "causal_research");
    }

    #[test]
    fn test_comparative() {
        let decision = select("PostgreSQL vs MySQL for analytics workloads");
        assert_eq!(decision.workflow, "comparative_research");
    }

    #[test]
    fn test_verification() {
        let decision = select("Is it true that Rust has no garbage collector?");
        assert_eq!(decision.workflow, "fact_check");
    }

    #[test]
    fn test_short_factual_goes_quick() {
        let decision = select("What is the capital of France?");
        assert_eq!(decision.workflow, "quick_research");
    }

    #[test]
    fn test_default_is_deep() {
        let decision = select(
            "Survey the current landscape of distributed consensus research and its open problems",
        );
        assert_eq!(decision.workflow, "deep_research");
    }
}
