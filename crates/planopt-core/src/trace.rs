//! Optimization trace.
//!
//! A flat event log the engine appends to as it works. Serializable so the
//! HTTP service can return it alongside the optimized plan, and inspectable
//! in tests to assert which rules fired.

use serde::{Deserialize, Serialize};

use crate::cost::Cost;
use crate::sym::PlanNodeId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum TraceEvent {
    /// A rule produced a strictly cheaper alternative that was accepted.
    RuleFired { rule: String, node: PlanNodeId },
    /// A full top-down pass finished without hitting the pass cap.
    PassComplete { pass: usize, root_cost: Cost },
    /// The pass cap was reached before rewriting converged.
    IterationCapReached { passes: usize },
    /// A join cluster was too large for exhaustive ordering and was ordered
    /// greedily instead.
    JoinEnumerationFallback { relations: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerTrace {
    pub events: Vec<TraceEvent>,
}

impl OptimizerTrace {
    pub fn new() -> Self {
        OptimizerTrace::default()
    }

    pub fn record(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn rules_fired(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TraceEvent::RuleFired { rule, .. } => Some(rule.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn fell_back_to_greedy(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, TraceEvent::JoinEnumerationFallback { .. }))
    }
}
