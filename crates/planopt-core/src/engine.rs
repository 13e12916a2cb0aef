//! The rewrite engine.
//!
//! Repeats top-down rule application until no rule improves the plan or the
//! pass cap is hit, then hands the result to the exchange enforcer. The
//! engine itself holds no mutable state between runs; a single `Optimizer`
//! can serve concurrent optimizations, each with its own memo and trace.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::config::OptimizerConfig;
use crate::cost::Cost;
use crate::enforcer::add_exchanges;
use crate::error::OptimizeError;
use crate::memo::Memo;
use crate::plan::PlanNode;
use crate::rule::{Rule, RuleContext};
use crate::stats::StatsProvider;
use crate::sym::PlanNodeIdAllocator;
use crate::trace::{OptimizerTrace, TraceEvent};

/// Cooperative cancellation flag, checked between passes. Cancelling mid-run
/// abandons the run; the caller keeps its original plan.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of a successful optimization.
#[derive(Debug)]
pub struct OptimizedPlan {
    pub plan: PlanNode,
    pub cost: Cost,
    pub trace: OptimizerTrace,
}

pub struct Optimizer {
    config: OptimizerConfig,
    rules: Vec<Box<dyn Rule>>,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig, rules: Vec<Box<dyn Rule>>) -> Self {
        Optimizer { config, rules }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Runs the full pipeline: validation, rule rewriting to fixpoint, then
    /// exchange placement.
    pub fn optimize(
        &self,
        plan: PlanNode,
        provider: &dyn StatsProvider,
        token: &CancellationToken,
    ) -> Result<OptimizedPlan, OptimizeError> {
        plan.validate()?;
        let mut memo = Memo::new();
        let mut ids = PlanNodeIdAllocator::resume_after(plan.max_id());
        let mut trace = OptimizerTrace::new();
        let mut current = plan;

        for pass in 1..=self.config.max_passes {
            if token.is_cancelled() {
                return Err(OptimizeError::Cancelled);
            }
            let mut ctx = RuleContext {
                memo: &mut memo,
                provider,
                config: &self.config,
                ids: &mut ids,
                trace: &mut trace,
            };
            let (next, changed) = self.rewrite(current, &mut ctx);
            current = next;
            let root_cost = ctx.cost(&current);
            ctx.trace.record(TraceEvent::PassComplete { pass, root_cost });
            debug!(pass, ?root_cost, changed, "rewrite pass finished");
            if !changed {
                break;
            }
            if pass == self.config.max_passes {
                trace.record(TraceEvent::IterationCapReached { passes: pass });
                debug!(passes = pass, "pass cap reached before convergence");
            }
        }

        let enforced = add_exchanges(current, &mut ids);
        let group = memo.intern(&enforced, provider, &self.config);
        let cost = memo.group(group).cost;
        Ok(OptimizedPlan {
            plan: enforced,
            cost,
            trace,
        })
    }

    /// Applies rules at this node until none fires, then recurses into the
    /// children. Each (subtree shape, rule) pair is attempted at most once
    /// per run; accepted rewrites must be strictly cheaper, so the loop
    /// terminates.
    fn rewrite(&self, node: PlanNode, ctx: &mut RuleContext<'_>) -> (PlanNode, bool) {
        let mut node = node;
        let mut changed = false;
        'rules: loop {
            let group = ctx.memo.intern(&node, ctx.provider, ctx.config);
            for rule in &self.rules {
                if ctx.memo.rule_applied(group, rule.name()) {
                    continue;
                }
                ctx.memo.mark_rule_applied(group, rule.name());
                let Some(candidate) = rule.apply(&node, ctx) else {
                    continue;
                };
                if ctx.is_improvement(&candidate, &node) {
                    debug!(rule = rule.name(), node = %node.id(), "rewrite accepted");
                    ctx.trace.record(TraceEvent::RuleFired {
                        rule: rule.name().to_string(),
                        node: node.id(),
                    });
                    node = candidate;
                    changed = true;
                    continue 'rules;
                }
            }
            break;
        }
        let mut child_changed = false;
        let node = node.map_children(&mut |child| {
            let (rewritten, c) = self.rewrite(child, ctx);
            child_changed |= c;
            rewritten
        });
        (node, changed || child_changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::TableHandle;
    use crate::properties::Distribution;
    use crate::stats::InMemoryStatsProvider;
    use crate::sym::{PlanNodeId, Symbol};

    fn scan() -> PlanNode {
        PlanNode::TableScan {
            id: PlanNodeId(0),
            table: TableHandle::new("t", "orders"),
            outputs: vec![Symbol::bigint("orderkey")],
            partitioning: Distribution::Arbitrary,
        }
    }

    #[test]
    fn cancelled_token_aborts_before_any_pass() {
        let optimizer = Optimizer::new(OptimizerConfig::default(), vec![]);
        let token = CancellationToken::new();
        token.cancel();
        let result = optimizer.optimize(scan(), &InMemoryStatsProvider::new(), &token);
        assert!(matches!(result, Err(OptimizeError::Cancelled)));
    }

    #[test]
    fn rule_free_run_still_enforces_root_gather() {
        let optimizer = Optimizer::new(OptimizerConfig::default(), vec![]);
        let result = optimizer
            .optimize(scan(), &InMemoryStatsProvider::new(), &CancellationToken::new())
            .unwrap();
        assert!(matches!(result.plan, PlanNode::Exchange { .. }));
        assert_eq!(result.trace.rules_fired().len(), 0);
    }
}
