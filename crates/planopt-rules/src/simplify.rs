//! Trivial predicate elimination and filter merging.

use planopt_core::expr::Expr;
use planopt_core::plan::PlanNode;
use planopt_core::rule::{Rule, RuleContext};

/// Removes filters whose predicate is literally `true`, and collapses
/// filters whose predicate is literally `false` to an empty `Values`.
pub struct RemoveTrivialFilter;

impl Rule for RemoveTrivialFilter {
    fn name(&self) -> &'static str {
        "RemoveTrivialFilter"
    }

    fn apply(&self, node: &PlanNode, ctx: &mut RuleContext<'_>) -> Option<PlanNode> {
        let PlanNode::Filter { child, predicate, .. } = node else {
            return None;
        };
        if predicate.is_true_literal() {
            return Some(child.as_ref().clone());
        }
        if predicate.is_false_literal() {
            return Some(PlanNode::Values {
                id: ctx.ids.next_id(),
                outputs: child.output_symbols(),
                rows: vec![],
            });
        }
        None
    }
}

/// Collapses a filter directly over another filter into one conjunction, so
/// the rows are scanned once. Pushdown rules routinely stack filters; this
/// cleans up after them.
pub struct MergeAdjacentFilters;

impl Rule for MergeAdjacentFilters {
    fn name(&self) -> &'static str {
        "MergeAdjacentFilters"
    }

    fn apply(&self, node: &PlanNode, _ctx: &mut RuleContext<'_>) -> Option<PlanNode> {
        let PlanNode::Filter { id, child, predicate } = node else {
            return None;
        };
        let PlanNode::Filter {
            child: inner,
            predicate: inner_predicate,
            ..
        } = child.as_ref()
        else {
            return None;
        };
        let merged = predicate
            .conjuncts()
            .into_iter()
            .chain(inner_predicate.conjuncts())
            .cloned()
            .collect();
        Some(PlanNode::Filter {
            id: *id,
            child: inner.clone(),
            predicate: Expr::and(merged),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planopt_core::config::OptimizerConfig;
    use planopt_core::expr::{Expr, ScalarValue};
    use planopt_core::memo::Memo;
    use planopt_core::plan::TableHandle;
    use planopt_core::properties::Distribution;
    use planopt_core::stats::InMemoryStatsProvider;
    use planopt_core::sym::{PlanNodeId, PlanNodeIdAllocator, Symbol};
    use planopt_core::trace::OptimizerTrace;

    fn filter_over_scan(predicate: Expr) -> PlanNode {
        PlanNode::Filter {
            id: PlanNodeId(1),
            child: Box::new(PlanNode::TableScan {
                id: PlanNodeId(0),
                table: TableHandle::new("t", "orders"),
                outputs: vec![Symbol::bigint("orderkey")],
                partitioning: Distribution::Arbitrary,
            }),
            predicate,
        }
    }

    #[test]
    fn true_filter_collapses_to_child() {
        let provider = InMemoryStatsProvider::new();
        let config = OptimizerConfig::default();
        let mut memo = Memo::new();
        let mut ids = PlanNodeIdAllocator::resume_after(PlanNodeId(1));
        let mut trace = OptimizerTrace::new();
        let mut ctx = RuleContext {
            memo: &mut memo,
            provider: &provider,
            config: &config,
            ids: &mut ids,
            trace: &mut trace,
        };
        let plan = filter_over_scan(Expr::literal(ScalarValue::Boolean(true)));
        let rewritten = RemoveTrivialFilter.apply(&plan, &mut ctx).unwrap();
        assert!(matches!(rewritten, PlanNode::TableScan { .. }));
    }

    #[test]
    fn false_filter_becomes_empty_values() {
        let provider = InMemoryStatsProvider::new();
        let config = OptimizerConfig::default();
        let mut memo = Memo::new();
        let mut ids = PlanNodeIdAllocator::resume_after(PlanNodeId(1));
        let mut trace = OptimizerTrace::new();
        let mut ctx = RuleContext {
            memo: &mut memo,
            provider: &provider,
            config: &config,
            ids: &mut ids,
            trace: &mut trace,
        };
        let plan = filter_over_scan(Expr::literal(ScalarValue::Boolean(false)));
        match RemoveTrivialFilter.apply(&plan, &mut ctx).unwrap() {
            PlanNode::Values { rows, outputs, .. } => {
                assert!(rows.is_empty());
                assert_eq!(outputs, vec![Symbol::bigint("orderkey")]);
            }
            other => panic!("expected Values, got {other:?}"),
        }
    }

    #[test]
    fn stacked_filters_merge_into_one_conjunction() {
        let provider = InMemoryStatsProvider::new();
        let config = OptimizerConfig::default();
        let mut memo = Memo::new();
        let mut ids = PlanNodeIdAllocator::resume_after(PlanNodeId(2));
        let mut trace = OptimizerTrace::new();
        let mut ctx = RuleContext {
            memo: &mut memo,
            provider: &provider,
            config: &config,
            ids: &mut ids,
            trace: &mut trace,
        };
        let upper = Expr::eq(
            Expr::symbol(Symbol::bigint("orderkey")),
            Expr::literal(ScalarValue::Bigint(1)),
        );
        let lower = Expr::eq(
            Expr::symbol(Symbol::bigint("orderkey")),
            Expr::literal(ScalarValue::Bigint(2)),
        );
        let plan = PlanNode::Filter {
            id: PlanNodeId(2),
            child: Box::new(filter_over_scan(lower.clone())),
            predicate: upper.clone(),
        };
        match MergeAdjacentFilters.apply(&plan, &mut ctx).unwrap() {
            PlanNode::Filter { child, predicate, .. } => {
                assert!(matches!(child.as_ref(), PlanNode::TableScan { .. }));
                assert_eq!(predicate, Expr::And(vec![upper, lower]));
            }
            other => panic!("expected Filter, got {other:?}"),
        }
    }

    #[test]
    fn nontrivial_filter_untouched() {
        let provider = InMemoryStatsProvider::new();
        let config = OptimizerConfig::default();
        let mut memo = Memo::new();
        let mut ids = PlanNodeIdAllocator::resume_after(PlanNodeId(1));
        let mut trace = OptimizerTrace::new();
        let mut ctx = RuleContext {
            memo: &mut memo,
            provider: &provider,
            config: &config,
            ids: &mut ids,
            trace: &mut trace,
        };
        let plan = filter_over_scan(Expr::eq(
            Expr::symbol(Symbol::bigint("orderkey")),
            Expr::literal(ScalarValue::Bigint(1)),
        ));
        assert!(RemoveTrivialFilter.apply(&plan, &mut ctx).is_none());
    }
}
