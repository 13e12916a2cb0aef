//! Predicate pushdown.
//!
//! Filters shrink row counts, so evaluating them as close to the scans as
//! possible reduces everything downstream: join inputs, exchange volume,
//! aggregation state. Both rules here preserve semantics exactly; the engine
//! accepts them only when statistics show the earlier evaluation paying off.

use std::collections::{BTreeMap, BTreeSet};

use planopt_core::expr::Expr;
use planopt_core::plan::PlanNode;
use planopt_core::rule::{Rule, RuleContext};
use planopt_core::sym::Symbol;

/// Moves a filter below an adjacent projection by rewriting the predicate
/// through the projection's assignments.
pub struct PushFilterThroughProject;

impl Rule for PushFilterThroughProject {
    fn name(&self) -> &'static str {
        "PushFilterThroughProject"
    }

    fn apply(&self, node: &PlanNode, ctx: &mut RuleContext<'_>) -> Option<PlanNode> {
        let PlanNode::Filter { child, predicate, .. } = node else {
            return None;
        };
        let PlanNode::Project {
            id: project_id,
            child: inner,
            assignments,
        } = child.as_ref()
        else {
            return None;
        };
        let map: BTreeMap<Symbol, Expr> = assignments.iter().cloned().collect();
        if !predicate.symbols().iter().all(|s| map.contains_key(s)) {
            return None;
        }
        let pushed = predicate.substitute(&map);
        Some(PlanNode::Project {
            id: *project_id,
            child: Box::new(PlanNode::Filter {
                id: ctx.ids.next_id(),
                child: inner.clone(),
                predicate: pushed,
            }),
            assignments: assignments.clone(),
        })
    }
}

/// Splits a filter above a join and pushes single-sided conjuncts into the
/// join inputs. For inner joins both sides are eligible; for outer joins
/// only conjuncts over the preserved side may move.
pub struct PushFilterIntoJoin;

impl Rule for PushFilterIntoJoin {
    fn name(&self) -> &'static str {
        "PushFilterIntoJoin"
    }

    fn apply(&self, node: &PlanNode, ctx: &mut RuleContext<'_>) -> Option<PlanNode> {
        let PlanNode::Filter {
            id: filter_id,
            child,
            predicate,
        } = node
        else {
            return None;
        };
        let PlanNode::Join {
            id: join_id,
            join_type,
            left,
            right,
            criteria,
            residual,
            distribution,
        } = child.as_ref()
        else {
            return None;
        };
        let left_symbols: BTreeSet<Symbol> = left.output_symbols().into_iter().collect();
        let right_symbols: BTreeSet<Symbol> = right.output_symbols().into_iter().collect();

        let mut left_parts = vec![];
        let mut right_parts = vec![];
        let mut remaining = vec![];
        // A conjunct may only move below the join when its side's columns
        // are never null-extended, which happens whenever the opposite side
        // is preserved.
        for conjunct in predicate.conjuncts() {
            let used = conjunct.symbols();
            if used.iter().all(|s| left_symbols.contains(s)) && !join_type.preserves_right() {
                left_parts.push(conjunct.clone());
            } else if used.iter().all(|s| right_symbols.contains(s))
                && !join_type.preserves_left()
            {
                right_parts.push(conjunct.clone());
            } else {
                remaining.push(conjunct.clone());
            }
        }
        if left_parts.is_empty() && right_parts.is_empty() {
            return None;
        }

        let new_left = if left_parts.is_empty() {
            left.clone()
        } else {
            Box::new(PlanNode::Filter {
                id: ctx.ids.next_id(),
                child: left.clone(),
                predicate: Expr::and(left_parts),
            })
        };
        let new_right = if right_parts.is_empty() {
            right.clone()
        } else {
            Box::new(PlanNode::Filter {
                id: ctx.ids.next_id(),
                child: right.clone(),
                predicate: Expr::and(right_parts),
            })
        };
        let join = PlanNode::Join {
            id: *join_id,
            join_type: *join_type,
            left: new_left,
            right: new_right,
            criteria: criteria.clone(),
            residual: residual.clone(),
            distribution: *distribution,
        };
        if remaining.is_empty() {
            Some(join)
        } else {
            Some(PlanNode::Filter {
                id: *filter_id,
                child: Box::new(join),
                predicate: Expr::and(remaining),
            })
        }
    }
}
