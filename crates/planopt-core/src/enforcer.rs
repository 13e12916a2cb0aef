//! Exchange placement.
//!
//! Runs after cost-based rewriting. Walks the plan bottom-up, tracking the
//! distribution each subtree actually delivers, and inserts the minimal
//! `Exchange` wherever a parent's requirement is not already met. Running
//! the pass again on its own output inserts nothing, because every exchange
//! it placed now delivers exactly the distribution that was missing.

use crate::plan::{ExchangeKind, JoinDistribution, PlanNode};
use crate::properties::Distribution;
use crate::sym::PlanNodeIdAllocator;

/// Inserts the exchanges a distributed execution of `plan` needs, gathering
/// the final result onto a single node.
pub fn add_exchanges(plan: PlanNode, ids: &mut PlanNodeIdAllocator) -> PlanNode {
    let (node, delivered) = enforce(plan, ids);
    let (rooted, _) = ensure(node, delivered, Distribution::Single, ids);
    rooted
}

/// Wraps `node` in an exchange when `delivered` does not satisfy `required`.
fn ensure(
    node: PlanNode,
    delivered: Distribution,
    required: Distribution,
    ids: &mut PlanNodeIdAllocator,
) -> (PlanNode, Distribution) {
    if delivered.satisfies(&required) {
        return (node, delivered);
    }
    let kind = match &required {
        Distribution::Single => ExchangeKind::Single,
        Distribution::HashPartitioned(keys) => ExchangeKind::Hash(keys.clone()),
        Distribution::Replicated => ExchangeKind::Broadcast,
        Distribution::Arbitrary => return (node, delivered),
    };
    let wrapped = PlanNode::Exchange {
        id: ids.next_id(),
        child: Box::new(node),
        kind,
    };
    (wrapped, required)
}

fn enforce(node: PlanNode, ids: &mut PlanNodeIdAllocator) -> (PlanNode, Distribution) {
    match node {
        PlanNode::TableScan {
            id,
            table,
            outputs,
            partitioning,
        } => {
            let delivered = partitioning.clone();
            (
                PlanNode::TableScan {
                    id,
                    table,
                    outputs,
                    partitioning,
                },
                delivered,
            )
        }
        PlanNode::Filter {
            id,
            child,
            predicate,
        } => {
            let (child, delivered) = enforce(*child, ids);
            (
                PlanNode::Filter {
                    id,
                    child: Box::new(child),
                    predicate,
                },
                delivered,
            )
        }
        PlanNode::Project {
            id,
            child,
            assignments,
        } => {
            let (child, delivered) = enforce(*child, ids);
            (
                PlanNode::Project {
                    id,
                    child: Box::new(child),
                    assignments,
                },
                delivered,
            )
        }
        PlanNode::Join {
            id,
            join_type,
            left,
            right,
            criteria,
            residual,
            distribution,
        } => {
            let (left, left_delivered) = enforce(*left, ids);
            let (right, right_delivered) = enforce(*right, ids);
            // Broadcast is only ever chosen by the enumerator, which checks
            // the build-side size against the threshold; a join that reaches
            // enforcement undecided repartitions.
            let strategy = distribution.unwrap_or(JoinDistribution::Partitioned);
            let (left, right, delivered) = match strategy {
                JoinDistribution::Broadcast => {
                    // Probe side stays put; the build side is replicated to
                    // wherever probe rows already live.
                    let (right, _) =
                        ensure(right, right_delivered, Distribution::Replicated, ids);
                    (left, right, left_delivered)
                }
                JoinDistribution::Partitioned if criteria.is_empty() => {
                    // No keys to partition on; both sides gather instead.
                    let (left, left_delivered) =
                        ensure(left, left_delivered, Distribution::Single, ids);
                    let (right, _) = ensure(right, right_delivered, Distribution::Single, ids);
                    (left, right, left_delivered)
                }
                JoinDistribution::Partitioned => {
                    let left_keys: Vec<_> = criteria.iter().map(|c| c.left.clone()).collect();
                    let right_keys: Vec<_> = criteria.iter().map(|c| c.right.clone()).collect();
                    let (left, left_delivered) = ensure(
                        left,
                        left_delivered,
                        Distribution::HashPartitioned(left_keys),
                        ids,
                    );
                    let (right, _) = ensure(
                        right,
                        right_delivered,
                        Distribution::HashPartitioned(right_keys),
                        ids,
                    );
                    (left, right, left_delivered)
                }
            };
            (
                PlanNode::Join {
                    id,
                    join_type,
                    left: Box::new(left),
                    right: Box::new(right),
                    criteria,
                    residual,
                    distribution: Some(strategy),
                },
                delivered,
            )
        }
        PlanNode::Aggregate {
            id,
            child,
            group_keys,
            aggregates,
        } => {
            let (child, delivered) = enforce(*child, ids);
            let required = if group_keys.is_empty() {
                Distribution::Single
            } else {
                Distribution::HashPartitioned(group_keys.clone())
            };
            let (child, delivered) = ensure(child, delivered, required, ids);
            (
                PlanNode::Aggregate {
                    id,
                    child: Box::new(child),
                    group_keys,
                    aggregates,
                },
                delivered,
            )
        }
        PlanNode::Sort { id, child, order_by } => {
            let (child, delivered) = enforce(*child, ids);
            let (child, delivered) = ensure(child, delivered, Distribution::Single, ids);
            (
                PlanNode::Sort {
                    id,
                    child: Box::new(child),
                    order_by,
                },
                delivered,
            )
        }
        PlanNode::Limit { id, child, count } => {
            let (child, delivered) = enforce(*child, ids);
            let (child, delivered) = ensure(child, delivered, Distribution::Single, ids);
            (
                PlanNode::Limit {
                    id,
                    child: Box::new(child),
                    count,
                },
                delivered,
            )
        }
        PlanNode::Exchange { id, child, kind } => {
            let (child, _) = enforce(*child, ids);
            let delivered = kind.output_distribution();
            (
                PlanNode::Exchange {
                    id,
                    child: Box::new(child),
                    kind,
                },
                delivered,
            )
        }
        values @ PlanNode::Values { .. } => (values, Distribution::Single),
        PlanNode::Union {
            id,
            children,
            outputs,
        } => {
            let children = children
                .into_iter()
                .map(|c| enforce(c, ids).0)
                .collect();
            (
                PlanNode::Union {
                    id,
                    children,
                    outputs,
                },
                Distribution::Arbitrary,
            )
        }
    }
}
