//! Cost-based join ordering.
//!
//! Flattens a maximal cluster of inner joins (looking through intermediate
//! filters) into a set of relations and equi-join edges, then searches for
//! the cheapest join tree. Clusters up to the configured threshold are
//! ordered by exhaustive dynamic programming over relation subsets; larger
//! clusters fall back to a greedy heuristic that grows the tree one cheapest
//! extension at a time.
//!
//! Every join the enumerator builds also picks its physical strategy: sides
//! already partitioned on their join keys stay put, otherwise the build side
//! is broadcast when its estimated size is known and under the broadcast
//! threshold, and repartitioned in every remaining case. A build side of
//! unknown size is never broadcast.

use std::cmp::Ordering;

use tracing::debug;

use planopt_core::cost;
use planopt_core::expr::Expr;
use planopt_core::plan::{EquiJoinClause, JoinDistribution, JoinType, PlanNode};
use planopt_core::properties::Distribution;
use planopt_core::rule::{Rule, RuleContext};
use planopt_core::stats::Estimate;
use planopt_core::sym::Symbol;
use planopt_core::trace::TraceEvent;

pub struct ReorderJoins;

/// An equi-join edge between two relations of a flattened cluster.
struct Edge {
    a: usize,
    a_sym: Symbol,
    b: usize,
    b_sym: Symbol,
}

#[derive(Default)]
struct Cluster {
    relations: Vec<PlanNode>,
    clauses: Vec<EquiJoinClause>,
    residuals: Vec<Expr>,
}

impl Rule for ReorderJoins {
    fn name(&self) -> &'static str {
        "ReorderJoins"
    }

    fn apply(&self, node: &PlanNode, ctx: &mut RuleContext<'_>) -> Option<PlanNode> {
        if !matches!(
            node,
            PlanNode::Join {
                join_type: JoinType::Inner,
                ..
            }
        ) {
            return None;
        }
        let mut cluster = Cluster::default();
        flatten(node, &mut cluster);
        let n = cluster.relations.len();
        if n < 2 {
            return None;
        }
        let edges = resolve_edges(&cluster)?;

        let ordered = if n <= ctx.config.join_reorder_dp_threshold {
            enumerate_exhaustive(&cluster.relations, &edges, ctx)?
        } else {
            debug!(relations = n, "join cluster too large, ordering greedily");
            ctx.trace
                .record(TraceEvent::JoinEnumerationFallback { relations: n });
            enumerate_greedy(&cluster.relations, &edges, ctx)?
        };

        if cluster.residuals.is_empty() {
            Some(ordered)
        } else {
            Some(PlanNode::Filter {
                id: ctx.ids.next_id(),
                child: Box::new(ordered),
                predicate: Expr::and(cluster.residuals),
            })
        }
    }
}

/// Collects relations, equi-join clauses, and leftover predicates from a
/// tree of inner joins and filters. Anything else becomes a leaf relation.
fn flatten(node: &PlanNode, cluster: &mut Cluster) {
    match node {
        PlanNode::Join {
            join_type: JoinType::Inner,
            left,
            right,
            criteria,
            residual,
            ..
        } => {
            flatten(left, cluster);
            flatten(right, cluster);
            cluster.clauses.extend(criteria.iter().cloned());
            if let Some(residual) = residual {
                cluster
                    .residuals
                    .extend(residual.conjuncts().into_iter().cloned());
            }
        }
        // Filters over the join cluster itself are hoisted into residuals;
        // a filter sitting directly on a leaf stays glued to its relation.
        PlanNode::Filter { child, predicate, .. }
            if matches!(
                child.as_ref(),
                PlanNode::Join {
                    join_type: JoinType::Inner,
                    ..
                } | PlanNode::Filter { .. }
            ) =>
        {
            flatten(child, cluster);
            cluster
                .residuals
                .extend(predicate.conjuncts().into_iter().cloned());
        }
        other => cluster.relations.push(other.clone()),
    }
}

/// Maps each clause to the pair of relations owning its symbols. Bails when
/// a symbol is produced by zero or several relations, because reordering
/// would then be ambiguous.
fn resolve_edges(cluster: &Cluster) -> Option<Vec<Edge>> {
    let owner = |sym: &Symbol| -> Option<usize> {
        let mut found = None;
        for (i, rel) in cluster.relations.iter().enumerate() {
            if rel.output_symbols().contains(sym) {
                if found.is_some() {
                    return None;
                }
                found = Some(i);
            }
        }
        found
    };
    cluster
        .clauses
        .iter()
        .map(|clause| {
            let a = owner(&clause.left)?;
            let b = owner(&clause.right)?;
            Some(Edge {
                a,
                a_sym: clause.left.clone(),
                b,
                b_sym: clause.right.clone(),
            })
        })
        .collect()
}

/// Equi-join clauses connecting `probe_set` to `build_set`, oriented so the
/// left symbol comes from the probe side.
fn crossing_clauses(edges: &[Edge], probe_set: usize, build_set: usize) -> Vec<EquiJoinClause> {
    let mut clauses = vec![];
    for edge in edges {
        let (a_bit, b_bit) = (1usize << edge.a, 1usize << edge.b);
        if a_bit & probe_set != 0 && b_bit & build_set != 0 {
            clauses.push(EquiJoinClause {
                left: edge.a_sym.clone(),
                right: edge.b_sym.clone(),
            });
        } else if b_bit & probe_set != 0 && a_bit & build_set != 0 {
            clauses.push(EquiJoinClause {
                left: edge.b_sym.clone(),
                right: edge.a_sym.clone(),
            });
        }
    }
    clauses
}

/// Builds a join with its physical strategy chosen from the inputs. Sides
/// already co-located on the join keys partition for free; otherwise the
/// build side is broadcast when its size is known and under the threshold.
fn make_join(
    probe: PlanNode,
    build: PlanNode,
    criteria: Vec<EquiJoinClause>,
    ctx: &mut RuleContext<'_>,
) -> PlanNode {
    let colocated = !criteria.is_empty()
        && probe.delivered_distribution().satisfies(&Distribution::HashPartitioned(
            criteria.iter().map(|c| c.left.clone()).collect(),
        ))
        && build.delivered_distribution().satisfies(&Distribution::HashPartitioned(
            criteria.iter().map(|c| c.right.clone()).collect(),
        ));
    let build_stats = ctx.statistics(&build);
    let build_size = build_stats.data_size(&build.output_symbols(), ctx.config);
    let strategy = if colocated {
        JoinDistribution::Partitioned
    } else {
        match build_size {
            Estimate::Known(bytes) if bytes < ctx.config.broadcast_join_threshold_bytes => {
                JoinDistribution::Broadcast
            }
            _ => JoinDistribution::Partitioned,
        }
    };
    PlanNode::Join {
        id: ctx.ids.next_id(),
        join_type: JoinType::Inner,
        left: Box::new(probe),
        right: Box::new(build),
        criteria,
        residual: None,
        distribution: Some(strategy),
    }
}

/// Whether `candidate` beats `incumbent` strictly. Ties go to the incumbent,
/// so enumeration order fully determines the winner.
fn strictly_cheaper(
    candidate: &PlanNode,
    incumbent: &PlanNode,
    ctx: &mut RuleContext<'_>,
) -> bool {
    let candidate_cost = ctx.cost(candidate);
    let incumbent_cost = ctx.cost(incumbent);
    cost::compare_with_tiebreak(
        &candidate_cost,
        candidate.node_count(),
        &incumbent_cost,
        incumbent.node_count(),
    ) == Ordering::Less
}

/// Dynamic programming over relation subsets. `best[mask]` holds the
/// cheapest tree joining exactly the relations in `mask`; each mask is
/// built by splitting into a probe submask and a build complement.
fn enumerate_exhaustive(
    relations: &[PlanNode],
    edges: &[Edge],
    ctx: &mut RuleContext<'_>,
) -> Option<PlanNode> {
    let n = relations.len();
    let full = (1usize << n) - 1;
    let mut best: Vec<Option<PlanNode>> = vec![None; 1 << n];
    for (i, rel) in relations.iter().enumerate() {
        best[1 << i] = Some(rel.clone());
    }
    for mask in 1..=full {
        if mask.count_ones() < 2 {
            continue;
        }
        let mut cheapest: Option<PlanNode> = None;
        let mut sub = (mask - 1) & mask;
        while sub > 0 {
            let rest = mask & !sub;
            if let (Some(probe), Some(build)) = (best[sub].clone(), best[rest].clone()) {
                let criteria = crossing_clauses(edges, sub, rest);
                if !criteria.is_empty() || ctx.config.allow_cross_joins {
                    let candidate = make_join(probe, build, criteria, ctx);
                    let better = match &cheapest {
                        None => true,
                        Some(incumbent) => strictly_cheaper(&candidate, incumbent, ctx),
                    };
                    if better {
                        cheapest = Some(candidate);
                    }
                }
            }
            sub = (sub - 1) & mask;
        }
        best[mask] = cheapest;
    }
    best[full].take()
}

/// Greedy ordering for oversized clusters: start from the cheapest joinable
/// pair, then repeatedly attach the relation whose join onto the current
/// tree is cheapest. Relations are considered in index order, so equal-cost
/// choices resolve the same way every run.
fn enumerate_greedy(
    relations: &[PlanNode],
    edges: &[Edge],
    ctx: &mut RuleContext<'_>,
) -> Option<PlanNode> {
    let n = relations.len();
    let mut cheapest_pair: Option<(PlanNode, usize, usize)> = None;
    for i in 0..n {
        for j in (i + 1)..n {
            let criteria = crossing_clauses(edges, 1 << i, 1 << j);
            if criteria.is_empty() && !ctx.config.allow_cross_joins {
                continue;
            }
            let candidate = make_join(relations[i].clone(), relations[j].clone(), criteria, ctx);
            let better = match &cheapest_pair {
                None => true,
                Some((incumbent, _, _)) => strictly_cheaper(&candidate, incumbent, ctx),
            };
            if better {
                cheapest_pair = Some((candidate, i, j));
            }
        }
    }
    let (mut current, i, j) = cheapest_pair?;
    let mut joined = (1usize << i) | (1usize << j);

    while joined != (1usize << n) - 1 {
        let mut extension: Option<(PlanNode, usize)> = None;
        for (r, relation) in relations.iter().enumerate() {
            if joined & (1 << r) != 0 {
                continue;
            }
            let criteria = crossing_clauses(edges, joined, 1 << r);
            if criteria.is_empty() && !ctx.config.allow_cross_joins {
                continue;
            }
            let candidate = make_join(current.clone(), relation.clone(), criteria, ctx);
            let better = match &extension {
                None => true,
                Some((incumbent, _)) => strictly_cheaper(&candidate, incumbent, ctx),
            };
            if better {
                extension = Some((candidate, r));
            }
        }
        // A disconnected cluster cannot be completed without cross joins;
        // leave the original plan as-is.
        let (next, r) = extension?;
        current = next;
        joined |= 1 << r;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use planopt_core::expr::ScalarValue;
    use planopt_core::plan::TableHandle;
    use planopt_core::properties::Distribution;
    use planopt_core::sym::PlanNodeId;

    fn scan(id: u32, table: &str, col: &str) -> PlanNode {
        PlanNode::TableScan {
            id: PlanNodeId(id),
            table: TableHandle::new("t", table),
            outputs: vec![Symbol::bigint(col)],
            partitioning: Distribution::Arbitrary,
        }
    }

    fn inner_join(id: u32, left: PlanNode, right: PlanNode, l: &str, r: &str) -> PlanNode {
        PlanNode::Join {
            id: PlanNodeId(id),
            join_type: JoinType::Inner,
            left: Box::new(left),
            right: Box::new(right),
            criteria: vec![EquiJoinClause {
                left: Symbol::bigint(l),
                right: Symbol::bigint(r),
            }],
            residual: None,
            distribution: None,
        }
    }

    #[test]
    fn flatten_collects_relations_and_clauses() {
        let plan = inner_join(
            4,
            inner_join(3, scan(0, "a", "ka"), scan(1, "b", "kb"), "ka", "kb"),
            scan(2, "c", "kc"),
            "kb",
            "kc",
        );
        let mut cluster = Cluster::default();
        flatten(&plan, &mut cluster);
        assert_eq!(cluster.relations.len(), 3);
        assert_eq!(cluster.clauses.len(), 2);
        assert!(cluster.residuals.is_empty());
        assert!(resolve_edges(&cluster).is_some());
    }

    #[test]
    fn leaf_filters_stay_with_their_relation() {
        let filtered = PlanNode::Filter {
            id: PlanNodeId(5),
            child: Box::new(scan(0, "a", "ka")),
            predicate: Expr::eq(
                Expr::symbol(Symbol::bigint("ka")),
                Expr::literal(ScalarValue::Bigint(1)),
            ),
        };
        let plan = inner_join(4, filtered, scan(1, "b", "kb"), "ka", "kb");
        let mut cluster = Cluster::default();
        flatten(&plan, &mut cluster);
        assert_eq!(cluster.relations.len(), 2);
        assert!(matches!(cluster.relations[0], PlanNode::Filter { .. }));
        assert!(cluster.residuals.is_empty());
    }

    #[test]
    fn intermediate_filters_become_residuals() {
        let inner = inner_join(3, scan(0, "a", "ka"), scan(1, "b", "kb"), "ka", "kb");
        let filtered = PlanNode::Filter {
            id: PlanNodeId(5),
            child: Box::new(inner),
            predicate: Expr::eq(
                Expr::symbol(Symbol::bigint("ka")),
                Expr::symbol(Symbol::bigint("kb")),
            ),
        };
        let plan = inner_join(4, filtered, scan(2, "c", "kc"), "kb", "kc");
        let mut cluster = Cluster::default();
        flatten(&plan, &mut cluster);
        assert_eq!(cluster.relations.len(), 3);
        assert_eq!(cluster.residuals.len(), 1);
    }

    #[test]
    fn ambiguous_symbol_ownership_bails() {
        // Both relations output a symbol named "k".
        let plan = inner_join(2, scan(0, "a", "k"), scan(1, "b", "k"), "k", "k");
        let mut cluster = Cluster::default();
        flatten(&plan, &mut cluster);
        assert!(resolve_edges(&cluster).is_none());
    }
}
