//! Statistics derivation.
//!
//! Pure functions from a node plus its children's statistics to the node's
//! output statistics. Derivation never fails: when the inputs it needs are
//! missing it degrades to `Unknown` or to configured defaults, and the cost
//! model decides how to treat the gap.

use std::collections::BTreeMap;

use crate::config::OptimizerConfig;
use crate::expr::{ComparisonOp, Expr, ScalarValue};
use crate::plan::{EquiJoinClause, PlanNode, TableHandle};
use crate::stats::{Estimate, PlanStatistics, StatsProvider, SymbolStatistics};
use crate::sym::Symbol;

/// Derives output statistics for `node` given its children's statistics, in
/// child order.
pub fn derive_statistics(
    node: &PlanNode,
    child_stats: &[&PlanStatistics],
    provider: &dyn StatsProvider,
    config: &OptimizerConfig,
) -> PlanStatistics {
    match node {
        PlanNode::TableScan { table, outputs, .. } => {
            scan_statistics(table, outputs, provider, config)
        }
        PlanNode::Filter { predicate, .. } => {
            let input = child_stats[0];
            let selectivity = predicate_selectivity(predicate, input, config);
            scale_rows(input, selectivity)
        }
        PlanNode::Project { assignments, .. } => {
            let input = child_stats[0];
            let mut symbols = BTreeMap::new();
            for (target, expr) in assignments {
                symbols.insert(target.clone(), expression_statistics(expr, input));
            }
            PlanStatistics {
                row_count: input.row_count,
                symbols,
            }
        }
        PlanNode::Join {
            join_type,
            criteria,
            residual,
            ..
        } => {
            let left = child_stats[0];
            let right = child_stats[1];
            let mut stats = join_statistics(left, right, criteria);
            if let Some(residual) = residual {
                let selectivity = predicate_selectivity(residual, &stats, config);
                stats = scale_rows(&stats, selectivity);
            }
            // Preserved sides contribute their unmatched rows, so the output
            // can never fall below them.
            let mut floor = Estimate::known(0.0);
            if join_type.preserves_left() {
                floor = floor.max(left.row_count);
            }
            if join_type.preserves_right() {
                floor = floor.max(right.row_count);
            }
            stats.row_count = stats.row_count.max(floor);
            stats
        }
        PlanNode::Aggregate {
            group_keys,
            aggregates,
            ..
        } => {
            let input = child_stats[0];
            let row_count = group_count(group_keys, input);
            let mut symbols = BTreeMap::new();
            for key in group_keys {
                symbols.insert(key.clone(), input.symbol(key).cap_distinct(row_count));
            }
            for call in aggregates {
                symbols.insert(
                    call.output.clone(),
                    SymbolStatistics {
                        distinct_count: row_count,
                        null_fraction: Estimate::known(0.0),
                        avg_width: Estimate::known(8.0),
                    },
                );
            }
            PlanStatistics { row_count, symbols }
        }
        PlanNode::Sort { .. } | PlanNode::Exchange { .. } => child_stats[0].clone(),
        PlanNode::Limit { count, .. } => {
            let input = child_stats[0];
            let row_count = match input.row_count {
                Estimate::Known(rows) => Estimate::known(rows.min(*count as f64)),
                Estimate::Unknown => Estimate::known(*count as f64),
            };
            PlanStatistics {
                row_count,
                symbols: input
                    .symbols
                    .iter()
                    .map(|(s, st)| (s.clone(), st.cap_distinct(row_count)))
                    .collect(),
            }
        }
        PlanNode::Values { outputs, rows, .. } => {
            let row_count = Estimate::known(rows.len() as f64);
            PlanStatistics {
                row_count,
                symbols: outputs
                    .iter()
                    .map(|s| {
                        (
                            s.clone(),
                            SymbolStatistics {
                                distinct_count: row_count,
                                null_fraction: Estimate::known(0.0),
                                avg_width: Estimate::Unknown,
                            },
                        )
                    })
                    .collect(),
            }
        }
        PlanNode::Union { outputs, .. } => {
            let row_count = child_stats
                .iter()
                .map(|c| c.row_count)
                .fold(Estimate::known(0.0), Estimate::add);
            let symbols = outputs
                .iter()
                .map(|s| {
                    let summed = child_stats
                        .iter()
                        .map(|c| c.symbol(s).distinct_count)
                        .fold(Estimate::known(0.0), Estimate::add);
                    (
                        s.clone(),
                        SymbolStatistics {
                            distinct_count: summed.combine(row_count, f64::min),
                            null_fraction: Estimate::Unknown,
                            avg_width: Estimate::Unknown,
                        },
                    )
                })
                .collect();
            PlanStatistics { row_count, symbols }
        }
    }
}

/// Tables the provider knows nothing about get the configured default row
/// count with unknown column statistics, so optimization proceeds instead of
/// stalling on an entirely unknown subtree.
fn scan_statistics(
    table: &TableHandle,
    outputs: &[Symbol],
    provider: &dyn StatsProvider,
    config: &OptimizerConfig,
) -> PlanStatistics {
    match provider.table_statistics(table) {
        Some(ts) => {
            let symbols = outputs
                .iter()
                .map(|s| {
                    let col = ts.columns.get(&s.name).copied().unwrap_or_default();
                    (s.clone(), col.cap_distinct(ts.row_count))
                })
                .collect();
            PlanStatistics {
                row_count: ts.row_count,
                symbols,
            }
        }
        None => PlanStatistics {
            row_count: Estimate::known(config.default_row_count),
            symbols: BTreeMap::new(),
        },
    }
}

/// Scales row count by `selectivity` and caps per-symbol distinct counts at
/// the reduced row count. A selectivity of zero genuinely yields zero rows;
/// there is no floor of one row.
fn scale_rows(input: &PlanStatistics, selectivity: f64) -> PlanStatistics {
    let row_count = input.row_count.map(|rows| rows * selectivity);
    PlanStatistics {
        row_count,
        symbols: input
            .symbols
            .iter()
            .map(|(s, st)| (s.clone(), st.cap_distinct(row_count)))
            .collect(),
    }
}

/// Inner equi-join cardinality: `|L| * |R| / min-key NDV` per clause, on the
/// assumption that the smaller key domain is contained in the larger one.
/// The result is clamped to the cross-product upper bound.
fn join_statistics(
    left: &PlanStatistics,
    right: &PlanStatistics,
    criteria: &[EquiJoinClause],
) -> PlanStatistics {
    let cross = left.row_count.multiply(right.row_count);
    let mut row_count = cross;
    for clause in criteria {
        let ndv_left = left.symbol(&clause.left).distinct_count;
        let ndv_right = right.symbol(&clause.right).distinct_count;
        let ndv = ndv_left.min(ndv_right);
        row_count = row_count.combine(ndv, |rows, ndv| rows / ndv.max(1.0));
    }
    if let (Estimate::Known(rows), Estimate::Known(bound)) = (row_count, cross) {
        row_count = Estimate::known(rows.clamp(0.0, bound));
    }
    let mut symbols: BTreeMap<Symbol, SymbolStatistics> = BTreeMap::new();
    for (s, st) in left.symbols.iter().chain(right.symbols.iter()) {
        symbols.insert(s.clone(), st.cap_distinct(row_count));
    }
    PlanStatistics { row_count, symbols }
}

/// Estimated group count: product of group-key NDVs, capped at the input row
/// count. Any key with unknown NDV degrades the whole product to the input
/// row count, the worst case where every row is its own group.
fn group_count(group_keys: &[Symbol], input: &PlanStatistics) -> Estimate {
    if group_keys.is_empty() {
        return Estimate::known(1.0);
    }
    let mut product = Estimate::known(1.0);
    for key in group_keys {
        product = product.multiply(input.symbol(key).distinct_count);
    }
    match (product, input.row_count) {
        (Estimate::Known(groups), Estimate::Known(rows)) => Estimate::known(groups.min(rows)),
        (Estimate::Unknown, Estimate::Known(rows)) => Estimate::known(rows),
        (known, Estimate::Unknown) => known,
    }
}

/// Fraction of input rows a predicate retains, in [0, 1].
pub fn predicate_selectivity(
    predicate: &Expr,
    input: &PlanStatistics,
    config: &OptimizerConfig,
) -> f64 {
    let sel = match predicate {
        Expr::Literal(ScalarValue::Boolean(true)) => 1.0,
        Expr::Literal(ScalarValue::Boolean(false)) | Expr::Literal(ScalarValue::Null) => 0.0,
        Expr::Comparison { op, left, right } => {
            comparison_selectivity(*op, left, right, input, config)
        }
        Expr::And(parts) => parts
            .iter()
            .map(|p| predicate_selectivity(p, input, config))
            .product(),
        // Inclusion-exclusion, folded pairwise.
        Expr::Or(parts) => parts
            .iter()
            .map(|p| predicate_selectivity(p, input, config))
            .fold(0.0, |acc, s| acc + s - acc * s),
        Expr::Not(inner) => 1.0 - predicate_selectivity(inner, input, config),
        Expr::IsNull(inner) => match inner.as_ref() {
            Expr::Symbol(s) => input
                .symbol(s)
                .null_fraction
                .or(config.default_filter_selectivity),
            _ => config.default_filter_selectivity,
        },
        _ => config.default_filter_selectivity,
    };
    sel.clamp(0.0, 1.0)
}

fn comparison_selectivity(
    op: ComparisonOp,
    left: &Expr,
    right: &Expr,
    input: &PlanStatistics,
    config: &OptimizerConfig,
) -> f64 {
    // Only symbol-vs-literal comparisons are analyzable; everything else
    // falls back to the configured default.
    let symbol = match (left, right) {
        (Expr::Symbol(s), Expr::Literal(_)) | (Expr::Literal(_), Expr::Symbol(s)) => s,
        _ => return config.default_filter_selectivity,
    };
    match op {
        ComparisonOp::Eq => match input.symbol(symbol).distinct_count {
            Estimate::Known(ndv) if ndv >= 1.0 => 1.0 / ndv,
            _ => config.default_filter_selectivity,
        },
        ComparisonOp::NotEq => match input.symbol(symbol).distinct_count {
            Estimate::Known(ndv) if ndv >= 1.0 => 1.0 - 1.0 / ndv,
            _ => config.default_filter_selectivity,
        },
        ComparisonOp::Lt | ComparisonOp::LtEq | ComparisonOp::Gt | ComparisonOp::GtEq => 1.0 / 3.0,
    }
}

fn expression_statistics(expr: &Expr, input: &PlanStatistics) -> SymbolStatistics {
    match expr {
        Expr::Symbol(s) => input.symbol(s),
        Expr::Literal(ScalarValue::Null) => SymbolStatistics {
            distinct_count: Estimate::known(0.0),
            null_fraction: Estimate::known(1.0),
            avg_width: Estimate::known(1.0),
        },
        Expr::Literal(_) => SymbolStatistics {
            distinct_count: Estimate::known(1.0),
            null_fraction: Estimate::known(0.0),
            avg_width: Estimate::known(8.0),
        },
        _ => SymbolStatistics::default(),
    }
}
