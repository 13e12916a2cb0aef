//! Textual plan rendering.
//!
//! The renderer is the stable human-facing surface: two-space indentation,
//! one node per line, each annotated with its estimated row count. Output is
//! fully determined by the plan and statistics, so golden-text tests can
//! compare renderings byte for byte.

use crate::config::OptimizerConfig;
use crate::expr::Expr;
use crate::memo::Memo;
use crate::plan::{AggregateCall, PlanNode};
use crate::stats::StatsProvider;

/// Renders a plan tree with row-count annotations.
pub fn render_plan(
    plan: &PlanNode,
    provider: &dyn StatsProvider,
    config: &OptimizerConfig,
) -> String {
    let mut memo = Memo::new();
    let mut out = String::new();
    render_node(plan, provider, config, &mut memo, 0, &mut out);
    out
}

fn render_node(
    node: &PlanNode,
    provider: &dyn StatsProvider,
    config: &OptimizerConfig,
    memo: &mut Memo,
    depth: usize,
    out: &mut String,
) {
    let group = memo.intern(node, provider, config);
    let rows = memo.group(group).stats.row_count;
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&format!("{} rows={rows}\n", node_label(node)));
    for child in node.children() {
        render_node(child, provider, config, memo, depth + 1, out);
    }
}

fn node_label(node: &PlanNode) -> String {
    match node {
        PlanNode::TableScan { table, .. } => format!("TableScan[{table}]"),
        PlanNode::Filter { predicate, .. } => format!("Filter[{predicate}]"),
        PlanNode::Project { assignments, .. } => {
            let parts: Vec<String> = assignments
                .iter()
                .map(|(target, expr)| match expr {
                    Expr::Symbol(s) if s == target => target.to_string(),
                    _ => format!("{target} := {expr}"),
                })
                .collect();
            format!("Project[{}]", parts.join(", "))
        }
        PlanNode::Join {
            join_type,
            criteria,
            distribution,
            ..
        } => {
            let mut parts = vec![join_type.to_string()];
            if let Some(d) = distribution {
                parts.push(d.to_string());
            }
            parts.extend(criteria.iter().map(|c| c.to_string()));
            format!("Join[{}]", parts.join(", "))
        }
        PlanNode::Aggregate {
            group_keys,
            aggregates,
            ..
        } => {
            let mut parts: Vec<String> = group_keys.iter().map(|s| s.to_string()).collect();
            parts.extend(aggregates.iter().map(render_aggregate));
            format!("Aggregate[{}]", parts.join(", "))
        }
        PlanNode::Sort { order_by, .. } => {
            let keys: Vec<String> = order_by.iter().map(|s| s.to_string()).collect();
            format!("Sort[{}]", keys.join(", "))
        }
        PlanNode::Limit { count, .. } => format!("Limit[{count}]"),
        PlanNode::Exchange { kind, .. } => format!("Exchange[{kind}]"),
        PlanNode::Values { rows, .. } => format!("Values[{} rows]", rows.len()),
        PlanNode::Union { .. } => "Union".to_string(),
    }
}

fn render_aggregate(call: &AggregateCall) -> String {
    match &call.input {
        Some(input) => format!("{} := {}({input})", call.output, call.function),
        None => format!("{} := {}(*)", call.output, call.function),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::TableHandle;
    use crate::properties::Distribution;
    use crate::stats::{Estimate, InMemoryStatsProvider, TableStatistics};
    use crate::sym::{PlanNodeId, Symbol};

    #[test]
    fn renders_scan_with_known_and_unknown_rows() {
        let provider = InMemoryStatsProvider::new()
            .with_table(
                TableHandle::new("tpch", "orders"),
                TableStatistics {
                    row_count: Estimate::known(15_000.0),
                    columns: Default::default(),
                },
            )
            .with_table(
                TableHandle::new("tpch", "events"),
                TableStatistics {
                    row_count: Estimate::Unknown,
                    columns: Default::default(),
                },
            );
        let config = OptimizerConfig::default();
        let known = PlanNode::TableScan {
            id: PlanNodeId(0),
            table: TableHandle::new("tpch", "orders"),
            outputs: vec![Symbol::bigint("orderkey")],
            partitioning: Distribution::Arbitrary,
        };
        assert_eq!(
            render_plan(&known, &provider, &config),
            "TableScan[tpch.orders] rows=15000\n"
        );
        let unknown = PlanNode::TableScan {
            id: PlanNodeId(1),
            table: TableHandle::new("tpch", "events"),
            outputs: vec![Symbol::bigint("x")],
            partitioning: Distribution::Arbitrary,
        };
        assert_eq!(
            render_plan(&unknown, &provider, &config),
            "TableScan[tpch.events] rows=?\n"
        );
        // Tables absent from the catalog pick up the configured default.
        let absent = PlanNode::TableScan {
            id: PlanNodeId(2),
            table: TableHandle::new("tpch", "missing"),
            outputs: vec![Symbol::bigint("x")],
            partitioning: Distribution::Arbitrary,
        };
        assert_eq!(
            render_plan(&absent, &provider, &config),
            "TableScan[tpch.missing] rows=1000\n"
        );
    }

    #[test]
    fn rendering_is_stable_across_runs() {
        let provider = InMemoryStatsProvider::new();
        let config = OptimizerConfig::default();
        let plan = PlanNode::Limit {
            id: PlanNodeId(1),
            child: Box::new(PlanNode::TableScan {
                id: PlanNodeId(0),
                table: TableHandle::new("t", "a"),
                outputs: vec![Symbol::bigint("x")],
                partitioning: Distribution::Arbitrary,
            }),
            count: 10,
        };
        let a = render_plan(&plan, &provider, &config);
        let b = render_plan(&plan, &provider, &config);
        assert_eq!(a, b);
        assert!(a.starts_with("Limit[10] rows=10\n  TableScan[t.a] rows=1000"));
    }
}
