//! The cost model.
//!
//! A cost is a vector of {cpu, memory, network} estimates. Comparison is
//! lexicographic with network dominating: moving bytes between workers is the
//! scarce resource in a distributed engine, so a plan that ships less data
//! wins regardless of local work. Unknown components compare worse than any
//! known value, which steers the optimizer toward plans it can actually
//! reason about.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::plan::{ExchangeKind, JoinDistribution, PlanNode};
use crate::properties::Distribution;
use crate::stats::{Estimate, PlanStatistics};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub cpu: Estimate,
    pub memory: Estimate,
    pub network: Estimate,
}

impl Cost {
    pub fn zero() -> Self {
        Cost {
            cpu: Estimate::known(0.0),
            memory: Estimate::known(0.0),
            network: Estimate::known(0.0),
        }
    }

    pub fn add(&self, other: &Cost) -> Cost {
        Cost {
            cpu: self.cpu.add(other.cpu),
            memory: self.memory.add(other.memory),
            network: self.network.add(other.network),
        }
    }
}

fn compare_component(a: Estimate, b: Estimate) -> Ordering {
    match (a, b) {
        (Estimate::Known(x), Estimate::Known(y)) => x.total_cmp(&y),
        (Estimate::Known(_), Estimate::Unknown) => Ordering::Less,
        (Estimate::Unknown, Estimate::Known(_)) => Ordering::Greater,
        (Estimate::Unknown, Estimate::Unknown) => Ordering::Equal,
    }
}

/// Total order over costs: network, then cpu, then memory.
pub fn compare(a: &Cost, b: &Cost) -> Ordering {
    compare_component(a.network, b.network)
        .then_with(|| compare_component(a.cpu, b.cpu))
        .then_with(|| compare_component(a.memory, b.memory))
}

/// Cost order with plan shape as the final tiebreak. Equal costs prefer the
/// plan with fewer nodes, which keeps the engine from oscillating between
/// cost-equivalent rewrites.
pub fn compare_with_tiebreak(
    a: &Cost,
    a_nodes: usize,
    b: &Cost,
    b_nodes: usize,
) -> Ordering {
    compare(a, b).then_with(|| a_nodes.cmp(&b_nodes))
}

fn data_size(node: &PlanNode, stats: &PlanStatistics, config: &OptimizerConfig) -> Estimate {
    stats.data_size(&node.output_symbols(), config)
}

/// Whether a join input already sits in the layout its strategy needs.
/// Covers both an explicit exchange below the join, whose node carries the
/// network charge itself, and data that is co-located without any exchange,
/// such as a scan natively partitioned on the join key. Either way the join
/// must not charge for movement that will not happen.
fn side_already_placed(child: &PlanNode, required: &Distribution) -> bool {
    child.delivered_distribution().satisfies(required)
}

/// Cost of executing `node` itself, excluding its subtree. Subtree cost is
/// the sum over nodes; the memo caches it per equivalence group.
pub fn node_cost(
    node: &PlanNode,
    node_stats: &PlanStatistics,
    child_stats: &[&PlanStatistics],
    config: &OptimizerConfig,
) -> Cost {
    let zero = Estimate::known(0.0);
    match node {
        PlanNode::TableScan { outputs, .. } => Cost {
            // Proportional to bytes read, so pruning unused columns pays.
            cpu: node_stats
                .data_size(outputs, config)
                .map(|bytes| bytes / config.default_column_width),
            memory: zero,
            network: zero,
        },
        PlanNode::Filter { .. } => Cost {
            cpu: child_stats[0].row_count,
            memory: zero,
            network: zero,
        },
        PlanNode::Project { .. } => Cost {
            cpu: child_stats[0].row_count,
            memory: zero,
            network: zero,
        },
        PlanNode::Join {
            left,
            right,
            criteria,
            distribution,
            ..
        } => {
            let probe = child_stats[0];
            let build = child_stats[1];
            let build_size = data_size(right, build, config);
            let probe_size = data_size(left, probe, config);
            let cpu = probe
                .row_count
                .add(build.row_count)
                .add(node_stats.row_count);
            // Mirrors the enforcer: undecided joins repartition; broadcast
            // is only chosen by the enumerator under the size threshold.
            let strategy = distribution.unwrap_or(JoinDistribution::Partitioned);
            let network = match strategy {
                JoinDistribution::Broadcast => {
                    if side_already_placed(right, &Distribution::Replicated) {
                        zero
                    } else {
                        build_size.map(|b| b * config.exchange_fanout)
                    }
                }
                JoinDistribution::Partitioned if criteria.is_empty() => {
                    let left_charge = if side_already_placed(left, &Distribution::Single) {
                        zero
                    } else {
                        probe_size
                    };
                    let right_charge = if side_already_placed(right, &Distribution::Single) {
                        zero
                    } else {
                        build_size
                    };
                    left_charge.add(right_charge)
                }
                JoinDistribution::Partitioned => {
                    let left_required = Distribution::HashPartitioned(
                        criteria.iter().map(|c| c.left.clone()).collect(),
                    );
                    let right_required = Distribution::HashPartitioned(
                        criteria.iter().map(|c| c.right.clone()).collect(),
                    );
                    let left_charge = if side_already_placed(left, &left_required) {
                        zero
                    } else {
                        probe_size
                    };
                    let right_charge = if side_already_placed(right, &right_required) {
                        zero
                    } else {
                        build_size
                    };
                    left_charge.add(right_charge)
                }
            };
            Cost {
                cpu,
                memory: build_size,
                network,
            }
        }
        PlanNode::Aggregate { .. } => Cost {
            cpu: child_stats[0].row_count,
            memory: data_size(node, node_stats, config),
            network: zero,
        },
        PlanNode::Sort { .. } => Cost {
            cpu: child_stats[0]
                .row_count
                .map(|n| if n > 1.0 { n * n.log2() } else { n }),
            memory: node_stats.data_size(&node.output_symbols(), config),
            network: zero,
        },
        PlanNode::Limit { .. } => Cost {
            cpu: node_stats.row_count,
            memory: zero,
            network: zero,
        },
        PlanNode::Exchange { child, kind, .. } => {
            let moved = data_size(child, child_stats[0], config);
            let network = match kind {
                ExchangeKind::Broadcast | ExchangeKind::Replicate => {
                    moved.map(|b| b * config.exchange_fanout)
                }
                ExchangeKind::Hash(_) | ExchangeKind::Single => moved,
            };
            Cost {
                cpu: zero,
                memory: zero,
                network,
            }
        }
        PlanNode::Values { rows, .. } => Cost {
            cpu: Estimate::known(rows.len() as f64),
            memory: zero,
            network: zero,
        },
        PlanNode::Union { .. } => Cost::zero(),
    }
}
