//! Optimizer session configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a single optimizer run. All knobs have conservative defaults
/// matching what the engine ships with; callers override per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Upper bound on rewrite passes before the engine gives up on reaching a
    /// fixpoint and returns the best plan found so far.
    pub max_passes: usize,

    /// Tables whose estimated data size falls below this threshold (bytes)
    /// are eligible for broadcast join distribution.
    pub broadcast_join_threshold_bytes: f64,

    /// Selectivity assumed for predicates the estimator cannot analyze.
    pub default_filter_selectivity: f64,

    /// Row count assumed for tables with no statistics.
    pub default_row_count: f64,

    /// Average byte width assumed for columns with no statistics.
    pub default_column_width: f64,

    /// Join clusters up to this many relations are ordered by exhaustive
    /// dynamic programming; larger clusters fall back to a greedy heuristic.
    pub join_reorder_dp_threshold: usize,

    /// Whether the join enumerator may consider cross products between
    /// relations with no connecting equi-join edge.
    pub allow_cross_joins: bool,

    /// Multiplier applied to repartitioned data volume to model the fan-out
    /// of a hash exchange across worker nodes.
    pub exchange_fanout: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            max_passes: 16,
            broadcast_join_threshold_bytes: 10.0 * 1024.0 * 1024.0,
            default_filter_selectivity: 0.5,
            default_row_count: 1000.0,
            default_column_width: 8.0,
            join_reorder_dp_threshold: 8,
            allow_cross_joins: false,
            exchange_fanout: 8.0,
        }
    }
}
