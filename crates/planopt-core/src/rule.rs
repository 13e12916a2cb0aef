//! The rewrite-rule abstraction.

use std::cmp::Ordering;

use crate::config::OptimizerConfig;
use crate::cost::{self, Cost};
use crate::memo::Memo;
use crate::plan::PlanNode;
use crate::stats::{PlanStatistics, StatsProvider};
use crate::sym::PlanNodeIdAllocator;
use crate::trace::OptimizerTrace;

/// Everything a rule may consult while rewriting, and the allocator it must
/// use for any nodes it mints.
pub struct RuleContext<'a> {
    pub memo: &'a mut Memo,
    pub provider: &'a dyn StatsProvider,
    pub config: &'a OptimizerConfig,
    pub ids: &'a mut PlanNodeIdAllocator,
    pub trace: &'a mut OptimizerTrace,
}

impl RuleContext<'_> {
    /// Derived statistics for a subtree, memoized across calls.
    pub fn statistics(&mut self, node: &PlanNode) -> PlanStatistics {
        let group = self.memo.intern(node, self.provider, self.config);
        self.memo.group(group).stats.clone()
    }

    /// Total estimated cost of a subtree, memoized across calls.
    pub fn cost(&mut self, node: &PlanNode) -> Cost {
        let group = self.memo.intern(node, self.provider, self.config);
        self.memo.group(group).cost
    }

    /// Whether `candidate` is strictly cheaper than `current`. Ties never
    /// count as improvements, so rewriting terminates.
    pub fn is_improvement(&mut self, candidate: &PlanNode, current: &PlanNode) -> bool {
        let candidate_cost = self.cost(candidate);
        let current_cost = self.cost(current);
        cost::compare_with_tiebreak(
            &candidate_cost,
            candidate.node_count(),
            &current_cost,
            current.node_count(),
        ) == Ordering::Less
    }
}

/// A local rewrite. `apply` looks at one node (and whatever of its subtree it
/// needs) and either proposes a replacement subtree or declines.
///
/// Rules must propose only semantically equivalent plans; the engine accepts
/// a proposal only when it is strictly cheaper under the cost model. A rule
/// that cannot improve on the input should return `None` rather than an
/// equal-cost alternative.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, node: &PlanNode, ctx: &mut RuleContext<'_>) -> Option<PlanNode>;
}
