//! The memo: an arena of equivalence groups.
//!
//! Structurally identical subtrees, even when minted under different node
//! ids, intern to the same group. A group caches the subtree's derived
//! statistics, its cost, and the set of rules already tried against it, so
//! repeated estimation across rewrite passes is a lookup instead of a
//! recomputation.

use std::collections::{BTreeSet, HashMap};

use crate::config::OptimizerConfig;
use crate::cost::{self, Cost};
use crate::derive::derive_statistics;
use crate::plan::PlanNode;
use crate::stats::{PlanStatistics, StatsProvider};

/// Index of an equivalence group within one memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(u32);

/// One equivalence group: the cached facts about a structurally distinct
/// subtree.
#[derive(Debug)]
pub struct EquivalenceGroup {
    pub stats: PlanStatistics,
    /// Total cost of the subtree this group represents.
    pub cost: Cost,
    pub node_count: usize,
    /// The subtree that first interned to this group. Lookups confirm
    /// payload equality against it, so a fingerprint collision can never
    /// merge two distinct subtrees.
    representative: PlanNode,
    applied_rules: BTreeSet<&'static str>,
}

/// Interning bucket key: the node's own payload fingerprint plus the groups
/// its children interned to. The fingerprint is only a bucket address;
/// membership is decided by structural payload equality within the bucket.
#[derive(Debug, PartialEq, Eq, Hash)]
struct MemoKey {
    local: u64,
    children: Vec<GroupId>,
}

#[derive(Debug, Default)]
pub struct Memo {
    groups: Vec<EquivalenceGroup>,
    index: HashMap<MemoKey, Vec<GroupId>>,
}

impl Memo {
    pub fn new() -> Self {
        Memo::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Interns a subtree bottom-up, returning its group. Re-interning a
    /// structurally identical subtree returns the existing group without
    /// re-deriving anything.
    pub fn intern(
        &mut self,
        node: &PlanNode,
        provider: &dyn StatsProvider,
        config: &OptimizerConfig,
    ) -> GroupId {
        let child_ids: Vec<GroupId> = node
            .children()
            .iter()
            .map(|c| self.intern(c, provider, config))
            .collect();
        let key = MemoKey {
            local: node.local_fingerprint(),
            children: child_ids.clone(),
        };
        if let Some(candidates) = self.index.get(&key) {
            for &existing in candidates {
                if self.groups[existing.0 as usize].representative.local_eq(node) {
                    return existing;
                }
            }
        }
        let child_stats: Vec<&PlanStatistics> =
            child_ids.iter().map(|g| &self.groups[g.0 as usize].stats).collect();
        let stats = derive_statistics(node, &child_stats, provider, config);
        let own_cost = cost::node_cost(node, &stats, &child_stats, config);
        let subtree_cost = child_ids
            .iter()
            .map(|g| self.groups[g.0 as usize].cost)
            .fold(own_cost, |acc, c| acc.add(&c));
        let node_count = 1 + child_ids
            .iter()
            .map(|g| self.groups[g.0 as usize].node_count)
            .sum::<usize>();
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(EquivalenceGroup {
            stats,
            cost: subtree_cost,
            node_count,
            representative: node.clone(),
            applied_rules: BTreeSet::new(),
        });
        self.index.entry(key).or_default().push(id);
        id
    }

    pub fn group(&self, id: GroupId) -> &EquivalenceGroup {
        &self.groups[id.0 as usize]
    }

    pub fn rule_applied(&self, id: GroupId, rule: &'static str) -> bool {
        self.groups[id.0 as usize].applied_rules.contains(rule)
    }

    pub fn mark_rule_applied(&mut self, id: GroupId, rule: &'static str) {
        self.groups[id.0 as usize].applied_rules.insert(rule);
    }
}
