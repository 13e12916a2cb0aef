//! Scan column pruning.

use std::collections::BTreeSet;

use planopt_core::plan::PlanNode;
use planopt_core::rule::{Rule, RuleContext};
use planopt_core::sym::Symbol;

/// Narrows a table scan to the columns actually consumed above it.
///
/// Fires at a `Project` or `Aggregate`, because those nodes state their
/// outputs explicitly; nodes that forward every child column upward give no
/// license to drop anything. Filters between the anchor and the scan are
/// walked through, with their predicate symbols added to the keep set.
pub struct PruneScanColumns;

impl Rule for PruneScanColumns {
    fn name(&self) -> &'static str {
        "PruneScanColumns"
    }

    fn apply(&self, node: &PlanNode, _ctx: &mut RuleContext<'_>) -> Option<PlanNode> {
        let (needed, child): (BTreeSet<Symbol>, &PlanNode) = match node {
            PlanNode::Project {
                assignments, child, ..
            } => (
                assignments.iter().flat_map(|(_, e)| e.symbols()).collect(),
                child,
            ),
            PlanNode::Aggregate {
                group_keys,
                aggregates,
                child,
                ..
            } => {
                let mut needed: BTreeSet<Symbol> = group_keys.iter().cloned().collect();
                needed.extend(aggregates.iter().filter_map(|a| a.input.clone()));
                (needed, child)
            }
            _ => return None,
        };
        let narrowed = narrow_chain(child, needed)?;
        // Infallible: same arity as the original child list.
        node.replace_children(vec![narrowed]).ok()
    }
}

fn narrow_chain(node: &PlanNode, mut needed: BTreeSet<Symbol>) -> Option<PlanNode> {
    match node {
        PlanNode::Filter {
            id,
            child,
            predicate,
        } => {
            needed.extend(predicate.symbols());
            let narrowed = narrow_chain(child, needed)?;
            Some(PlanNode::Filter {
                id: *id,
                child: Box::new(narrowed),
                predicate: predicate.clone(),
            })
        }
        PlanNode::TableScan {
            id,
            table,
            outputs,
            partitioning,
        } => {
            let kept: Vec<Symbol> = outputs
                .iter()
                .filter(|s| needed.contains(s))
                .cloned()
                .collect();
            if kept.len() == outputs.len() {
                return None;
            }
            Some(PlanNode::TableScan {
                id: *id,
                table: table.clone(),
                outputs: kept,
                partitioning: partitioning.clone(),
            })
        }
        _ => None,
    }
}
