//! # planopt-rules: Rewrite Rules
//!
//! The cost-based rewrite rules shipped with the optimizer. Each rule is a
//! local transformation; the engine in `planopt-core` drives them to a
//! fixpoint and accepts a rewrite only when the cost model says it is a
//! strict improvement.

pub mod predicate_pushdown;
pub mod projection_pruning;
pub mod reorder_joins;
pub mod simplify;

use planopt_core::rule::Rule;

pub use predicate_pushdown::{PushFilterIntoJoin, PushFilterThroughProject};
pub use projection_pruning::PruneScanColumns;
pub use reorder_joins::ReorderJoins;
pub use simplify::{MergeAdjacentFilters, RemoveTrivialFilter};

/// The standard rule set, in application order. Simplification and pushdown
/// run before join reordering so the enumerator sees predicates at their
/// final positions.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(RemoveTrivialFilter),
        Box::new(PushFilterThroughProject),
        Box::new(PushFilterIntoJoin),
        Box::new(MergeAdjacentFilters),
        Box::new(PruneScanColumns),
        Box::new(ReorderJoins),
    ]
}
