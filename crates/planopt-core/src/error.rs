//! Error types for plan construction and optimization.

use thiserror::Error;

use crate::sym::{PlanNodeId, Symbol};

/// A structural defect in an input plan. Optimization refuses to start on a
/// plan that fails validation, so rules may assume these invariants hold.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// A rewrite produced a node with the wrong number of children.
    #[error("node {node} expects {expected} children, got {actual}")]
    ArityMismatch {
        node: PlanNodeId,
        expected: usize,
        actual: usize,
    },

    /// An expression references a symbol no child produces.
    #[error("node {node} references symbol '{symbol}' not produced by any child")]
    DanglingSymbol { node: PlanNodeId, symbol: Symbol },
}

/// Failure modes of a full optimizer run.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The caller's cancellation token was set. The input plan is untouched;
    /// no partially rewritten tree escapes.
    #[error("optimization cancelled")]
    Cancelled,
}
