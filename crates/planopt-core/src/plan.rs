//! The plan-node tree.
//!
//! Plans are immutable trees; rewrite rules build replacement subtrees rather
//! than mutating in place, so a rejected alternative simply drops. Each node
//! carries a `PlanNodeId` that is stable across rewrites which merely
//! reparent it, letting traces refer to nodes across passes.

use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::expr::{Expr, ScalarValue};
use crate::properties::Distribution;
use crate::sym::{PlanNodeId, Symbol};

/// Reference to a table in some catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableHandle {
    pub catalog: String,
    pub name: String,
}

impl TableHandle {
    pub fn new(catalog: impl Into<String>, name: impl Into<String>) -> Self {
        TableHandle {
            catalog: catalog.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.catalog, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    /// Whether unmatched left-side rows survive the join.
    pub fn preserves_left(&self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }

    /// Whether unmatched right-side rows survive the join.
    pub fn preserves_right(&self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Right => write!(f, "RIGHT"),
            JoinType::Full => write!(f, "FULL"),
        }
    }
}

/// One equality condition `left = right` between join inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquiJoinClause {
    pub left: Symbol,
    pub right: Symbol,
}

impl fmt::Display for EquiJoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

/// Physical strategy chosen for a join. `None` on a join means the choice has
/// not been made yet; the enforcer defaults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinDistribution {
    /// Build side replicated to every worker holding probe-side data.
    Broadcast,
    /// Both sides hash-partitioned on their join keys.
    Partitioned,
}

impl fmt::Display for JoinDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinDistribution::Broadcast => write!(f, "BROADCAST"),
            JoinDistribution::Partitioned => write!(f, "PARTITIONED"),
        }
    }
}

/// The data movement an `Exchange` node performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    /// Gather all rows to one node.
    Single,
    /// Redistribute rows by hash of the given symbols.
    Hash(Vec<Symbol>),
    /// Replicate all rows to every worker holding probe-side data.
    Broadcast,
    /// Replicate all rows to every worker in the cluster.
    Replicate,
}

impl ExchangeKind {
    /// The distribution the exchange delivers.
    pub fn output_distribution(&self) -> Distribution {
        match self {
            ExchangeKind::Single => Distribution::Single,
            ExchangeKind::Hash(keys) => Distribution::HashPartitioned(keys.clone()),
            ExchangeKind::Broadcast | ExchangeKind::Replicate => Distribution::Replicated,
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeKind::Single => write!(f, "SINGLE"),
            ExchangeKind::Hash(keys) => {
                let rendered: Vec<String> = keys.iter().map(|s| s.to_string()).collect();
                write!(f, "HASH({})", rendered.join(", "))
            }
            ExchangeKind::Broadcast => write!(f, "BROADCAST"),
            ExchangeKind::Replicate => write!(f, "REPLICATE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Avg => "avg",
        };
        write!(f, "{s}")
    }
}

/// One aggregate in an `Aggregate` node, e.g. `total := sum(amount)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateCall {
    pub function: AggregateFunction,
    /// `None` for `count(*)`.
    pub input: Option<Symbol>,
    pub output: Symbol,
}

/// A node in the plan tree. Children are owned inline; sharing happens only
/// through the memo, never through the tree itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "node")]
pub enum PlanNode {
    TableScan {
        id: PlanNodeId,
        table: TableHandle,
        outputs: Vec<Symbol>,
        /// Distribution the connector delivers rows under, before any
        /// exchange. Most connectors report `Arbitrary`.
        partitioning: Distribution,
    },
    Filter {
        id: PlanNodeId,
        child: Box<PlanNode>,
        predicate: Expr,
    },
    Project {
        id: PlanNodeId,
        child: Box<PlanNode>,
        assignments: Vec<(Symbol, Expr)>,
    },
    Join {
        id: PlanNodeId,
        join_type: JoinType,
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        criteria: Vec<EquiJoinClause>,
        /// Non-equi predicate evaluated after the hash match, if any.
        residual: Option<Expr>,
        distribution: Option<JoinDistribution>,
    },
    Aggregate {
        id: PlanNodeId,
        child: Box<PlanNode>,
        group_keys: Vec<Symbol>,
        aggregates: Vec<AggregateCall>,
    },
    Sort {
        id: PlanNodeId,
        child: Box<PlanNode>,
        order_by: Vec<Symbol>,
    },
    Limit {
        id: PlanNodeId,
        child: Box<PlanNode>,
        count: u64,
    },
    Exchange {
        id: PlanNodeId,
        child: Box<PlanNode>,
        kind: ExchangeKind,
    },
    Values {
        id: PlanNodeId,
        outputs: Vec<Symbol>,
        rows: Vec<Vec<ScalarValue>>,
    },
    Union {
        id: PlanNodeId,
        children: Vec<PlanNode>,
        outputs: Vec<Symbol>,
    },
}

impl PlanNode {
    pub fn id(&self) -> PlanNodeId {
        match self {
            PlanNode::TableScan { id, .. }
            | PlanNode::Filter { id, .. }
            | PlanNode::Project { id, .. }
            | PlanNode::Join { id, .. }
            | PlanNode::Aggregate { id, .. }
            | PlanNode::Sort { id, .. }
            | PlanNode::Limit { id, .. }
            | PlanNode::Exchange { id, .. }
            | PlanNode::Values { id, .. }
            | PlanNode::Union { id, .. } => *id,
        }
    }

    /// Human-readable variant name for traces and rendering.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PlanNode::TableScan { .. } => "TableScan",
            PlanNode::Filter { .. } => "Filter",
            PlanNode::Project { .. } => "Project",
            PlanNode::Join { .. } => "Join",
            PlanNode::Aggregate { .. } => "Aggregate",
            PlanNode::Sort { .. } => "Sort",
            PlanNode::Limit { .. } => "Limit",
            PlanNode::Exchange { .. } => "Exchange",
            PlanNode::Values { .. } => "Values",
            PlanNode::Union { .. } => "Union",
        }
    }

    pub fn children(&self) -> Vec<&PlanNode> {
        match self {
            PlanNode::TableScan { .. } | PlanNode::Values { .. } => vec![],
            PlanNode::Filter { child, .. }
            | PlanNode::Project { child, .. }
            | PlanNode::Aggregate { child, .. }
            | PlanNode::Sort { child, .. }
            | PlanNode::Limit { child, .. }
            | PlanNode::Exchange { child, .. } => vec![child],
            PlanNode::Join { left, right, .. } => vec![left, right],
            PlanNode::Union { children, .. } => children.iter().collect(),
        }
    }

    /// Rebuilds this node with each child passed through `f`, keeping the
    /// node's own id and payload.
    pub fn map_children(self, f: &mut impl FnMut(PlanNode) -> PlanNode) -> PlanNode {
        match self {
            leaf @ (PlanNode::TableScan { .. } | PlanNode::Values { .. }) => leaf,
            PlanNode::Filter {
                id,
                child,
                predicate,
            } => PlanNode::Filter {
                id,
                child: Box::new(f(*child)),
                predicate,
            },
            PlanNode::Project {
                id,
                child,
                assignments,
            } => PlanNode::Project {
                id,
                child: Box::new(f(*child)),
                assignments,
            },
            PlanNode::Join {
                id,
                join_type,
                left,
                right,
                criteria,
                residual,
                distribution,
            } => PlanNode::Join {
                id,
                join_type,
                left: Box::new(f(*left)),
                right: Box::new(f(*right)),
                criteria,
                residual,
                distribution,
            },
            PlanNode::Aggregate {
                id,
                child,
                group_keys,
                aggregates,
            } => PlanNode::Aggregate {
                id,
                child: Box::new(f(*child)),
                group_keys,
                aggregates,
            },
            PlanNode::Sort { id, child, order_by } => PlanNode::Sort {
                id,
                child: Box::new(f(*child)),
                order_by,
            },
            PlanNode::Limit { id, child, count } => PlanNode::Limit {
                id,
                child: Box::new(f(*child)),
                count,
            },
            PlanNode::Exchange { id, child, kind } => PlanNode::Exchange {
                id,
                child: Box::new(f(*child)),
                kind,
            },
            PlanNode::Union {
                id,
                children,
                outputs,
            } => PlanNode::Union {
                id,
                children: children.into_iter().map(f).collect(),
                outputs,
            },
        }
    }

    /// Rebuilds this node over the given children, keeping its id and
    /// payload. Fails when the child count does not match the node's arity.
    pub fn replace_children(&self, new_children: Vec<PlanNode>) -> Result<PlanNode, PlanError> {
        let expected = match self {
            PlanNode::Union { children, .. } => children.len(),
            other => other.children().len(),
        };
        if new_children.len() != expected {
            return Err(PlanError::ArityMismatch {
                node: self.id(),
                expected,
                actual: new_children.len(),
            });
        }
        let mut replacements = new_children.into_iter();
        Ok(self
            .clone()
            .map_children(&mut |_| replacements.next().unwrap()))
    }

    /// Symbols this node makes visible to its parent.
    pub fn output_symbols(&self) -> Vec<Symbol> {
        match self {
            PlanNode::TableScan { outputs, .. }
            | PlanNode::Values { outputs, .. }
            | PlanNode::Union { outputs, .. } => outputs.clone(),
            PlanNode::Filter { child, .. }
            | PlanNode::Sort { child, .. }
            | PlanNode::Limit { child, .. }
            | PlanNode::Exchange { child, .. } => child.output_symbols(),
            PlanNode::Project { assignments, .. } => {
                assignments.iter().map(|(s, _)| s.clone()).collect()
            }
            PlanNode::Join { left, right, .. } => {
                let mut out = left.output_symbols();
                out.extend(right.output_symbols());
                out
            }
            PlanNode::Aggregate {
                group_keys,
                aggregates,
                ..
            } => {
                let mut out = group_keys.clone();
                out.extend(aggregates.iter().map(|a| a.output.clone()));
                out
            }
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// The distribution this subtree delivers once enforcement has run:
    /// nodes that require a layout report the layout they will receive, so
    /// the cost model and the enforcer agree on where data already sits and
    /// neither charges for movement the other would skip.
    pub fn delivered_distribution(&self) -> Distribution {
        match self {
            PlanNode::TableScan { partitioning, .. } => partitioning.clone(),
            PlanNode::Filter { child, .. } | PlanNode::Project { child, .. } => {
                child.delivered_distribution()
            }
            PlanNode::Exchange { kind, .. } => kind.output_distribution(),
            PlanNode::Join {
                left,
                criteria,
                distribution,
                ..
            } => match distribution.unwrap_or(JoinDistribution::Partitioned) {
                JoinDistribution::Broadcast => left.delivered_distribution(),
                JoinDistribution::Partitioned if criteria.is_empty() => Distribution::Single,
                JoinDistribution::Partitioned => {
                    let required = Distribution::HashPartitioned(
                        criteria.iter().map(|c| c.left.clone()).collect(),
                    );
                    let delivered = left.delivered_distribution();
                    if delivered.satisfies(&required) {
                        delivered
                    } else {
                        required
                    }
                }
            },
            PlanNode::Aggregate {
                child, group_keys, ..
            } => {
                if group_keys.is_empty() {
                    Distribution::Single
                } else {
                    let required = Distribution::HashPartitioned(group_keys.clone());
                    let delivered = child.delivered_distribution();
                    if delivered.satisfies(&required) {
                        delivered
                    } else {
                        required
                    }
                }
            }
            PlanNode::Sort { .. } | PlanNode::Limit { .. } | PlanNode::Values { .. } => {
                Distribution::Single
            }
            PlanNode::Union { .. } => Distribution::Arbitrary,
        }
    }

    pub fn max_id(&self) -> PlanNodeId {
        self.children()
            .iter()
            .map(|c| c.max_id())
            .max()
            .map_or(self.id(), |m| m.max(self.id()))
    }

    /// Checks the whole tree for dangling symbol references. Rules and the
    /// enforcer rely on this having passed before they run.
    pub fn validate(&self) -> Result<(), PlanError> {
        for child in self.children() {
            child.validate()?;
        }
        let available: BTreeSet<Symbol> = self
            .children()
            .iter()
            .flat_map(|c| c.output_symbols())
            .collect();
        let check = |syms: BTreeSet<Symbol>| -> Result<(), PlanError> {
            for s in syms {
                if !available.contains(&s) {
                    return Err(PlanError::DanglingSymbol {
                        node: self.id(),
                        symbol: s,
                    });
                }
            }
            Ok(())
        };
        match self {
            PlanNode::TableScan { .. } | PlanNode::Values { .. } => Ok(()),
            PlanNode::Filter { predicate, .. } => check(predicate.symbols()),
            PlanNode::Project { assignments, .. } => {
                for (_, expr) in assignments {
                    check(expr.symbols())?;
                }
                Ok(())
            }
            PlanNode::Join {
                left,
                right,
                criteria,
                residual,
                ..
            } => {
                let left_out: BTreeSet<Symbol> = left.output_symbols().into_iter().collect();
                let right_out: BTreeSet<Symbol> = right.output_symbols().into_iter().collect();
                for clause in criteria {
                    if !left_out.contains(&clause.left) {
                        return Err(PlanError::DanglingSymbol {
                            node: self.id(),
                            symbol: clause.left.clone(),
                        });
                    }
                    if !right_out.contains(&clause.right) {
                        return Err(PlanError::DanglingSymbol {
                            node: self.id(),
                            symbol: clause.right.clone(),
                        });
                    }
                }
                if let Some(residual) = residual {
                    check(residual.symbols())?;
                }
                Ok(())
            }
            PlanNode::Aggregate {
                group_keys,
                aggregates,
                ..
            } => {
                check(group_keys.iter().cloned().collect())?;
                check(
                    aggregates
                        .iter()
                        .filter_map(|a| a.input.clone())
                        .collect(),
                )
            }
            PlanNode::Sort { order_by, .. } => check(order_by.iter().cloned().collect()),
            PlanNode::Exchange { kind, .. } => match kind {
                ExchangeKind::Hash(keys) => check(keys.iter().cloned().collect()),
                _ => Ok(()),
            },
            PlanNode::Limit { .. } => Ok(()),
            PlanNode::Union { children, outputs, .. } => {
                for child in children {
                    let child_out: BTreeSet<Symbol> =
                        child.output_symbols().into_iter().collect();
                    for s in outputs {
                        if !child_out.contains(s) {
                            return Err(PlanError::DanglingSymbol {
                                node: self.id(),
                                symbol: s.clone(),
                            });
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Structural hash of this node's own payload, excluding its id and its
    /// children. The memo combines this with child group ids to detect
    /// structurally identical subtrees minted under different ids.
    pub fn local_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        mem::discriminant(self).hash(&mut hasher);
        match self {
            PlanNode::TableScan {
                table,
                outputs,
                partitioning,
                ..
            } => {
                table.hash(&mut hasher);
                outputs.hash(&mut hasher);
                partitioning.hash(&mut hasher);
            }
            PlanNode::Filter { predicate, .. } => predicate.hash(&mut hasher),
            PlanNode::Project { assignments, .. } => assignments.hash(&mut hasher),
            PlanNode::Join {
                join_type,
                criteria,
                residual,
                distribution,
                ..
            } => {
                join_type.hash(&mut hasher);
                criteria.hash(&mut hasher);
                residual.hash(&mut hasher);
                distribution.hash(&mut hasher);
            }
            PlanNode::Aggregate {
                group_keys,
                aggregates,
                ..
            } => {
                group_keys.hash(&mut hasher);
                aggregates.hash(&mut hasher);
            }
            PlanNode::Sort { order_by, .. } => order_by.hash(&mut hasher),
            PlanNode::Limit { count, .. } => count.hash(&mut hasher),
            PlanNode::Exchange { kind, .. } => kind.hash(&mut hasher),
            PlanNode::Values { outputs, rows, .. } => {
                outputs.hash(&mut hasher);
                rows.hash(&mut hasher);
            }
            PlanNode::Union { outputs, .. } => outputs.hash(&mut hasher),
        }
        hasher.finish()
    }

    /// Structural equality of this node's own payload, excluding ids and
    /// children. Equal fingerprints are only a candidate match; the memo
    /// confirms with this before sharing a group, so a hash collision can
    /// never merge two distinct subtrees.
    pub fn local_eq(&self, other: &PlanNode) -> bool {
        match (self, other) {
            (
                PlanNode::TableScan {
                    table: a,
                    outputs: a_out,
                    partitioning: a_part,
                    ..
                },
                PlanNode::TableScan {
                    table: b,
                    outputs: b_out,
                    partitioning: b_part,
                    ..
                },
            ) => a == b && a_out == b_out && a_part == b_part,
            (
                PlanNode::Filter { predicate: a, .. },
                PlanNode::Filter { predicate: b, .. },
            ) => a == b,
            (
                PlanNode::Project { assignments: a, .. },
                PlanNode::Project { assignments: b, .. },
            ) => a == b,
            (
                PlanNode::Join {
                    join_type: a_ty,
                    criteria: a_crit,
                    residual: a_res,
                    distribution: a_dist,
                    ..
                },
                PlanNode::Join {
                    join_type: b_ty,
                    criteria: b_crit,
                    residual: b_res,
                    distribution: b_dist,
                    ..
                },
            ) => a_ty == b_ty && a_crit == b_crit && a_res == b_res && a_dist == b_dist,
            (
                PlanNode::Aggregate {
                    group_keys: a_keys,
                    aggregates: a_aggs,
                    ..
                },
                PlanNode::Aggregate {
                    group_keys: b_keys,
                    aggregates: b_aggs,
                    ..
                },
            ) => a_keys == b_keys && a_aggs == b_aggs,
            (PlanNode::Sort { order_by: a, .. }, PlanNode::Sort { order_by: b, .. }) => a == b,
            (PlanNode::Limit { count: a, .. }, PlanNode::Limit { count: b, .. }) => a == b,
            (PlanNode::Exchange { kind: a, .. }, PlanNode::Exchange { kind: b, .. }) => a == b,
            (
                PlanNode::Values {
                    outputs: a_out,
                    rows: a_rows,
                    ..
                },
                PlanNode::Values {
                    outputs: b_out,
                    rows: b_rows,
                    ..
                },
            ) => a_out == b_out && a_rows == b_rows,
            (
                PlanNode::Union { outputs: a, .. },
                PlanNode::Union { outputs: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ComparisonOp;
    use crate::sym::ScalarType;

    fn scan(id: u32, table: &str, cols: &[&str]) -> PlanNode {
        PlanNode::TableScan {
            id: PlanNodeId(id),
            table: TableHandle::new("t", table),
            outputs: cols
                .iter()
                .map(|c| Symbol::new(*c, ScalarType::Bigint))
                .collect(),
            partitioning: Distribution::Arbitrary,
        }
    }

    #[test]
    fn local_payload_equality_ignores_ids_and_children() {
        let predicate = Expr::comparison(
            ComparisonOp::Eq,
            Expr::symbol(Symbol::bigint("orderkey")),
            Expr::literal(ScalarValue::Bigint(1)),
        );
        let a = PlanNode::Filter {
            id: PlanNodeId(1),
            child: Box::new(scan(0, "orders", &["orderkey"])),
            predicate: predicate.clone(),
        };
        let b = PlanNode::Filter {
            id: PlanNodeId(9),
            child: Box::new(scan(7, "lineitem", &["orderkey"])),
            predicate: predicate.clone(),
        };
        assert!(a.local_eq(&b));
        let c = PlanNode::Filter {
            id: PlanNodeId(1),
            child: Box::new(scan(0, "orders", &["orderkey"])),
            predicate: Expr::comparison(
                ComparisonOp::Eq,
                Expr::symbol(Symbol::bigint("orderkey")),
                Expr::literal(ScalarValue::Bigint(2)),
            ),
        };
        assert!(!a.local_eq(&c));
        assert!(!a.local_eq(&scan(0, "orders", &["orderkey"])));
    }

    #[test]
    fn validate_rejects_dangling_filter_symbol() {
        let plan = PlanNode::Filter {
            id: PlanNodeId(1),
            child: Box::new(scan(0, "orders", &["orderkey"])),
            predicate: Expr::comparison(
                ComparisonOp::Eq,
                Expr::symbol(Symbol::bigint("missing")),
                Expr::literal(ScalarValue::Bigint(1)),
            ),
        };
        match plan.validate() {
            Err(PlanError::DanglingSymbol { symbol, .. }) => {
                assert_eq!(symbol.name, "missing");
            }
            other => panic!("expected dangling symbol, got {other:?}"),
        }
    }

    #[test]
    fn replace_children_checks_arity() {
        let plan = PlanNode::Filter {
            id: PlanNodeId(1),
            child: Box::new(scan(0, "orders", &["orderkey"])),
            predicate: Expr::literal(ScalarValue::Boolean(true)),
        };
        let err = plan.replace_children(vec![]).unwrap_err();
        assert!(matches!(err, PlanError::ArityMismatch { expected: 1, actual: 0, .. }));
    }

    #[test]
    fn fingerprint_ignores_node_ids() {
        let a = scan(1, "orders", &["orderkey"]);
        let b = scan(99, "orders", &["orderkey"]);
        assert_eq!(a.local_fingerprint(), b.local_fingerprint());
        let c = scan(1, "lineitem", &["orderkey"]);
        assert_ne!(a.local_fingerprint(), c.local_fingerprint());
    }

    #[test]
    fn join_outputs_concatenate_both_sides() {
        let join = PlanNode::Join {
            id: PlanNodeId(2),
            join_type: JoinType::Inner,
            left: Box::new(scan(0, "orders", &["orderkey"])),
            right: Box::new(scan(1, "lineitem", &["l_orderkey"])),
            criteria: vec![EquiJoinClause {
                left: Symbol::bigint("orderkey"),
                right: Symbol::bigint("l_orderkey"),
            }],
            residual: None,
            distribution: None,
        };
        let out = join.output_symbols();
        assert_eq!(out.len(), 2);
        assert!(join.validate().is_ok());
    }
}
