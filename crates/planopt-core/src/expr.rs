//! Scalar expressions over symbols.
//!
//! Expressions appear in filter predicates, projection assignments, and join
//! residuals. They are plain data: evaluation is the engine's job, the
//! optimizer only inspects structure (conjunct decomposition, referenced
//! symbols) and estimates selectivity.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::sym::Symbol;

/// A literal constant. Doubles are wrapped in `OrderedFloat` so expressions
/// are hashable and totally ordered, which the memo's fingerprinting needs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarValue {
    Bigint(i64),
    Double(OrderedFloat<f64>),
    Varchar(String),
    Boolean(bool),
    Null,
}

impl ScalarValue {
    pub fn double(v: f64) -> Self {
        ScalarValue::Double(OrderedFloat(v))
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bigint(v) => write!(f, "{v}"),
            ScalarValue::Double(v) => write!(f, "{}", v.0),
            ScalarValue::Varchar(v) => write!(f, "'{v}'"),
            ScalarValue::Boolean(v) => write!(f, "{v}"),
            ScalarValue::Null => write!(f, "null"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        };
        write!(f, "{s}")
    }
}

/// Scalar expression tree. `And`/`Or` are n-ary so conjunct and disjunct
/// lists round-trip without artificial nesting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Symbol(Symbol),
    Literal(ScalarValue),
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    IsNull(Box<Expr>),
}

impl Expr {
    pub fn symbol(s: Symbol) -> Self {
        Expr::Symbol(s)
    }

    pub fn literal(v: ScalarValue) -> Self {
        Expr::Literal(v)
    }

    pub fn comparison(op: ComparisonOp, left: Expr, right: Expr) -> Self {
        Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Expr::comparison(ComparisonOp::Eq, left, right)
    }

    pub fn and(conjuncts: Vec<Expr>) -> Self {
        match conjuncts.len() {
            0 => Expr::Literal(ScalarValue::Boolean(true)),
            1 => conjuncts.into_iter().next().unwrap(),
            _ => Expr::And(conjuncts),
        }
    }

    pub fn is_true_literal(&self) -> bool {
        matches!(self, Expr::Literal(ScalarValue::Boolean(true)))
    }

    pub fn is_false_literal(&self) -> bool {
        matches!(self, Expr::Literal(ScalarValue::Boolean(false)))
    }

    /// Splits a predicate into top-level AND conjuncts.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::And(parts) => parts.iter().flat_map(|p| p.conjuncts()).collect(),
            other => vec![other],
        }
    }

    /// All symbols referenced anywhere in the expression.
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<Symbol>) {
        match self {
            Expr::Symbol(s) => {
                out.insert(s.clone());
            }
            Expr::Literal(_) => {}
            Expr::Comparison { left, right, .. } | Expr::Arithmetic { left, right, .. } => {
                left.collect_symbols(out);
                right.collect_symbols(out);
            }
            Expr::And(parts) | Expr::Or(parts) => {
                for p in parts {
                    p.collect_symbols(out);
                }
            }
            Expr::Not(inner) | Expr::IsNull(inner) => inner.collect_symbols(out),
        }
    }

    /// Rewrites symbol references through `map`; symbols absent from the map
    /// are left as-is.
    pub fn substitute(&self, map: &BTreeMap<Symbol, Expr>) -> Expr {
        match self {
            Expr::Symbol(s) => map.get(s).cloned().unwrap_or_else(|| self.clone()),
            Expr::Literal(_) => self.clone(),
            Expr::Comparison { op, left, right } => Expr::Comparison {
                op: *op,
                left: Box::new(left.substitute(map)),
                right: Box::new(right.substitute(map)),
            },
            Expr::Arithmetic { op, left, right } => Expr::Arithmetic {
                op: *op,
                left: Box::new(left.substitute(map)),
                right: Box::new(right.substitute(map)),
            },
            Expr::And(parts) => Expr::And(parts.iter().map(|p| p.substitute(map)).collect()),
            Expr::Or(parts) => Expr::Or(parts.iter().map(|p| p.substitute(map)).collect()),
            Expr::Not(inner) => Expr::Not(Box::new(inner.substitute(map))),
            Expr::IsNull(inner) => Expr::IsNull(Box::new(inner.substitute(map))),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Symbol(s) => write!(f, "{s}"),
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Comparison { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::Arithmetic { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::And(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", rendered.join(" AND "))
            }
            Expr::Or(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", rendered.join(" OR "))
            }
            Expr::Not(inner) => write!(f, "(NOT {inner})"),
            Expr::IsNull(inner) => write!(f, "({inner} IS NULL)"),
        }
    }
}
