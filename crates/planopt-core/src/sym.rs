//! Symbols, scalar types, and the node-id allocator.
//!
//! A `Symbol` is a named, typed column reference flowing between plan nodes.
//! Symbols are ordered so they can key `BTreeMap`s, which keeps every
//! iteration over per-symbol statistics deterministic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar types carried by symbols. Only the types the expression language
/// needs; this is not a full SQL type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bigint,
    Double,
    Varchar,
    Boolean,
    Date,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Bigint => "bigint",
            ScalarType::Double => "double",
            ScalarType::Varchar => "varchar",
            ScalarType::Boolean => "boolean",
            ScalarType::Date => "date",
        };
        write!(f, "{name}")
    }
}

/// A named, typed value produced by a plan node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub ty: ScalarType,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: ScalarType) -> Self {
        Symbol {
            name: name.into(),
            ty,
        }
    }

    pub fn bigint(name: impl Into<String>) -> Self {
        Symbol::new(name, ScalarType::Bigint)
    }

    pub fn double(name: impl Into<String>) -> Self {
        Symbol::new(name, ScalarType::Double)
    }

    pub fn varchar(name: impl Into<String>) -> Self {
        Symbol::new(name, ScalarType::Varchar)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Stable identity of a plan node within one plan tree. Rewrites that replace
/// a node mint a fresh id; rewrites that merely reparent keep the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanNodeId(pub u32);

impl fmt::Display for PlanNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mints plan-node ids. Seed with `resume_after` when extending an existing
/// tree so fresh ids never collide with ids already in use.
#[derive(Debug, Default)]
pub struct PlanNodeIdAllocator {
    next: u32,
}

impl PlanNodeIdAllocator {
    pub fn new() -> Self {
        PlanNodeIdAllocator::default()
    }

    pub fn resume_after(max_in_use: PlanNodeId) -> Self {
        PlanNodeIdAllocator {
            next: max_in_use.0 + 1,
        }
    }

    pub fn next_id(&mut self) -> PlanNodeId {
        let id = PlanNodeId(self.next);
        self.next += 1;
        id
    }
}
