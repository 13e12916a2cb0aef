//! # planopt-core: Cost-Based Distributed Query Optimizer Core
//!
//! This crate implements the data structures and algorithms at the heart of a
//! statistics-driven cost-based query optimizer for a distributed SQL engine.
//! It consumes an already-analyzed logical plan plus a statistics provider and
//! produces a distributed physical plan with explicit data-exchange boundaries,
//! ready for fragment scheduling.
//!
//! ## Module Overview
//!
//! - **`plan`**: The immutable plan-node tree (scans, filters, joins, exchanges, ...).
//! - **`expr`**: Scalar expressions over symbols (predicates, projections, join keys).
//! - **`sym`**: Typed symbols and the allocators that mint fresh identities.
//! - **`stats`**: Statistics structures with explicit unknown-tagged estimates,
//!   and the `StatsProvider` abstraction over the catalog.
//! - **`derive`**: Per-variant statistics derivation (selectivity, join cardinality).
//! - **`cost`**: The {cpu, memory, network} cost vector and its total ordering.
//! - **`memo`**: Arena of equivalence groups used to memoize statistics, costs,
//!   and the best alternative found per structurally-distinct subtree.
//! - **`rule`**: The `Rule` trait and the context rules run inside.
//! - **`engine`**: The fixpoint rewrite engine with cancellation and tracing.
//! - **`enforcer`**: The property-satisfaction pass that inserts `Exchange` nodes.
//! - **`properties`**: Data-distribution properties and their satisfaction rules.
//! - **`render`**: Order-stable textual rendering used by golden-plan tests.

pub mod config;
pub mod cost;
pub mod derive;
pub mod enforcer;
pub mod engine;
pub mod error;
pub mod expr;
pub mod memo;
pub mod plan;
pub mod properties;
pub mod render;
pub mod rule;
pub mod stats;
pub mod sym;
pub mod trace;
