//! Statistics structures and the provider abstraction.
//!
//! Unknown values are first-class: an `Estimate` is either `Known(f64)` or
//! `Unknown`, and every arithmetic combinator propagates `Unknown` rather
//! than inventing a number. Sentinel values like NaN never appear, so
//! downstream comparisons stay total and deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::plan::TableHandle;
use crate::sym::Symbol;

/// A numeric estimate that may be unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimate {
    Known(f64),
    Unknown,
}

impl Estimate {
    pub fn known(v: f64) -> Self {
        Estimate::Known(v)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Estimate::Known(_))
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Estimate::Known(v) => Some(*v),
            Estimate::Unknown => None,
        }
    }

    /// The known value, or `default` when unknown.
    pub fn or(&self, default: f64) -> f64 {
        self.value().unwrap_or(default)
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Estimate {
        match self {
            Estimate::Known(v) => Estimate::Known(f(v)),
            Estimate::Unknown => Estimate::Unknown,
        }
    }

    /// Combines two estimates; unknown on either side poisons the result.
    pub fn combine(self, other: Estimate, f: impl FnOnce(f64, f64) -> f64) -> Estimate {
        match (self, other) {
            (Estimate::Known(a), Estimate::Known(b)) => Estimate::Known(f(a, b)),
            _ => Estimate::Unknown,
        }
    }

    pub fn add(self, other: Estimate) -> Estimate {
        self.combine(other, |a, b| a + b)
    }

    pub fn multiply(self, other: Estimate) -> Estimate {
        self.combine(other, |a, b| a * b)
    }

    pub fn min(self, other: Estimate) -> Estimate {
        self.combine(other, f64::min)
    }

    pub fn max(self, other: Estimate) -> Estimate {
        self.combine(other, f64::max)
    }
}

impl Default for Estimate {
    fn default() -> Self {
        Estimate::Unknown
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Known(v) => write!(f, "{v:.0}"),
            Estimate::Unknown => write!(f, "?"),
        }
    }
}

/// Per-column statistics, either from the catalog or derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolStatistics {
    pub distinct_count: Estimate,
    /// Fraction of rows that are null, in [0, 1].
    pub null_fraction: Estimate,
    /// Average encoded width in bytes.
    pub avg_width: Estimate,
}

impl Default for SymbolStatistics {
    fn default() -> Self {
        SymbolStatistics {
            distinct_count: Estimate::Unknown,
            null_fraction: Estimate::Unknown,
            avg_width: Estimate::Unknown,
        }
    }
}

impl SymbolStatistics {
    /// Scales distinct count after a row-reducing operation: NDV cannot
    /// exceed the remaining row count.
    pub fn cap_distinct(&self, row_count: Estimate) -> SymbolStatistics {
        SymbolStatistics {
            distinct_count: self.distinct_count.combine(row_count, f64::min),
            ..*self
        }
    }
}

/// Statistics for the output of one plan node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStatistics {
    pub row_count: Estimate,
    pub symbols: BTreeMap<Symbol, SymbolStatistics>,
}

impl PlanStatistics {
    pub fn symbol(&self, s: &Symbol) -> SymbolStatistics {
        self.symbols.get(s).copied().unwrap_or_default()
    }

    /// Estimated bytes in this node's output, using the configured default
    /// width for columns with no width statistic.
    pub fn data_size(&self, output: &[Symbol], config: &OptimizerConfig) -> Estimate {
        let row_width: f64 = output
            .iter()
            .map(|s| self.symbol(s).avg_width.or(config.default_column_width))
            .sum();
        self.row_count.map(|rows| rows * row_width)
    }
}

/// Catalog-level statistics for a base table, keyed by column name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableStatistics {
    pub row_count: Estimate,
    pub columns: BTreeMap<String, SymbolStatistics>,
}

/// Source of base-table statistics. Implementations must be shareable across
/// concurrent optimizer runs.
pub trait StatsProvider: Send + Sync {
    /// Statistics for a table, or `None` when the catalog has none. Absent
    /// tables and absent statistics are indistinguishable by design; both
    /// degrade to defaults rather than failing the optimization.
    fn table_statistics(&self, table: &TableHandle) -> Option<TableStatistics>;
}

/// Map-backed provider, used by tests and by the HTTP service which receives
/// statistics inline with each request.
#[derive(Debug, Default)]
pub struct InMemoryStatsProvider {
    tables: BTreeMap<(String, String), TableStatistics>,
}

impl InMemoryStatsProvider {
    pub fn new() -> Self {
        InMemoryStatsProvider::default()
    }

    pub fn with_table(mut self, table: TableHandle, stats: TableStatistics) -> Self {
        self.insert(table, stats);
        self
    }

    pub fn insert(&mut self, table: TableHandle, stats: TableStatistics) {
        self.tables.insert((table.catalog, table.name), stats);
    }
}

impl StatsProvider for InMemoryStatsProvider {
    fn table_statistics(&self, table: &TableHandle) -> Option<TableStatistics> {
        self.tables
            .get(&(table.catalog.clone(), table.name.clone()))
            .cloned()
    }
}
