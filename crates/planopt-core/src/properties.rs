//! Data-distribution properties.
//!
//! Every physical subtree delivers its output under some distribution. The
//! enforcer compares what a parent requires against what a child actually
//! delivers and inserts exchanges where the two disagree.

use serde::{Deserialize, Serialize};

use crate::sym::Symbol;

/// How a subtree's output rows are spread across workers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// All rows on a single node.
    Single,
    /// Rows hash-partitioned on the given symbols.
    HashPartitioned(Vec<Symbol>),
    /// Every worker holds a full copy.
    Replicated,
    /// No guarantee; rows may be anywhere.
    Arbitrary,
}

impl Distribution {
    /// Whether data already laid out as `self` satisfies a requirement for
    /// `required` without moving.
    ///
    /// Hash partitioning on a subset of the required keys satisfies the
    /// requirement: rows agreeing on the subset agree on placement, so rows
    /// agreeing on the superset are co-located too.
    pub fn satisfies(&self, required: &Distribution) -> bool {
        match (self, required) {
            (_, Distribution::Arbitrary) => true,
            (Distribution::Single, Distribution::Single) => true,
            // A single node trivially co-locates any key.
            (Distribution::Single, Distribution::HashPartitioned(_)) => true,
            (Distribution::HashPartitioned(actual), Distribution::HashPartitioned(required)) => {
                !actual.is_empty() && actual.iter().all(|s| required.contains(s))
            }
            (Distribution::Replicated, Distribution::Replicated) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym::ScalarType;

    fn sym(name: &str) -> Symbol {
        Symbol::new(name, ScalarType::Bigint)
    }

    #[test]
    fn subset_hash_partitioning_satisfies_superset_requirement() {
        let actual = Distribution::HashPartitioned(vec![sym("a")]);
        let required = Distribution::HashPartitioned(vec![sym("a"), sym("b")]);
        assert!(actual.satisfies(&required));
        assert!(!required.satisfies(&actual));
    }

    #[test]
    fn single_satisfies_any_partitioning() {
        let required = Distribution::HashPartitioned(vec![sym("k")]);
        assert!(Distribution::Single.satisfies(&required));
        assert!(Distribution::Single.satisfies(&Distribution::Single));
    }

    #[test]
    fn arbitrary_is_satisfied_by_everything() {
        assert!(Distribution::Replicated.satisfies(&Distribution::Arbitrary));
        assert!(Distribution::Arbitrary.satisfies(&Distribution::Arbitrary));
    }
}
