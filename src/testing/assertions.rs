//! Assertions over planned partitions.

use crate::predicate::PartitionPredicate;
use crate::value::Value;
use std::fmt::Write;

/// Assert that every value falls into exactly one predicate.
///
/// `Value::Null` is expected to land in the `IS NULL` partition.
///
/// # Panics
///
/// Panics listing each value matched by zero or several predicates.
pub fn assert_partitions_cover(predicates: &[PartitionPredicate], values: &[Value]) {
    let mut report = String::new();
    for v in values {
        let hits: Vec<usize> = predicates
            .iter()
            .enumerate()
            .filter(|(_, p)| p.contains(v))
            .map(|(i, _)| i)
            .collect();
        if hits.len() != 1 {
            let _ = writeln!(report, "  {v}: matched partitions {hits:?}");
        }
    }
    assert!(
        report.is_empty(),
        "partitions do not cover values exactly once:\n{report}"
    );
}

/// Assert `values` is strictly increasing.
///
/// # Panics
///
/// Panics at the first pair that is not.
pub fn assert_strictly_increasing(values: &[Value]) {
    for (i, pair) in values.windows(2).enumerate() {
        assert!(
            pair[0] < pair[1],
            "values not strictly increasing at index {}: {} then {}",
            i + 1,
            pair[0],
            pair[1]
        );
    }
}
