//! Range predicates over the split column.
//!
//! Boundaries `b1 < b2 < ... < bk` between `min` and `max` become `k + 1` ranges:
//!
//! ```text
//! [min, b1) [b1, b2) ... [b(k-1), bk) [bk, max]
//! ```
//!
//! Every range is half-open except the last, which closes on `max` so the maximum
//! is claimed exactly once. When the column has nulls a final `col IS NULL`
//! partition is appended. Together the predicates cover the unsplit row set with
//! no overlap.

use crate::probe::RangeStats;
use crate::splitter::SplitPlan;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};

/// One partition of the split column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PartitionPredicate {
    #[serde(rename_all = "camelCase")]
    Range {
        column: String,
        lower: Value,
        lower_inclusive: bool,
        upper: Value,
        upper_inclusive: bool,
    },
    IsNull { column: String },
}

impl PartitionPredicate {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Range { column, .. } | Self::IsNull { column } => column,
        }
    }

    #[must_use]
    pub const fn is_null_sentinel(&self) -> bool {
        matches!(self, Self::IsNull { .. })
    }

    /// Render as a SQL condition. Text bounds are quoted, numeric bounds are not.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Range {
                column,
                lower,
                lower_inclusive,
                upper,
                upper_inclusive,
            } => {
                let lo_op = if *lower_inclusive { ">=" } else { ">" };
                let hi_op = if *upper_inclusive { "<=" } else { "<" };
                format!(
                    "{column} {lo_op} {} AND {column} {hi_op} {}",
                    lower.to_sql_literal(),
                    upper.to_sql_literal()
                )
            }
            Self::IsNull { column } => format!("{column} IS NULL"),
        }
    }

    /// Whether a row whose split value is `v` falls in this partition.
    #[must_use]
    pub fn contains(&self, v: &Value) -> bool {
        match self {
            Self::IsNull { .. } => v.is_null(),
            Self::Range {
                lower,
                lower_inclusive,
                upper,
                upper_inclusive,
                ..
            } => {
                if v.is_null() {
                    return false;
                }
                let above = if *lower_inclusive { v >= lower } else { v > lower };
                let below = if *upper_inclusive { v <= upper } else { v < upper };
                above && below
            }
        }
    }
}

impl Display for PartitionPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(&self.to_sql())
    }
}

/// Turn a split plan into partition predicates over `column`.
#[must_use]
pub fn build_predicates(
    column: &str,
    stats: &RangeStats,
    plan: &SplitPlan,
) -> Vec<PartitionPredicate> {
    let mut points = Vec::with_capacity(plan.boundaries.len() + 2);
    points.push(&stats.min);
    points.extend(plan.boundaries.iter());
    points.push(&stats.max);

    let last = points.len() - 2;
    let mut out: Vec<PartitionPredicate> = points
        .windows(2)
        .enumerate()
        .map(|(i, pair)| PartitionPredicate::Range {
            column: column.to_string(),
            lower: pair[0].clone(),
            lower_inclusive: true,
            upper: pair[1].clone(),
            upper_inclusive: i == last,
        })
        .collect();

    if stats.has_nulls {
        out.push(PartitionPredicate::IsNull {
            column: column.to_string(),
        });
    }
    out
}
