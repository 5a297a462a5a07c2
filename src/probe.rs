//! Range statistics for a split column.
//!
//! The probe issues two aggregate statements against the source:
//!
//! ```text
//! SELECT MIN(col), MAX(col) FROM table WHERE [(filter) AND ] col IS NOT NULL
//! SELECT COUNT(*) FROM table WHERE [(filter) AND ] col IS NULL
//! ```
//!
//! and reports either [`RangeStats`] or the reason the column cannot be split.
//! Query errors are returned as-is; deciding what to do about them (fall back to
//! a single scan) is the caller's job.
//!
//! Float-class extremes that `f64` cannot carry exactly (wide `DECIMAL`s, large
//! `NUMBER` ids) are moved one ulp outward, so predicates rendered from them still
//! admit the true minimum and maximum rows.

use crate::query::and_filter;
use crate::source::{SourceError, SourceResult, SqlExecutor};
use crate::value::{KeyKind, Value};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};
use tracing::debug;

/// Observed extremes of a split column under the job's filter.
///
/// Only constructed when both extremes exist and differ.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeStats {
    pub min: Value,
    pub max: Value,
    pub kind: KeyKind,
    /// At least one row has a null split value.
    pub has_nulls: bool,
}

/// Why a probed column yields no range to split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotSplittable {
    /// The filtered table is empty.
    NoRows,
    /// Every filtered row has a null split value.
    AllNull,
    /// `min == max`.
    NoSpread,
    /// The extremes cannot be represented in the reported key class.
    Unconvertible,
}

impl Display for NotSplittable {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let s = match self {
            Self::NoRows => "no rows",
            Self::AllNull => "split column is entirely null",
            Self::NoSpread => "min equals max",
            Self::Unconvertible => "extremes do not match the column type",
        };
        f.write_str(s)
    }
}

/// Outcome of a probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Probe {
    Stats(RangeStats),
    NotSplittable(NotSplittable),
}

#[must_use]
pub fn min_max_sql(table: &str, column: &str, filter: Option<&str>) -> String {
    format!(
        "SELECT MIN({column}), MAX({column}) FROM {table} WHERE {}",
        and_filter(filter, &format!("{column} IS NOT NULL"))
    )
}

#[must_use]
pub fn null_count_sql(table: &str, column: &str, filter: Option<&str>) -> String {
    format!(
        "SELECT COUNT(*) FROM {table} WHERE {}",
        and_filter(filter, &format!("{column} IS NULL"))
    )
}

/// Runs the statistics statements through a borrowed executor.
pub struct RangeStatsProbe<'a> {
    executor: &'a dyn SqlExecutor,
}

impl<'a> RangeStatsProbe<'a> {
    #[must_use]
    pub fn new(executor: &'a dyn SqlExecutor) -> Self {
        Self { executor }
    }

    /// Probe `column` of `table` under the optional pre-existing `filter`.
    ///
    /// # Errors
    ///
    /// Returns the connection layer's error if either statement fails.
    pub fn probe(&self, table: &str, column: &str, filter: Option<&str>) -> SourceResult<Probe> {
        let sql = min_max_sql(table, column, filter);
        let extremes = self
            .executor
            .query(&sql)
            .map_err(|e| with_sql_if_missing(e, &sql))?;
        let kind = extremes
            .column_type(0)
            .map_or(KeyKind::Text, |t| t.key_kind());
        let (min, max) = match extremes.first_row() {
            Some([min, max, ..]) => (min.clone(), max.clone()),
            _ => (Value::Null, Value::Null),
        };

        let null_sql = null_count_sql(table, column, filter);
        let nulls = self
            .executor
            .query(&null_sql)
            .map_err(|e| with_sql_if_missing(e, &null_sql))?;
        let null_count = nulls.first_value().and_then(Value::as_i64).unwrap_or(0);
        let has_nulls = null_count > 0;

        debug!(table, column, %min, %max, ?kind, null_count, "probed split column");

        if min.is_null() || max.is_null() {
            let reason = if has_nulls {
                NotSplittable::AllNull
            } else {
                NotSplittable::NoRows
            };
            return Ok(Probe::NotSplittable(reason));
        }

        let (Some(lo), Some(hi)) = (min.coerce(kind), max.coerce(kind)) else {
            return Ok(Probe::NotSplittable(NotSplittable::Unconvertible));
        };
        if lo == hi {
            return Ok(Probe::NotSplittable(NotSplittable::NoSpread));
        }
        let (lo, hi) = match kind {
            KeyKind::Float => (enclose(&min, lo, false), enclose(&max, hi, true)),
            KeyKind::Integer | KeyKind::Text => (lo, hi),
        };

        Ok(Probe::Stats(RangeStats {
            min: lo,
            max: hi,
            kind,
            has_nulls,
        }))
    }
}

/* ---------- Lossy float extremes ---------- */

/// The source compares against the exact value it reported. When that value does
/// not render back unchanged from `f64`, step the bound one ulp outward (`up` for
/// the maximum) so the rendered literal still encloses it.
fn enclose(reported: &Value, coerced: Value, up: bool) -> Value {
    let Some(v) = coerced.as_f64() else {
        return coerced;
    };
    if renders_exactly(reported, v) {
        return coerced;
    }
    let widened = next_float(v, up);
    if widened.is_finite() {
        Value::float(widened)
    } else {
        coerced
    }
}

fn renders_exactly(reported: &Value, v: f64) -> bool {
    match reported {
        Value::Null | Value::Float(_) => true,
        Value::Int(i) => Value::float(v).as_i64() == Some(*i),
        Value::Text(s) => {
            normalize_decimal(s.trim()).is_some_and(|d| Some(d) == normalize_decimal(&v.to_string()))
        }
    }
}

/// Canonical form of a plain decimal literal; `None` for anything else
/// (exponents, hex, words).
fn normalize_decimal(s: &str) -> Option<String> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    if int.is_empty() && frac.is_empty() {
        return None;
    }
    if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let int = match int.trim_start_matches('0') {
        "" => "0",
        digits => digits,
    };
    let frac = frac.trim_end_matches('0');
    let mut out = String::with_capacity(int.len() + frac.len() + 2);
    if negative && (int != "0" || !frac.is_empty()) {
        out.push('-');
    }
    out.push_str(int);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    Some(out)
}

/// Adjacent finite `f64` above (`up`) or below `v`.
fn next_float(v: f64, up: bool) -> f64 {
    if v == 0.0 {
        let tiny = f64::from_bits(1);
        return if up { tiny } else { -tiny };
    }
    let bits = v.to_bits();
    if (v > 0.0) == up {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

fn with_sql_if_missing(err: SourceError, sql: &str) -> SourceError {
    if err.sql.is_some() {
        err
    } else {
        err.with_sql(sql)
    }
}
