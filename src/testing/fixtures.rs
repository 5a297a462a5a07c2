//! Ready-made statistics and job configurations for planner tests.

use crate::config::{ConnectionConfig, JobConfig};
use crate::probe::RangeStats;
use crate::value::{KeyKind, Value};

/// Integer statistics over `[min, max]`.
#[must_use]
pub fn int_stats(min: i64, max: i64, has_nulls: bool) -> RangeStats {
    RangeStats {
        min: Value::Int(min),
        max: Value::Int(max),
        kind: KeyKind::Integer,
        has_nulls,
    }
}

#[must_use]
pub fn float_stats(min: f64, max: f64, has_nulls: bool) -> RangeStats {
    RangeStats {
        min: Value::float(min),
        max: Value::float(max),
        kind: KeyKind::Float,
        has_nulls,
    }
}

#[must_use]
pub fn text_stats(min: &str, max: &str, has_nulls: bool) -> RangeStats {
    RangeStats {
        min: Value::text(min),
        max: Value::text(max),
        kind: KeyKind::Text,
        has_nulls,
    }
}

/// A table-mode job reading `tables` from one connection.
///
/// # Example
///
/// ```
/// use rangeslice::testing::table_job;
///
/// let job = table_job("jdbc:mysql://db1:3306/shop", &["orders"], Some("id"), 4);
/// assert_eq!(job.desired_split_count(), 20);
/// ```
#[must_use]
pub fn table_job(
    jdbc_url: &str,
    tables: &[&str],
    split_pk: Option<&str>,
    advice_number: usize,
) -> JobConfig {
    JobConfig {
        connections: vec![ConnectionConfig {
            jdbc_url: jdbc_url.to_string(),
            tables: tables.iter().map(ToString::to_string).collect(),
            query_sql: Vec::new(),
        }],
        split_pk: split_pk.map(str::to_string),
        advice_number,
        ..JobConfig::default()
    }
}

/// A query-mode job passing `queries` through on one connection.
#[must_use]
pub fn query_job(jdbc_url: &str, queries: &[&str]) -> JobConfig {
    JobConfig {
        connections: vec![ConnectionConfig {
            jdbc_url: jdbc_url.to_string(),
            tables: Vec::new(),
            query_sql: queries.iter().map(ToString::to_string).collect(),
        }],
        ..JobConfig::default()
    }
}
