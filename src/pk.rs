//! Split-key discovery from catalog metadata.
//!
//! When a job does not name a split column the resolver asks the dialect's catalog
//! for primary and unique keys of the table. Multi-column keys cannot be expressed
//! as a scalar range and are discarded. Among single-column keys the primary key
//! wins, then a numeric unique key, then whichever unique key the catalog listed
//! first.
//!
//! Discovery is best effort: dialects without a catalog statement and catalog
//! errors both resolve to `None`.

use crate::dialect::{Dialect, TableRef};
use crate::source::{QueryResult, SqlExecutor};
use crate::value::Value;
use tracing::{debug, warn};

/// A single-column key reported by the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyCandidate {
    pub column: String,
    pub primary: bool,
    pub numeric: bool,
}

pub struct PrimaryKeyResolver<'a> {
    executor: &'a dyn SqlExecutor,
    dialect: Dialect,
}

impl<'a> PrimaryKeyResolver<'a> {
    #[must_use]
    pub fn new(executor: &'a dyn SqlExecutor, dialect: Dialect) -> Self {
        Self { executor, dialect }
    }

    /// Nominate a split column for `table` (optionally `schema.table`).
    #[must_use]
    pub fn resolve(&self, table: &str) -> Option<String> {
        let catalog = self.dialect.spec().key_catalog?;
        let sql = catalog(&TableRef::parse(table));
        let result = match self.executor.query(&sql) {
            Ok(r) => r,
            Err(err) => {
                warn!(table, dialect = %self.dialect, error = %err, "key discovery failed");
                return None;
            }
        };
        let chosen = choose(&single_column_keys(&result));
        debug!(table, key = ?chosen, "key discovery finished");
        chosen
    }
}

/// Group catalog rows by constraint and keep constraints with exactly one column.
#[must_use]
pub fn single_column_keys(result: &QueryResult) -> Vec<KeyCandidate> {
    // (constraint, primary, columns with types), in catalog order
    let mut groups: Vec<(String, bool, Vec<(String, String)>)> = Vec::new();
    for row in &result.rows {
        let [constraint, kind, column, data_type, ..] = row.as_slice() else {
            continue;
        };
        let (Some(constraint), Some(column)) = (text(constraint), text(column)) else {
            continue;
        };
        let primary = text(kind).is_some_and(|k| k.eq_ignore_ascii_case("PRIMARY KEY"));
        let data_type = text(data_type).unwrap_or_default();
        match groups.iter_mut().find(|(name, _, _)| *name == constraint) {
            Some((_, _, cols)) => cols.push((column, data_type)),
            None => groups.push((constraint, primary, vec![(column, data_type)])),
        }
    }
    groups
        .into_iter()
        .filter_map(|(_, primary, mut cols)| {
            if cols.len() != 1 {
                return None;
            }
            let (column, data_type) = cols.pop()?;
            Some(KeyCandidate {
                column,
                primary,
                numeric: is_numeric_type(&data_type),
            })
        })
        .collect()
}

/// Primary key, then numeric unique key, then first candidate.
#[must_use]
pub fn choose(candidates: &[KeyCandidate]) -> Option<String> {
    candidates
        .iter()
        .find(|c| c.primary)
        .or_else(|| candidates.iter().find(|c| c.numeric))
        .or_else(|| candidates.first())
        .map(|c| c.column.clone())
}

/// Whether a catalog type name denotes a numeric column.
#[must_use]
pub fn is_numeric_type(data_type: &str) -> bool {
    const NUMERIC: &[&str] = &[
        "int", "serial", "number", "numeric", "decimal", "double", "float", "real",
    ];
    let t = data_type.to_ascii_lowercase();
    NUMERIC.iter().any(|n| t.contains(n)) && !t.contains("interval") && !t.contains("point")
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::Text(s) => Some(s.trim().to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_type_names() {
        for t in ["INT", "bigint", "NUMBER(10)", "numeric(12,2)", "double precision", "bigserial"] {
            assert!(is_numeric_type(t), "{t}");
        }
        for t in ["varchar", "uuid", "interval", "point", "text"] {
            assert!(!is_numeric_type(t), "{t}");
        }
    }

    #[test]
    fn preference_order() {
        let unique_text = KeyCandidate {
            column: "code".into(),
            primary: false,
            numeric: false,
        };
        let unique_num = KeyCandidate {
            column: "seq".into(),
            primary: false,
            numeric: true,
        };
        let pk = KeyCandidate {
            column: "uuid".into(),
            primary: true,
            numeric: false,
        };
        assert_eq!(
            choose(&[unique_text.clone(), unique_num.clone(), pk]).as_deref(),
            Some("uuid")
        );
        assert_eq!(
            choose(&[unique_text.clone(), unique_num]).as_deref(),
            Some("seq")
        );
        assert_eq!(choose(&[unique_text]).as_deref(), Some("code"));
        assert_eq!(choose(&[]), None);
    }
}
