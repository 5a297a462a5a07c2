//! Small helpers for assembling the statements the planner emits.

/// Normalize an optional filter: surrounding whitespace is dropped and blank
/// filters are treated as absent.
#[must_use]
pub fn normalize_filter(filter: Option<&str>) -> Option<&str> {
    filter.map(str::trim).filter(|f| !f.is_empty())
}

/// Combine a pre-existing filter with an additional condition.
///
/// With no existing filter the condition stands alone; otherwise both sides are
/// parenthesized and joined with `AND` so operator precedence in the user's
/// filter cannot leak into the condition.
#[must_use]
pub fn and_filter(existing: Option<&str>, condition: &str) -> String {
    match normalize_filter(existing) {
        Some(f) => format!("({f}) AND ({condition})"),
        None => condition.to_string(),
    }
}

/// `SELECT <columns> FROM <table> [WHERE <filter>]`
#[must_use]
pub fn select_sql(columns: &[String], table: &str, filter: Option<&str>) -> String {
    let cols = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    };
    match normalize_filter(filter) {
        Some(f) => format!("SELECT {cols} FROM {table} WHERE {f}"),
        None => format!("SELECT {cols} FROM {table}"),
    }
}
