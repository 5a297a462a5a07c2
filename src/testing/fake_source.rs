//! Scripted in-memory SQL source.
//!
//! Replies are chosen by substring: the most recently registered rule whose needle
//! occurs in the statement wins. Statements no rule matches fail with a
//! [`SourceErrorKind::Syntax`] error, so unexpected SQL surfaces in tests.

use crate::probe::{min_max_sql, null_count_sql};
use crate::source::{
    Column, ColumnType, ConnectionProvider, QueryResult, SourceError, SourceErrorKind,
    SourceResult, SqlExecutor, shared,
};
use crate::value::Value;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
enum Reply {
    Rows(QueryResult),
    Fail(SourceErrorKind, String),
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<(String, Reply)>,
    log: Vec<String>,
}

/// A [`SqlExecutor`] answering from scripted rules and recording every statement.
///
/// Clones share rules and log.
///
/// # Example
///
/// ```
/// use rangeslice::source::{ColumnType, SqlExecutor};
/// use rangeslice::testing::FakeSource;
/// use rangeslice::Value;
///
/// let source = FakeSource::new().with_range_stats(
///     "orders", "id", None, ColumnType::BigInt, Value::Int(1), Value::Int(100), 0,
/// );
/// let result = source.query("SELECT MIN(id), MAX(id) FROM orders WHERE id IS NOT NULL").unwrap();
/// assert_eq!(result.first_row().unwrap()[1], Value::Int(100));
/// ```
#[derive(Clone, Debug, Default)]
pub struct FakeSource {
    state: Arc<Mutex<State>>,
}

impl FakeSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `needle` with `result`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn on(self, needle: impl Into<String>, result: QueryResult) -> Self {
        self.push(needle.into(), Reply::Rows(result));
        self
    }

    /// Fail statements containing `needle`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn fail_on(
        self,
        needle: impl Into<String>,
        kind: SourceErrorKind,
        message: impl Into<String>,
    ) -> Self {
        self.push(needle.into(), Reply::Fail(kind, message.into()));
        self
    }

    /// Script both statistics statements for `column` of `table`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn with_range_stats(
        self,
        table: &str,
        column: &str,
        filter: Option<&str>,
        column_type: ColumnType,
        min: Value,
        max: Value,
        null_count: i64,
    ) -> Self {
        let extremes = QueryResult::new(
            vec![
                Column::new(format!("MIN({column})"), column_type),
                Column::new(format!("MAX({column})"), column_type),
            ],
            vec![vec![min, max]],
        );
        let nulls = QueryResult::scalar(
            Column::new("COUNT(*)", ColumnType::BigInt),
            Value::Int(null_count),
        );
        self.on(min_max_sql(table, column, filter), extremes)
            .on(null_count_sql(table, column, filter), nulls)
    }

    /// Every statement executed so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.state.lock().expect("fake source mutex poisoned").log.clone()
    }

    /// Executed statements containing `needle`.
    #[must_use]
    pub fn queries_matching(&self, needle: &str) -> Vec<String> {
        self.queries()
            .into_iter()
            .filter(|q| q.contains(needle))
            .collect()
    }

    /// A provider serving this source for every connection URL.
    #[must_use]
    pub fn provider(&self) -> impl ConnectionProvider {
        shared(Arc::new(self.clone()))
    }

    fn push(&self, needle: String, reply: Reply) {
        self.state
            .lock()
            .expect("fake source mutex poisoned")
            .rules
            .push((needle, reply));
    }
}

impl SqlExecutor for FakeSource {
    fn query(&self, sql: &str) -> SourceResult<QueryResult> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SourceError::new(SourceErrorKind::Other, "fake source mutex poisoned"))?;
        state.log.push(sql.to_string());
        let reply = state
            .rules
            .iter()
            .rev()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone());
        match reply {
            Some(Reply::Rows(result)) => Ok(result),
            Some(Reply::Fail(kind, message)) => Err(SourceError::new(kind, message).with_sql(sql)),
            None => Err(
                SourceError::new(SourceErrorKind::Syntax, "no scripted reply").with_sql(sql),
            ),
        }
    }
}
