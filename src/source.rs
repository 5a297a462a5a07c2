//! The connection contract the planner consumes.
//!
//! The planner never talks to a driver directly. It issues SQL through
//! [`SqlExecutor`], a blocking "run a statement, get back rows" capability.
//! Pooling, timeouts and retries belong to the implementor; by the time an
//! error reaches the planner it is terminal for the table being planned.

use crate::value::{KeyKind, Value};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Error Type
// ============================================================================

/// Error reported by the connection layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub kind: SourceErrorKind,
    pub message: String,
    /// Statement that failed, when known.
    pub sql: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Connection,
    Timeout,
    Permission,
    Syntax,
    Other,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        if let Some(sql) = &self.sql {
            write!(f, " [sql: {sql}]")?;
        }
        Ok(())
    }
}

impl Error for SourceError {}

impl SourceError {
    pub fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            sql: None,
        }
    }

    #[must_use]
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

// ============================================================================
// Result Sets
// ============================================================================

/// Driver-reported column type, modeled on the JDBC type codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Numeric,
    Real,
    Float,
    Double,
    Char,
    Varchar,
    NChar,
    NVarchar,
    LongVarchar,
    Date,
    Timestamp,
    Boolean,
    Binary,
    Other,
}

impl ColumnType {
    /// Bucket the column type into a split-key class.
    #[must_use]
    pub const fn key_kind(self) -> KeyKind {
        match self {
            Self::TinyInt | Self::SmallInt | Self::Integer | Self::BigInt => KeyKind::Integer,
            Self::Decimal | Self::Numeric | Self::Real | Self::Float | Self::Double => {
                KeyKind::Float
            }
            _ => KeyKind::Text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A fully buffered result set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    #[must_use]
    pub const fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Single-column, single-row result.
    #[must_use]
    pub fn scalar(column: Column, value: Value) -> Self {
        Self::new(vec![column], vec![vec![value]])
    }

    #[must_use]
    pub fn first_row(&self) -> Option<&[Value]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// First cell of the first row, if any.
    #[must_use]
    pub fn first_value(&self) -> Option<&Value> {
        self.first_row().and_then(<[Value]>::first)
    }

    #[must_use]
    pub fn column_type(&self, idx: usize) -> Option<ColumnType> {
        self.columns.get(idx).map(|c| c.column_type)
    }
}

// ============================================================================
// Executor Traits
// ============================================================================

/// Blocking SQL execution with retry already applied underneath.
pub trait SqlExecutor: Send + Sync {
    /// Run `sql` and return its buffered rows.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the statement cannot be executed.
    fn query(&self, sql: &str) -> SourceResult<QueryResult>;
}

impl<T: SqlExecutor + ?Sized> SqlExecutor for Arc<T> {
    fn query(&self, sql: &str) -> SourceResult<QueryResult> {
        (**self).query(sql)
    }
}

impl<T: SqlExecutor + ?Sized> SqlExecutor for &T {
    fn query(&self, sql: &str) -> SourceResult<QueryResult> {
        (**self).query(sql)
    }
}

/// Hands out executors per connection URL.
pub trait ConnectionProvider: Sync {
    /// Open (or borrow from a pool) an executor for `jdbc_url`.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when no connection can be established.
    fn executor(&self, jdbc_url: &str) -> SourceResult<Arc<dyn SqlExecutor>>;
}

impl<F> ConnectionProvider for F
where
    F: Fn(&str) -> SourceResult<Arc<dyn SqlExecutor>> + Sync,
{
    fn executor(&self, jdbc_url: &str) -> SourceResult<Arc<dyn SqlExecutor>> {
        self(jdbc_url)
    }
}

/// A provider that serves the same executor for every connection.
pub fn shared(executor: Arc<dyn SqlExecutor>) -> impl ConnectionProvider {
    move |_jdbc_url: &str| -> SourceResult<Arc<dyn SqlExecutor>> { Ok(Arc::clone(&executor)) }
}
