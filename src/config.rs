//! Job configuration.
//!
//! A job names a dialect and one or more connections. Each connection either lists
//! tables to scan (table mode) or literal queries to pass through (query mode);
//! a job must use one mode throughout.
//!
//! # Example
//!
//! ```
//! use rangeslice::config::JobConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = JobConfig::from_json_str(r#"{
//!     "dialect": "postgresql",
//!     "connections": [
//!         { "jdbcUrl": "jdbc:postgresql://pg1:5432/shop", "tables": ["public.orders"] }
//!     ],
//!     "columns": ["id", "total"],
//!     "splitPk": "id",
//!     "where": "status = 'paid'",
//!     "adviceNumber": 8
//! }"#)?;
//! assert_eq!(config.table_count(), 1);
//! # Ok(())
//! # }
//! ```

use crate::dialect::Dialect;
use crate::query::normalize_filter;
use crate::splitter::StringSplit;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

/// Multiplier applied to the split budget when a job splits exactly one table.
pub const DEFAULT_SPLIT_FACTOR: usize = 5;

/// Top-level job configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobConfig {
    pub dialect: Dialect,
    pub connections: Vec<ConnectionConfig>,
    /// Projected columns; `*` when empty.
    pub columns: Vec<String>,
    /// Split column. When absent, `auto_split_pk` allows catalog discovery.
    pub split_pk: Option<String>,
    /// Pre-existing row filter applied to every scan.
    #[serde(rename = "where")]
    pub filter: Option<String>,
    /// Global concurrency target.
    pub advice_number: usize,
    /// Explicit per-table split count; bypasses the derived budget.
    pub split_count: Option<usize>,
    pub split_factor: usize,
    pub string_split: StringSplit,
    /// Discover a single-column key from the catalog when `split_pk` is unset.
    pub auto_split_pk: bool,
    /// Fail the job instead of scanning whole when no split key is available.
    pub require_split: bool,
}

/// One source connection and what to read from it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
    pub jdbc_url: String,
    pub tables: Vec<String>,
    pub query_sql: Vec<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            connections: Vec::new(),
            columns: vec!["*".to_string()],
            split_pk: None,
            filter: None,
            advice_number: num_cpus::get().max(1),
            split_count: None,
            split_factor: DEFAULT_SPLIT_FACTOR,
            string_split: StringSplit::default(),
            auto_split_pk: false,
            require_split: false,
        }
    }
}

impl JobConfig {
    /// Parse and validate a JSON job configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails [`JobConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("parse job configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON job configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("load {}", path.display()))
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.connections.is_empty() {
            bail!("job configuration has no connections");
        }
        if self.advice_number == 0 {
            bail!("adviceNumber must be at least 1");
        }
        if self.split_factor == 0 {
            bail!("splitFactor must be at least 1");
        }
        if self.split_count == Some(0) {
            bail!("splitCount must be at least 1 when set");
        }
        let table_mode = self.connections.iter().any(|c| !c.tables.is_empty());
        let query_mode = self.connections.iter().any(|c| !c.query_sql.is_empty());
        if table_mode && query_mode {
            bail!("job mixes tables and querySql; use one mode throughout");
        }
        for (i, conn) in self.connections.iter().enumerate() {
            if conn.jdbc_url.trim().is_empty() {
                bail!("connection #{i} has an empty jdbcUrl");
            }
            if conn.tables.is_empty() && conn.query_sql.is_empty() {
                bail!("connection #{i} names neither tables nor querySql");
            }
            if let Some(t) = conn.tables.iter().find(|t| t.trim().is_empty()) {
                bail!("connection #{i} has a blank table name {t:?}");
            }
        }
        Ok(())
    }

    /// True when the job names tables rather than literal queries.
    #[must_use]
    pub fn is_table_mode(&self) -> bool {
        self.connections.iter().any(|c| !c.tables.is_empty())
    }

    #[must_use]
    pub fn table_count(&self) -> usize {
        self.connections.iter().map(|c| c.tables.len()).sum()
    }

    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        normalize_filter(self.filter.as_deref())
    }

    #[must_use]
    pub fn split_pk(&self) -> Option<&str> {
        self.split_pk
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Per-table split count.
    ///
    /// An explicit `split_count` wins. Otherwise the budget is
    /// `ceil(advice_number / table_count)`, multiplied by `split_factor` when the
    /// job splits exactly one table and the budget allows splitting at all.
    #[must_use]
    pub fn desired_split_count(&self) -> usize {
        if let Some(n) = self.split_count {
            return n;
        }
        let tables = self.table_count().max(1);
        let budget = split_budget(self.advice_number, tables);
        if tables == 1 && budget > 1 {
            budget.saturating_mul(self.split_factor)
        } else {
            budget
        }
    }
}

/// `ceil(advice_number / table_count)`
#[must_use]
pub const fn split_budget(advice_number: usize, table_count: usize) -> usize {
    if table_count == 0 {
        return advice_number;
    }
    advice_number.div_ceil(table_count)
}
