//! Planned units of work handed to the execution engine.

use crate::dialect::Dialect;
use serde::{Deserialize, Serialize};

/// What slice of the source a task reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartitionKind {
    /// The whole (filtered) table.
    Whole,
    /// One range of the split column.
    Range,
    /// Rows whose split value is null.
    Null,
    /// A user-supplied query, passed through verbatim.
    Query,
}

/// Slice-local copy of the job settings a task needs to run on its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceConfig {
    pub dialect: Dialect,
    pub jdbc_url: String,
    pub table: Option<String>,
    pub columns: Vec<String>,
    pub split_pk: Option<String>,
    /// The job-level filter, before the partition condition is added.
    #[serde(rename = "where")]
    pub filter: Option<String>,
    /// The partition condition this slice adds to `filter`.
    pub partition_predicate: Option<String>,
}

/// One immutable unit of planned work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    /// Table identifier; `None` in query mode.
    pub table: Option<String>,
    /// Ready-to-run statement.
    pub query: String,
    /// Load-balancing key, normally the source host.
    pub resource: String,
    pub kind: PartitionKind,
    /// Position of this task among its table's (or connection's) tasks.
    pub index: usize,
    pub count: usize,
    pub slice: SliceConfig,
}
