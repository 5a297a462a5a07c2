//! # rangeslice
//!
//! A **split planner** for parallel bulk reads from relational databases. Given a
//! table, a split column and a concurrency target, rangeslice probes the column's
//! range and turns it into non-overlapping `WHERE` predicates, one independent
//! read task per partition.
//!
//! ## Key Features
//!
//! - **Arithmetic splitting** - integer and float keys split by even steps, no extra round trip
//! - **Text splitting** - interpolated synthetic boundaries, or a dialect-specific random sample
//! - **Null handling** - a dedicated `IS NULL` partition when the column has nulls
//! - **Graceful degradation** - any table that cannot be split is read with one whole scan
//! - **Key discovery** - optional single-column primary/unique key lookup from the catalog
//! - **Query mode** - caller-supplied statements are passed through verbatim
//! - **Sequential and parallel planning** - plan tables one by one or on a rayon pool
//!
//! ## Quick Start
//!
//! ```
//! use rangeslice::source::ColumnType;
//! use rangeslice::testing::FakeSource;
//! use rangeslice::{JobConfig, SplitOrchestrator, Value};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = JobConfig::from_json_str(r#"{
//!     "dialect": "mysql",
//!     "connections": [
//!         { "jdbcUrl": "jdbc:mysql://db1:3306/shop", "tables": ["orders"] }
//!     ],
//!     "splitPk": "id",
//!     "splitCount": 3
//! }"#)?;
//!
//! // Any `SqlExecutor` works; the fake answers the two statistics statements.
//! let source = FakeSource::new().with_range_stats(
//!     "orders", "id", None, ColumnType::BigInt, Value::Int(1), Value::Int(100), 0,
//! );
//!
//! let plan = SplitOrchestrator::new(config)?.plan(&source.provider())?;
//! assert_eq!(plan.tasks[0].query, "SELECT * FROM orders WHERE id >= 1 AND id < 34");
//! assert_eq!(plan.tasks[2].query, "SELECT * FROM orders WHERE id >= 67 AND id <= 100");
//! # Ok(())
//! # }
//! ```
//!
//! ## Planning Pipeline
//!
//! 1. [`config`] decides the per-table split count from the concurrency target
//! 2. [`probe`] reads `MIN`, `MAX` and the null count of the split column
//! 3. [`splitter`] turns the range into strictly increasing interior boundaries
//! 4. [`predicate`] turns boundaries into half-open ranges plus an optional null partition
//! 5. [`orchestrator`] wraps each predicate into a [`TaskDescriptor`]
//!
//! ## Module Overview
//!
//! - [`config`] - Job configuration and the split budget
//! - [`dialect`] - Per-database sampling and catalog SQL, resource keys
//! - [`source`] - The connection contract ([`SqlExecutor`], [`ConnectionProvider`])
//! - [`pk`] - Split-key discovery
//! - [`io`] - Plan persistence (JSON Lines)
//! - [`testing`] - Fakes, fixtures and assertions for planner tests

pub mod config;
pub mod dialect;
pub mod io;
pub mod orchestrator;
pub mod pk;
pub mod predicate;
pub mod probe;
pub mod query;
pub mod source;
pub mod splitter;
pub mod task;
pub mod testing;
pub mod value;

// General re-exports
pub use config::{ConnectionConfig, JobConfig};
pub use dialect::Dialect;
pub use orchestrator::{JobPlan, PlanMode, PlanSummary, SingleScanReason, SplitOrchestrator, TableOutcome};
pub use predicate::PartitionPredicate;
pub use probe::{NotSplittable, Probe, RangeStats, RangeStatsProbe};
pub use source::{ConnectionProvider, QueryResult, SourceError, SourceErrorKind, SqlExecutor};
pub use splitter::{PlanError, SplitPlan, SplitPointPlanner, Strategy, StringSplit};
pub use task::{PartitionKind, SliceConfig, TaskDescriptor};
pub use value::{KeyKind, Value};

// Gated re-exports
#[cfg(feature = "io-jsonl")]
pub use io::jsonl::{read_tasks_jsonl, write_tasks_jsonl};
