//! Testing utilities for split planning.
//!
//! - **Fake source**: [`FakeSource`], a scripted [`SqlExecutor`](crate::source::SqlExecutor)
//!   that records every statement it sees
//! - **Fixtures**: statistics and job configurations for common scenarios
//! - **Assertions**: coverage and ordering checks over planned partitions
//!
//! # Quick Start
//!
//! ```
//! use rangeslice::source::ColumnType;
//! use rangeslice::testing::*;
//! use rangeslice::{SplitOrchestrator, Value};
//!
//! # fn main() -> anyhow::Result<()> {
//! let source = FakeSource::new().with_range_stats(
//!     "orders", "id", None, ColumnType::BigInt, Value::Int(1), Value::Int(100), 0,
//! );
//! let mut job = table_job("jdbc:mysql://db1:3306/shop", &["orders"], Some("id"), 1);
//! job.split_count = Some(3);
//!
//! let plan = SplitOrchestrator::new(job)?.plan(&source.provider())?;
//! assert_eq!(plan.tasks.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fake_source;
pub mod fixtures;

pub use assertions::*;
pub use fake_source::*;
pub use fixtures::*;
