//! Split orchestration: job configuration in, task descriptors out.
//!
//! Each table runs through its own small state machine:
//!
//! ```text
//! Unplanned --(no split key)-------------------------------> [SingleScan]
//! Unplanned --(split count < 2)----------------------------> [SingleScan]
//! Unplanned -> ProbingStats --(error / no rows / all null /
//!                              min == max)-----------------> [SingleScan]
//! Unplanned -> ProbingStats -> Planning -> BuildingPredicates -> [Partitioned(N)]
//! ```
//!
//! One table falling back to a single scan never affects another. Query-mode jobs
//! skip all of this and emit one task per supplied statement.
//!
//! Only a broken plan (see [`PlanError`](crate::splitter::PlanError)) aborts planning
//! unconditionally. A job that sets `require_split` also aborts when a table has no
//! split key or the source rejects the split column as invalid SQL. Every other
//! problem degrades the affected table to a whole-table scan.

use crate::config::JobConfig;
use crate::dialect::resource_key;
use crate::pk::PrimaryKeyResolver;
use crate::predicate::{PartitionPredicate, build_predicates};
use crate::probe::{NotSplittable, Probe, RangeStatsProbe};
use crate::query::{and_filter, select_sql};
use crate::source::{ConnectionProvider, SourceErrorKind};
use crate::splitter::{Sampler, SplitPointPlanner, StringSplit, Strategy};
use crate::task::{PartitionKind, SliceConfig, TaskDescriptor};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FormatResult};
use tracing::{debug, info, warn};

/// How tables of one job are planned relative to each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlanMode {
    /// Table by table on the calling thread.
    #[default]
    Sequential,
    /// Tables in parallel on a rayon pool. `threads: None` uses the global pool.
    Parallel { threads: Option<usize> },
}

/// Why a table is read with one unsplit scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum SingleScanReason {
    NoSplitKey,
    BudgetTooSmall { desired: usize },
    ProbeFailed { error: String },
    NotSplittable { cause: NotSplittable },
}

impl Display for SingleScanReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::NoSplitKey => write!(f, "no split key"),
            Self::BudgetTooSmall { desired } => write!(f, "split count {desired} < 2"),
            Self::ProbeFailed { error } => write!(f, "probe failed: {error}"),
            Self::NotSplittable { cause } => write!(f, "{cause}"),
        }
    }
}

/// Terminal state of one table's planning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TableOutcome {
    SingleScan {
        table: String,
        reason: SingleScanReason,
    },
    #[serde(rename_all = "camelCase")]
    Partitioned {
        table: String,
        split_pk: String,
        partitions: usize,
        strategy: Strategy,
        has_nulls: bool,
    },
}

impl TableOutcome {
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::SingleScan { table, .. } | Self::Partitioned { table, .. } => table,
        }
    }

    #[must_use]
    pub const fn is_partitioned(&self) -> bool {
        matches!(self, Self::Partitioned { .. })
    }
}

/// Everything planning produced for a job.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct JobPlan {
    pub tasks: Vec<TaskDescriptor>,
    /// One entry per table, in configuration order. Empty in query mode.
    pub outcomes: Vec<TableOutcome>,
}

/// Counters describing a [`JobPlan`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub tables: usize,
    pub partitioned: usize,
    pub single_scan: usize,
    pub tasks: usize,
}

impl JobPlan {
    #[must_use]
    pub fn summary(&self) -> PlanSummary {
        let partitioned = self.outcomes.iter().filter(|o| o.is_partitioned()).count();
        PlanSummary {
            tables: self.outcomes.len(),
            partitioned,
            single_scan: self.outcomes.len() - partitioned,
            tasks: self.tasks.len(),
        }
    }

    /// Tasks planned for `table`, in partition order.
    pub fn tasks_for<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a TaskDescriptor> {
        self.tasks
            .iter()
            .filter(move |t| t.table.as_deref() == Some(table))
    }

    /// Human-readable account of the plan.
    #[must_use]
    pub const fn explain(&self) -> PlanExplanation<'_> {
        PlanExplanation { plan: self }
    }
}

/// Display adapter returned by [`JobPlan::explain`].
pub struct PlanExplanation<'a> {
    plan: &'a JobPlan,
}

impl Display for PlanExplanation<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let summary = self.plan.summary();
        writeln!(
            f,
            "┌─ SPLIT PLAN ─────────────────────────────────────────────────┐"
        )?;
        writeln!(f, "│ Tables:            {:>10}", summary.tables)?;
        writeln!(f, "│ Partitioned:       {:>10}", summary.partitioned)?;
        writeln!(f, "│ Single scan:       {:>10}", summary.single_scan)?;
        writeln!(f, "│ Tasks:             {:>10}", summary.tasks)?;
        for outcome in &self.plan.outcomes {
            writeln!(f, "│")?;
            match outcome {
                TableOutcome::Partitioned {
                    table,
                    split_pk,
                    partitions,
                    strategy,
                    has_nulls,
                } => {
                    let nulls = if *has_nulls { " + null partition" } else { "" };
                    writeln!(f, "│ {table}: {partitions} partitions on {split_pk}{nulls}")?;
                    writeln!(f, "│   Strategy: {strategy}")?;
                }
                TableOutcome::SingleScan { table, reason } => {
                    writeln!(f, "│ {table}: single scan")?;
                    writeln!(f, "│   Reason: {reason}")?;
                }
            }
            for task in self.plan.tasks_for(outcome.table()) {
                writeln!(f, "│   [{}] {}", task.index, task.query)?;
            }
        }
        writeln!(
            f,
            "└──────────────────────────────────────────────────────────────┘"
        )
    }
}

/// A table to plan and the connection it lives on.
#[derive(Clone, Copy, Debug)]
struct TableJob<'a> {
    jdbc_url: &'a str,
    table: &'a str,
}

struct TablePlan {
    tasks: Vec<TaskDescriptor>,
    outcome: TableOutcome,
}

/// Entry point of the planner.
#[derive(Clone, Debug)]
pub struct SplitOrchestrator {
    config: JobConfig,
    mode: PlanMode,
}

impl SplitOrchestrator {
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(config: JobConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mode: PlanMode::default(),
        })
    }

    #[must_use]
    pub fn with_mode(mut self, mode: PlanMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Plan every table (or pass through every query) of the job.
    ///
    /// # Errors
    ///
    /// Returns an error when a plan breaks its own invariants, when the planning
    /// thread pool cannot be built, or, if the job sets `require_split`, when a
    /// table has no split key or the source rejects its split column.
    pub fn plan(&self, provider: &dyn ConnectionProvider) -> Result<JobPlan> {
        if !self.config.is_table_mode() {
            let tasks = self.plan_queries();
            info!(tasks = tasks.len(), "query mode, passing statements through");
            return Ok(JobPlan {
                tasks,
                outcomes: Vec::new(),
            });
        }

        let desired = self.config.desired_split_count();
        let jobs: Vec<TableJob<'_>> = self
            .config
            .connections
            .iter()
            .flat_map(|c| {
                c.tables.iter().map(|t| TableJob {
                    jdbc_url: &c.jdbc_url,
                    table: t.trim(),
                })
            })
            .collect();
        info!(
            tables = jobs.len(),
            desired,
            mode = ?self.mode,
            "planning table splits"
        );

        let planned: Vec<TablePlan> = match self.mode {
            PlanMode::Sequential => jobs
                .iter()
                .map(|job| self.plan_table(*job, desired, provider))
                .collect::<Result<_>>()?,
            PlanMode::Parallel { threads } => {
                let run = || {
                    jobs.par_iter()
                        .map(|job| self.plan_table(*job, desired, provider))
                        .collect::<Result<Vec<_>>>()
                };
                match threads {
                    Some(t) => rayon::ThreadPoolBuilder::new()
                        .num_threads(t)
                        .build()
                        .context("build planning thread pool")?
                        .install(run)?,
                    None => run()?,
                }
            }
        };

        let mut plan = JobPlan::default();
        for table_plan in planned {
            plan.tasks.extend(table_plan.tasks);
            plan.outcomes.push(table_plan.outcome);
        }
        Ok(plan)
    }

    fn plan_table(
        &self,
        job: TableJob<'_>,
        desired: usize,
        provider: &dyn ConnectionProvider,
    ) -> Result<TablePlan> {
        let cfg = &self.config;
        let configured = cfg.split_pk();
        if configured.is_none() && !cfg.auto_split_pk {
            return self.no_split_key(job);
        }
        if desired < 2 {
            debug!(table = job.table, desired, "split count too small, scanning whole table");
            return Ok(self.single_scan(
                job,
                configured,
                SingleScanReason::BudgetTooSmall { desired },
            ));
        }

        let executor = match provider.executor(job.jdbc_url) {
            Ok(executor) => executor,
            Err(err) => {
                warn!(table = job.table, error = %err, "no connection for split planning, scanning whole table");
                return Ok(self.single_scan(
                    job,
                    configured,
                    SingleScanReason::ProbeFailed {
                        error: err.to_string(),
                    },
                ));
            }
        };

        let split_pk = match configured {
            Some(pk) => pk.to_string(),
            None => match PrimaryKeyResolver::new(&*executor, cfg.dialect).resolve(job.table)
            {
                Some(pk) => {
                    info!(table = job.table, split_pk = %pk, "discovered split key");
                    pk
                }
                None => return self.no_split_key(job),
            },
        };

        let filter = cfg.filter();
        let stats = match RangeStatsProbe::new(&*executor).probe(job.table, &split_pk, filter)
        {
            Ok(Probe::Stats(stats)) => stats,
            Ok(Probe::NotSplittable(cause)) => {
                debug!(table = job.table, split_pk = %split_pk, %cause, "nothing to split, scanning whole table");
                return Ok(self.single_scan(
                    job,
                    Some(&split_pk),
                    SingleScanReason::NotSplittable { cause },
                ));
            }
            Err(err) if cfg.require_split && err.kind == SourceErrorKind::Syntax => {
                bail!(
                    "table {} requires splitting but split column {split_pk} was rejected: {err}",
                    job.table
                );
            }
            Err(err) => {
                warn!(table = job.table, split_pk = %split_pk, error = %err, "range probe failed, scanning whole table");
                return Ok(self.single_scan(
                    job,
                    Some(&split_pk),
                    SingleScanReason::ProbeFailed {
                        error: err.to_string(),
                    },
                ));
            }
        };

        let planner = match cfg.string_split {
            StringSplit::Interpolate => SplitPointPlanner::new(),
            StringSplit::Sample => SplitPointPlanner::with_sampler(Sampler {
                executor: &*executor,
                dialect: cfg.dialect,
                table: job.table,
                column: &split_pk,
                filter,
            }),
        };
        let plan = planner
            .plan(&stats, desired)
            .with_context(|| format!("plan splits for table {}", job.table))?;
        let predicates = build_predicates(&split_pk, &stats, &plan);

        info!(
            table = job.table,
            split_pk = %split_pk,
            partitions = predicates.len(),
            strategy = %plan.strategy,
            has_nulls = stats.has_nulls,
            "partitioned table scan"
        );
        Ok(self.partitioned(job, &split_pk, &predicates, plan.strategy, stats.has_nulls))
    }

    fn no_split_key(&self, job: TableJob<'_>) -> Result<TablePlan> {
        if self.config.require_split {
            bail!(
                "table {} requires splitting but has no usable single-column split key",
                job.table
            );
        }
        debug!(table = job.table, "no split key, scanning whole table");
        Ok(self.single_scan(job, None, SingleScanReason::NoSplitKey))
    }

    fn single_scan(
        &self,
        job: TableJob<'_>,
        split_pk: Option<&str>,
        reason: SingleScanReason,
    ) -> TablePlan {
        let query = select_sql(&self.config.columns, job.table, self.config.filter());
        let task = self.task(job, query, PartitionKind::Whole, (0, 1), split_pk, None);
        TablePlan {
            tasks: vec![task],
            outcome: TableOutcome::SingleScan {
                table: job.table.to_string(),
                reason,
            },
        }
    }

    fn partitioned(
        &self,
        job: TableJob<'_>,
        split_pk: &str,
        predicates: &[PartitionPredicate],
        strategy: Strategy,
        has_nulls: bool,
    ) -> TablePlan {
        let count = predicates.len();
        let tasks = predicates
            .iter()
            .enumerate()
            .map(|(i, predicate)| {
                let condition = predicate.to_sql();
                let filter = and_filter(self.config.filter(), &condition);
                let query = select_sql(&self.config.columns, job.table, Some(&filter));
                let kind = if predicate.is_null_sentinel() {
                    PartitionKind::Null
                } else {
                    PartitionKind::Range
                };
                self.task(job, query, kind, (i, count), Some(split_pk), Some(condition))
            })
            .collect();
        TablePlan {
            tasks,
            outcome: TableOutcome::Partitioned {
                table: job.table.to_string(),
                split_pk: split_pk.to_string(),
                partitions: count,
                strategy,
                has_nulls,
            },
        }
    }

    fn task(
        &self,
        job: TableJob<'_>,
        query: String,
        kind: PartitionKind,
        (index, count): (usize, usize),
        split_pk: Option<&str>,
        partition_predicate: Option<String>,
    ) -> TaskDescriptor {
        TaskDescriptor {
            table: Some(job.table.to_string()),
            query,
            resource: resource_key(job.jdbc_url),
            kind,
            index,
            count,
            slice: SliceConfig {
                dialect: self.config.dialect,
                jdbc_url: job.jdbc_url.to_string(),
                table: Some(job.table.to_string()),
                columns: self.config.columns.clone(),
                split_pk: split_pk.map(str::to_string),
                filter: self.config.filter().map(str::to_string),
                partition_predicate,
            },
        }
    }

    fn plan_queries(&self) -> Vec<TaskDescriptor> {
        self.config
            .connections
            .iter()
            .flat_map(|conn| {
                let count = conn.query_sql.len();
                conn.query_sql
                    .iter()
                    .enumerate()
                    .map(move |(index, query)| TaskDescriptor {
                        table: None,
                        query: query.clone(),
                        resource: resource_key(&conn.jdbc_url),
                        kind: PartitionKind::Query,
                        index,
                        count,
                        slice: SliceConfig {
                            dialect: self.config.dialect,
                            jdbc_url: conn.jdbc_url.clone(),
                            table: None,
                            columns: self.config.columns.clone(),
                            split_pk: None,
                            filter: None,
                            partition_predicate: None,
                        },
                    })
            })
            .collect()
    }
}
