//! JSON Lines persistence for planned tasks.
//!
//! A plan is written as one [`TaskDescriptor`] per line so an external execution
//! engine can pick it up without linking this crate.
//!
//! # Notes
//! - Empty/whitespace-only lines are skipped on read.
//! - Parent directories are created on write.

use crate::task::TaskDescriptor;
use anyhow::{Context, Result};
use std::fs::{File, create_dir_all};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Write `tasks` to `path`, one JSON document per line.
///
/// # Returns
/// The number of tasks written.
///
/// # Errors
/// Returns an error if the file/dirs cannot be created or any task fails to
/// serialize/flush.
pub fn write_tasks_jsonl(path: impl AsRef<Path>, tasks: &[TaskDescriptor]) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    for (i, task) in tasks.iter().enumerate() {
        serde_json::to_writer(&mut w, task)
            .with_context(|| format!("serialize task #{} to {}", i, path.display()))?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(tasks.len())
}

/// Read tasks previously written by [`write_tasks_jsonl`].
///
/// # Errors
/// Returns an error if the file cannot be opened, read, or if any line fails
/// to parse. Errors include the line number.
pub fn read_tasks_jsonl(path: impl AsRef<Path>) -> Result<Vec<TaskDescriptor>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut out = Vec::new();
    for (i, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("read line {} in {}", i + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let task: TaskDescriptor = serde_json::from_str(&line)
            .with_context(|| format!("parse task on line {} in {}", i + 1, path.display()))?;
        out.push(task);
    }
    Ok(out)
}
