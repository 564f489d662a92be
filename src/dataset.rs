//! Task dataset loading.
//!
//! One difficulty index per line. Lines that are not integers, or fall
//! outside [1, 10], are skipped with a warning and never abort the load.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Result, SchedulerError};
use crate::models::{is_valid_difficulty, Task};

/// Why a dataset line was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Parsed as an integer outside [1, 10].
    OutOfRange(i64),
    /// Not an integer.
    NotANumber,
}

/// A skipped dataset line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    /// Trimmed line content.
    pub content: String,
    pub reason: SkipReason,
}

/// Tasks loaded from a dataset plus the lines that were skipped.
#[derive(Debug, Clone, Default)]
pub struct DatasetLoad {
    pub tasks: Vec<Task>,
    pub skipped: Vec<SkippedLine>,
}

/// Parses tasks from a reader.
///
/// Lines that are not valid UTF-8 are skipped like any other bad line.
///
/// Task ids are assigned in load order starting at 0; names record the
/// zero-based source line (`task-{index}-{line}`).
pub fn parse_tasks<R: BufRead>(reader: R) -> Result<DatasetLoad> {
    let mut load = DatasetLoad::default();

    for (offset, raw) in reader.split(b'\n').enumerate() {
        let raw = raw?;
        // Undecodable bytes become U+FFFD and fall through to `NotANumber`.
        let line = String::from_utf8_lossy(&raw);
        let content = line.trim();
        let line_no = offset + 1;

        let reason = match content.parse::<i64>() {
            Ok(value) if is_valid_difficulty(value) => {
                let index = value as u8;
                let task = Task::new(load.tasks.len(), index)
                    .with_name(format!("task-{index}-{offset}"));
                load.tasks.push(task);
                continue;
            }
            Ok(value) => {
                warn!(line = line_no, value, "Task index out of range (1-10), skipping");
                SkipReason::OutOfRange(value)
            }
            Err(_) => {
                warn!(line = line_no, content, "Ignoring invalid dataset line");
                SkipReason::NotANumber
            }
        };

        load.skipped.push(SkippedLine {
            line: line_no,
            content: content.to_string(),
            reason,
        });
    }

    Ok(load)
}

/// Loads tasks from a file.
///
/// # Errors
/// `DatasetNotFound` if the file does not exist; `Io` on read failures.
pub fn load_tasks(path: impl AsRef<Path>) -> Result<DatasetLoad> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SchedulerError::DatasetNotFound(path.to_path_buf()));
    }
    let load = parse_tasks(BufReader::new(File::open(path)?))?;
    info!(
        path = %path.display(),
        tasks = load.tasks.len(),
        skipped = load.skipped.len(),
        "Loaded dataset"
    );
    Ok(load)
}
