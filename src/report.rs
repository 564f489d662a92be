//! CSV export of execution records.
//!
//! Columns: `index,task_name,machine,start_time,exec_time,finish_time,wait_time`.
//! Start and finish are seconds relative to the earliest start in the
//! batch; rows are sorted by relative start. Failed tasks keep their `-1`
//! sentinels.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::models::{seconds_since, ExecutionRecord};

const HEADER: &str = "index,task_name,machine,start_time,exec_time,finish_time,wait_time";

/// One exported row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub index: usize,
    pub task_name: String,
    pub machine: String,
    pub start_time: f64,
    pub exec_time: f64,
    pub finish_time: f64,
    pub wait_time: f64,
}

/// Converts records into rows sorted by relative start time.
pub fn result_rows(records: &[ExecutionRecord]) -> Vec<ResultRow> {
    let Some(origin) = records.iter().map(|r| r.started_at).min() else {
        return Vec::new();
    };

    let mut rows: Vec<ResultRow> = records
        .iter()
        .map(|r| ResultRow {
            index: r.task_id,
            task_name: r.task_name.clone(),
            machine: r.machine.clone(),
            start_time: seconds_since(origin, r.started_at),
            exec_time: r.exec_secs,
            finish_time: seconds_since(origin, r.finished_at),
            wait_time: r.wait_secs,
        })
        .collect();
    rows.sort_by(|a, b| a.start_time.total_cmp(&b.start_time).then(a.index.cmp(&b.index)));
    rows
}

/// Rows to export, or `None` (with a warning) when there are none.
fn rows_to_write(records: &[ExecutionRecord]) -> Option<Vec<ResultRow>> {
    let rows = result_rows(records);
    if rows.is_empty() {
        warn!("No results to write");
        return None;
    }
    Some(rows)
}

fn write_rows<W: Write>(rows: &[ResultRow], mut writer: W) -> Result<usize> {
    writeln!(writer, "{HEADER}")?;
    for row in rows {
        writeln!(
            writer,
            "{},{},{},{:.6},{:.6},{:.6},{:.6}",
            row.index,
            escape(&row.task_name),
            escape(&row.machine),
            row.start_time,
            row.exec_time,
            row.finish_time,
            row.wait_time
        )?;
    }
    writer.flush()?;
    Ok(rows.len())
}

/// Writes records as CSV. Returns the number of data rows written.
///
/// An empty record set writes nothing, not even the header.
pub fn write_results<W: Write>(records: &[ExecutionRecord], writer: W) -> Result<usize> {
    match rows_to_write(records) {
        Some(rows) => write_rows(&rows, writer),
        None => Ok(0),
    }
}

/// Writes records to a CSV file. An empty record set leaves no file behind.
pub fn write_results_file(records: &[ExecutionRecord], path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let Some(rows) = rows_to_write(records) else {
        return Ok(0);
    };
    let written = write_rows(&rows, BufWriter::new(File::create(path)?))?;
    info!(path = %path.display(), rows = written, "Saved execution results");
    Ok(written)
}

/// Quotes a field if it contains a delimiter, quote, or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
