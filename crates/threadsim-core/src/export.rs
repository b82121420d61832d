//! CSV export of registry snapshots, plus a re-parser for consumers of
//! exported files.
//!
//! The CSV is the only persisted artifact of the engine. Fields are not
//! quoted, matching the format the export has always produced; thread
//! names containing commas will not round-trip.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::thread::{SimThread, ThreadPriority, ThreadState};

/// Exact header line of every export.
pub const CSV_HEADER: &str = "ID,Name,State,Priority,CPU Usage (%),Memory (MB),\
Execution Time (ms),Burst Time (ms),Progress (%)";

/// One parsed row of an exported file.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRecord {
    pub id: u64,
    pub name: String,
    pub state: ThreadState,
    pub priority: ThreadPriority,
    pub cpu_usage: f64,
    pub memory_mb: f64,
    pub execution_ms: u64,
    pub burst_ms: u64,
    pub progress: f64,
}

#[derive(Debug)]
pub enum ExportError {
    Io(io::Error),
    Parse { line: usize, message: String },
}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "IO error: {}", e),
            ExportError::Parse { line, message } => {
                write!(f, "parse error on line {}: {}", line, message)
            }
        }
    }
}

impl std::error::Error for ExportError {}

/// Write a snapshot as CSV, one row per thread in snapshot order.
pub fn write_csv<W: Write>(threads: &[SimThread], mut writer: W) -> Result<(), ExportError> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for t in threads {
        writeln!(
            writer,
            "{},{},{},{},{:.2},{:.2},{},{},{:.2}",
            t.id,
            t.name,
            t.state,
            t.priority,
            t.cpu_usage,
            t.memory_mb,
            t.execution_ms,
            t.burst_ms,
            t.progress_percent()
        )?;
    }
    Ok(())
}

pub fn write_csv_file<P: AsRef<Path>>(path: P, threads: &[SimThread]) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_csv(threads, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Parse a previously exported CSV back into records.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<CsvRecord>, ExportError> {
    let mut lines = BufReader::new(reader).lines();

    match lines.next() {
        Some(header) => {
            let header = header?;
            if header != CSV_HEADER {
                return Err(ExportError::Parse {
                    line: 1,
                    message: format!("unexpected header '{}'", header),
                });
            }
        }
        None => {
            return Err(ExportError::Parse {
                line: 1,
                message: "empty input".into(),
            })
        }
    }

    let mut records = Vec::new();
    for (idx, line) in lines.enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        records.push(parse_row(&line, idx + 2)?);
    }
    Ok(records)
}

fn parse_row(line: &str, line_no: usize) -> Result<CsvRecord, ExportError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 9 {
        return Err(ExportError::Parse {
            line: line_no,
            message: format!("expected 9 fields, got {}", fields.len()),
        });
    }

    fn field<T: std::str::FromStr>(
        raw: &str,
        what: &str,
        line_no: usize,
    ) -> Result<T, ExportError>
    where
        T::Err: fmt::Display,
    {
        raw.parse().map_err(|e| ExportError::Parse {
            line: line_no,
            message: format!("bad {} '{}': {}", what, raw, e),
        })
    }

    Ok(CsvRecord {
        id: field(fields[0], "id", line_no)?,
        name: fields[1].to_string(),
        state: field(fields[2], "state", line_no)?,
        priority: field(fields[3], "priority", line_no)?,
        cpu_usage: field(fields[4], "cpu usage", line_no)?,
        memory_mb: field(fields[5], "memory", line_no)?,
        execution_ms: field(fields[6], "execution time", line_no)?,
        burst_ms: field(fields[7], "burst time", line_no)?,
        progress: field(fields[8], "progress", line_no)?,
    })
}
