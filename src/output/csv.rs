//! CSV output formatter for diff reports.
//!
//! One row per diff record.
//!
//! # Columns
//!
//! - `source`: Partition index of the record
//! - `id`: Partition-local record id
//! - `hash`: Content digest (hexadecimal)
//! - `filename`: Base name
//! - `filepath`: Full path as discovered
//! - `size`: File size in bytes
//! - `size_hr`: Human-readable size
//! - `flag`: Always `diff`

use std::io;

use serde::Serialize;

use super::{OutputError, Report};
use crate::store::Flag;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    source: usize,
    id: i64,
    hash: &'a str,
    filename: &'a str,
    filepath: &'a str,
    size: u64,
    size_hr: &'a str,
    flag: Flag,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    report: &'a Report,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(report: &'a Report) -> Self {
        Self { report }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), OutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        if self.report.is_empty() {
            csv_writer.write_record([
                "source", "id", "hash", "filename", "filepath", "size", "size_hr", "flag",
            ])?;
        }

        for (partition, record) in self.report.rows() {
            csv_writer.serialize(CsvRow {
                source: partition.index(),
                id: record.id,
                hash: &record.hash,
                filename: &record.filename,
                filepath: &record.filepath,
                size: record.size,
                size_hr: &record.size_hr,
                flag: record.flag,
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if serialization fails.
    pub fn to_string(&self) -> Result<String, OutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
