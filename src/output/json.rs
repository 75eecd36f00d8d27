//! JSON output formatter for diff reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2024-05-01T12:00:00Z",
//!   "total_records": 2,
//!   "partitions": [
//!     {
//!       "partition": 0,
//!       "root": "/srv/a",
//!       "records": [
//!         {
//!           "id": 2,
//!           "hash": "37b51d194a7513e45b56f6524f2d51f2",
//!           "filename": "y.txt",
//!           "filepath": "/srv/a/y.txt",
//!           "size": 3,
//!           "size_hr": "3 B",
//!           "flag": "diff"
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{OutputError, PartitionReport, Report};

#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    generated_at: DateTime<Utc>,
    total_records: usize,
    partitions: &'a [PartitionReport],
}

/// JSON output formatter.
pub struct JsonOutput<'a> {
    report: &'a Report,
    generated_at: DateTime<Utc>,
}

impl<'a> JsonOutput<'a> {
    /// Create a JSON formatter stamped with the current time.
    #[must_use]
    pub fn new(report: &'a Report) -> Self {
        Self {
            report,
            generated_at: Utc::now(),
        }
    }

    /// Override the generation timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    fn document(&self) -> JsonDocument<'_> {
        JsonDocument {
            generated_at: self.generated_at,
            total_records: self.report.total_records(),
            partitions: &self.report.partitions,
        }
    }

    /// Compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string(&self.document())?)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), OutputError> {
        serde_json::to_writer_pretty(&mut writer, &self.document())?;
        writeln!(writer)?;
        Ok(())
    }
}
