//! Console table formatter.
//!
//! One section per partition, headed by its source root, then the diff
//! records rendered with `tabled` in columns
//! `id hash filename filepath size size_hr flag`.

use std::io::Write;

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};
use yansi::Paint;

use super::{OutputError, PartitionReport, Report};
use crate::store::{FileRecord, Flag};

/// Position of the `size` column in [`RecordRow`].
const SIZE_COLUMN: usize = 4;

#[derive(Debug, Tabled)]
struct RecordRow<'a> {
    id: i64,
    hash: &'a str,
    filename: &'a str,
    filepath: &'a str,
    size: u64,
    size_hr: &'a str,
    flag: Flag,
}

impl<'a> From<&'a FileRecord> for RecordRow<'a> {
    fn from(record: &'a FileRecord) -> Self {
        Self {
            id: record.id,
            hash: &record.hash,
            filename: &record.filename,
            filepath: &record.filepath,
            size: record.size,
            size_hr: &record.size_hr,
            flag: record.flag,
        }
    }
}

/// Aligned table formatter.
pub struct TableOutput<'a> {
    report: &'a Report,
    color: bool,
}

impl<'a> TableOutput<'a> {
    /// Create a table formatter with emphasized section titles.
    #[must_use]
    pub fn new(report: &'a Report) -> Self {
        Self {
            report,
            color: true,
        }
    }

    /// Enable or disable title emphasis.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write the table.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Io`] if writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), OutputError> {
        for (idx, partition) in self.report.partitions.iter().enumerate() {
            if idx > 0 {
                writeln!(writer)?;
            }
            self.write_partition(&mut writer, partition)?;
        }

        let total = self.report.total_records();
        writeln!(writer)?;
        if total == 0 {
            writeln!(writer, "No differences found.")?;
        } else {
            writeln!(writer, "{} files without a counterpart.", total)?;
        }
        Ok(())
    }

    /// Render the table into a string.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if rendering fails.
    pub fn to_string(&self) -> Result<String, OutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn write_partition<W: Write>(
        &self,
        writer: &mut W,
        partition: &PartitionReport,
    ) -> Result<(), OutputError> {
        let title = format!(
            "Source {} ({}): {} unique",
            partition.partition,
            partition.root.display(),
            partition.records.len()
        );
        if self.color {
            writeln!(writer, "{}", title.bold())?;
        } else {
            writeln!(writer, "{}", title)?;
        }

        if partition.records.is_empty() {
            return Ok(());
        }

        let table = Table::new(partition.records.iter().map(RecordRow::from))
            .with(Style::psql())
            .with(Modify::new(Columns::single(SIZE_COLUMN)).with(Alignment::right()))
            .to_string();
        writeln!(writer, "{}", table)?;
        Ok(())
    }
}
