//! Inventory record definitions.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Identifies one source's partition (its position in the source list).
///
/// The backing table name is derived from this integer only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PartitionId(pub usize);

impl PartitionId {
    /// Name of the table holding this partition.
    #[must_use]
    pub fn table_name(self) -> String {
        format!("files{}", self.0)
    }

    /// Position of the source in the registration order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for PartitionId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Classification of a record after comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    /// Content not found in the other source (default)
    #[default]
    Diff,
    /// Content also present in the other source
    Shared,
}

impl Flag {
    /// Stored column value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Flag::Diff => "diff",
            Flag::Shared => "shared",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diff" => Ok(Flag::Diff),
            "shared" => Ok(Flag::Shared),
            other => Err(format!("Unknown flag: '{other}'")),
        }
    }
}

impl ToSql for Flag {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

// NULL flags come from tables written before the column had a default.
impl FromSql for Flag {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Flag::Diff),
            ValueRef::Text(text) => std::str::from_utf8(text)
                .map_err(|e| FromSqlError::Other(Box::new(e)))?
                .parse()
                .map_err(|e: String| FromSqlError::Other(e.into())),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// One stored file inventory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Partition-local id, assigned on insert
    pub id: i64,
    /// Content digest (hex)
    pub hash: String,
    /// Base name of the file
    pub filename: String,
    /// Full path as discovered
    pub filepath: String,
    /// Exact size in bytes
    pub size: u64,
    /// Human-readable size
    pub size_hr: String,
    /// Comparison flag
    pub flag: Flag,
}
