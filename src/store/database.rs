//! SQLite-backed inventory store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::record::{FileRecord, Flag, PartitionId};
use crate::scanner::Fingerprint;

/// Errors raised by the inventory store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Any SQLite failure (I/O, corruption, full disk).
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The directory holding the database could not be created.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The partition has never been created.
    #[error("Partition {0} does not exist")]
    MissingPartition(PartitionId),

    /// A size that SQLite cannot hold as a signed 64-bit integer.
    #[error("File size {0} exceeds the storable range")]
    SizeOutOfRange(u64),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable per-source table of fingerprint records.
///
/// The connection runs in autocommit mode: every mutation is committed on
/// its own, and each row is written by a single statement, so an
/// interrupted run never leaves a half-written record behind.
pub struct InventoryStore {
    conn: Connection,
}

impl std::fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStore")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl InventoryStore {
    /// Opens or creates an inventory database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the parent directory cannot be created or
    /// the database cannot be opened.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        log::debug!("Opened inventory database at {}", path.display());

        Ok(Self { conn })
    }

    /// Opens a private in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Creates an empty partition if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on SQLite failure.
    pub fn create_partition(&self, partition: PartitionId) -> StoreResult<()> {
        let table = partition.table_name();
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                hash     TEXT NOT NULL,
                filename TEXT NOT NULL,
                filepath TEXT NOT NULL,
                size     INTEGER NOT NULL,
                size_hr  TEXT NOT NULL,
                flag     TEXT DEFAULT 'diff'
            );
            CREATE INDEX IF NOT EXISTS {table}_hash ON {table} (hash);"
        ))?;
        log::trace!("Partition {} ready ({})", partition, table);
        Ok(())
    }

    /// Whether the partition's table exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on SQLite failure.
    pub fn partition_exists(&self, partition: PartitionId) -> StoreResult<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![partition.table_name()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn ensure_partition(&self, partition: PartitionId) -> StoreResult<String> {
        if self.partition_exists(partition)? {
            Ok(partition.table_name())
        } else {
            Err(StoreError::MissingPartition(partition))
        }
    }

    /// Inserts a record and returns its newly assigned id.
    ///
    /// The flag column takes its default (`diff`). `filepath` is stored as
    /// text; a non-UTF-8 path is converted lossily.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the partition is missing or the insert fails.
    pub fn append(&self, partition: PartitionId, record: &Fingerprint) -> StoreResult<i64> {
        let table = self.ensure_partition(partition)?;
        let size =
            i64::try_from(record.size).map_err(|_| StoreError::SizeOutOfRange(record.size))?;

        self.conn.execute(
            &format!(
                "INSERT INTO {table} (hash, filename, filepath, size, size_hr)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![
                record.hash,
                record.filename,
                record.filepath.to_string_lossy().into_owned(),
                size,
                record.size_hr,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All hashes of the partition, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the partition is missing or the query fails.
    pub fn list_hashes(&self, partition: PartitionId) -> StoreResult<Vec<String>> {
        let table = self.ensure_partition(partition)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT hash FROM {table} ORDER BY id"))?;
        let hashes = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(hashes)
    }

    /// Sets the flag on every record carrying `hash`.
    ///
    /// Returns the number of rows updated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the partition is missing or the update fails.
    pub fn set_flag_by_hash(
        &self,
        partition: PartitionId,
        hash: &str,
        flag: Flag,
    ) -> StoreResult<usize> {
        let table = self.ensure_partition(partition)?;
        let updated = self.conn.execute(
            &format!("UPDATE {table} SET flag = ?1 WHERE hash = ?2"),
            params![flag, hash],
        )?;
        Ok(updated)
    }

    /// Records carrying the given flag, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the partition is missing or the query fails.
    pub fn list_by_flag(
        &self,
        partition: PartitionId,
        flag: Flag,
    ) -> StoreResult<Vec<FileRecord>> {
        let table = self.ensure_partition(partition)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, hash, filename, filepath, size, size_hr, flag FROM {table}
             WHERE COALESCE(flag, 'diff') = ?1 ORDER BY id"
        ))?;
        let records = stmt
            .query_map(params![flag], read_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Every record of the partition, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the partition is missing or the query fails.
    pub fn list_records(&self, partition: PartitionId) -> StoreResult<Vec<FileRecord>> {
        let table = self.ensure_partition(partition)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, hash, filename, filepath, size, size_hr, flag FROM {table} ORDER BY id"
        ))?;
        let records = stmt
            .query_map([], read_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Number of records in the partition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the partition is missing or the query fails.
    pub fn count(&self, partition: PartitionId) -> StoreResult<usize> {
        let table = self.ensure_partition(partition)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Every partition present in the database, in index order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on SQLite failure.
    pub fn partitions(&self) -> StoreResult<Vec<PartitionId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'files%'")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut partitions: Vec<PartitionId> = names
            .iter()
            .filter_map(|name| name.strip_prefix("files")?.parse().ok())
            .map(PartitionId)
            .collect();
        partitions.sort();
        Ok(partitions)
    }

    /// Removes every record of the partition and restarts its id sequence.
    ///
    /// Missing partitions are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on SQLite failure.
    pub fn clear_partition(&self, partition: PartitionId) -> StoreResult<usize> {
        if !self.partition_exists(partition)? {
            return Ok(0);
        }
        let table = partition.table_name();

        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(&format!("DELETE FROM {table}"), [])?;
        tx.execute(
            "DELETE FROM sqlite_sequence WHERE name = ?1",
            params![table],
        )?;
        tx.commit()?;

        log::debug!("Cleared {} records from partition {}", removed, partition);
        Ok(removed)
    }
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    let size: i64 = row.get(4)?;
    Ok(FileRecord {
        id: row.get(0)?,
        hash: row.get(1)?,
        filename: row.get(2)?,
        filepath: row.get(3)?,
        size: u64::try_from(size).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Integer, Box::new(e))
        })?,
        size_hr: row.get(5)?,
        flag: row.get(6)?,
    })
}
