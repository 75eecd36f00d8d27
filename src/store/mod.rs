//! Inventory store for hashdiff.
//!
//! This module persists one table of fingerprint records per registered
//! source and supports the flag updates made by the comparator.
//!
//! # Architecture
//!
//! * [`database`]: SQLite persistence, partition creation and record CRUD.
//! * [`record`]: [`PartitionId`], [`Flag`] and the stored [`FileRecord`].
//!
//! # Layout
//!
//! Source `i` lives in table `files{i}`:
//!
//! ```text
//! id       INTEGER PRIMARY KEY AUTOINCREMENT
//! hash     TEXT NOT NULL
//! filename TEXT NOT NULL
//! filepath TEXT NOT NULL
//! size     INTEGER NOT NULL
//! size_hr  TEXT NOT NULL
//! flag     TEXT DEFAULT 'diff'
//! ```

pub mod database;
pub mod record;

pub use database::{InventoryStore, StoreError, StoreResult};
pub use record::{FileRecord, Flag, PartitionId};
