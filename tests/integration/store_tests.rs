use hashdiff::scanner::Fingerprinter;
use hashdiff::store::{Flag, InventoryStore, PartitionId, StoreError};

use rusqlite::Connection;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_store_layout_matches_table_per_source() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("inventory.db");
    {
        let store = InventoryStore::open(&db).unwrap();
        store.create_partition(PartitionId(0)).unwrap();
        store.create_partition(PartitionId(1)).unwrap();
    }

    let conn = Connection::open(&db).unwrap();
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('files1') ORDER BY cid")
        .unwrap();
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        columns,
        vec!["id", "hash", "filename", "filepath", "size", "size_hr", "flag"]
    );
}

#[test]
fn test_store_reads_legacy_database() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("data.db");
    {
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE files0 (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hash TEXT NOT NULL, filename TEXT NOT NULL, filepath TEXT NOT NULL,
                size INTEGER NOT NULL, size_hr TEXT NOT NULL, flag TEXT);
             INSERT INTO files0 (hash, filename, filepath, size, size_hr)
                VALUES ('acbd18db4cc2f85cedef654fccc4a4d8', 'x.txt', '/a/x.txt', 3, '3 B');
             INSERT INTO files0 (hash, filename, filepath, size, size_hr, flag)
                VALUES ('37b51d194a7513e45b56f6524f2d51f2', 'y.txt', '/a/y.txt', 3, '3 B', 'shared');",
        )
        .unwrap();
    }

    let store = InventoryStore::open(&db).unwrap();
    store.create_partition(PartitionId(0)).unwrap();

    let diff = store.list_by_flag(PartitionId(0), Flag::Diff).unwrap();
    assert_eq!(diff.len(), 1);
    assert_eq!(diff[0].filename, "x.txt");
    assert_eq!(store.list_by_flag(PartitionId(0), Flag::Shared).unwrap().len(), 1);
}

#[test]
fn test_store_appends_fingerprints() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("note.txt");
    fs::write(&file, "bar").unwrap();
    let fp = Fingerprinter::new().fingerprint(&file).unwrap();

    let store = InventoryStore::open_in_memory().unwrap();
    store.create_partition(PartitionId(3)).unwrap();
    let id = store.append(PartitionId(3), &fp).unwrap();

    assert_eq!(id, 1);
    assert_eq!(store.list_hashes(PartitionId(3)).unwrap(), vec![fp.hash.clone()]);
    let record = &store.list_records(PartitionId(3)).unwrap()[0];
    assert_eq!(record.filepath, file.to_string_lossy());
    assert_eq!(record.flag, Flag::Diff);
}

#[test]
fn test_store_missing_partition_errors() {
    let store = InventoryStore::open_in_memory().unwrap();
    assert!(matches!(
        store.list_hashes(PartitionId(0)),
        Err(StoreError::MissingPartition(PartitionId(0)))
    ));
    assert!(matches!(
        store.set_flag_by_hash(PartitionId(0), "h", Flag::Shared),
        Err(StoreError::MissingPartition(_))
    ));
    assert_eq!(store.clear_partition(PartitionId(0)).unwrap(), 0);
}

#[test]
fn test_store_open_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("a").join("b").join("inventory.db");
    InventoryStore::open(&db).unwrap();
    assert!(db.exists());
}
