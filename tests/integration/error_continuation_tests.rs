use hashdiff::crawler::{CrawlError, Crawler, CrawlerConfig, ReadError, ReadErrorPolicy};
use hashdiff::scanner::HashError;
use hashdiff::sources::SourceList;
use hashdiff::store::{InventoryStore, PartitionId};

use std::fs;
use tempfile::tempdir;

#[cfg(unix)]
fn lock(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
    // Root ignores file permissions.
    fs::read(path).is_err()
}

#[cfg(unix)]
fn unlock(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_abort_keeps_rows_written_before_the_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "first").unwrap();
    fs::write(dir.path().join("b.txt"), "locked").unwrap();
    fs::write(dir.path().join("c.txt"), "never reached").unwrap();
    let locked = dir.path().join("b.txt");
    if !lock(&locked) {
        unlock(&locked);
        return;
    }

    let mut sources = SourceList::new();
    sources.register(dir.path()).unwrap();
    let store = InventoryStore::open_in_memory().unwrap();

    let err = Crawler::new(&store, CrawlerConfig::default())
        .crawl(&sources.to_vec())
        .unwrap_err();

    assert!(matches!(
        err,
        CrawlError::Read {
            partition: PartitionId(0),
            source: ReadError::Fingerprint(HashError::PermissionDenied(_)),
        }
    ));
    let records = store.list_records(PartitionId(0)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].filename, "a.txt");

    unlock(&locked);
}

#[cfg(unix)]
#[test]
fn test_skip_continues_past_unreadable_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "first").unwrap();
    fs::write(dir.path().join("b.txt"), "locked").unwrap();
    fs::write(dir.path().join("c.txt"), "last").unwrap();
    let locked = dir.path().join("b.txt");
    if !lock(&locked) {
        unlock(&locked);
        return;
    }

    let mut sources = SourceList::new();
    sources.register(dir.path()).unwrap();
    let store = InventoryStore::open_in_memory().unwrap();

    let summary = Crawler::new(
        &store,
        CrawlerConfig::default().with_read_error_policy(ReadErrorPolicy::Skip),
    )
    .crawl(&sources.to_vec())
    .unwrap();

    assert_eq!(summary.total_files(), 2);
    assert_eq!(summary.skipped_files(), 1);
    assert!(summary.sources[0].skipped[0].to_string().contains("b.txt"));
    let names: Vec<_> = store
        .list_records(PartitionId(0))
        .unwrap()
        .into_iter()
        .map(|r| r.filename)
        .collect();
    assert_eq!(names, vec!["a.txt", "c.txt"]);

    unlock(&locked);
}

#[cfg(unix)]
#[test]
fn test_skip_unreadable_directory() {
    let dir = tempdir().unwrap();
    let sealed = dir.path().join("sealed");
    fs::create_dir(&sealed).unwrap();
    fs::write(sealed.join("inner.txt"), "hidden").unwrap();
    fs::write(dir.path().join("open.txt"), "visible").unwrap();

    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&sealed).is_ok() {
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let mut sources = SourceList::new();
    sources.register(dir.path()).unwrap();
    let store = InventoryStore::open_in_memory().unwrap();

    let summary = Crawler::new(
        &store,
        CrawlerConfig::default().with_read_error_policy(ReadErrorPolicy::Skip),
    )
    .crawl(&sources.to_vec())
    .unwrap();

    assert_eq!(summary.total_files(), 1);
    assert_eq!(summary.skipped_files(), 1);
    assert!(matches!(summary.sources[0].skipped[0], ReadError::Walk(_)));

    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();
}
