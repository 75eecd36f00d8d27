use hashdiff::crawler::{CrawlError, Crawler, CrawlerConfig};
use hashdiff::scanner::{HashAlgorithm, WalkerConfig};
use hashdiff::sources::SourceList;
use hashdiff::store::{InventoryStore, PartitionId};

use std::fs;
use tempfile::{tempdir, TempDir};

fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn single_source(dir: &TempDir) -> SourceList {
    let mut sources = SourceList::new();
    sources.register(dir.path()).unwrap();
    sources
}

#[test]
fn test_crawl_record_fields() {
    let dir = tree(&[]);
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("data.bin"), vec![0u8; 1500]).unwrap();
    let sources = single_source(&dir);
    let store = InventoryStore::open_in_memory().unwrap();

    Crawler::new(&store, CrawlerConfig::default())
        .crawl(&sources.to_vec())
        .unwrap();

    let records = store.list_records(PartitionId(0)).unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, 1);
    assert_eq!(record.filename, "data.bin");
    assert!(record.filepath.ends_with("data.bin"));
    assert!(record.filepath.starts_with(&*sources.get(0).unwrap().root.to_string_lossy()));
    assert_eq!(record.size, 1500);
    assert_eq!(record.size_hr, "1.5 KB");
    assert_eq!(record.hash.len(), 32);
    assert!(record.hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_crawl_order_is_deterministic() {
    let dir = tree(&[
        ("b/2.txt", "2"),
        ("a/1.txt", "1"),
        ("c.txt", "3"),
        ("a/0.txt", "0"),
    ]);
    let sources = single_source(&dir);

    let names = |store: &InventoryStore| -> Vec<String> {
        store
            .list_records(PartitionId(0))
            .unwrap()
            .into_iter()
            .map(|r| r.filename)
            .collect()
    };

    let first = InventoryStore::open_in_memory().unwrap();
    Crawler::new(&first, CrawlerConfig::default())
        .crawl(&sources.to_vec())
        .unwrap();
    let second = InventoryStore::open_in_memory().unwrap();
    Crawler::new(&second, CrawlerConfig::default())
        .crawl(&sources.to_vec())
        .unwrap();

    assert_eq!(names(&first), vec!["0.txt", "1.txt", "2.txt", "c.txt"]);
    assert_eq!(names(&first), names(&second));
}

#[test]
fn test_crawl_includes_empty_files() {
    let dir = tree(&[("empty", ""), ("full", "x")]);
    let store = InventoryStore::open_in_memory().unwrap();

    Crawler::new(&store, CrawlerConfig::default())
        .crawl(&single_source(&dir).to_vec())
        .unwrap();

    let records = store.list_records(PartitionId(0)).unwrap();
    assert_eq!(records[0].filename, "empty");
    assert_eq!(records[0].hash, "d41d8cd98f00b204e9800998ecf8427e");
    assert_eq!(records[0].size_hr, "0 B");
}

#[test]
fn test_crawl_skip_hidden() {
    let dir = tree(&[(".git/config", "x"), (".env", "y"), ("visible.txt", "z")]);
    let sources = single_source(&dir);

    let store = InventoryStore::open_in_memory().unwrap();
    Crawler::new(&store, CrawlerConfig::default())
        .crawl(&sources.to_vec())
        .unwrap();
    assert_eq!(store.count(PartitionId(0)).unwrap(), 3);

    let store = InventoryStore::open_in_memory().unwrap();
    Crawler::new(
        &store,
        CrawlerConfig::default().with_walker_config(WalkerConfig::new(false, true)),
    )
    .crawl(&sources.to_vec())
    .unwrap();
    assert_eq!(store.count(PartitionId(0)).unwrap(), 1);
}

#[test]
fn test_crawl_blake3_digest() {
    let dir = tree(&[("a.txt", "foo")]);
    let store = InventoryStore::open_in_memory().unwrap();

    Crawler::new(
        &store,
        CrawlerConfig::default().with_algorithm(HashAlgorithm::Blake3),
    )
    .crawl(&single_source(&dir).to_vec())
    .unwrap();

    let hash = &store.list_records(PartitionId(0)).unwrap()[0].hash;
    assert_eq!(hash.len(), 32);
    assert_ne!(hash, "acbd18db4cc2f85cedef654fccc4a4d8");
    assert_eq!(
        *hash,
        blake3::hash(b"foo").to_hex().as_str()[..32].to_string()
    );
}

#[test]
fn test_crawl_partitions_are_isolated() {
    let a = tree(&[("a.txt", "a")]);
    let b = tree(&[("b1.txt", "b"), ("b2.txt", "bb")]);
    let mut sources = SourceList::new();
    sources.register(a.path()).unwrap();
    sources.register(b.path()).unwrap();
    let store = InventoryStore::open_in_memory().unwrap();
    let crawler = Crawler::new(&store, CrawlerConfig::default());

    crawler.crawl_source(&sources.get(1).unwrap()).unwrap();

    assert!(!store.partition_exists(PartitionId(0)).unwrap());
    assert_eq!(store.count(PartitionId(1)).unwrap(), 2);

    crawler.crawl_source(&sources.get(0).unwrap()).unwrap();
    assert_eq!(store.count(PartitionId(0)).unwrap(), 1);
    assert_eq!(store.count(PartitionId(1)).unwrap(), 2);
}

#[test]
fn test_crawl_error_mentions_source() {
    let a = tree(&[]);
    let sources = single_source(&a);
    let root = sources.get(0).unwrap().root;
    drop(a);

    let store = InventoryStore::open_in_memory().unwrap();
    let err = Crawler::new(&store, CrawlerConfig::default())
        .crawl(&sources.to_vec())
        .unwrap_err();

    assert!(matches!(err, CrawlError::SourceUnavailable { .. }));
    assert!(err.to_string().contains(&*root.to_string_lossy()));
}

#[test]
#[cfg(unix)]
fn test_crawl_records_symlinked_files() {
    let outside = tree(&[("target.txt", "linked content")]);
    let dir = tree(&[("real.txt", "real")]);
    std::os::unix::fs::symlink(outside.path().join("target.txt"), dir.path().join("link.txt"))
        .unwrap();
    let sources = single_source(&dir);
    let store = InventoryStore::open_in_memory().unwrap();

    Crawler::new(&store, CrawlerConfig::default())
        .crawl(&sources.to_vec())
        .unwrap();

    let records = store.list_records(PartitionId(0)).unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["link.txt", "real.txt"]);

    let target = hashdiff::scanner::Fingerprinter::new()
        .fingerprint(&outside.path().join("target.txt"))
        .unwrap();
    assert_eq!(records[0].hash, target.hash);
    assert_eq!(records[0].size, "linked content".len() as u64);
}
