use hashdiff::cli::{Cli, OutputFormat};
use hashdiff::compare::compare;
use hashdiff::config::Config;
use hashdiff::crawler::{Crawler, CrawlerConfig};
use hashdiff::error::ExitCode;
use hashdiff::output::Report;
use hashdiff::sources::SourceList;
use hashdiff::store::{Flag, InventoryStore, PartitionId};
use hashdiff::{run_app, write_report};

use clap::Parser;
use std::fs;
use std::path::Path;
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

fn report_names(report: &Report) -> Vec<String> {
    report.rows().map(|(_, r)| r.filename.clone()).collect()
}

#[test]
fn test_pipeline_reports_files_without_counterpart() {
    let a = tree(&[("x.txt", "foo"), ("y.txt", "bar")]);
    let b = tree(&[("z.txt", "foo"), ("w.txt", "baz")]);
    let mut sources = SourceList::new();
    sources.register(a.path()).unwrap();
    sources.register(b.path()).unwrap();

    let store = InventoryStore::open_in_memory().unwrap();
    Crawler::new(&store, CrawlerConfig::default())
        .crawl(&sources.to_vec())
        .unwrap();
    let summary = compare(&store, PartitionId(0), PartitionId(1)).unwrap();
    assert_eq!(summary.matched_hashes, 1);

    let report = Report::collect(&store, &sources.to_vec()).unwrap();
    assert_eq!(report_names(&report), vec!["y.txt", "w.txt"]);

    let shared = store.list_by_flag(PartitionId(0), Flag::Shared).unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].filename, "x.txt");
    assert_eq!(shared[0].hash, "acbd18db4cc2f85cedef654fccc4a4d8");
}

#[test]
fn test_pipeline_nested_duplicates() {
    let a = tree(&[
        ("docs/report.txt", "same"),
        ("docs/copy/report.txt", "same"),
        ("notes.txt", "only in a"),
    ]);
    let b = tree(&[("archive/2023/report-final.txt", "same")]);
    let mut sources = SourceList::new();
    sources.register(a.path()).unwrap();
    sources.register(b.path()).unwrap();

    let store = InventoryStore::open_in_memory().unwrap();
    Crawler::new(&store, CrawlerConfig::default())
        .crawl(&sources.to_vec())
        .unwrap();
    let summary = compare(&store, PartitionId(0), PartitionId(1)).unwrap();

    assert_eq!(summary.left_flagged, 2);
    assert_eq!(summary.right_flagged, 1);
    let report = Report::collect(&store, &sources.to_vec()).unwrap();
    assert_eq!(report_names(&report), vec!["notes.txt"]);
}

#[test]
fn test_pipeline_identical_trees_have_no_differences() {
    let a = tree(&[("a.txt", "1"), ("b.txt", "2")]);
    let b = tree(&[("b.txt", "2"), ("a.txt", "1")]);
    let mut sources = SourceList::new();
    sources.register(a.path()).unwrap();
    sources.register(b.path()).unwrap();

    let store = InventoryStore::open_in_memory().unwrap();
    Crawler::new(&store, CrawlerConfig::default())
        .crawl(&sources.to_vec())
        .unwrap();
    compare(&store, PartitionId(0), PartitionId(1)).unwrap();

    let report = Report::collect(&store, &sources.to_vec()).unwrap();
    assert!(report.is_empty());

    let mut csv = Vec::new();
    write_report(&report, OutputFormat::Csv, false, &mut csv).unwrap();
    assert_eq!(String::from_utf8(csv).unwrap().lines().count(), 1);
}

fn cli(config: &Path, db: &Path, args: &[&str]) -> Cli {
    let mut argv = vec![
        "hashdiff".to_string(),
        "-q".to_string(),
        "--no-color".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--db".to_string(),
        db.display().to_string(),
    ];
    argv.extend(args.iter().map(|s| s.to_string()));
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_run_app_full_cycle() {
    let work = tempdir().unwrap();
    let config = work.path().join("config.toml");
    let db = work.path().join("inventory.db");
    let a = tree(&[("x.txt", "foo"), ("y.txt", "bar")]);
    let b = tree(&[("z.txt", "foo"), ("w.txt", "baz")]);

    let code = run_app(cli(
        &config,
        &db,
        &[
            "source",
            "add",
            &a.path().display().to_string(),
            &b.path().display().to_string(),
        ],
    ))
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    let saved = Config::load_from_path(&config).unwrap();
    assert_eq!(saved.sources.len(), 2);

    let code = run_app(cli(&config, &db, &["run", "--output", "csv"])).unwrap();
    assert_eq!(code, ExitCode::Success);

    let store = InventoryStore::open(&db).unwrap();
    assert_eq!(store.count(PartitionId(0)).unwrap(), 2);
    assert_eq!(store.list_by_flag(PartitionId(1), Flag::Diff).unwrap()[0].filename, "w.txt");
    drop(store);

    // A second plain run appends; --fresh rebuilds.
    run_app(cli(&config, &db, &["crawl"])).unwrap();
    let store = InventoryStore::open(&db).unwrap();
    assert_eq!(store.count(PartitionId(0)).unwrap(), 4);
    drop(store);

    run_app(cli(&config, &db, &["run", "--fresh", "-o", "json"])).unwrap();
    let store = InventoryStore::open(&db).unwrap();
    assert_eq!(store.count(PartitionId(0)).unwrap(), 2);
    drop(store);

    let code = run_app(cli(&config, &db, &["reset"])).unwrap();
    assert_eq!(code, ExitCode::Success);
    let store = InventoryStore::open(&db).unwrap();
    assert_eq!(store.count(PartitionId(0)).unwrap(), 0);
    assert_eq!(store.count(PartitionId(1)).unwrap(), 0);
}

#[test]
fn test_run_app_no_differences_exit_code() {
    let work = tempdir().unwrap();
    let config = work.path().join("config.toml");
    let db = work.path().join("inventory.db");
    let a = tree(&[("x.txt", "foo")]);
    let b = tree(&[("renamed.txt", "foo")]);

    run_app(cli(
        &config,
        &db,
        &[
            "source",
            "add",
            &a.path().display().to_string(),
            &b.path().display().to_string(),
        ],
    ))
    .unwrap();

    let code = run_app(cli(&config, &db, &["run"])).unwrap();
    assert_eq!(code, ExitCode::NoDifferences);
    assert_eq!(code.as_i32(), 2);
}

#[test]
fn test_run_app_third_source_crawled_not_compared() {
    let work = tempdir().unwrap();
    let config = work.path().join("config.toml");
    let db = work.path().join("inventory.db");
    let a = tree(&[("x.txt", "foo")]);
    let b = tree(&[("y.txt", "bar")]);
    let c = tree(&[("z.txt", "foo")]);

    run_app(cli(
        &config,
        &db,
        &[
            "source",
            "add",
            &a.path().display().to_string(),
            &b.path().display().to_string(),
            &c.path().display().to_string(),
        ],
    ))
    .unwrap();
    run_app(cli(&config, &db, &["run"])).unwrap();

    let store = InventoryStore::open(&db).unwrap();
    assert_eq!(store.count(PartitionId(2)).unwrap(), 1);
    assert_eq!(store.list_by_flag(PartitionId(2), Flag::Diff).unwrap().len(), 1);
    assert_eq!(store.list_by_flag(PartitionId(0), Flag::Diff).unwrap().len(), 1);
}
