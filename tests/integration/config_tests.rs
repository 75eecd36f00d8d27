use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use hashdiff::config::Config;
use hashdiff::crawler::ReadErrorPolicy;
use hashdiff::scanner::HashAlgorithm;
use hashdiff::sources::SourceList;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

// Env is left out of these figments; see tests/config_tests.rs for overrides.
fn from_file(path: &std::path::Path) -> Config {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .extract()
        .unwrap()
}

#[test]
fn test_config_load_from_toml() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::create_dir(&a).unwrap();
    fs::create_dir(&b).unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        format!(
            "sources = [{:?}, {:?}]\ndatabase = \"/var/lib/hd.db\"\nalgorithm = \"blake3\"\non_read_error = \"skip\"\nskip_hidden = true\n",
            a.display().to_string(),
            b.display().to_string()
        ),
    )
    .unwrap();

    let config = from_file(&path);

    assert_eq!(config.sources.len(), 2);
    assert_eq!(config.sources.get(1).unwrap().root, b);
    assert_eq!(config.database, Some(PathBuf::from("/var/lib/hd.db")));
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert_eq!(config.on_read_error, ReadErrorPolicy::Skip);
    assert!(config.skip_hidden);
    assert!(!config.follow_symlinks);
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let config = from_file(&dir.path().join("absent.toml"));
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_rejects_unknown_algorithm() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "algorithm = \"sha1\"\n").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract();
    assert!(result.is_err());
}

#[test]
fn test_config_save_and_reload_sources() {
    let dir = tempdir().unwrap();
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    let mut sources = SourceList::new();
    sources.register(a.path()).unwrap();
    sources.register(b.path()).unwrap();

    let path = dir.path().join("hashdiff").join("config.toml");
    let config = Config {
        sources,
        on_read_error: ReadErrorPolicy::Skip,
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    let reloaded = from_file(&path);
    assert_eq!(reloaded, config);
    assert_eq!(
        reloaded.sources.get(0).unwrap().root,
        a.path().canonicalize().unwrap()
    );
}
