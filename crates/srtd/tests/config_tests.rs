//! Config file loading against real files on disk.

use srtd::collector::Backend;
use srtd::commands;
use srtd::config::Config;
use std::fs;
use std::io::Cursor;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_from_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        "[collector]\nsince = \"1h30m\"\nbackend = \"linux\"\n\n[poll]\ninterval_secs = 10\n",
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.since().unwrap(), Duration::from_secs(5400));
    assert_eq!(config.collector.backend, Backend::Linux);
    assert_eq!(config.poll.interval_secs, 10);
    assert_eq!(config.poll.timeout_secs, 3);
}

#[test]
fn test_invalid_files_are_rejected() {
    let temp_dir = TempDir::new().unwrap();

    let missing = temp_dir.path().join("missing.toml");
    assert!(Config::load_from_path(&missing).is_err());

    let garbled = temp_dir.path().join("garbled.toml");
    fs::write(&garbled, "[collector\nsince = 1h").unwrap();
    assert!(Config::load_from_path(&garbled).is_err());

    let zero_timeout = temp_dir.path().join("zero.toml");
    fs::write(&zero_timeout, "[poll]\ntimeout_secs = 0\n").unwrap();
    let err = Config::load_from_path(&zero_timeout).unwrap_err();
    assert!(err.to_string().contains("timeout_secs"));

    let bad_backend = temp_dir.path().join("backend.toml");
    fs::write(&bad_backend, "[collector]\nbackend = \"windows\"\n").unwrap();
    assert!(Config::load_from_path(&bad_backend).is_err());
}

#[test]
fn test_saved_config_reloads() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    let mut config = Config::default();
    config.collector.since = "45m".to_string();
    fs::write(&path, config.to_toml().unwrap()).unwrap();

    assert_eq!(Config::load_from_path(&path).unwrap(), config);
}

#[test]
fn test_parse_captured_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("journal.txt");
    fs::write(
        &path,
        "Nov 03 16:25:43 host bwrap[12345]: Permission denied: /path/to/file\n",
    )
    .unwrap();

    assert!(commands::parse(commands::LogFormat::Journal, &path, true, 5).is_ok());
    assert!(commands::parse(commands::LogFormat::Journal, &temp_dir.path().join("nope"), true, 5).is_err());

    let ctx = srt_shared::ParseContext::now();
    let harvest = commands::parse_reader(
        commands::LogFormat::Journal,
        Cursor::new(fs::read(&path).unwrap()),
        &ctx,
    );
    assert_eq!(harvest.len(), 1);
}
