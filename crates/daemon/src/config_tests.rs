// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn empty_file_uses_defaults() {
    let config = Config::parse("").unwrap();

    assert_eq!(config.catalog, PathBuf::from("catalog.toml"));
    assert_eq!(config.flows_dir, PathBuf::from("flows"));
    assert_eq!(config.scheduler, SchedulerConfig::default());
    assert_eq!(config.notify.command, None);
}

#[test]
fn parses_durations_and_sections() {
    let config = Config::parse(
        r#"
state_dir = "state"
shutdown_grace = "3s"

[scheduler]
preempt_timeout = "2m"

[notify]
command = "notify-send"

[dry_run]
block_delay = "50ms"
"#,
    )
    .unwrap();

    assert_eq!(config.shutdown_grace, Duration::from_secs(3));
    assert_eq!(config.scheduler.preempt_timeout, Duration::from_secs(120));
    assert_eq!(config.scheduler.graceful_stop, Duration::from_secs(5));
    assert_eq!(config.notify.command.as_deref(), Some("notify-send"));
    assert_eq!(config.dry_run.block_delay, Duration::from_millis(50));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = Config::parse("catalogue = \"x.toml\"").unwrap_err();
    assert!(matches!(err, LifecycleError::ConfigParse(_)));
}

#[test]
fn paths_resolve_against_the_config_directory() {
    let config = Config::parse("state_dir = \"state\"\ncatalog = \"farm.toml\"").unwrap();

    let paths = config.paths(Path::new("/srv/sprig")).unwrap();

    assert_eq!(paths.state_dir, PathBuf::from("/srv/sprig/state"));
    assert_eq!(paths.catalog, PathBuf::from("/srv/sprig/farm.toml"));
    assert_eq!(paths.flows_dir, PathBuf::from("/srv/sprig/flows"));
    assert_eq!(paths.wal, PathBuf::from("/srv/sprig/state/wal.jsonl"));
}

#[test]
fn absolute_state_dir_is_kept() {
    let config = Config::parse("state_dir = \"/var/lib/sprig\"").unwrap();

    let paths = config.paths(Path::new("/etc/sprig")).unwrap();

    assert_eq!(paths.lock, PathBuf::from("/var/lib/sprig/sprigd.pid"));
}

#[test]
fn missing_implicit_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE);

    assert!(Config::load(&path, false).is_ok());
    assert!(matches!(
        Config::load(&path, true),
        Err(LifecycleError::ConfigRead(..))
    ));
}
