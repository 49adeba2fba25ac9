// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

const CATALOG: &str = r#"
[[program]]
id = "tomatoes"
name = "Tomato feed"

[[program.cycle]]
id = "morning"
start = "08:00"

[[program.cycle.action]]
name = "Mix nutrients"
flow = "mix"

[[monitor]]
id = "ph"
name = "pH check"
flow = "read-ph"
interval = 5
"#;

fn setup(flows: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("catalog.toml"), CATALOG).unwrap();
    let flows_dir = dir.path().join("flows");
    std::fs::create_dir(&flows_dir).unwrap();
    for (file, content) in flows {
        std::fs::write(flows_dir.join(file), content).unwrap();
    }
    dir
}

#[test]
fn loads_catalog_and_flows() {
    let dir = setup(&[
        ("mix.json", r#"{"id":"mix","name":"Mix","blocks":[{"id":"b1","type":"pump","pump":"A","ml":20}]}"#),
        ("read-ph.json", r#"{"id":"read-ph","name":"Read pH"}"#),
        ("notes.txt", "ignored"),
    ]);

    let catalog =
        FileCatalog::load(&dir.path().join("catalog.toml"), &dir.path().join("flows")).unwrap();

    let mix = catalog.flow("mix").unwrap();
    assert_eq!(mix.blocks.len(), 1);
    assert_eq!(mix.blocks[0].kind, "pump");
    assert_eq!(mix.blocks[0].params["ml"], 20);
    assert!(catalog.flow("read-ph").unwrap().blocks.is_empty());

    let actions = catalog.cycle_actions("tomatoes", "morning").unwrap();
    assert_eq!(actions[0].flow, "mix");
}

#[test]
fn missing_referenced_flow_fails_load() {
    let dir = setup(&[("mix.json", r#"{"id":"mix","name":"Mix"}"#)]);

    let err = FileCatalog::load(&dir.path().join("catalog.toml"), &dir.path().join("flows"))
        .err()
        .unwrap();
    assert!(matches!(err, FlowCatalogError::FlowNotFound(ref id) if id == "read-ph"));
}

#[test]
fn malformed_flow_file_names_the_file() {
    let dir = setup(&[("mix.json", "{not json")]);

    let err = FileCatalog::load(&dir.path().join("catalog.toml"), &dir.path().join("flows"))
        .err()
        .unwrap();
    assert!(err.to_string().contains("mix.json"), "got: {err}");
}

#[test]
fn missing_catalog_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileCatalog::load(&dir.path().join("nope.toml"), dir.path())
        .err()
        .unwrap();
    assert!(matches!(err, FlowCatalogError::Io { .. }));
}
