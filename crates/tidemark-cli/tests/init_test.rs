mod common;
use common::TestFixture;

use predicates::prelude::*;

#[test]
fn test_init_creates_store_and_keeps_existing_config() {
    let fixture = TestFixture::new();

    fixture.run_ok(&["init"]);
    assert!(fixture.db_path().exists());

    // The fixture wrote a config before init; it must not be replaced.
    let config = common::read_to_string(&fixture.data_dir().join("config.toml"));
    assert!(config.contains("meta_batch_size = 50"));

    // Re-running init on an existing store is harmless.
    fixture.run_ok(&["init"]);
}

#[test]
fn test_commands_require_init_first() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tidemark init"));
}

#[test]
fn test_status_on_fresh_store() {
    let fixture = TestFixture::new();
    fixture.run_ok(&["init"]);

    let out = fixture.run_ok(&["status"]);
    assert!(out.contains("0 files"));
    assert!(out.contains("last scan: never"));
    assert!(out.contains("write lease: free"));
}

#[test]
fn test_taxonomy_show_prints_tree() {
    let fixture = TestFixture::new();
    fixture.run_ok(&["init"]);

    let out = fixture.run_ok(&["taxonomy", "show"]);
    assert!(out.contains("Docs"));
    assert!(out.contains("  Finance"));
    assert!(out.contains("invoice"));
}
