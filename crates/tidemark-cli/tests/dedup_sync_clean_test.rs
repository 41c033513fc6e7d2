mod common;
use common::TestFixture;

use predicates::prelude::*;

#[test]
fn test_dedup_report_and_safe_apply() {
    let fixture = TestFixture::new();
    fixture.add_remote_file("/Docs/Finance/tax-2025.pdf", b"same bytes");
    fixture.add_remote_file("/Docs/Finance/copies/tax-2025.pdf", b"same bytes");
    fixture.run_ok(&["init"]);
    fixture.run_ok(&["scan"]);
    fixture.run_ok(&["classify"]);

    let report = fixture.run_ok(&["dedup", "report", "--detail"]);
    assert!(report.contains("1 duplicate groups"));
    assert!(report.contains("keep /Docs/Finance/tax-2025.pdf"));
    assert!(report.contains("drop /Docs/Finance/copies/tax-2025.pdf"));

    fixture.run_ok(&["dedup", "apply", "--tier", "safe"]);
    assert!(fixture.remote_has("/Docs/Finance/tax-2025.pdf"));
    assert!(!fixture.remote_has("/Docs/Finance/copies/tax-2025.pdf"));
}

#[test]
fn test_dedup_apply_refuses_manual_tier() {
    let fixture = TestFixture::new();
    fixture.run_ok(&["init"]);

    fixture
        .command()
        .args(["dedup", "apply", "--tier", "manual"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("by hand"));
}

#[test]
fn test_sync_push_uploads_only_local_side() {
    let fixture = TestFixture::new();
    fixture.add_remote_file("/kept-remote.txt", b"remote only");
    fixture.run_ok(&["init"]);
    fixture.run_ok(&["scan"]);

    fixture.add_local_file("notes/todo.txt", b"local only");
    let out = fixture.run_ok(&["sync", "push"]);

    assert!(out.contains("transferred=1"), "output: {}", out);
    assert!(fixture.remote_has("/notes/todo.txt"));
    // Push never deletes or downloads the remote-only side.
    assert!(fixture.remote_has("/kept-remote.txt"));
    assert!(!fixture.local_root().join("kept-remote.txt").exists());
}

#[test]
fn test_sync_pull_downloads_missing_files() {
    let fixture = TestFixture::new();
    fixture.add_remote_file("/report.pdf", b"contents");
    fixture.run_ok(&["init"]);
    fixture.run_ok(&["scan"]);

    let out = fixture.run_ok(&["sync", "pull"]);
    assert!(out.contains("transferred=1"), "output: {}", out);
    assert!(fixture.local_root().join("report.pdf").exists());
}

#[test]
fn test_clean_apply_removes_only_safe_targets() {
    let fixture = TestFixture::new();
    fixture.add_remote_file("/keep/data.bin", b"payload");
    std::fs::create_dir_all(fixture.remote_root().join("empty")).unwrap();
    fixture.run_ok(&["init"]);
    fixture.run_ok(&["scan"]);

    let report = fixture.run_ok(&["clean", "report"]);
    assert!(report.contains("empty directories: 1"));

    fixture.run_ok(&["clean", "apply"]);
    assert!(!fixture.remote_has("/empty"));
    assert!(fixture.remote_has("/keep/data.bin"));
}

#[test]
fn test_status_clear_lease() {
    let fixture = TestFixture::new();
    fixture.run_ok(&["init"]);

    let out = fixture.run_ok(&["status", "--clear-lease"]);
    assert!(out.contains("write lease cleared"));
}
