mod common;
use common::TestFixture;

fn seeded_fixture() -> TestFixture {
    let fixture = TestFixture::new();
    fixture.add_remote_file("/Inbox/Scans/receipt-march.pdf", b"march receipt");
    fixture.add_remote_file("/Inbox/photo-001.jpg", b"jpeg bytes");
    fixture.add_remote_file("/Inbox/tax-return-2025.pdf", b"tax form");
    fixture.add_remote_file("/Misc/unknowable.bin", b"???");
    fixture.run_ok(&["init"]);
    fixture
}

#[test]
fn test_scan_populates_index() {
    let fixture = seeded_fixture();

    let out = fixture.run_ok(&["scan"]);
    assert!(out.contains("discovered="));

    let status = fixture.run_ok(&["status"]);
    assert!(status.contains("4 files"));
    assert!(status.contains("last scan:"));
}

#[test]
fn test_rescan_of_unchanged_tree_updates_nothing() {
    let fixture = seeded_fixture();

    fixture.run_ok(&["scan"]);
    let out = fixture.run_ok(&["scan"]);
    assert!(out.contains("updated=0"), "second scan output: {}", out);
}

#[test]
fn test_classify_cascade_over_scanned_tree() {
    let fixture = seeded_fixture();
    fixture.run_ok(&["scan"]);

    let out = fixture.run_ok(&["classify", "--detail"]);
    // Directory mapping beats every other rule.
    assert!(out.contains("/Inbox/Scans/receipt-march.pdf -> /Docs/Finance"));
    // Keyword match on the filename.
    assert!(out.contains("/Inbox/tax-return-2025.pdf -> /Docs/Finance"));
    // Extension hint.
    assert!(out.contains("/Inbox/photo-001.jpg -> /Media"));
    // Nothing matched: catch-all category.
    assert!(out.contains("/Misc/unknowable.bin -> /Unsorted"));
}

#[test]
fn test_classify_without_force_skips_already_classified() {
    let fixture = seeded_fixture();
    fixture.run_ok(&["scan"]);

    fixture.run_ok(&["classify"]);
    let second = fixture.run_ok(&["classify"]);
    assert!(second.contains("classified=0"), "output: {}", second);
}

#[test]
fn test_scan_json_report() {
    let fixture = seeded_fixture();

    let out = fixture.run_ok(&["--format", "json", "scan"]);
    let report: serde_json::Value = serde_json::from_str(&out).expect("valid json");
    assert_eq!(report["job"], "scan");
    // 4 files plus the /Inbox, /Inbox/Scans, and /Misc directories.
    assert_eq!(report["counts"]["discovered"], 7);
}
