use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use rsb_merge::{merge_bundles, MergeError, MergeOptions};
use rusqlite::Connection;

const SCHEMA: &str = "
    CREATE TABLE TestCases (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
    CREATE TABLE TestCaseRuns (
        id INTEGER PRIMARY KEY,
        testCase_fk INTEGER REFERENCES TestCases(id),
        result TEXT
    );
    CREATE TABLE Attachments (name TEXT, run_fk INTEGER REFERENCES TestCaseRuns);
";

const INFO: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<plist version=\"1.0\">
<dict>
\t<key>dateCreated</key>
\t<date>2024-05-01T12:00:00Z</date>
</dict>
</plist>
";

/// A bundle with `cases` test cases, one run per case, and one attachment
/// per run.
fn bundle(root: &Path, name: &str, cases: usize, blobs: &[(&str, &str)]) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(dir.join("Data")).unwrap();
    for (blob, contents) in blobs {
        std::fs::write(dir.join("Data").join(blob), contents).unwrap();
    }
    std::fs::write(dir.join("Info.plist"), INFO).unwrap();

    let conn = Connection::open(dir.join("database.sqlite3")).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    for i in 1..=cases {
        conn.execute(
            "INSERT INTO TestCases (name) VALUES (?1)",
            [format!("{name}-case{i}")],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO TestCaseRuns (testCase_fk, result) VALUES (?1, 'ok')",
            [i as i64],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO Attachments (name, run_fk) VALUES (?1, ?2)",
            rusqlite::params![format!("{name}-log{i}"), i as i64],
        )
        .unwrap();
    }
    dir
}

fn options() -> MergeOptions {
    MergeOptions {
        now: Some(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()),
        ..MergeOptions::default()
    }
}

fn open(bundle: &Path) -> Connection {
    Connection::open(bundle.join("database.sqlite3")).unwrap()
}

#[test]
fn merged_rows_land_past_the_base() {
    let tmp = tempfile::tempdir().unwrap();
    let a = bundle(tmp.path(), "A", 5, &[("data.0~shared", "same"), ("data.0~a", "a")]);
    let b = bundle(tmp.path(), "B", 3, &[("data.0~shared", "same"), ("data.0~b", "b")]);
    let out = tmp.path().join("merged");

    let report = merge_bundles(&[&a, &b], &out, &options()).unwrap();
    assert_eq!(report.bundles, 2);
    assert_eq!(report.tables["TestCases"], 8);
    assert_eq!(report.tables["TestCaseRuns"], 8);
    assert_eq!(report.tables["Attachments"], 8);
    assert_eq!(report.rows_merged["TestCases"], 3);
    assert_eq!(report.blobs.copied, 1);
    assert_eq!(report.blobs.deduplicated, 1);
    assert!(report.stamped);

    let db = open(&out);
    let b_ids: Vec<(i64, String)> = db
        .prepare("SELECT id, name FROM TestCases WHERE name LIKE 'B-%' ORDER BY id")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        b_ids,
        vec![
            (6, "B-case1".to_string()),
            (7, "B-case2".to_string()),
            (8, "B-case3".to_string()),
        ]
    );

    // Every merged reference still reaches the same logical rows.
    let joined: Vec<(String, String)> = db
        .prepare(
            "SELECT a.name, c.name FROM Attachments a
             JOIN TestCaseRuns r ON a.run_fk = r.id
             JOIN TestCases c ON r.testCase_fk = c.id
             ORDER BY a.rowid",
        )
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(joined.len(), 8);
    for (attachment, case) in &joined {
        assert_eq!(attachment.replace("-log", "-case"), *case);
    }

    let fk: i64 = db
        .query_row("SELECT testCase_fk FROM TestCaseRuns WHERE id = 6", [], |r| r.get(0))
        .unwrap();
    assert_eq!(fk, 6);
    let violations: i64 = db
        .query_row("SELECT COUNT(*) FROM pragma_foreign_key_check", [], |r| r.get(0))
        .unwrap();
    assert_eq!(violations, 0);

    assert!(out.join("Data/data.0~a").is_file());
    assert!(out.join("Data/data.0~b").is_file());
    let info = std::fs::read_to_string(out.join("Info.plist")).unwrap();
    assert!(info.contains("<date>2026-10-19T09:00:00Z</date>"));
}

#[test]
fn row_counts_add_up_across_three_bundles() {
    let tmp = tempfile::tempdir().unwrap();
    let a = bundle(tmp.path(), "A", 2, &[]);
    let b = bundle(tmp.path(), "B", 4, &[]);
    let c = bundle(tmp.path(), "C", 1, &[]);
    let out = tmp.path().join("merged");

    let report = merge_bundles(&[a, b, c], &out, &options()).unwrap();
    assert_eq!(report.tables["TestCases"], 7);
    assert_eq!(report.rows_merged["TestCaseRuns"], 5);

    let c_case: i64 = open(&out)
        .query_row("SELECT id FROM TestCases WHERE name = 'C-case1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(c_case, 7);

    // The source bundles are untouched.
    let a_rows: i64 = open(&tmp.path().join("A"))
        .query_row("SELECT COUNT(*) FROM TestCases", [], |r| r.get(0))
        .unwrap();
    assert_eq!(a_rows, 2);
}

#[test]
fn conflicting_blob_aborts_before_rows_merge() {
    let tmp = tempfile::tempdir().unwrap();
    let a = bundle(tmp.path(), "A", 1, &[("data.0~x", "one")]);
    let b = bundle(tmp.path(), "B", 1, &[("data.0~x", "two")]);
    let out = tmp.path().join("merged");

    let err = merge_bundles(&[&a, &b], &out, &options()).unwrap_err();
    assert!(matches!(err, MergeError::BlobConflict { .. }));
    let rows: i64 = open(&out)
        .query_row("SELECT COUNT(*) FROM TestCases", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn needs_two_bundles() {
    let tmp = tempfile::tempdir().unwrap();
    let a = bundle(tmp.path(), "A", 1, &[]);
    let err = merge_bundles(&[&a], &tmp.path().join("merged"), &options()).unwrap_err();
    assert!(matches!(err, MergeError::NotEnoughSources(1)));
}

#[test]
fn refuses_existing_output() {
    let tmp = tempfile::tempdir().unwrap();
    let a = bundle(tmp.path(), "A", 1, &[]);
    let b = bundle(tmp.path(), "B", 1, &[]);
    let err = merge_bundles(&[&a, &b], &a, &options()).unwrap_err();
    assert!(matches!(err, MergeError::OutputExists(_)));
}

#[test]
fn rejects_directory_without_database() {
    let tmp = tempfile::tempdir().unwrap();
    let a = bundle(tmp.path(), "A", 1, &[]);
    let empty = tmp.path().join("empty");
    std::fs::create_dir(&empty).unwrap();
    let err = merge_bundles(&[&a, &empty], &tmp.path().join("merged"), &options()).unwrap_err();
    assert!(matches!(err, MergeError::NotABundle(p) if p == empty));
}
