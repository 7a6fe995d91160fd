//! Relational merge of one source database into the output.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params_from_iter, Connection, OpenFlags};
use tracing::debug;

use crate::error::{MergeError, MergeResult};
use crate::plan::{plan_table_rows, SqlValue, TableSchema};
use crate::schema::{quote_ident, read_high_water_marks, read_rows, read_schema};

/// Open a source database read-only.
pub fn open_source(path: &Path) -> MergeResult<Connection> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|e| {
        MergeError::SchemaOpen {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })
}

/// Merge every row of the database at `source_path` into `output`.
///
/// Offsets are the output's high-water marks taken once, before any row of
/// this source is inserted. All inserts run in one transaction; a failure
/// rolls the output back to its state before the call. Returns the number
/// of rows inserted per table.
///
/// Foreign-key enforcement is switched off on `output`: tables are merged
/// in name order, so a child table may be filled before its parent.
pub fn merge_database(
    output: &Connection,
    output_schemas: &[TableSchema],
    source_path: &Path,
) -> MergeResult<BTreeMap<String, usize>> {
    let source = open_source(source_path)?;
    let source_schemas = read_schema(&source).map_err(|e| MergeError::SchemaOpen {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })?;
    let marks = read_high_water_marks(output, output_schemas)?;

    output.execute_batch("PRAGMA foreign_keys = OFF;")?;
    let tx = output.unchecked_transaction()?;
    let mut inserted = BTreeMap::new();
    for schema in output_schemas {
        let Some(source_schema) = source_schemas.iter().find(|s| s.name == schema.name) else {
            debug!(table = %schema.name, "table absent from source; skipped");
            continue;
        };
        let shared = shared_columns(schema, source_schema);
        let rows = read_rows(&source, &shared)?;
        let planned = plan_table_rows(&shared, &rows, &marks)?;

        let mut stmt = tx.prepare(&insert_statement(&shared))?;
        let with_rowid = shared.rowid_alias.is_none();
        for row in &planned {
            let rowid = SqlValue::Integer(row.rowid);
            let leading = with_rowid.then_some(&rowid);
            stmt.execute(params_from_iter(leading.into_iter().chain(&row.values)))?;
        }
        debug!(
            table = %schema.name,
            rows = planned.len(),
            offset = marks.get(&schema.name).unwrap_or_default(),
            "merged table"
        );
        inserted.insert(schema.name.clone(), planned.len());
    }
    tx.commit()?;
    Ok(inserted)
}

/// The output table restricted to columns the source also has.
///
/// Foreign keys on dropped columns go with them; the rowid alias is kept
/// only if the source stores it.
fn shared_columns(output: &TableSchema, source: &TableSchema) -> TableSchema {
    let columns: Vec<String> = output
        .columns
        .iter()
        .filter(|c| source.columns.contains(c))
        .cloned()
        .collect();
    let rowid_alias = output
        .rowid_alias
        .clone()
        .filter(|alias| columns.contains(alias));
    let foreign_keys = output
        .foreign_keys
        .iter()
        .filter(|fk| columns.contains(&fk.column))
        .cloned()
        .collect();
    TableSchema {
        name: output.name.clone(),
        columns,
        rowid_alias,
        foreign_keys,
    }
}

/// `INSERT` with an explicit rowid, unless an alias column carries it.
fn insert_statement(schema: &TableSchema) -> String {
    let mut columns: Vec<String> = Vec::with_capacity(schema.columns.len() + 1);
    if schema.rowid_alias.is_none() {
        columns.push("rowid".into());
    }
    columns.extend(schema.columns.iter().map(|c| quote_ident(c)));
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        quote_ident(&schema.name),
        columns.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "
        CREATE TABLE TestCases (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
        CREATE TABLE TestCaseRuns (testCase_fk INTEGER REFERENCES TestCases(id), result TEXT);
    ";

    fn database(dir: &Path, name: &str, rows: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(rows).unwrap();
        path
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn rows_and_references_shift() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = database(
            dir.path(),
            "out.sqlite3",
            "INSERT INTO TestCases (name) VALUES ('a'), ('b');
             INSERT INTO TestCaseRuns VALUES (2, 'ok');",
        );
        let src = database(
            dir.path(),
            "src.sqlite3",
            "INSERT INTO TestCases (name) VALUES ('c');
             INSERT INTO TestCaseRuns VALUES (1, 'fail'), (NULL, 'skip');",
        );

        let output = Connection::open(&out_path).unwrap();
        let schemas = read_schema(&output).unwrap();
        let inserted = merge_database(&output, &schemas, &src).unwrap();
        assert_eq!(inserted["TestCases"], 1);
        assert_eq!(inserted["TestCaseRuns"], 2);

        let name: String = output
            .query_row("SELECT name FROM TestCases WHERE id = 3", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "c");
        let fk: Option<i64> = output
            .query_row("SELECT testCase_fk FROM TestCaseRuns WHERE rowid = 2", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fk, Some(3));
        let fk: Option<i64> = output
            .query_row("SELECT testCase_fk FROM TestCaseRuns WHERE rowid = 3", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fk, None);
    }

    #[test]
    fn child_table_merged_before_its_parent() {
        let dir = tempfile::tempdir().unwrap();
        let schema = "
            CREATE TABLE Suites (id INTEGER PRIMARY KEY, name TEXT);
            CREATE TABLE Runs (id INTEGER PRIMARY KEY, suite_fk INTEGER REFERENCES Suites(id));
            CREATE TABLE Logs (run_fk INTEGER REFERENCES Runs(id), line TEXT);
        ";
        let make = |name: &str, suites: &[&str]| {
            let path = dir.path().join(name);
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(schema).unwrap();
            for (i, suite) in suites.iter().enumerate() {
                let id = i as i64 + 1;
                conn.execute("INSERT INTO Suites (name) VALUES (?1)", [suite]).unwrap();
                conn.execute("INSERT INTO Runs (suite_fk) VALUES (?1)", [id]).unwrap();
                conn.execute(
                    "INSERT INTO Logs VALUES (?1, ?2)",
                    rusqlite::params![id, format!("{suite} log")],
                )
                .unwrap();
            }
            path
        };
        let out_path = make("out.sqlite3", &["a", "b"]);
        let src = make("src.sqlite3", &["c"]);

        let output = Connection::open(&out_path).unwrap();
        let schemas = read_schema(&output).unwrap();
        let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Logs", "Runs", "Suites"]);

        let inserted = merge_database(&output, &schemas, &src).unwrap();
        assert_eq!(inserted["Logs"], 1);
        let line: String = output
            .query_row(
                "SELECT l.line FROM Logs l JOIN Runs r ON l.run_fk = r.id
                 JOIN Suites s ON r.suite_fk = s.id WHERE s.name = 'c'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(line, "c log");
        let violations: i64 = output
            .query_row("SELECT COUNT(*) FROM pragma_foreign_key_check", [], |r| r.get(0))
            .unwrap();
        assert_eq!(violations, 0);
    }

    #[test]
    fn text_bytes_survive_the_merge() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = database(dir.path(), "out.sqlite3", "");
        let src = database(
            dir.path(),
            "src.sqlite3",
            "INSERT INTO TestCaseRuns VALUES (NULL, CAST(x'ff41fe' AS TEXT));",
        );

        let output = Connection::open(&out_path).unwrap();
        let schemas = read_schema(&output).unwrap();
        merge_database(&output, &schemas, &src).unwrap();
        let (kind, hex): (String, String) = output
            .query_row("SELECT typeof(result), hex(result) FROM TestCaseRuns", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(kind, "text");
        assert_eq!(hex, "FF41FE");
    }

    #[test]
    fn failing_insert_rolls_back_everything() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = database(
            dir.path(),
            "out.sqlite3",
            "INSERT INTO TestCases (name) VALUES ('dup');",
        );
        let src = database(
            dir.path(),
            "src.sqlite3",
            "INSERT INTO TestCases (name) VALUES ('dup');
             INSERT INTO TestCaseRuns VALUES (1, 'ok');",
        );

        let output = Connection::open(&out_path).unwrap();
        let schemas = read_schema(&output).unwrap();
        let err = merge_database(&output, &schemas, &src).unwrap_err();
        assert!(matches!(err, MergeError::Sql(_)));
        assert_eq!(count(&output, "TestCases"), 1);
        assert_eq!(count(&output, "TestCaseRuns"), 0);
    }

    #[test]
    fn missing_source_database() {
        let dir = tempfile::tempdir().unwrap();
        let output = Connection::open_in_memory().unwrap();
        let err = merge_database(&output, &[], &dir.path().join("absent.sqlite3")).unwrap_err();
        assert!(matches!(err, MergeError::SchemaOpen { .. }));
    }

    #[test]
    fn insert_statement_shapes() {
        let aliased = TableSchema {
            name: "T".into(),
            columns: vec!["id".into(), "v".into()],
            rowid_alias: Some("id".into()),
            foreign_keys: vec![],
        };
        assert_eq!(
            insert_statement(&aliased),
            "INSERT INTO \"T\" (\"id\", \"v\") VALUES (?, ?)"
        );
        let plain = TableSchema {
            rowid_alias: None,
            columns: vec!["v".into()],
            ..aliased
        };
        assert_eq!(
            insert_statement(&plain),
            "INSERT INTO \"T\" (rowid, \"v\") VALUES (?, ?)"
        );
    }
}
