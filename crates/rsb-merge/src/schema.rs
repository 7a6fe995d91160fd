//! Schema and row access over `rusqlite`.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql};

use crate::error::MergeResult;
use crate::plan::{ForeignKey, HighWaterMarks, SourceRow, SqlValue, TableSchema};

/// Quote an identifier for interpolation into SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// User tables of `conn`, sorted by name. SQLite's internal tables are
/// skipped.
pub fn read_schema(conn: &Connection) -> MergeResult<Vec<TableSchema>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<_, _>>()?;

    names
        .into_iter()
        .map(|name| read_table_schema(conn, name))
        .collect()
}

fn read_table_schema(conn: &Connection, name: String) -> MergeResult<TableSchema> {
    let quoted = quote_ident(&name);

    // cid, name, type, notnull, dflt_value, pk
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({quoted})"))?;
    let info: Vec<(String, String, i64)> = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                row.get::<_, i64>(5)?,
            ))
        })?
        .collect::<Result<_, _>>()?;

    let pk: Vec<&(String, String, i64)> = info.iter().filter(|(_, _, pk)| *pk > 0).collect();
    let rowid_alias = match pk.as_slice() {
        [(column, ty, _)] if ty.eq_ignore_ascii_case("INTEGER") => Some(column.clone()),
        _ => None,
    };
    let columns = info.into_iter().map(|(column, _, _)| column).collect();

    // id, seq, table, from, to, on_update, on_delete, match
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({quoted})"))?;
    let foreign_keys = stmt
        .query_map([], |row| {
            Ok(ForeignKey {
                target_table: row.get(2)?,
                column: row.get(3)?,
                target_column: row.get(4)?,
            })
        })?
        .collect::<Result<_, _>>()?;

    Ok(TableSchema {
        name,
        columns,
        rowid_alias,
        foreign_keys,
    })
}

/// Current maximum rowid of every table in `schemas`; empty tables are 0.
pub fn read_high_water_marks(
    conn: &Connection,
    schemas: &[TableSchema],
) -> MergeResult<HighWaterMarks> {
    let mut marks = HighWaterMarks::new();
    for schema in schemas {
        let max: i64 = conn.query_row(
            &format!(
                "SELECT COALESCE(MAX(rowid), 0) FROM {}",
                quote_ident(&schema.name)
            ),
            [],
            |row| row.get(0),
        )?;
        marks.insert(schema.name.clone(), max);
    }
    Ok(marks)
}

pub fn count_rows(conn: &Connection, table: &str) -> MergeResult<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// All rows of `schema.name`, in rowid order, with values for
/// `schema.columns`.
pub fn read_rows(conn: &Connection, schema: &TableSchema) -> MergeResult<Vec<SourceRow>> {
    let mut select = String::from("SELECT rowid");
    for column in &schema.columns {
        select.push_str(", ");
        select.push_str(&quote_ident(column));
    }
    select.push_str(&format!(
        " FROM {} ORDER BY rowid",
        quote_ident(&schema.name)
    ));

    let width = schema.columns.len();
    let mut stmt = conn.prepare(&select)?;
    let rows = stmt
        .query_map([], |row| {
            let rowid: i64 = row.get(0)?;
            let values = (1..=width)
                .map(|i| row.get_ref(i).map(sql_value))
                .collect::<Result<_, _>>()?;
            Ok(SourceRow { rowid, values })
        })?
        .collect::<Result<_, _>>()?;
    Ok(rows)
}

fn sql_value(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(f) => SqlValue::Real(f),
        ValueRef::Text(t) => SqlValue::Text(t.to_vec()),
        ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            SqlValue::Null => ValueRef::Null,
            SqlValue::Integer(i) => ValueRef::Integer(*i),
            SqlValue::Real(f) => ValueRef::Real(*f),
            SqlValue::Text(t) => ValueRef::Text(t),
            SqlValue::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}
