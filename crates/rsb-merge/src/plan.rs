//! Row remapping as a pure function of schema, rows and high-water marks.
//!
//! Nothing here touches a database. The I/O layer reads schemas and rows,
//! calls [`plan_table_rows`], and inserts what comes back.

use std::collections::BTreeMap;

use crate::error::{MergeError, MergeResult};

/// A single SQLite cell.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    /// TEXT as stored; SQLite does not guarantee valid UTF-8.
    Text(Vec<u8>),
    Blob(Vec<u8>),
}

/// A column that references another table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: String,
    pub target_table: String,
    /// Referenced column; `None` means the target's primary key.
    pub target_column: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    /// Stored columns in declaration order.
    pub columns: Vec<String>,
    /// The `INTEGER PRIMARY KEY` column aliasing the rowid, if any.
    pub rowid_alias: Option<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// One row: its rowid plus values aligned with [`TableSchema::columns`].
#[derive(Clone, Debug, PartialEq)]
pub struct SourceRow {
    pub rowid: i64,
    pub values: Vec<SqlValue>,
}

/// Per-table maximum rowid of the output, captured before a merge pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighWaterMarks {
    tables: BTreeMap<String, i64>,
}

impl HighWaterMarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: impl Into<String>, max_rowid: i64) {
        self.tables.insert(table.into(), max_rowid);
    }

    /// The offset for rows of `table`.
    pub fn get(&self, table: &str) -> Option<i64> {
        self.tables.get(table).copied()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Offset to add to `fk`'s values: the mark of the table it references.
    fn foreign_key_offset(&self, table: &str, fk: &ForeignKey) -> MergeResult<i64> {
        self.get(&fk.target_table)
            .ok_or_else(|| MergeError::UnknownTable {
                table: table.to_string(),
                target: fk.target_table.clone(),
            })
    }
}

/// Compute the rows to insert into the output for one source table.
///
/// Every row moves to `rowid + marks[table]`. Integer values in every
/// foreign-key column move by the mark of the table it references, whichever
/// column of that table it names. NULLs and non-integer values are left
/// alone.
pub fn plan_table_rows(
    schema: &TableSchema,
    rows: &[SourceRow],
    marks: &HighWaterMarks,
) -> MergeResult<Vec<SourceRow>> {
    let offset = marks.get(&schema.name).ok_or_else(|| MergeError::UnknownTable {
        table: schema.name.clone(),
        target: schema.name.clone(),
    })?;

    let mut shifts = Vec::new();
    for fk in &schema.foreign_keys {
        let Some(index) = schema.column_index(&fk.column) else {
            continue;
        };
        shifts.push((index, marks.foreign_key_offset(&schema.name, fk)?));
    }
    let alias_index = schema
        .rowid_alias
        .as_deref()
        .and_then(|alias| schema.column_index(alias));

    let planned = rows
        .iter()
        .map(|row| {
            let rowid = row.rowid + offset;
            let mut values = row.values.clone();
            for &(index, delta) in &shifts {
                if let Some(SqlValue::Integer(v)) = values.get_mut(index) {
                    *v += delta;
                }
            }
            if let Some(slot) = alias_index.and_then(|i| values.get_mut(i)) {
                *slot = SqlValue::Integer(rowid);
            }
            SourceRow { rowid, values }
        })
        .collect();
    Ok(planned)
}
