use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rsb_store::BundleLayout;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::blobs::{copy_tree, merge_blobs, BlobStats};
use crate::database::merge_database;
use crate::error::{MergeError, MergeResult};
use crate::info::stamp_creation_date;
use crate::schema::{count_rows, read_schema};

/// Settings for [`merge_bundles`].
#[derive(Clone, Debug, Default)]
pub struct MergeOptions {
    pub layout: BundleLayout,
    /// Creation time written to the output metadata; the current time when
    /// unset.
    pub now: Option<DateTime<Utc>>,
}

/// Outcome of a merge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub output: PathBuf,
    pub bundles: usize,
    /// Rows per table in the output after the merge.
    pub tables: BTreeMap<String, usize>,
    /// Rows inserted per table from the non-base bundles.
    pub rows_merged: BTreeMap<String, usize>,
    pub blobs: BlobStats,
    pub stamped: bool,
}

/// Merge `sources` into a new bundle at `output`.
///
/// The first source is copied wholesale; each later one contributes its
/// blobs and then its rows, in argument order. Rowids of merged rows and
/// the foreign keys pointing at them move past the output's existing ids.
///
/// Blobs copied before a failing relational merge are not removed. The
/// database is never left partially merged for a source.
pub fn merge_bundles<P: AsRef<Path>>(
    sources: &[P],
    output: &Path,
    options: &MergeOptions,
) -> MergeResult<MergeReport> {
    if sources.len() < 2 {
        return Err(MergeError::NotEnoughSources(sources.len()));
    }
    if output.exists() {
        return Err(MergeError::OutputExists(output.to_path_buf()));
    }
    let layout = &options.layout;
    for source in sources {
        let source = source.as_ref();
        if !layout.database_path(source).is_file() {
            return Err(MergeError::NotABundle(source.to_path_buf()));
        }
    }

    let base = sources[0].as_ref();
    copy_tree(base, output)?;
    info!(base = %base.display(), output = %output.display(), "copied base bundle");

    let db_path = layout.database_path(output);
    let db = Connection::open(&db_path).map_err(|e| MergeError::SchemaOpen {
        path: db_path.clone(),
        message: e.to_string(),
    })?;
    let schemas = read_schema(&db).map_err(|e| MergeError::SchemaOpen {
        path: db_path.clone(),
        message: e.to_string(),
    })?;
    debug!(tables = schemas.len(), "read output schema");

    let mut report = MergeReport {
        output: output.to_path_buf(),
        bundles: sources.len(),
        ..MergeReport::default()
    };
    let output_data = layout.data_path(output);
    for source in &sources[1..] {
        let source = source.as_ref();
        let source_data = layout.data_path(source);
        if source_data.is_dir() {
            report.blobs += merge_blobs(&source_data, &output_data, source)?;
        } else {
            debug!(bundle = %source.display(), "no blob directory");
        }

        let inserted = merge_database(&db, &schemas, &layout.database_path(source))?;
        for (table, rows) in inserted {
            *report.rows_merged.entry(table).or_insert(0) += rows;
        }
        info!(bundle = %source.display(), "merged bundle");
    }

    for schema in &schemas {
        report
            .tables
            .insert(schema.name.clone(), count_rows(&db, &schema.name)?);
    }
    drop(db);

    let now = options.now.unwrap_or_else(Utc::now);
    report.stamped = stamp_creation_date(&layout.info_path(output), now)?;
    Ok(report)
}
