use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use quick_xml::events::Event;
use quick_xml::Reader;
use rsb_diff::{BundleComparison, BundleSummary, DiffResult};
use rsb_merge::{merge_bundles, MergeOptions};
use rsb_projection::{to_canonical_json, to_legacy_json, to_log_json};
use rsb_store::{export, BundleStore, DirectoryChild, Node, ObjectStore, StoreConfig};
use rsb_types::ObjectId;
use serde_json::{json, Value};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Get(args) => cmd_get(args, config),
        Command::Export(args) => cmd_export(args, config),
        Command::Merge(args) => cmd_merge(args, config),
        Command::Diff(args) => cmd_diff(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<StoreConfig> {
    let Some(path) = path else {
        return Ok(StoreConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn cmd_get(args: GetArgs, config: StoreConfig) -> anyhow::Result<()> {
    let store = BundleStore::open_with(&args.path, config)?;
    let id = match &args.id {
        Some(id) => ObjectId::parse(id)?,
        None => root_id(&store)?,
    };

    let mut stdout = std::io::stdout().lock();
    if args.format == ObjectFormat::Raw {
        stdout.write_all(&store.load_raw_data(&id)?)?;
        return Ok(());
    }

    let json = match store.resolve(&id)? {
        Node::Object(value) => match args.format {
            ObjectFormat::Legacy => to_legacy_json(&value),
            ObjectFormat::Log => to_log_json(&value),
            _ => to_canonical_json(&value),
        },
        Node::Directory(children) => listing_json(&children),
        Node::Raw(bytes) => {
            stdout.write_all(&bytes)?;
            return Ok(());
        }
    };
    let text = if args.compact {
        serde_json::to_string(&json)?
    } else {
        serde_json::to_string_pretty(&json)?
    };
    writeln!(stdout, "{text}")?;
    Ok(())
}

fn listing_json(children: &[DirectoryChild]) -> Value {
    Value::Array(
        children
            .iter()
            .map(|c| json!({"name": c.entry.name, "kind": c.entry.kind, "id": c.id}))
            .collect(),
    )
}

/// The bundle's root object id, from the `rootId` entry of its metadata.
fn root_id(store: &BundleStore) -> anyhow::Result<ObjectId> {
    let info = store.config().layout.info_path(store.root());
    let text = std::fs::read_to_string(&info)
        .with_context(|| format!("no --id given and cannot read {}", info.display()))?;
    match find_root_id(&text) {
        Some(id) => Ok(ObjectId::parse(&id)?),
        None => bail!("no --id given and {} has no rootId", info.display()),
    }
}

/// The `<string>` value of the `hash` key that follows the `rootId` key.
fn find_root_id(plist: &str) -> Option<String> {
    let mut reader = Reader::from_str(plist);
    let mut key: Option<String> = None;
    let mut seen_root = false;
    let mut want_hash = false;
    let mut in_hash = false;

    loop {
        match reader.read_event().ok()? {
            Event::Eof => return None,
            Event::Start(e) => match e.name().as_ref() {
                b"key" => key = Some(String::new()),
                b"string" if want_hash => in_hash = true,
                _ => want_hash = false,
            },
            Event::Text(t) => {
                if in_hash {
                    return Some(t.unescape().ok()?.trim().to_string());
                }
                if let Some(buf) = key.as_mut() {
                    buf.push_str(&t.unescape().ok()?);
                }
            }
            Event::End(e) if e.name().as_ref() == b"key" => {
                match key.take().as_deref().map(str::trim) {
                    Some("rootId") => seen_root = true,
                    Some("hash") if seen_root => want_hash = true,
                    _ => want_hash = false,
                }
            }
            Event::End(_) | Event::Empty(_) => in_hash = false,
            _ => {}
        }
    }
}

fn cmd_export(args: ExportArgs, config: StoreConfig) -> anyhow::Result<()> {
    let store = BundleStore::open_with(&args.path, config)?;
    let id = ObjectId::parse(&args.id)?;
    let report = export(&store, &id, &args.output)?;
    println!(
        "{} Exported {} files ({} bytes) in {} directories to {}",
        "✓".green().bold(),
        report.files.to_string().bold(),
        report.bytes,
        report.directories,
        args.output.display()
    );
    Ok(())
}

fn cmd_merge(args: MergeArgs, config: StoreConfig) -> anyhow::Result<()> {
    let options = MergeOptions {
        layout: config.layout,
        now: None,
    };
    let report = merge_bundles(args.bundles.as_slice(), &args.output, &options)
        .with_context(|| format!("merging into {}", args.output.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "{} Merged {} bundles into {}",
        "✓".green().bold(),
        report.bundles,
        report.output.display().to_string().bold()
    );
    println!(
        "  Blobs: {} copied, {} shared",
        report.blobs.copied, report.blobs.deduplicated
    );
    for (table, rows) in &report.tables {
        let merged = report.rows_merged.get(table).copied().unwrap_or(0);
        println!("  {table}: {rows} rows ({} merged)", merged.to_string().cyan());
    }
    Ok(())
}

fn read_summary(path: &Path) -> anyhow::Result<BundleSummary> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing summary {}", path.display()))
}

fn cmd_diff(args: DiffArgs) -> anyhow::Result<()> {
    let current = read_summary(&args.current)?;
    let baseline = read_summary(&args.baseline)?;
    let comparison = rsb_diff::compare(&current, &baseline);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print_comparison(&comparison);
    }
    Ok(())
}

fn print_comparison(comparison: &BundleComparison) {
    if comparison.is_clean() {
        println!("{} No differences.", "✓".green().bold());
        return;
    }
    let tests = comparison.tests.clone().sorted_by_key(|t| t.identifier.clone());
    print_section("Tests", &tests, |t| t.identifier.clone());
    print_section("Failures", &comparison.failures, |f| {
        format!("{}: {}", f.test_identifier, f.message)
    });
    print_section("Issues", &comparison.issues, |i| {
        let location = i.location.as_ref().map(|l| l.file.as_str()).unwrap_or("");
        format!("[{}] {} ({location})", i.issue_type, i.message)
    });
}

fn print_section<T>(title: &str, diff: &DiffResult<T>, label: impl Fn(&T) -> String) {
    println!(
        "{}: {} introduced, {} resolved",
        title.bold(),
        diff.introduced.len().to_string().red(),
        diff.resolved.len().to_string().green()
    );
    for item in &diff.introduced {
        println!("  {} {}", "+".red(), label(item));
    }
    for item in &diff.resolved {
        println!("  {} {}", "-".green(), label(item));
    }
}
