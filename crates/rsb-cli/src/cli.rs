use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rsb",
    about = "Read, export, merge and compare test result bundles",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// TOML file with bundle layout and decoder settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ObjectFormat {
    Canonical,
    Legacy,
    Log,
    Raw,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print an object as JSON, or its raw bytes
    Get(GetArgs),
    /// Write a directory object out as files
    Export(ExportArgs),
    /// Merge bundles into a new bundle
    Merge(MergeArgs),
    /// Compare two bundle summaries
    Diff(DiffArgs),
}

#[derive(Args)]
pub struct GetArgs {
    /// Bundle directory
    #[arg(long)]
    pub path: PathBuf,
    /// Object id; defaults to the bundle's root object
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long, value_enum, default_value = "canonical")]
    pub format: ObjectFormat,
    /// Single-line JSON
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    #[arg(long)]
    pub path: PathBuf,
    #[arg(long)]
    pub id: String,
    /// Destination directory
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Path of the new merged bundle
    #[arg(long)]
    pub output: PathBuf,
    /// Bundles to merge; the first is the base
    #[arg(required = true, num_args = 2..)]
    pub bundles: Vec<PathBuf>,
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Summary JSON of the bundle under test
    #[arg(long)]
    pub current: PathBuf,
    /// Summary JSON of the reference bundle
    #[arg(long)]
    pub baseline: PathBuf,
    #[arg(long)]
    pub json: bool,
}
