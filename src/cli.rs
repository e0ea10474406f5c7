use clap::Parser;
use std::path::PathBuf;

/// Command-line surface of the subsetting tool.
///
/// Count constraints between `--subsets`, `--names` and `--max-per-subset`
/// are checked in `RunConfig::from_cli`, not here, so every violation is
/// reported with the conflicting values.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Split a folder of documents into randomized, size-balanced subsets",
    long_about = None
)]
pub struct Cli {
    /// The folder where all documents are located
    pub input: PathBuf,

    /// On how many subsets all documents should be split up
    #[arg(short = 'n', long)]
    pub subsets: usize,

    /// Where the subset folders are created [default: <input>/subsets]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// What document types should be included (file endings); all endings
    /// present are included if omitted
    #[arg(short, long, num_args = 1..)]
    pub endings: Vec<String>,

    /// Random seed for shuffling and splitting the subsets
    #[arg(short = 'r', long, default_value_t = 42)]
    pub random_seed: u64,

    /// Group files by ending, so that each ending is partitioned separately
    #[arg(short, long)]
    pub group_by_ending: bool,

    /// Include files without an extension under the reserved
    /// `no_extension` label
    #[arg(long)]
    pub include_extensionless: bool,

    /// Keep subsets that end up empty instead of suppressing them
    #[arg(long)]
    pub keep_empty: bool,

    /// Create one sub-folder per ending inside every subset folder
    #[arg(long)]
    pub ext_folders: bool,

    /// Give every subset the same files instead of a disjoint share
    #[arg(long)]
    pub same_for_all: bool,

    /// Human-readable subset names; the count must match --subsets
    /// [default: 0..N-1]
    #[arg(long, num_args = 1..)]
    pub names: Vec<String>,

    /// Per-subset file limits: either one value for all subsets or
    /// exactly one value per subset
    #[arg(long, num_args = 1..)]
    pub max_per_subset: Vec<usize>,

    /// Use the same name-to-subset assignment for every ending group
    /// instead of reshuffling names per group
    #[arg(long)]
    pub consistent_names: bool,

    /// Write a JSON report of the distribution plan and size profile to
    /// this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Build and report the plan without copying any files
    #[arg(long)]
    pub dry_run: bool,
}
