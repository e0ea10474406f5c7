use std::fmt;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::core::catalog::ExtensionFilter;

/// Fatal configuration errors, detected before any randomized work.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    ZeroSubsetCount,
    NameCountMismatch { names: usize, subsets: usize },
    CapCountMismatch { caps: usize, subsets: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSubsetCount => {
                write!(f, "subset count must be positive, got 0")
            }
            ConfigError::NameCountMismatch { names, subsets } => write!(
                f,
                "got {} subset names for {} subsets; the counts must match",
                names, subsets
            ),
            ConfigError::CapCountMismatch { caps, subsets } => write!(
                f,
                "got {} per-subset limits for {} subsets; supply one limit or exactly one per subset",
                caps, subsets
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub subsets: usize,
    pub output_root: PathBuf,
    pub filter: ExtensionFilter,
    pub seed: u64,
    pub group_by_ending: bool,
    pub include_extensionless: bool,
    pub suppress_empty: bool,
    pub ext_folders: bool,
    pub same_for_all: bool,
    /// Always exactly `subsets` entries after validation.
    pub names: Vec<String>,
    /// `None`, or exactly `subsets` entries after broadcasting.
    pub caps: Option<Vec<usize>>,
    pub consistent_names: bool,
    pub report: Option<PathBuf>,
    pub dry_run: bool,
}

impl RunConfig {
    /// Validate the raw CLI arguments into a run configuration.
    ///
    /// Count mismatches are never coerced: a names list or a caps list
    /// whose length disagrees with the subset count aborts the run. A
    /// single cap broadcasts to all subsets; omitted names default to the
    /// stringified subset indices.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if cli.subsets == 0 {
            return Err(ConfigError::ZeroSubsetCount);
        }

        let names = if cli.names.is_empty() {
            (0..cli.subsets).map(|index| index.to_string()).collect()
        } else if cli.names.len() == cli.subsets {
            cli.names
        } else {
            return Err(ConfigError::NameCountMismatch {
                names: cli.names.len(),
                subsets: cli.subsets,
            });
        };

        let caps = if cli.max_per_subset.is_empty() {
            None
        } else if cli.max_per_subset.len() == 1 {
            Some(vec![cli.max_per_subset[0]; cli.subsets])
        } else if cli.max_per_subset.len() == cli.subsets {
            Some(cli.max_per_subset)
        } else {
            return Err(ConfigError::CapCountMismatch {
                caps: cli.max_per_subset.len(),
                subsets: cli.subsets,
            });
        };

        let output_root = cli
            .output
            .unwrap_or_else(|| cli.input.join("subsets"));

        Ok(Self {
            filter: ExtensionFilter::from_endings(&cli.endings),
            input: cli.input,
            subsets: cli.subsets,
            output_root,
            seed: cli.random_seed,
            group_by_ending: cli.group_by_ending,
            include_extensionless: cli.include_extensionless,
            suppress_empty: !cli.keep_empty,
            ext_folders: cli.ext_folders,
            same_for_all: cli.same_for_all,
            names,
            caps,
            consistent_names: cli.consistent_names,
            report: cli.report,
            dry_run: cli.dry_run,
        })
    }
}
