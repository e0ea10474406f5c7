use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Stable handle for one cataloged file; dense 0..n-1 for the run.
pub type FileId = usize;

/// Stratum label used when stratification is off and the whole catalog is
/// treated as a single group.
pub const UNGROUPED_LABEL: &str = "ungrouped";

/// Reserved stratum label for files without an extension.
pub const NO_EXTENSION_LABEL: &str = "no_extension";

/// One candidate file found under the input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: FileId,
    pub path: PathBuf,
    /// Lowercased extension without the dot; `None` for extensionless files.
    pub extension: Option<String>,
}

impl FileRecord {
    /// Stratum label this record falls under when grouping by ending.
    pub fn stratum_label(&self) -> &str {
        self.extension.as_deref().unwrap_or(NO_EXTENSION_LABEL)
    }
}

/// Which file endings a scan should accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionFilter {
    /// Accept every extension present under the root.
    All,
    /// Accept only the listed endings (lowercased, no dot).
    Endings(Vec<String>),
}

impl ExtensionFilter {
    /// Build a filter from user-supplied endings. An empty list or a `*`
    /// entry means "every extension present".
    pub fn from_endings(endings: &[String]) -> Self {
        if endings.is_empty() || endings.iter().any(|ending| ending == "*") {
            return ExtensionFilter::All;
        }
        ExtensionFilter::Endings(
            endings
                .iter()
                .map(|ending| ending.trim_start_matches('.').to_lowercase())
                .collect(),
        )
    }

    pub fn matches(&self, extension: &str) -> bool {
        match self {
            ExtensionFilter::All => true,
            ExtensionFilter::Endings(endings) => {
                endings.iter().any(|ending| ending == extension)
            }
        }
    }
}

/// A named share of the catalog that is partitioned independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stratum {
    pub label: String,
    pub ids: Vec<FileId>,
}

/// Enumerates the candidate files of one run and owns their records.
///
/// Ids are assigned densely after sorting by path, so the id->path mapping
/// is reproducible on platforms whose directory iteration order differs.
/// The mapping is read-only after construction.
pub struct FileCatalog {
    records: Vec<FileRecord>,
}

impl FileCatalog {
    /// Scan the files directly under `root` that pass `filter`.
    ///
    /// Non-regular files are skipped, and extensionless files only count
    /// when `include_extensionless` is set. A missing or unreadable root
    /// yields an empty catalog; callers treat that as "nothing to do".
    pub fn scan(root: &Path, filter: &ExtensionFilter, include_extensionless: bool) -> Self {
        let mut found: Vec<(PathBuf, Option<String>)> = Vec::new();

        match fs::read_dir(root) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    let is_file = entry
                        .file_type()
                        .map(|file_type| file_type.is_file())
                        .unwrap_or(false);
                    if !is_file {
                        continue;
                    }

                    let extension = path
                        .extension()
                        .map(|ext| ext.to_string_lossy().to_lowercase());
                    match &extension {
                        Some(ext) => {
                            if !filter.matches(ext) {
                                continue;
                            }
                        }
                        None => {
                            if !include_extensionless {
                                continue;
                            }
                        }
                    }

                    found.push((path, extension));
                }
                info!("Found {} matching documents in {:?}", found.len(), root);
            }
            Err(e) => {
                warn!("Failed to read directory {:?}: {}", root, e);
            }
        }

        found.sort();

        let records = found
            .into_iter()
            .enumerate()
            .map(|(id, (path, extension))| FileRecord {
                id,
                path,
                extension,
            })
            .collect();

        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> Vec<FileId> {
        (0..self.records.len()).collect()
    }

    pub fn record(&self, id: FileId) -> Option<&FileRecord> {
        self.records.get(id)
    }

    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.records.get(id).map(|record| record.path.as_path())
    }

    /// Split the catalog into strata. Without stratification the whole
    /// catalog is one implicit stratum under the `ungrouped` label;
    /// otherwise one stratum per ending, extensionless files under the
    /// reserved `no_extension` label, ordered by label.
    pub fn strata(&self, stratify: bool) -> Vec<Stratum> {
        if !stratify {
            return vec![Stratum {
                label: UNGROUPED_LABEL.to_string(),
                ids: self.ids(),
            }];
        }

        let mut by_label: BTreeMap<String, Vec<FileId>> = BTreeMap::new();
        for record in &self.records {
            by_label
                .entry(record.stratum_label().to_string())
                .or_default()
                .push(record.id);
        }

        by_label
            .into_iter()
            .map(|(label, ids)| Stratum { label, ids })
            .collect()
    }
}
