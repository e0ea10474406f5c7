use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::warn;

use crate::core::catalog::{FileCatalog, FileId};
use crate::core::partition::{Group, GroupSet};

/// Stratum label -> mean on-disk byte size of each non-empty group, in
/// group order. Diagnostics only; never feeds back into the partition.
pub type SizeProfile = BTreeMap<String, Vec<f64>>;

#[derive(Debug)]
pub enum AnalysisError {
    /// A group references an id the catalog does not know.
    UnknownFile(FileId),
    /// Stat on a cataloged file failed; terminates the run.
    Stat { path: PathBuf, source: io::Error },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::UnknownFile(id) => {
                write!(f, "no catalog entry for file id {}", id)
            }
            AnalysisError::Stat { path, source } => {
                write!(f, "failed to stat {:?}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Mean file sizes for one stratum's groups.
///
/// Empty groups emit one warning each and are excluded from the mean and
/// standard-deviation computation; they do not contribute a zero. Groups
/// whose mean falls below the population standard deviation of the
/// stratum's means are flagged as anomalously small. A crude heuristic,
/// not a statistical test; warnings never alter the partition.
pub fn stratum_size_means(
    label: &str,
    groups: &[Group],
    catalog: &FileCatalog,
) -> Result<Vec<f64>, AnalysisError> {
    let mut means: Vec<(usize, f64)> = Vec::new();

    for (group_index, group) in groups.iter().enumerate() {
        if group.is_empty() {
            warn!(
                "'{}': subset at index {} is empty!\n\t---> subsets: {:?}",
                label, group_index, groups
            );
            continue;
        }
        means.push((group_index, group_mean_size(group, catalog)?));
    }

    let std_dev = population_std(means.iter().map(|(_, mean)| *mean));
    let rendered: Vec<String> = means.iter().map(|(_, mean)| mean.to_string()).collect();
    for (group_index, mean) in &means {
        if *mean < std_dev {
            warn!(
                "'{}': subset at index {} is significantly smaller than the other subsets (size: {})!\n\t---> size means: [{}]\n\t---> subsets: {:?}",
                label,
                group_index,
                mean,
                rendered.join(", "),
                groups
            );
        }
    }

    Ok(means.into_iter().map(|(_, mean)| mean).collect())
}

/// Size profile for the whole group set, one stratum at a time, threading
/// a fresh accumulator per call.
pub fn size_profile(
    group_set: &GroupSet,
    catalog: &FileCatalog,
) -> Result<SizeProfile, AnalysisError> {
    let mut profile = SizeProfile::new();
    for (label, groups) in group_set {
        let means = stratum_size_means(label, groups, catalog)?;
        profile.insert(label.clone(), means);
    }
    Ok(profile)
}

fn group_mean_size(group: &Group, catalog: &FileCatalog) -> Result<f64, AnalysisError> {
    let mut total: u64 = 0;
    for &id in group {
        let path = catalog.path(id).ok_or(AnalysisError::UnknownFile(id))?;
        let metadata = fs::metadata(path).map_err(|source| AnalysisError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        total += metadata.len();
    }
    Ok(total as f64 / group.len() as f64)
}

fn population_std(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let count = values.clone().count();
    if count == 0 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / count as f64;
    let variance = values.map(|value| (value - mean).powi(2)).sum::<f64>() / count as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::ExtensionFilter;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    fn sized_file(dir: &Path, name: &str, bytes: usize) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(&vec![b'x'; bytes]).unwrap();
    }

    fn scan(dir: &Path) -> FileCatalog {
        FileCatalog::scan(dir, &ExtensionFilter::All, false)
    }

    #[test]
    fn means_follow_group_membership() {
        let dir = tempfile::tempdir().unwrap();
        sized_file(dir.path(), "a.txt", 10);
        sized_file(dir.path(), "b.txt", 20);
        sized_file(dir.path(), "c.txt", 40);
        let catalog = scan(dir.path());

        let groups = vec![vec![0, 1], vec![2]];
        let means = stratum_size_means("txt", &groups, &catalog).unwrap();

        assert_eq!(means, vec![15.0, 40.0]);
    }

    #[test]
    fn empty_groups_are_excluded_not_zeroed() {
        let dir = tempfile::tempdir().unwrap();
        sized_file(dir.path(), "a.txt", 10);
        sized_file(dir.path(), "b.txt", 30);
        let catalog = scan(dir.path());

        let groups = vec![vec![0], vec![], vec![1]];
        let means = stratum_size_means("txt", &groups, &catalog).unwrap();

        // Two means, not three; the empty group contributes nothing
        assert_eq!(means, vec![10.0, 30.0]);
    }

    #[test]
    fn profile_covers_every_stratum() {
        let dir = tempfile::tempdir().unwrap();
        sized_file(dir.path(), "a.doc", 16);
        sized_file(dir.path(), "b.txt", 8);
        let catalog = scan(dir.path());

        let mut group_set = GroupSet::new();
        // a.doc sorts first, so it holds id 0
        group_set.insert("doc".to_string(), vec![vec![0]]);
        group_set.insert("txt".to_string(), vec![vec![1]]);

        let profile = size_profile(&group_set, &catalog).unwrap();

        assert_eq!(profile["doc"], vec![16.0]);
        assert_eq!(profile["txt"], vec![8.0]);
    }

    #[test]
    fn outlier_mean_is_still_reported_in_profile() {
        // means 1, 100, 100 -> population std ~46.7; the first group is
        // flagged in the log but stays in the returned profile untouched
        let dir = tempfile::tempdir().unwrap();
        sized_file(dir.path(), "a.txt", 1);
        sized_file(dir.path(), "b.txt", 100);
        sized_file(dir.path(), "c.txt", 100);
        let catalog = scan(dir.path());

        let groups = vec![vec![0], vec![1], vec![2]];
        let means = stratum_size_means("txt", &groups, &catalog).unwrap();

        assert_eq!(means, vec![1.0, 100.0, 100.0]);
    }

    #[test]
    fn missing_file_terminates_analysis() {
        let dir = tempfile::tempdir().unwrap();
        sized_file(dir.path(), "a.txt", 4);
        let catalog = scan(dir.path());

        fs::remove_file(dir.path().join("a.txt")).unwrap();

        let groups = vec![vec![0]];
        let err = stratum_size_means("txt", &groups, &catalog).unwrap_err();
        assert!(matches!(err, AnalysisError::Stat { .. }));
    }

    #[test]
    fn unknown_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = scan(dir.path());

        let err = stratum_size_means("txt", &[vec![7]], &catalog).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownFile(7)));
    }
}
