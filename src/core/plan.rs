use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::core::catalog::{FileId, UNGROUPED_LABEL};
use crate::core::partition::GroupSet;

/// How groups are mapped onto named output locations.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Human-readable subset names; length equals the requested subset
    /// count (validated before partitioning).
    pub names: Vec<String>,
    /// Nest a per-extension sub-folder under each subset name.
    pub folders_for_extensions: bool,
    /// Reuse one shuffled name assignment for every stratum instead of
    /// reshuffling per stratum.
    pub consistent_names: bool,
}

/// Output-path fragment -> file ids to place there. Fragments that
/// collide across strata union their id sets; duplicate ids collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionPlan {
    targets: BTreeMap<String, BTreeSet<FileId>>,
}

impl DistributionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> &BTreeMap<String, BTreeSet<FileId>> {
        &self.targets
    }

    pub fn fragment_count(&self) -> usize {
        self.targets.len()
    }

    /// Total file placements, counting a file once per fragment it lands in.
    pub fn file_count(&self) -> usize {
        self.targets.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn add(&mut self, fragment: String, ids: &[FileId]) {
        self.targets
            .entry(fragment)
            .or_default()
            .extend(ids.iter().copied());
    }
}

/// Assign subset names to each stratum's surviving groups and merge the
/// result into one plan.
///
/// The name list is shuffled before zipping with the groups, so which
/// name lands on which group index is randomized; when suppression left
/// fewer groups than names, the surviving groups take a random subset of
/// the names. Without `consistent_names` each stratum reshuffles from the
/// shared generator (drawn in stratum-label order), so assignments are
/// independent across strata.
pub fn build_plan(
    group_set: &GroupSet,
    options: &PlanOptions,
    rng: &mut ChaCha8Rng,
) -> DistributionPlan {
    let mut plan = DistributionPlan::new();

    let mut shared_names = options.names.clone();
    if options.consistent_names {
        shared_names.shuffle(rng);
    }

    for (label, groups) in group_set {
        let assigned = if options.consistent_names {
            shared_names.clone()
        } else {
            let mut names = options.names.clone();
            names.shuffle(rng);
            names
        };

        for (name, group) in assigned.iter().zip(groups) {
            let fragment = if options.folders_for_extensions && label != UNGROUPED_LABEL {
                format!("{}/{}", name, label)
            } else {
                name.clone()
            };
            debug!(
                "'{}': {} files -> fragment '{}'",
                label,
                group.len(),
                fragment
            );
            plan.add(fragment, group);
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{ExtensionFilter, FileCatalog};
    use crate::core::partition::{partition_strata, PartitionOptions};
    use rand::SeedableRng;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn names(count: usize) -> Vec<String> {
        (0..count).map(|index| index.to_string()).collect()
    }

    fn group_set(entries: &[(&str, Vec<Vec<FileId>>)]) -> GroupSet {
        entries
            .iter()
            .map(|(label, groups)| (label.to_string(), groups.clone()))
            .collect()
    }

    #[test]
    fn flat_plan_uses_bare_names() {
        let set = group_set(&[(UNGROUPED_LABEL, vec![vec![0, 1], vec![2]])]);
        let options = PlanOptions {
            names: names(2),
            folders_for_extensions: false,
            consistent_names: false,
        };

        let plan = build_plan(&set, &options, &mut rng(42));

        assert_eq!(plan.fragment_count(), 2);
        assert!(plan.targets().keys().all(|key| !key.contains('/')));
        assert_eq!(plan.file_count(), 3);
    }

    #[test]
    fn extension_folders_nest_under_subset_names() {
        let set = group_set(&[
            ("doc", vec![vec![0]]),
            ("txt", vec![vec![1], vec![2]]),
        ]);
        let options = PlanOptions {
            names: names(2),
            folders_for_extensions: true,
            consistent_names: false,
        };

        let plan = build_plan(&set, &options, &mut rng(42));

        assert_eq!(plan.fragment_count(), 3);
        for key in plan.targets().keys() {
            let (name, label) = key.split_once('/').expect("nested fragment");
            assert!(["0", "1"].contains(&name));
            assert!(["doc", "txt"].contains(&label));
        }
    }

    #[test]
    fn ungrouped_stratum_never_nests() {
        let set = group_set(&[(UNGROUPED_LABEL, vec![vec![0], vec![1]])]);
        let options = PlanOptions {
            names: names(2),
            folders_for_extensions: true,
            consistent_names: false,
        };

        let plan = build_plan(&set, &options, &mut rng(7));
        assert!(plan.targets().keys().all(|key| !key.contains('/')));
    }

    #[test]
    fn colliding_fragments_union_their_ids() {
        // Without extension folders both strata map onto the same two
        // names, so ids from both strata merge under each name.
        let set = group_set(&[
            ("doc", vec![vec![0], vec![1]]),
            ("txt", vec![vec![2], vec![3]]),
        ]);
        let options = PlanOptions {
            names: names(2),
            folders_for_extensions: false,
            consistent_names: false,
        };

        let plan = build_plan(&set, &options, &mut rng(11));

        assert_eq!(plan.fragment_count(), 2);
        assert_eq!(plan.file_count(), 4);
        for ids in plan.targets().values() {
            assert_eq!(ids.len(), 2);
        }
    }

    #[test]
    fn duplicate_ids_collapse_in_a_fragment() {
        // Same-for-all replication can land one id under the same name
        // through different strata entries; sets keep it once.
        let set = group_set(&[("doc", vec![vec![0, 1], vec![0, 1]])]);
        let options = PlanOptions {
            names: vec!["all".to_string(), "all".to_string()],
            folders_for_extensions: false,
            consistent_names: false,
        };

        let plan = build_plan(&set, &options, &mut rng(0));

        assert_eq!(plan.fragment_count(), 1);
        assert_eq!(plan.file_count(), 2);
    }

    #[test]
    fn suppressed_groups_take_a_subset_of_names() {
        let set = group_set(&[("doc", vec![vec![0]])]);
        let options = PlanOptions {
            names: names(4),
            folders_for_extensions: false,
            consistent_names: false,
        };

        let plan = build_plan(&set, &options, &mut rng(3));

        assert_eq!(plan.fragment_count(), 1);
        let fragment = plan.targets().keys().next().unwrap();
        assert!(options.names.contains(fragment));
    }

    #[test]
    fn consistent_names_align_across_strata() {
        let set = group_set(&[
            ("doc", vec![vec![0], vec![1]]),
            ("txt", vec![vec![2], vec![3]]),
        ]);
        let options = PlanOptions {
            names: names(2),
            folders_for_extensions: true,
            consistent_names: true,
        };

        let plan = build_plan(&set, &options, &mut rng(19));

        // Group index 0 of every stratum gets the same subset name
        let doc_0 = plan
            .targets()
            .iter()
            .find(|(key, ids)| key.ends_with("/doc") && ids.contains(&0))
            .map(|(key, _)| key.split_once('/').unwrap().0.to_string())
            .unwrap();
        let txt_0 = plan
            .targets()
            .iter()
            .find(|(key, ids)| key.ends_with("/txt") && ids.contains(&2))
            .map(|(key, _)| key.split_once('/').unwrap().0.to_string())
            .unwrap();
        assert_eq!(doc_0, txt_0);
    }

    #[test]
    fn plan_is_deterministic_for_a_seed() {
        let set = group_set(&[
            ("doc", vec![vec![0], vec![1]]),
            ("txt", vec![vec![2], vec![3]]),
        ]);
        let options = PlanOptions {
            names: names(2),
            folders_for_extensions: true,
            consistent_names: false,
        };

        let first = build_plan(&set, &options, &mut rng(23));
        let second = build_plan(&set, &options, &mut rng(23));
        assert_eq!(first, second);
    }

    fn sized_file(dir: &Path, name: &str, bytes: usize) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(&vec![b'x'; bytes]).unwrap();
    }

    #[test]
    fn stratified_corpus_end_to_end() {
        // 10 files: 3 x ".a", 7 x ".b"; 2 subsets, stratified, seed 42,
        // no caps, suppression on.
        let dir = tempfile::tempdir().unwrap();
        for index in 0..3 {
            sized_file(dir.path(), &format!("doc{}.a", index), 10);
        }
        for index in 0..7 {
            sized_file(dir.path(), &format!("doc{}.b", index), 10);
        }

        let catalog = FileCatalog::scan(dir.path(), &ExtensionFilter::All, false);
        assert_eq!(catalog.len(), 10);

        let strata = catalog.strata(true);
        let partition_options = PartitionOptions {
            group_count: 2,
            suppress_empty: true,
            caps: None,
            same_for_all: false,
        };
        let group_set = partition_strata(&strata, &partition_options, 42).unwrap();

        assert_eq!(
            group_set["a"].iter().map(Vec::len).collect::<Vec<_>>(),
            vec![2, 1]
        );
        assert_eq!(
            group_set["b"].iter().map(Vec::len).collect::<Vec<_>>(),
            vec![4, 3]
        );

        // Deterministic membership for the fixed seed
        let again = partition_strata(&strata, &partition_options, 42).unwrap();
        assert_eq!(group_set, again);

        let flat_options = PlanOptions {
            names: names(2),
            folders_for_extensions: false,
            consistent_names: false,
        };
        let flat = build_plan(&group_set, &flat_options, &mut rng(42));
        assert_eq!(flat.fragment_count(), 2);

        let nested_options = PlanOptions {
            names: names(2),
            folders_for_extensions: true,
            consistent_names: false,
        };
        let nested = build_plan(&group_set, &nested_options, &mut rng(42));
        assert_eq!(nested.fragment_count(), 4);
    }
}
