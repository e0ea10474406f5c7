use std::collections::BTreeMap;
use std::fmt;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::catalog::{FileId, Stratum};

/// One subset's membership within a stratum, in permuted order.
pub type Group = Vec<FileId>;

/// Stratum label -> ordered groups. A `BTreeMap` keeps stratum iteration
/// deterministic for every downstream consumer of the shared RNG stream.
pub type GroupSet = BTreeMap<String, Vec<Group>>;

/// How a set of ids is split into subsets.
#[derive(Debug, Clone)]
pub struct PartitionOptions {
    pub group_count: usize,
    /// Drop zero-member groups from the output, preserving relative order.
    pub suppress_empty: bool,
    /// Per-group file limits, applied after the split. Must hold exactly
    /// `group_count` entries when present.
    pub caps: Option<Vec<usize>>,
    /// Give every group the same (capacity-truncated) permutation instead
    /// of a disjoint share.
    pub same_for_all: bool,
}

impl PartitionOptions {
    /// Check the fatal configuration constraints. Callers run this before
    /// any shuffling so misconfiguration never wastes a randomized pass.
    pub fn validate(&self) -> Result<(), PartitionError> {
        if self.group_count == 0 {
            return Err(PartitionError::ZeroGroupCount);
        }
        if let Some(caps) = &self.caps {
            if caps.len() != self.group_count {
                return Err(PartitionError::CapCountMismatch {
                    caps: caps.len(),
                    groups: self.group_count,
                });
            }
        }
        Ok(())
    }

    fn cap_for(&self, index: usize) -> Option<usize> {
        self.caps.as_ref().map(|caps| caps[index])
    }
}

/// Fatal configuration errors for the partitioning step.
#[derive(Debug, PartialEq, Eq)]
pub enum PartitionError {
    ZeroGroupCount,
    CapCountMismatch { caps: usize, groups: usize },
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionError::ZeroGroupCount => {
                write!(f, "subset count must be positive, got 0")
            }
            PartitionError::CapCountMismatch { caps, groups } => write!(
                f,
                "got {} capacity caps for {} subsets; supply one cap or exactly one per subset",
                caps, groups
            ),
        }
    }
}

impl std::error::Error for PartitionError {}

/// Partition one stratum's ids into groups.
///
/// The ids are shuffled under the caller-provided generator, then either
/// replicated into every group (`same_for_all`) or split into contiguous
/// chunks whose sizes differ by at most one, the first `len % group_count`
/// chunks taking the extra element. Caps truncate per group index, and
/// suppression drops empty groups last.
pub fn partition_ids(
    ids: &[FileId],
    options: &PartitionOptions,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<Group>, PartitionError> {
    options.validate()?;

    let mut shuffled: Vec<FileId> = ids.to_vec();
    shuffled.shuffle(rng);

    let mut groups = if options.same_for_all {
        (0..options.group_count)
            .map(|index| {
                let mut group = shuffled.clone();
                if let Some(cap) = options.cap_for(index) {
                    group.truncate(cap);
                }
                group
            })
            .collect()
    } else {
        let mut groups = split_balanced(&shuffled, options.group_count);
        for (index, group) in groups.iter_mut().enumerate() {
            if let Some(cap) = options.cap_for(index) {
                group.truncate(cap);
            }
        }
        groups
    };

    if options.suppress_empty {
        groups.retain(|group| !group.is_empty());
    }

    Ok(groups)
}

/// Partition every stratum with a generator freshly seeded from `seed`,
/// so each stratum draws the same stream and its result is independent of
/// the map order.
pub fn partition_strata(
    strata: &[Stratum],
    options: &PartitionOptions,
    seed: u64,
) -> Result<GroupSet, PartitionError> {
    options.validate()?;

    let mut group_set = GroupSet::new();
    for stratum in strata {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let groups = partition_ids(&stratum.ids, options, &mut rng)?;
        group_set.insert(stratum.label.clone(), groups);
    }
    Ok(group_set)
}

/// Contiguous chunks over the permuted ids; sizes differ by at most one.
fn split_balanced(ids: &[FileId], group_count: usize) -> Vec<Group> {
    let base = ids.len() / group_count;
    let remainder = ids.len() % group_count;

    let mut groups = Vec::with_capacity(group_count);
    let mut start = 0;
    for index in 0..group_count {
        let len = base + usize::from(index < remainder);
        groups.push(ids[start..start + len].to_vec());
        start += len;
    }
    groups
}
