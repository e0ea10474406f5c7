use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::core::analysis::SizeProfile;
use crate::core::catalog::FileCatalog;
use crate::core::plan::DistributionPlan;

/// Machine-readable summary of one run, written on `--report`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub seed: u64,
    pub subset_names: Vec<String>,
    /// Stratum label -> mean file size per non-empty subset.
    pub size_means: BTreeMap<String, Vec<f64>>,
    /// Output fragment -> source paths placed there.
    pub subsets: BTreeMap<String, Vec<PathBuf>>,
}

impl RunReport {
    pub fn new(
        seed: u64,
        subset_names: &[String],
        profile: &SizeProfile,
        plan: &DistributionPlan,
        catalog: &FileCatalog,
    ) -> Self {
        let subsets = plan
            .targets()
            .iter()
            .map(|(fragment, ids)| {
                let paths = ids
                    .iter()
                    .filter_map(|&id| catalog.path(id).map(Path::to_path_buf))
                    .collect();
                (fragment.clone(), paths)
            })
            .collect();

        Self {
            seed,
            subset_names: subset_names.to_vec(),
            size_means: profile.clone(),
            subsets,
        }
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(path, contents)?;
        info!("Run report written to: {:?}", path);
        Ok(())
    }
}
