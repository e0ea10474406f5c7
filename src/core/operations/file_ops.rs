use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::core::catalog::FileCatalog;
use crate::core::plan::DistributionPlan;

/// Result type for file operations
pub type FileOpResult<T> = Result<T, FileOpError>;

/// Error types for file operations
#[derive(Debug)]
pub enum FileOpError {
    CreateDirFailed(String),
    CopyFailed(String),
    IoError(std::io::Error),
}

impl std::fmt::Display for FileOpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOpError::CreateDirFailed(msg) => write!(f, "Create directory failed: {}", msg),
            FileOpError::CopyFailed(msg) => write!(f, "Copy failed: {}", msg),
            FileOpError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FileOpError {}

impl From<std::io::Error> for FileOpError {
    fn from(error: std::io::Error) -> Self {
        FileOpError::IoError(error)
    }
}

/// Copy a file to its subset destination. An existing destination is
/// overwritten without collision detection: last writer wins.
pub fn copy_file(src: &Path, dest: &Path) -> FileOpResult<()> {
    debug!("Copying file from {:?} to {:?}", src, dest);

    if let Err(e) = fs::copy(src, dest) {
        error!("Failed to copy file from {:?} to {:?}: {}", src, dest, e);
        return Err(FileOpError::CopyFailed(format!(
            "Failed to copy from {:?} to {:?}: {}",
            src, dest, e
        )));
    }

    Ok(())
}

/// Counters reported after materializing a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeStats {
    pub directories_created: usize,
    pub files_copied: usize,
}

/// Create one directory per plan fragment under `output_root` and copy
/// every member file into it under its original file name.
///
/// # Arguments
/// * `plan` - Fragment-to-ids mapping produced by the planner
/// * `catalog` - Catalog that resolves ids back to source paths
/// * `output_root` - Root directory the fragments are created under
///
/// # Returns
/// * `Ok(MaterializeStats)` with directory and copy counts
/// * `Err(FileOpError)` on the first directory or copy failure
pub fn materialize_plan(
    plan: &DistributionPlan,
    catalog: &FileCatalog,
    output_root: &Path,
) -> FileOpResult<MaterializeStats> {
    let mut stats = MaterializeStats::default();

    for (fragment, ids) in plan.targets() {
        let target_dir = output_root.join(fragment);
        if let Err(e) = fs::create_dir_all(&target_dir) {
            error!("Failed to create directory {:?}: {}", target_dir, e);
            return Err(FileOpError::CreateDirFailed(format!(
                "Failed to create {:?}: {}",
                target_dir, e
            )));
        }
        stats.directories_created += 1;

        for &id in ids {
            let src = catalog.path(id).ok_or_else(|| {
                FileOpError::CopyFailed(format!("no catalog entry for file id {}", id))
            })?;
            let file_name = src.file_name().ok_or_else(|| {
                FileOpError::CopyFailed(format!("source path {:?} has no file name", src))
            })?;
            copy_file(src, &target_dir.join(file_name))?;
            stats.files_copied += 1;
        }

        info!("Placed {} files into {:?}", ids.len(), target_dir);
    }

    Ok(stats)
}
