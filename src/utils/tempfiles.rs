use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::utils::config::{BenchConsts, PackagePaths};

/// Create the isolated output root for one benchmark search (e.g. `/tmp/pseudofarm_bench_XXXX`).
pub fn create_bench_root() -> Result<TempDir> {
    let dir = tempfile::Builder::new()
        .prefix(PackagePaths::get().bench_dir_prefix())
        .tempdir()
        .context("create benchmark temp directory")?;
    debug!("Benchmark output root: {}", dir.path().display());
    Ok(dir)
}

/// Directory of trial `worker_count` under `root` (`<root>/inst_<k>`).
pub fn trial_dir(root: &Path, worker_count: u32) -> PathBuf {
    root.join(format!("{}{worker_count}", BenchConsts::TRIAL_DIR_PREFIX))
}

/// Create the trial directory and return the output prefix handed to workers (`<root>/inst_<k>/frame_`).
pub fn prepare_trial_prefix(root: &Path, worker_count: u32) -> Result<PathBuf> {
    let dir = trial_dir(root, worker_count);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create trial directory {}", dir.display()))?;
    Ok(dir.join(BenchConsts::FRAME_PREFIX))
}

/// Remove the benchmark root and everything in it. Failure is logged, not returned.
pub fn remove_bench_root(dir: TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        warn!("Failed to remove {}: {}", path.display(), e);
    } else {
        debug!("Removed benchmark output root {}", path.display());
    }
}
