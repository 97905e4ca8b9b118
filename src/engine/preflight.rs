//! Checks run before any worker is spawned. A failure here leaves no state behind.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::FarmOpts;

/// The project must exist on disk as a file: workers read it, not the host's in-memory state.
pub fn check_project_saved(project: &Path) -> Result<PathBuf> {
    if !project.is_file() {
        bail!(
            "Please save the project first: {} does not exist",
            project.display()
        );
    }
    project.canonicalize().context("canonicalize project path")
}

/// A full render relies on placeholders to let workers share one frame range: overwrite must be
/// off and placeholders on. The output directory must be known so a cancel can remove partial
/// frames.
pub fn check_render_flags(opts: &FarmOpts) -> Result<()> {
    if opts.overwrite {
        bail!("Validation Failed: 'Overwrite' must be UNCHECKED");
    }
    if !opts.placeholders {
        bail!("Validation Failed: 'Placeholders' must be CHECKED");
    }
    if opts.output_dir.is_none() {
        bail!("Render output directory is not set: pass --output-dir or set [settings].output_dir");
    }
    if opts.frames.is_empty() {
        bail!(
            "Frame range {}..{} is empty",
            opts.frames.start,
            opts.frames.end
        );
    }
    Ok(())
}
