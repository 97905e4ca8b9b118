//! Renderer command lines for full renders and benchmark sub-ranges.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::FrameRange;

/// Renderer executable plus the project it renders. Builds worker argument lists; knows nothing
/// about what the renderer does with them.
#[derive(Clone, Debug)]
pub struct JobCommand {
    pub executable: PathBuf,
    pub project: PathBuf,
}

impl JobCommand {
    pub fn new(executable: impl Into<PathBuf>, project: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            project: project.into(),
        }
    }

    /// `-b <project> -a`: render the whole range with the project's own output settings.
    pub fn full_args(&self) -> Vec<OsString> {
        vec!["-b".into(), self.project.clone().into(), "-a".into()]
    }

    /// `-b <project> -o <prefix> -s <start> -e <end> -a`: render `range` into `prefix`.
    pub fn range_args(&self, prefix: &Path, range: FrameRange) -> Vec<OsString> {
        vec![
            "-b".into(),
            self.project.clone().into(),
            "-o".into(),
            prefix.into(),
            "-s".into(),
            range.start.to_string().into(),
            "-e".into(),
            range.end.to_string().into(),
            "-a".into(),
        ]
    }
}
