//! Output completeness checks: detect frames truncated by a killed worker and delete them.

use log::{debug, warn};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::utils::config::ValidatorConsts;

/// Image format recognised by extension. Decides which completeness check applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Exr,
    Other,
}

impl OutputFormat {
    /// Format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => OutputFormat::Png,
            Some("jpg" | "jpeg") => OutputFormat::Jpeg,
            Some("exr") => OutputFormat::Exr,
            _ => OutputFormat::Other,
        }
    }
}

/// Read the last `FOOTER_LEN` bytes of a file. Callers guarantee the file is at least that long.
fn read_footer(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut f = File::open(path)?;
    f.seek(SeekFrom::End(-(ValidatorConsts::FOOTER_LEN as i64)))?;
    let mut footer = Vec::with_capacity(ValidatorConsts::FOOTER_LEN as usize);
    f.read_to_end(&mut footer)?;
    Ok(footer)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn inspect(path: &Path) -> std::io::Result<bool> {
    let meta = std::fs::metadata(path)?;
    let len = meta.len();
    // shorter than a footer: always a truncated write
    if !meta.is_file() || len < ValidatorConsts::FOOTER_LEN {
        return Ok(false);
    }
    let footer = read_footer(path)?;
    Ok(match OutputFormat::from_path(path) {
        OutputFormat::Png => contains(&footer, &ValidatorConsts::PNG_END),
        OutputFormat::Jpeg => contains(&footer, &ValidatorConsts::JPEG_EOI),
        OutputFormat::Exr => len > ValidatorConsts::EXR_MIN_SIZE,
        OutputFormat::Other => true,
    })
}

/// True when `path` looks like a completely written image.
///
/// - Missing files and files shorter than 10 bytes are invalid, whatever the extension.
/// - PNG must end with the IEND CRC, JPEG with the EOI marker (searched in the last 10 bytes).
/// - EXR has no cheap footer; files over 1000 bytes are accepted. This is only a size heuristic.
/// - Other extensions pass once at least 10 bytes long.
///
/// I/O errors count as invalid.
pub fn is_output_valid(path: &Path) -> bool {
    match inspect(path) {
        Ok(valid) => valid,
        Err(e) => {
            debug!("Error checking {}: {}", path.display(), e);
            false
        }
    }
}

/// Delete every invalid top-level file in `dir`. Returns the number deleted.
/// Subdirectories are not descended into. A failed delete is logged and the scan continues.
pub fn cleanup_corrupted_outputs(dir: &Path) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Cannot scan {}: {}", dir.display(), e);
            }
            return 0;
        }
    };

    let mut deleted = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || is_output_valid(&path) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed partial output {}", path.display());
                deleted += 1;
            }
            Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
        }
    }
    deleted
}
