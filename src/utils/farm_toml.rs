//! Load `.pseudofarm.toml` from the project directory (CLI only). Lib callers build `FarmOpts`
//! themselves. The benchmark writes its best worker count back into the same file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::FarmOpts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct FarmToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    workers: Option<u32>,
    executable: Option<String>,
    frame_start: Option<u32>,
    frame_end: Option<u32>,
    output_dir: Option<String>,
    overwrite: Option<bool>,
    placeholders: Option<bool>,
    poll_interval_ms: Option<u64>,
    verbose: Option<bool>,
    show_worker_output: Option<bool>,
}

impl FarmToml {
    pub fn workers(&self) -> Option<u32> {
        self.settings.workers
    }

    pub fn verbose(&self) -> Option<bool> {
        self.settings.verbose
    }
}

/// Settings file belonging to `project` (same directory).
pub fn settings_path_for(project: &Path) -> PathBuf {
    project
        .parent()
        .unwrap_or(Path::new("."))
        .join(PackagePaths::get().settings_filename())
}

/// Load the settings file. `Ok(None)` when it does not exist.
pub fn load_farm_toml(path: &Path) -> Result<Option<FarmToml>> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    let file = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(file))
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($idx:expr, $opts:expr, $idx_field:ident => $opts_field:ident) => {
        if let Some(v) = $idx.$idx_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
/// Relative paths are resolved against `base` (the project directory).
pub fn apply_file_to_opts(file: &FarmToml, opts: &mut FarmOpts, base: &Path) {
    let s = &file.settings;
    if let Some(ref exe) = s.executable {
        opts.executable = PathBuf::from(exe);
    }
    apply_file_opt!(s, opts.frames, frame_start => start);
    apply_file_opt!(s, opts.frames, frame_end => end);
    if let Some(ref dir) = s.output_dir {
        opts.output_dir = Some(base.join(dir));
    }
    apply_file_opt!(s, opts, overwrite => overwrite);
    apply_file_opt!(s, opts, placeholders => placeholders);
    if let Some(ms) = s.poll_interval_ms {
        opts.poll_interval = Duration::from_millis(ms);
    }
    apply_file_opt!(s, opts, verbose => verbose);
    apply_file_opt!(s, opts, show_worker_output => show_worker_output);
}

/// Write `workers` into `[settings]` of the file at `path`, keeping every other key. Creates the
/// file when missing.
pub fn store_workers(path: &Path, workers: u32) -> Result<()> {
    let mut doc = match std::fs::read_to_string(path) {
        Ok(s) => toml::from_str::<toml::Table>(&s)
            .with_context(|| format!("parse {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    let settings = doc
        .entry("settings")
        .or_insert(toml::Value::Table(toml::Table::new()));
    let Some(settings) = settings.as_table_mut() else {
        anyhow::bail!("{}: `settings` is not a table", path.display());
    };
    settings.insert("workers".to_string(), toml::Value::Integer(i64::from(workers)));
    let out = toml::to_string(&doc).context("serialize settings")?;
    std::fs::write(path, out).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_file_to_opts() {
        let file: FarmToml = toml::from_str(
            r#"
            [settings]
            workers = 6
            frame_end = 120
            output_dir = "out"
            placeholders = false
            poll_interval_ms = 250
            "#,
        )
        .unwrap();
        let mut opts = FarmOpts::default();
        apply_file_to_opts(&file, &mut opts, Path::new("/proj"));
        assert_eq!(file.workers(), Some(6));
        assert_eq!(opts.frames.start, 1);
        assert_eq!(opts.frames.end, 120);
        assert_eq!(opts.output_dir, Some(PathBuf::from("/proj/out")));
        assert!(!opts.placeholders);
        assert_eq!(opts.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_section_is_default() {
        let file: FarmToml = toml::from_str("").unwrap();
        assert_eq!(file.workers(), None);
        assert_eq!(file.verbose(), None);
    }
}
