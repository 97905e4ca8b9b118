//! Renderer executable lookup: CLI flag → env (PSEUDOFARM_EXECUTABLE) → .env in project dir → settings/default.

use log::debug;
use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Value of `key` in `<dir>/.env`. The file is parsed without touching the process environment.
fn from_dotenv(dir: &Path, key: &str) -> Option<String> {
    let entries = dotenvy::from_path_iter(dir.join(".env")).ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| non_empty(&v))
}

/// Pick the renderer executable. `fallback` is what the settings file or defaults provide.
pub fn resolve_executable(cli: Option<&Path>, project_dir: &Path, fallback: &Path) -> PathBuf {
    if let Some(exe) = cli {
        return exe.to_path_buf();
    }
    let key = PackagePaths::get().executable_env_key();
    let found = std::env::var(key)
        .ok()
        .and_then(|v| non_empty(&v))
        .map(|v| (v, "environment"))
        .or_else(|| from_dotenv(project_dir, key).map(|v| (v, ".env")));
    match found {
        Some((exe, source)) => {
            debug!("Renderer executable from {source}: {exe}");
            PathBuf::from(exe)
        }
        None => fallback.to_path_buf(),
    }
}
