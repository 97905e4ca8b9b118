//! Shared fixtures: recording host, fake renderer scripts, image bytes.
#![allow(dead_code)]

use anyhow::Result;
use pseudofarm::engine::Host;
use pseudofarm::{Notification, Status};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

static PROCESS_TESTS: Mutex<()> = Mutex::new(());

/// Serialize tests that write a script and then exec it. A fork from a parallel test could
/// otherwise inherit the script's write handle and fail the exec with ETXTBSY.
pub fn serial() -> MutexGuard<'static, ()> {
    PROCESS_TESTS.lock().unwrap_or_else(|e| e.into_inner())
}

/// Host that records everything the controller tells it.
#[derive(Default)]
pub struct RecordingHost {
    pub workers: u32,
    pub saves: u32,
    pub notes: Vec<Notification>,
    pub statuses: Vec<Status>,
}

impl RecordingHost {
    pub fn new(workers: u32) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn launch_failures(&self) -> usize {
        self.notes
            .iter()
            .filter(|n| matches!(n, Notification::LaunchFailed { .. }))
            .count()
    }
}

impl Host for RecordingHost {
    fn worker_count(&self) -> u32 {
        self.workers
    }

    fn set_worker_count(&mut self, count: u32) -> Result<()> {
        self.workers = count;
        Ok(())
    }

    fn save_project(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }

    fn notify(&mut self, note: Notification) {
        self.notes.push(note);
    }

    fn on_status(&mut self, status: &Status) {
        self.statuses.push(status.clone());
    }
}

/// Write an executable `/bin/sh` renderer into `dir`. It parses `-o/-s/-e`, appends its
/// arguments to `args.log`, runs `body`, then writes one file per frame when `-o` was given.
/// `body` sees `$out`, `$s`, `$e` and `$dir`.
#[cfg(unix)]
pub fn fake_renderer(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
dir="{dir}"
out=""; s=""; e=""
echo "$*" >> "$dir/args.log"
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
    -s) s="$2"; shift ;;
    -e) e="$2"; shift ;;
  esac
  shift
done
{body}
if [ -n "$out" ]; then
  f=$s
  while [ "$f" -le "$e" ]; do
    printf 'frame' > "$out$f.txt"
    f=$((f+1))
  done
fi
"#,
        dir = dir.display(),
        body = body
    );
    let path = dir.join("fake_renderer.sh");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Lines of `args.log` written by [`fake_renderer`].
pub fn logged_args(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("args.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Minimal byte stream ending like a complete PNG (IEND chunk + CRC).
pub fn complete_png() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 40]);
    bytes.extend_from_slice(&[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]);
    bytes
}
