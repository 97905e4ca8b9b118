//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    settings_filename: String,
    bench_dir_prefix: String,
    results_filename: String,
    executable_env_key: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                settings_filename: format!(".{pkg}.toml"),
                bench_dir_prefix: format!("{pkg}_bench_"),
                results_filename: format!("{pkg}.results.json"),
                executable_env_key: format!("{}_EXECUTABLE", pkg.to_uppercase()),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Settings file looked up next to the project file (e.g. `.pseudofarm.toml`).
    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }

    /// Prefix of the temporary directory created for a benchmark search.
    pub fn bench_dir_prefix(&self) -> &str {
        &self.bench_dir_prefix
    }

    pub fn results_filename(&self) -> &str {
        &self.results_filename
    }

    /// Environment variable naming the renderer executable (e.g. `PSEUDOFARM_EXECUTABLE`).
    pub fn executable_env_key(&self) -> &str {
        &self.executable_env_key
    }
}

// ---- Farm / worker limits ----

/// Worker count bounds and session timing.
pub struct FarmConsts;

impl FarmConsts {
    /// Smallest worker count the configuration accepts.
    pub const MIN_WORKERS: u32 = 1;
    /// Largest worker count; also the hard ceiling of the benchmark search.
    pub const MAX_WORKERS: u32 = 32;
    /// Worker count used when nothing is configured.
    pub const DEFAULT_WORKERS: u32 = 2;
    /// Default delay between polling ticks.
    pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
    /// Delay between terminating workers and scanning their output (lets handles close).
    pub const CANCEL_GRACE: Duration = Duration::from_millis(200);
    /// Signalled workers still alive after this long are killed outright.
    pub const TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);
    /// Granularity of the driver's sleep between ticks (cancel responsiveness).
    pub const SLEEP_SLICE: Duration = Duration::from_millis(50);
    /// Renderer executable when neither CLI, env nor settings file names one.
    pub const DEFAULT_EXECUTABLE: &'static str = "blender";
}

// ---- Benchmark ----

/// Benchmark search tuning.
pub struct BenchConsts;

impl BenchConsts {
    /// Frames rendered per trial are capped to bound wall-clock cost.
    pub const MAX_TRIAL_FRAMES: u32 = 50;
    /// Floor for trial elapsed time (seconds) in the throughput division.
    pub const MIN_ELAPSED_SECS: f64 = 0.001;
    /// Subdirectory name prefix for one trial's output (`inst_<k>`).
    pub const TRIAL_DIR_PREFIX: &'static str = "inst_";
    /// Output filename prefix handed to workers (`frame_`).
    pub const FRAME_PREFIX: &'static str = "frame_";
}

// ---- Output validation ----

/// Output file completeness checks.
pub struct ValidatorConsts;

impl ValidatorConsts {
    /// Bytes read from the end of a file for footer checks.
    pub const FOOTER_LEN: u64 = 10;
    /// PNG IEND chunk CRC: last four bytes of every complete PNG.
    pub const PNG_END: [u8; 4] = [0xAE, 0x42, 0x60, 0x82];
    /// JPEG end-of-image marker.
    pub const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];
    /// EXR files at or below this size are treated as truncated. Weak heuristic, not a real check.
    pub const EXR_MIN_SIZE: u64 = 1000;
}
