pub mod config;
pub mod executable;
pub mod farm_toml;
pub mod logger;
pub mod tempfiles;

pub use config::*;
pub use executable::resolve_executable;
pub use farm_toml::{FarmToml, apply_file_to_opts, load_farm_toml, settings_path_for, store_workers};
pub use logger::{Colors, setup_logging};
pub use tempfiles::{create_bench_root, prepare_trial_prefix, remove_bench_root, trial_dir};
