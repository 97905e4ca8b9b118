//! Engine: process pool, sessions, benchmark search, polling driver, CLI plumbing

pub mod arg_parser;
pub mod benchmark;
pub mod controller;
pub mod driver;
pub mod handlers;
pub mod host;
pub mod job;
pub mod pool;
pub mod preflight;
pub mod progress;
pub mod session;

// Re-export commonly used items
pub use arg_parser::{Cli, Commands, CommonArgs};
pub use benchmark::{
    BenchmarkSearch, Decision, TrialPlan, best_result, should_stop, throughput, trial_frame_count,
    trial_ranges,
};
pub use controller::{CancelReport, Controller, clamp_workers};
pub use driver::{install_cancel_handler, run_until_idle};
pub use handlers::{CliHost, handle_run};
pub use host::Host;
pub use job::JobCommand;
pub use pool::{ProcessPool, TerminatedWorkers, WorkerProcess};
pub use session::{RenderSession, RenderSummary, seconds_per_frame};
