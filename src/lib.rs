//! pseudofarm: local render farm controller with a worker-count benchmark

pub mod engine;
pub mod types;
pub mod utils;
pub mod validate;

/// Re-export types for API
pub use types::*;

use std::sync::atomic::AtomicBool;

use engine::{Controller, Host, JobCommand, run_until_idle};

/// Result alias used by public pseudofarm API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use validate::{cleanup_corrupted_outputs, is_output_valid};

/// Run a full render to completion: launch `host.worker_count()` instances of `job`, then tick
/// until they all exited or `cancel` was raised and handled.
///
/// Returns the controller so callers can read [`Controller::last_render`].
///
/// ```ignore
/// let job = JobCommand::new("blender", "shot.blend");
/// let cancel = AtomicBool::new(false);
/// let ctrl = pseudofarm::render(job, FarmOpts::default(), &mut my_host, &cancel)?;
/// println!("{:?}", ctrl.last_render());
/// ```
pub fn render(
    job: JobCommand,
    opts: FarmOpts,
    host: &mut dyn Host,
    cancel: &AtomicBool,
) -> Result<Controller> {
    let mut controller = Controller::new(job, opts);
    controller.start_render(host)?;
    run_until_idle(&mut controller, host, cancel);
    Ok(controller)
}

/// Run the benchmark search to completion. The best worker count is handed to
/// [`Host::set_worker_count`] and reported through [`Notification::BenchmarkComplete`].
pub fn benchmark(
    job: JobCommand,
    opts: FarmOpts,
    host: &mut dyn Host,
    cancel: &AtomicBool,
) -> Result<Controller> {
    let mut controller = Controller::new(job, opts);
    controller.start_benchmark(host)?;
    run_until_idle(&mut controller, host, cancel);
    Ok(controller)
}
