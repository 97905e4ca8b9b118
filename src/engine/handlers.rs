//! CLI command handlers: render, benchmark, clean, check.

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::engine::arg_parser::{Cli, Commands, CommonArgs};
use crate::engine::controller::clamp_workers;
use crate::engine::driver::install_cancel_handler;
use crate::engine::host::Host;
use crate::engine::job::JobCommand;
use crate::engine::preflight::{check_project_saved, check_render_flags};
use crate::engine::progress::StatusBar;
use crate::utils::config::{FarmConsts, PackagePaths};
use crate::utils::{
    Colors, apply_file_to_opts, load_farm_toml, resolve_executable, settings_path_for,
    setup_logging, store_workers,
};
use crate::validate::{cleanup_corrupted_outputs, is_output_valid};
use crate::{FarmOpts, Notification, Status, TrialResult};

/// Benchmark dump written with `--results`.
#[derive(Serialize)]
struct BenchmarkReport<'a> {
    best_count: u32,
    seconds_per_frame: f64,
    results: &'a [TrialResult],
}

/// Host for terminal runs: worker count lives in the settings file, notifications go to the log.
pub struct CliHost {
    project: PathBuf,
    settings_path: PathBuf,
    workers: u32,
    results_path: Option<PathBuf>,
    bar: Option<StatusBar>,
    cancelled: bool,
}

impl CliHost {
    pub fn new(project: PathBuf, settings_path: PathBuf, workers: u32) -> Self {
        Self {
            project,
            settings_path,
            workers,
            results_path: None,
            bar: None,
            cancelled: false,
        }
    }

    /// Err when the run ended through a cancel request.
    fn finish(self, what: &str) -> Result<()> {
        if self.cancelled {
            return Err(anyhow!("{what} cancelled by user; partial frames were removed"));
        }
        Ok(())
    }

    fn write_results(&self, best_count: u32, seconds_per_frame: f64, results: &[TrialResult]) {
        let Some(path) = self.results_path.as_deref() else {
            return;
        };
        let report = BenchmarkReport {
            best_count,
            seconds_per_frame,
            results,
        };
        let written = serde_json::to_string_pretty(&report)
            .context("serialize benchmark results")
            .and_then(|s| {
                std::fs::write(path, s).with_context(|| format!("write {}", path.display()))
            });
        match written {
            Ok(()) => info!("Benchmark results written to {}", path.display()),
            Err(e) => warn!("{e:#}"),
        }
    }
}

impl Host for CliHost {
    fn worker_count(&self) -> u32 {
        self.workers
    }

    fn set_worker_count(&mut self, count: u32) -> Result<()> {
        self.workers = count;
        store_workers(&self.settings_path, count)?;
        debug!("Stored {count} instances in {}", self.settings_path.display());
        Ok(())
    }

    fn save_project(&mut self) -> Result<()> {
        check_project_saved(&self.project).map(|_| ())
    }

    fn notify(&mut self, note: Notification) {
        match note {
            Notification::LaunchFailed { .. } => {}
            Notification::BenchmarkTrialStarted {
                worker_count,
                frames,
                launched,
            } => {
                if launched < worker_count {
                    warn!("Trial {worker_count}: only {launched} of {worker_count} instances started");
                }
                debug!("Trial {worker_count}: {frames} frames");
            }
            Notification::RenderComplete {
                workers,
                elapsed,
                seconds_per_frame,
            } => {
                self.bar.take();
                info!(
                    "{} {workers} instances finished in {:.1} s at {:.1} seconds per frame",
                    Colors::colorize(Colors::OK, "Render complete."),
                    elapsed.as_secs_f64(),
                    seconds_per_frame
                );
            }
            Notification::RenderCancelled { elapsed } => {
                self.bar.take();
                warn!("Render cancelled after {:.1} s", elapsed.as_secs_f64());
            }
            Notification::BenchmarkComplete {
                best_count,
                seconds_per_frame,
                results,
            } => {
                self.bar.take();
                info!(
                    "{} Optimal number of instances is {} with {:.1} seconds per frame",
                    Colors::colorize(Colors::OK, "Benchmark complete."),
                    Colors::colorize(Colors::INFO, &best_count.to_string()),
                    seconds_per_frame
                );
                info!("Benchmarking stats:");
                for r in &results {
                    info!(
                        "  {:>2} instances: {:.3} frames/s ({:.2} s/frame)",
                        r.worker_count,
                        r.throughput,
                        r.seconds_per_frame()
                    );
                }
                self.write_results(best_count, seconds_per_frame, &results);
            }
            Notification::BenchmarkAborted => {
                self.bar.take();
                warn!(
                    "{}",
                    Colors::colorize(Colors::NOTE, "Benchmark stopped before any trial finished")
                );
            }
            Notification::Cancelled { .. } => self.cancelled = true,
        }
    }

    fn on_status(&mut self, status: &Status) {
        if let Some(bar) = self.bar.as_mut() {
            bar.update(status);
        }
    }
}

/// Resolved configuration for one render or benchmark run.
struct Setup {
    opts: FarmOpts,
    workers: u32,
    settings_path: PathBuf,
    job: JobCommand,
}

fn project_dir(project: &Path) -> &Path {
    project.parent().unwrap_or(Path::new("."))
}

fn apply_cli_to_opts(common: &CommonArgs, opts: &mut FarmOpts) {
    if let Some(start) = common.frame_start {
        opts.frames.start = start;
    }
    if let Some(end) = common.frame_end {
        opts.frames.end = end;
    }
    if let Some(ref dir) = common.output_dir {
        opts.output_dir = Some(dir.clone());
    }
    if let Some(ms) = common.poll_interval_ms {
        opts.poll_interval = std::time::Duration::from_millis(ms);
    }
    if common.show_worker_output {
        opts.show_worker_output = true;
    }
}

/// Defaults → settings file → env → CLI. Also sets up logging.
fn setup_operation(common: &CommonArgs) -> Result<Setup> {
    let settings_path = settings_path_for(&common.project);
    let file = load_farm_toml(&settings_path);
    let verbose = common.verbose
        || file
            .as_ref()
            .ok()
            .and_then(|f| f.as_ref()?.verbose())
            .unwrap_or(false);
    setup_logging(verbose);

    let file = file.unwrap_or_else(|e| {
        warn!("{e:#}");
        None
    });
    let base = project_dir(&common.project);
    let mut opts = FarmOpts::default();
    if let Some(ref f) = file {
        apply_file_to_opts(f, &mut opts, base);
        debug!("Loaded {}", settings_path.display());
    }
    apply_cli_to_opts(common, &mut opts);
    opts.verbose = verbose;
    opts.executable = resolve_executable(common.exe.as_deref(), base, &opts.executable);

    let requested = common
        .workers
        .or_else(|| file.as_ref().and_then(|f| f.workers()))
        .unwrap_or(FarmConsts::DEFAULT_WORKERS);
    let workers = clamp_workers(requested);
    if workers != requested {
        warn!("Instance count {requested} out of range, using {workers}");
    }

    debug!(
        "{} CONFIG:{:#?}",
        PackagePaths::get().pkg_name().to_uppercase(),
        opts
    );
    let job = JobCommand::new(opts.executable.clone(), common.project.clone());
    Ok(Setup {
        opts,
        workers,
        settings_path,
        job,
    })
}

fn handle_render(common: &CommonArgs) -> Result<()> {
    let Setup {
        opts,
        workers,
        settings_path,
        job,
    } = setup_operation(common)?;
    check_render_flags(&opts)?;

    let mut host = CliHost::new(common.project.clone(), settings_path, workers);
    if opts.verbose {
        host.bar = Some(StatusBar::for_render(workers));
    }
    let cancel = install_cancel_handler()?;
    crate::render(job, opts, &mut host, &cancel)?;
    host.finish("Render")
}

fn handle_benchmark(common: &CommonArgs, results: Option<&Option<PathBuf>>) -> Result<()> {
    let Setup {
        opts,
        workers,
        settings_path,
        job,
    } = setup_operation(common)?;

    let mut host = CliHost::new(common.project.clone(), settings_path, workers);
    host.results_path = results.map(|p| {
        p.clone().unwrap_or_else(|| {
            project_dir(&common.project).join(PackagePaths::get().results_filename())
        })
    });
    if opts.verbose {
        host.bar = Some(StatusBar::for_benchmark());
    }
    let cancel = install_cancel_handler()?;
    crate::benchmark(job, opts, &mut host, &cancel)?;
    host.finish("Benchmark")
}

fn handle_clean(dir: &Path, verbose: bool) -> Result<()> {
    setup_logging(verbose);
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let removed = cleanup_corrupted_outputs(dir);
    info!("Removed {removed} partial files from {}", dir.display());
    Ok(())
}

fn handle_check(files: &[PathBuf], verbose: bool) -> Result<()> {
    setup_logging(verbose);
    let mut incomplete = 0;
    for path in files {
        if is_output_valid(path) {
            info!("{} {}", Colors::colorize(Colors::OK, "complete  "), path.display());
        } else {
            incomplete += 1;
            info!("{} {}", Colors::colorize(Colors::BAD, "incomplete"), path.display());
        }
    }
    if incomplete > 0 {
        bail!("{incomplete} of {} files are incomplete", files.len());
    }
    Ok(())
}

/// Dispatch a parsed command line.
pub fn handle_run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Render { common } => handle_render(common),
        Commands::Benchmark { common, results } => handle_benchmark(common, results.as_ref()),
        Commands::Clean { dir, verbose } => handle_clean(dir, *verbose),
        Commands::Check { files, verbose } => handle_check(files, *verbose),
    }
}
