//! Farm controller: owns the pool and whichever session is active, and advances both once per tick.
//!
//! All state lives in [`Controller`] and is only touched through `&mut self` from the tick or an
//! action (start, cancel), so one thread drives everything and nothing needs a lock. A tick never
//! blocks on a child process.

use anyhow::{Result, bail};
use log::{debug, error, info, warn};
use std::time::Duration;

use super::benchmark::{BenchmarkSearch, Decision};
use super::host::Host;
use super::job::JobCommand;
use super::pool::{ProcessPool, TerminatedWorkers};
use super::session::{RenderSession, RenderSummary};
use crate::utils::config::FarmConsts;
use crate::validate::cleanup_corrupted_outputs;
use crate::{FarmOpts, Notification, Phase, Status};

/// Outcome of [`Controller::cancel`].
#[derive(Debug, Default)]
pub struct CancelReport {
    /// Signalled workers. Call `wait_timeout` on it to confirm they are gone.
    pub terminated: TerminatedWorkers,
    /// Partial output files deleted from the render output directory.
    pub removed: usize,
}

/// Clamp a configured worker count into `[1, 32]`.
pub fn clamp_workers(count: u32) -> u32 {
    count.clamp(FarmConsts::MIN_WORKERS, FarmConsts::MAX_WORKERS)
}

#[derive(Debug)]
pub struct Controller {
    job: JobCommand,
    opts: FarmOpts,
    pool: ProcessPool,
    render: Option<RenderSession>,
    bench: Option<BenchmarkSearch>,
    last_render: Option<RenderSummary>,
}

impl Controller {
    pub fn new(job: JobCommand, opts: FarmOpts) -> Self {
        Self {
            pool: ProcessPool::new(opts.show_worker_output),
            job,
            opts,
            render: None,
            bench: None,
            last_render: None,
        }
    }

    pub fn opts(&self) -> &FarmOpts {
        &self.opts
    }

    pub fn pool(&self) -> &ProcessPool {
        &self.pool
    }

    pub fn render_session(&self) -> Option<&RenderSession> {
        self.render.as_ref()
    }

    pub fn benchmark(&self) -> Option<&BenchmarkSearch> {
        self.bench.as_ref()
    }

    /// Summary of the last render that ran to completion.
    pub fn last_render(&self) -> Option<&RenderSummary> {
        self.last_render.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.bench.is_some() {
            Phase::Benchmarking
        } else if self.render.is_some() {
            Phase::Rendering
        } else {
            Phase::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase() != Phase::Idle
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.phase() {
            Phase::Rendering => bail!("A render is already running"),
            Phase::Benchmarking => bail!("A benchmark is already running"),
            Phase::Idle if !self.pool.is_empty() => {
                bail!("{} workers from a previous run are still alive", self.pool.len())
            }
            Phase::Idle => Ok(()),
        }
    }

    /// Start a full render: `worker_count` copies of the full-job command, each covering the whole
    /// frame range. Fails without side effects when a session is active. Fails when not a single
    /// worker could be spawned; fewer than requested is accepted.
    pub fn start_render(&mut self, host: &mut dyn Host) -> Result<u32> {
        self.ensure_idle()?;
        host.save_project()?;
        let workers = clamp_workers(host.worker_count());
        let session = RenderSession::new(self.opts.frames.len(), workers);

        let args = self.job.full_args();
        let launched = self.pool.launch_batch(
            &self.job.executable,
            (0..workers).map(|_| args.clone()),
            |index, e| {
                error!("Failed to launch instance {index}: {e:#}");
                host.notify(Notification::LaunchFailed {
                    index,
                    error: format!("{e:#}"),
                });
            },
        );
        if launched == 0 {
            bail!("No render instance could be launched");
        }

        info!("Launched {launched} render instances.");
        self.render = Some(session);
        Ok(launched)
    }

    /// Start the benchmark search at one worker.
    pub fn start_benchmark(&mut self, host: &mut dyn Host) -> Result<()> {
        self.ensure_idle()?;
        host.save_project()?;
        self.bench = Some(BenchmarkSearch::new(self.opts.frames.end)?);
        match self.launch_trial(host) {
            Ok(0) => {
                self.conclude_benchmark(host);
                bail!("No benchmark instance could be launched")
            }
            Ok(_) => Ok(()),
            Err(e) => {
                self.conclude_benchmark(host);
                Err(e)
            }
        }
    }

    /// Launch the workers of the current trial. Returns how many started.
    fn launch_trial(&mut self, host: &mut dyn Host) -> Result<u32> {
        let Some(search) = self.bench.as_mut() else {
            bail!("no benchmark running");
        };
        let plan = search.plan_trial()?;
        info!("{}", search.status_message());

        let job = &self.job;
        let launched = self.pool.launch_batch(
            &job.executable,
            plan.ranges
                .iter()
                .map(|range| job.range_args(&plan.prefix, *range)),
            |index, e| {
                error!("Failed to launch instance {index}: {e:#}");
                host.notify(Notification::LaunchFailed {
                    index,
                    error: format!("{e:#}"),
                });
            },
        );
        host.notify(Notification::BenchmarkTrialStarted {
            worker_count: plan.worker_count,
            frames: plan.frames,
            launched,
        });
        Ok(launched)
    }

    /// The trial's pool drained (or it was cancelled): record, then continue or conclude.
    fn on_trial_drained(&mut self, host: &mut dyn Host) {
        let decision = {
            let Some(search) = self.bench.as_mut() else {
                return;
            };
            if !search.early_exit() {
                let result = search.complete_trial();
                info!(
                    "{} instances: {:.2} frames/s",
                    result.worker_count, result.throughput
                );
            }
            let decision = search.decide();
            if decision == Decision::Continue {
                search.advance();
            }
            decision
        };

        match decision {
            Decision::Stop => self.conclude_benchmark(host),
            Decision::Continue => match self.launch_trial(host) {
                Ok(0) => {
                    warn!("No instance of the next trial could be launched; stopping benchmark");
                    self.conclude_benchmark(host);
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Cannot start next benchmark trial: {e:#}");
                    self.conclude_benchmark(host);
                }
            },
        }
    }

    /// Pick the best worker count, write it back to the host, remove the temp output, clear state.
    fn conclude_benchmark(&mut self, host: &mut dyn Host) {
        let Some(search) = self.bench.take() else {
            return;
        };
        let (best, results) = search.conclude();
        let Some(best) = best else {
            warn!("Benchmark stopped before any trial completed");
            host.notify(Notification::BenchmarkAborted);
            return;
        };

        if let Err(e) = host.set_worker_count(best.worker_count) {
            warn!("Could not store worker count {}: {e:#}", best.worker_count);
        }
        debug!(
            "Optimal found: {} instances at {:.1} seconds per frame",
            best.worker_count,
            best.seconds_per_frame()
        );
        debug!("Benchmark results: {:?}", results);
        host.notify(Notification::BenchmarkComplete {
            best_count: best.worker_count,
            seconds_per_frame: best.seconds_per_frame(),
            results,
        });
    }

    fn finish_render(&mut self, host: &mut dyn Host) {
        let Some(session) = self.render.take() else {
            return;
        };
        let summary = session.finish();
        debug!(
            "All instances finished in {:.1} s at {:.1} seconds per frame",
            summary.elapsed.as_secs_f64(),
            summary.seconds_per_frame
        );
        host.notify(Notification::RenderComplete {
            workers: summary.workers,
            elapsed: summary.elapsed,
            seconds_per_frame: summary.seconds_per_frame,
        });
        self.last_render = Some(summary);
    }

    /// One polling tick: reap exited workers, finalize the active session when its pool drained.
    /// Returns the delay until the next tick, or `None` once nothing is active (do not reschedule).
    pub fn tick(&mut self, host: &mut dyn Host) -> Option<Duration> {
        let reaped = self.pool.poll_and_reap();
        if self.pool.is_empty() {
            match self.phase() {
                Phase::Benchmarking => self.on_trial_drained(host),
                Phase::Rendering => self.finish_render(host),
                Phase::Idle => {}
            }
        }
        host.on_status(&self.status(reaped));
        self.is_active().then_some(self.opts.poll_interval)
    }

    /// Stop everything: terminate workers, wait the grace delay, conclude a running benchmark with
    /// the trials completed so far, then delete partial files from the render output directory.
    pub fn cancel(&mut self, host: &mut dyn Host) -> CancelReport {
        if !self.is_active() && self.pool.is_empty() {
            info!("No active processes found");
            return CancelReport::default();
        }

        let mut terminated = self.pool.terminate_all();
        if let Some(search) = self.bench.as_mut() {
            search.request_early_exit();
        }
        if let Some(session) = self.render.take() {
            host.notify(Notification::RenderCancelled {
                elapsed: session.elapsed(),
            });
        }

        std::thread::sleep(self.opts.cancel_grace);
        let alive = terminated.reap();
        if alive > 0 {
            debug!("{alive} terminated workers have not exited yet");
        }

        if self.bench.is_some() {
            self.conclude_benchmark(host);
        }

        let removed = match self.opts.output_dir.as_deref() {
            Some(dir) => cleanup_corrupted_outputs(dir),
            None => {
                warn!("No render output directory configured; partial frames were not checked");
                0
            }
        };
        if terminated.signalled() > 0 {
            warn!(
                "Terminated {} render processes. Removed {} partial files",
                terminated.signalled(),
                removed
            );
        }
        host.notify(Notification::Cancelled {
            terminated: terminated.signalled(),
            removed,
        });
        CancelReport {
            terminated,
            removed,
        }
    }

    /// Status line for the host after a tick.
    pub fn status(&self, reaped: usize) -> Status {
        let (message, trial) = match (&self.bench, &self.render, &self.last_render) {
            (Some(search), _, _) => (search.status_message(), search.worker_count()),
            (None, Some(_), _) => (format!("Rendering: {} active", self.pool.len()), 0),
            (None, None, Some(last)) => (
                format!(
                    "Ready. Spent {:.1} seconds with {:.1} seconds per frame",
                    last.elapsed.as_secs_f64(),
                    last.seconds_per_frame
                ),
                0,
            ),
            (None, None, None) => ("Ready".to_string(), 0),
        };
        Status {
            phase: self.phase(),
            active: self.pool.len(),
            reaped,
            trial,
            message,
        }
    }
}
