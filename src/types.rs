//! Public types for the farm controller API: options, frame ranges, benchmark records, notifications.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::config::FarmConsts;

/// Inclusive frame range `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FrameRange {
    pub start: u32,
    pub end: u32,
}

impl FrameRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of frames in the range; 0 when `end < start`.
    pub fn len(&self) -> u32 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One completed benchmark trial.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrialResult {
    pub worker_count: u32,
    /// Frames per second measured for the trial.
    pub throughput: f64,
}

impl TrialResult {
    pub fn seconds_per_frame(&self) -> f64 {
        if self.throughput > 0.0 {
            1.0 / self.throughput
        } else {
            f64::INFINITY
        }
    }
}

/// Which session the controller is currently driving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Rendering,
    Benchmarking,
}

/// Snapshot handed to the host after every tick (status line, progress).
#[derive(Clone, Debug)]
pub struct Status {
    pub phase: Phase,
    /// Workers still running.
    pub active: usize,
    /// Workers reaped during this tick.
    pub reaped: usize,
    /// Current benchmark trial worker count (0 when not benchmarking).
    pub trial: u32,
    pub message: String,
}

/// Events emitted to the host (the notification sink).
#[derive(Clone, Debug)]
pub enum Notification {
    /// One worker of a batch could not be spawned. The batch continues.
    LaunchFailed { index: u32, error: String },
    /// All render workers exited.
    RenderComplete {
        workers: u32,
        elapsed: Duration,
        seconds_per_frame: f64,
    },
    /// A render session was cancelled before its workers drained.
    RenderCancelled { elapsed: Duration },
    /// A benchmark trial was launched.
    BenchmarkTrialStarted {
        worker_count: u32,
        frames: u32,
        launched: u32,
    },
    /// The search concluded with at least one completed trial.
    BenchmarkComplete {
        best_count: u32,
        seconds_per_frame: f64,
        results: Vec<TrialResult>,
    },
    /// The search ended before any trial completed; configuration untouched.
    BenchmarkAborted,
    /// Cancellation command finished.
    Cancelled { terminated: usize, removed: usize },
}

/// Controller options. Built from defaults, the settings file, environment and CLI (see `engine::handlers`).
#[derive(Clone, Debug)]
pub struct FarmOpts {
    /// Renderer executable invoked for every worker.
    pub executable: PathBuf,
    /// Frames of a full render job.
    pub frames: FrameRange,
    /// Output directory of full renders; scanned for partial files on cancel. Required by the CLI
    /// render command. None skips the scan with a warning.
    pub output_dir: Option<PathBuf>,
    /// Delay between polling ticks.
    pub poll_interval: Duration,
    /// Delay between terminating workers and scanning their output.
    pub cancel_grace: Duration,
    /// How long the driver waits for signalled workers before killing them.
    pub terminate_timeout: Duration,
    /// Host render flag: overwrite existing frames. Must be off for a full render.
    pub overwrite: bool,
    /// Host render flag: write placeholder files. Must be on for a full render.
    pub placeholders: bool,
    /// Let workers inherit stdout/stderr instead of discarding it.
    pub show_worker_output: bool,
    /// Verbose logging and live status bar.
    pub verbose: bool,
}

impl Default for FarmOpts {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(FarmConsts::DEFAULT_EXECUTABLE),
            frames: FrameRange::new(1, 250),
            output_dir: None,
            poll_interval: FarmConsts::POLL_INTERVAL,
            cancel_grace: FarmConsts::CANCEL_GRACE,
            terminate_timeout: FarmConsts::TERMINATE_TIMEOUT,
            overwrite: false,
            placeholders: true,
            show_worker_output: false,
            verbose: false,
        }
    }
}
