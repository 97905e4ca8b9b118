//! Benchmark search: hill-climb over worker counts 1, 2, 3, ... measuring frames per second.
//!
//! Each trial renders at most 50 frames, rounded down to a multiple of the worker count so every
//! worker gets the same contiguous share. The search stops when a cancel was requested, the
//! ceiling of 32 workers is reached, or (from the third trial on) a trial is slower than the
//! single-worker baseline. Only trial 1 is the reference; a dip below the previous trial does
//! not stop the search.

use anyhow::{Result, bail};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use crate::utils::config::{BenchConsts, FarmConsts};
use crate::utils::{create_bench_root, prepare_trial_prefix, remove_bench_root};
use crate::{FrameRange, TrialResult};

/// Frames rendered by a trial with `workers` workers: `min(frame_end, 50)` rounded down to a
/// multiple of `workers`.
pub fn trial_frame_count(frame_end: u32, workers: u32) -> u32 {
    if workers == 0 {
        return 0;
    }
    frame_end.min(BenchConsts::MAX_TRIAL_FRAMES) / workers * workers
}

/// Split `frames` (starting at frame 1) into `workers` disjoint contiguous ranges of equal size.
pub fn trial_ranges(frames: u32, workers: u32) -> Vec<FrameRange> {
    if workers == 0 {
        return Vec::new();
    }
    let share = frames / workers;
    (0..workers)
        .map(|i| FrameRange::new(1 + i * share, (i + 1) * share))
        .collect()
}

/// Frames per second, with elapsed floored so an instant trial cannot divide by zero.
pub fn throughput(frames: u32, elapsed: Duration) -> f64 {
    f64::from(frames) / elapsed.as_secs_f64().max(BenchConsts::MIN_ELAPSED_SECS)
}

/// Stopping rule, applied after trial `worker_count` was recorded (or interrupted).
pub fn should_stop(results: &[TrialResult], worker_count: u32, early_exit: bool) -> bool {
    if early_exit || worker_count >= FarmConsts::MAX_WORKERS {
        return true;
    }
    if worker_count <= 2 {
        return false;
    }
    match (results.first(), results.last()) {
        (Some(baseline), Some(latest)) => latest.throughput < baseline.throughput,
        _ => false,
    }
}

/// Highest throughput; ties go to the lowest worker count.
pub fn best_result(results: &[TrialResult]) -> Option<TrialResult> {
    results.iter().copied().fold(None, |best, r| match best {
        Some(b) if b.throughput > r.throughput => Some(b),
        Some(b) if b.throughput == r.throughput && b.worker_count <= r.worker_count => Some(b),
        _ => Some(r),
    })
}

/// What to do once the pool of a trial drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Stop,
}

/// Launch plan for one trial.
#[derive(Debug, Clone)]
pub struct TrialPlan {
    pub worker_count: u32,
    pub frames: u32,
    /// Output prefix passed with `-o`.
    pub prefix: PathBuf,
    /// One range per worker.
    pub ranges: Vec<FrameRange>,
}

/// State of a running search. Dropping it removes the temp output root as well; [`Self::conclude`]
/// does it explicitly and logs failures.
#[derive(Debug)]
pub struct BenchmarkSearch {
    frame_end: u32,
    worker_count: u32,
    frames: u32,
    results: Vec<TrialResult>,
    temp_root: Option<TempDir>,
    trial_started: Instant,
    early_exit: bool,
}

impl BenchmarkSearch {
    /// Start a search at one worker. `frame_end` is the project's last frame.
    pub fn new(frame_end: u32) -> Result<Self> {
        if trial_frame_count(frame_end, 1) == 0 {
            bail!("Cannot benchmark: frame range ends at {frame_end}, nothing to render");
        }
        Ok(Self {
            frame_end,
            worker_count: 1,
            frames: 0,
            results: Vec::new(),
            temp_root: Some(create_bench_root()?),
            trial_started: Instant::now(),
            early_exit: false,
        })
    }

    pub fn worker_count(&self) -> u32 {
        self.worker_count
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    pub fn temp_root(&self) -> Option<&std::path::Path> {
        self.temp_root.as_ref().map(|d| d.path())
    }

    pub fn early_exit(&self) -> bool {
        self.early_exit
    }

    /// Mark the search for early exit; the interrupted trial records nothing.
    pub fn request_early_exit(&mut self) {
        self.early_exit = true;
    }

    /// Prepare the current trial: frame count, output directory, per-worker ranges. Starts its clock.
    pub fn plan_trial(&mut self) -> Result<TrialPlan> {
        let Some(root) = self.temp_root.as_ref() else {
            bail!("benchmark output root already removed");
        };
        let k = self.worker_count;
        self.frames = trial_frame_count(self.frame_end, k);
        let prefix = prepare_trial_prefix(root.path(), k)?;
        self.trial_started = Instant::now();
        Ok(TrialPlan {
            worker_count: k,
            frames: self.frames,
            prefix,
            ranges: trial_ranges(self.frames, k),
        })
    }

    /// Record the throughput of the trial whose pool just drained.
    pub fn complete_trial(&mut self) -> TrialResult {
        let result = TrialResult {
            worker_count: self.worker_count,
            throughput: throughput(self.frames, self.trial_started.elapsed()),
        };
        self.results.push(result);
        result
    }

    /// Stop or go on to the next worker count. Also stops when the next trial would have no frames.
    pub fn decide(&self) -> Decision {
        if should_stop(&self.results, self.worker_count, self.early_exit)
            || trial_frame_count(self.frame_end, self.worker_count + 1) == 0
        {
            Decision::Stop
        } else {
            Decision::Continue
        }
    }

    /// Move to the next worker count.
    pub fn advance(&mut self) {
        self.worker_count += 1;
    }

    pub fn status_message(&self) -> String {
        format!(
            "Testing {} instances on {} frames",
            self.worker_count, self.frames
        )
    }

    /// Remove the temp output root and return the best trial with the full result list.
    pub fn conclude(mut self) -> (Option<TrialResult>, Vec<TrialResult>) {
        if let Some(root) = self.temp_root.take() {
            remove_bench_root(root);
        }
        let results = std::mem::take(&mut self.results);
        (best_result(&results), results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(worker_count: u32, throughput: f64) -> TrialResult {
        TrialResult {
            worker_count,
            throughput,
        }
    }

    #[test]
    fn test_trial_frame_count_divisible_and_capped() {
        for frame_end in [1, 7, 49, 50, 51, 250] {
            for k in 1..=32 {
                let n = trial_frame_count(frame_end, k);
                assert_eq!(n % k, 0, "frame_end={frame_end} k={k}");
                assert!(n <= 50);
                assert!(n <= frame_end);
            }
        }
        assert_eq!(trial_frame_count(250, 3), 48);
        assert_eq!(trial_frame_count(250, 7), 49);
        assert_eq!(trial_frame_count(10, 4), 8);
        assert_eq!(trial_frame_count(3, 4), 0);
    }

    #[test]
    fn test_trial_ranges_disjoint_contiguous() {
        let ranges = trial_ranges(48, 3);
        assert_eq!(
            ranges,
            vec![
                FrameRange::new(1, 16),
                FrameRange::new(17, 32),
                FrameRange::new(33, 48)
            ]
        );
        assert_eq!(trial_ranges(50, 1), vec![FrameRange::new(1, 50)]);
    }

    #[test]
    fn test_throughput_floors_elapsed() {
        assert_eq!(throughput(50, Duration::ZERO), 50_000.0);
        assert_eq!(throughput(10, Duration::from_secs(5)), 2.0);
    }

    #[test]
    fn test_stop_compares_against_baseline_only() {
        let results = vec![r(1, 2.0), r(2, 3.8), r(3, 3.5)];
        // 3.5 dipped below trial 2 but is still above the baseline
        assert!(!should_stop(&results, 3, false));
        let results = vec![r(1, 2.0), r(2, 3.8), r(3, 3.5), r(4, 1.9)];
        assert!(should_stop(&results, 4, false));
    }

    #[test]
    fn test_stop_never_on_first_two_trials() {
        assert!(!should_stop(&[r(1, 2.0)], 1, false));
        assert!(!should_stop(&[r(1, 2.0), r(2, 0.5)], 2, false));
    }

    #[test]
    fn test_stop_on_ceiling_and_early_exit() {
        assert!(should_stop(&[r(1, 1.0)], 32, false));
        assert!(should_stop(&[], 1, true));
    }

    #[test]
    fn test_best_result_ties_prefer_lowest_count() {
        assert_eq!(best_result(&[]), None);
        let results = vec![r(1, 2.0), r(2, 4.0), r(3, 4.0), r(4, 3.0)];
        assert_eq!(best_result(&results), Some(r(2, 4.0)));
        let results = vec![r(1, 5.0), r(2, 4.0)];
        assert_eq!(best_result(&results), Some(r(1, 5.0)));
    }
}
