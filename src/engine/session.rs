//! Full-job render session: every worker renders the whole range; the host's placeholder
//! mechanism makes them skip frames another worker already claimed.

use std::time::{Duration, Instant};

/// Timing summary of a drained render session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSummary {
    pub workers: u32,
    pub elapsed: Duration,
    pub seconds_per_frame: f64,
}

/// An active render session. Dropped (inactive) once finished or cancelled.
#[derive(Debug)]
pub struct RenderSession {
    started_at: Instant,
    frame_count: u32,
    workers: u32,
}

impl RenderSession {
    pub fn new(frame_count: u32, workers: u32) -> Self {
        Self {
            started_at: Instant::now(),
            frame_count,
            workers,
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn workers(&self) -> u32 {
        self.workers
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Close the session at the moment its pool drained. Workers overlap in wall-clock time, so
    /// elapsed is start to last exit, not a sum.
    pub fn finish(self) -> RenderSummary {
        let elapsed = self.elapsed();
        RenderSummary {
            workers: self.workers,
            elapsed,
            seconds_per_frame: seconds_per_frame(elapsed, self.frame_count),
        }
    }
}

/// `elapsed / frames`; 0 frames reports the whole elapsed time.
pub fn seconds_per_frame(elapsed: Duration, frames: u32) -> f64 {
    elapsed.as_secs_f64() / f64::from(frames.max(1))
}
