//! Host seam: configuration source and notification sink the controller talks to.

use anyhow::Result;

use crate::{Notification, Status};

/// The application embedding the controller (CLI, editor plugin, tests).
pub trait Host {
    /// Configured worker count, expected in `[1, 32]`.
    fn worker_count(&self) -> u32;

    /// Store a new worker count (benchmark result).
    fn set_worker_count(&mut self, count: u32) -> Result<()>;

    /// Persist the project so spawned workers see the current state. Called before every launch.
    fn save_project(&mut self) -> Result<()> {
        Ok(())
    }

    fn notify(&mut self, note: Notification);

    /// Called at the end of every tick.
    fn on_status(&mut self, _status: &Status) {}
}
