//! Timer-driven event loop around [`Controller::tick`].
//!
//! Runs on the calling thread. Between ticks it sleeps in short slices so a cancel request is
//! picked up quickly; the request is only acted on at the top of a tick, never inside one.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::controller::Controller;
use super::host::Host;
use crate::utils::config::FarmConsts;
use crate::validate::cleanup_corrupted_outputs;

/// Install a Ctrl+C handler that raises the returned flag.
pub fn install_cancel_handler() -> Result<Arc<AtomicBool>> {
    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;
    Ok(cancel_requested)
}

fn sleep_until_next_tick(interval: Duration, cancel: &AtomicBool) {
    let deadline = Instant::now() + interval;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::sleep((deadline - now).min(FarmConsts::SLEEP_SLICE));
    }
}

/// Cancel, then wait up to `terminate_timeout` for the signalled workers. Survivors are killed
/// and the output directory is scanned again, since they may have written after the first scan.
fn cancel_and_confirm(controller: &mut Controller, host: &mut dyn Host) {
    let mut report = controller.cancel(host);
    if report.terminated.remaining() == 0 {
        return;
    }
    let alive = report
        .terminated
        .wait_timeout(controller.opts().terminate_timeout);
    if alive == 0 {
        return;
    }
    warn!("{alive} workers ignored the terminate signal; killing them");
    report.terminated.kill_remaining();
    if let Some(dir) = controller.opts().output_dir.as_deref() {
        let removed = cleanup_corrupted_outputs(dir);
        debug!("Second cleanup pass removed {removed} partial files");
    }
}

/// Tick until the controller has nothing left to drive. A raised `cancel` flag runs
/// [`Controller::cancel`] before the next tick and is then cleared.
pub fn run_until_idle(controller: &mut Controller, host: &mut dyn Host, cancel: &AtomicBool) {
    loop {
        if cancel.swap(false, Ordering::Relaxed) {
            warn!("Cancel requested");
            cancel_and_confirm(controller, host);
        }
        match controller.tick(host) {
            Some(interval) => sleep_until_next_tick(interval, cancel),
            None => break,
        }
    }
}
