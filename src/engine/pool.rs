//! Worker process pool: spawn, non-blocking reap, best-effort termination.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// A spawned worker and the arguments it was launched with.
#[derive(Debug)]
pub struct WorkerProcess {
    child: Child,
    args: Vec<OsString>,
    launched_at: Instant,
}

impl WorkerProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Non-blocking exit check. `Err` means the status can no longer be observed.
    fn has_exited(&mut self) -> std::io::Result<bool> {
        match self.child.try_wait()? {
            Some(status) => {
                debug!(
                    "Worker {} exited with {} after {:.1?}",
                    self.pid(),
                    status,
                    self.launched_at.elapsed()
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Ask the process to stop. SIGTERM on Unix so the renderer can flush; hard kill elsewhere.
    fn signal_terminate(&mut self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            let pid = self.child.id() as libc::pid_t;
            if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        }
        #[cfg(not(unix))]
        {
            self.child.kill()
        }
    }
}

/// Workers signalled by [`ProcessPool::terminate_all`]. Their exit is not confirmed; use
/// [`TerminatedWorkers::reap`] or [`TerminatedWorkers::wait_timeout`] when that matters.
#[derive(Debug, Default)]
pub struct TerminatedWorkers {
    workers: Vec<WorkerProcess>,
    signalled: usize,
}

impl TerminatedWorkers {
    /// Number of workers that were still running and got signalled.
    pub fn signalled(&self) -> usize {
        self.signalled
    }

    /// Workers not yet observed to exit.
    pub fn remaining(&self) -> usize {
        self.workers.len()
    }

    /// Non-blocking: drop workers that have exited. Returns how many are still alive.
    pub fn reap(&mut self) -> usize {
        self.workers.retain_mut(|w| matches!(w.has_exited(), Ok(false)));
        self.workers.len()
    }

    /// Poll until every worker exited or `timeout` elapsed. Returns how many are still alive.
    pub fn wait_timeout(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        loop {
            if self.reap() == 0 || Instant::now() >= deadline {
                return self.workers.len();
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    /// Hard-kill and wait for every worker still alive (SIGKILL on Unix). Returns how many were
    /// killed. Meant for workers that ignored the terminate signal.
    pub fn kill_remaining(&mut self) -> usize {
        let mut killed = 0;
        for mut w in self.workers.drain(..) {
            let pid = w.pid();
            match w.child.kill().and_then(|()| w.child.wait()) {
                Ok(status) => {
                    debug!("Killed worker {pid} ({status})");
                    killed += 1;
                }
                Err(e) => warn!("Failed to kill worker {pid}: {e}"),
            }
        }
        killed
    }
}

/// Live worker handles owned by the controller.
/// Invariant: every handle was spawned here and has not been observed to exit.
#[derive(Debug, Default)]
pub struct ProcessPool {
    workers: Vec<WorkerProcess>,
    show_output: bool,
}

impl ProcessPool {
    pub fn new(show_output: bool) -> Self {
        Self {
            workers: Vec::new(),
            show_output,
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn workers(&self) -> &[WorkerProcess] {
        &self.workers
    }

    /// Spawn `command args` and take ownership of the handle.
    pub fn launch(&mut self, command: &Path, args: Vec<OsString>) -> Result<&WorkerProcess> {
        let (stdout, stderr) = if self.show_output {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };
        let child = Command::new(command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .with_context(|| format!("spawn worker {}", command.display()))?;
        debug!("Launched worker {} ({:?})", child.id(), args);
        self.workers.push(WorkerProcess {
            child,
            args,
            launched_at: Instant::now(),
        });
        let last = self.workers.len() - 1;
        Ok(&self.workers[last])
    }

    /// Launch one worker per argument list. A failed spawn is handed to `on_error` with its
    /// index and does not stop the rest of the batch. Returns how many started.
    pub fn launch_batch<I, F>(&mut self, command: &Path, batch: I, mut on_error: F) -> u32
    where
        I: IntoIterator<Item = Vec<OsString>>,
        F: FnMut(u32, &anyhow::Error),
    {
        let mut launched = 0;
        for (index, args) in (0u32..).zip(batch) {
            match self.launch(command, args) {
                Ok(_) => launched += 1,
                Err(e) => on_error(index, &e),
            }
        }
        launched
    }

    /// Remove every worker that has exited. Returns how many were removed.
    /// A worker whose status check fails is removed as well so it cannot stall the session.
    pub fn poll_and_reap(&mut self) -> usize {
        let before = self.workers.len();
        self.workers.retain_mut(|w| match w.has_exited() {
            Ok(exited) => !exited,
            Err(e) => {
                warn!("Lost track of worker {}: {}", w.pid(), e);
                false
            }
        });
        before - self.workers.len()
    }

    /// Signal every still-running worker and empty the pool. Returns before the processes are
    /// confirmed dead.
    pub fn terminate_all(&mut self) -> TerminatedWorkers {
        let mut signalled = 0;
        let mut workers = Vec::with_capacity(self.workers.len());
        for mut w in self.workers.drain(..) {
            if let Ok(true) = w.has_exited() {
                continue;
            }
            match w.signal_terminate() {
                Ok(()) => signalled += 1,
                Err(e) => warn!("Failed to terminate worker {}: {}", w.pid(), e),
            }
            workers.push(w);
        }
        TerminatedWorkers { workers, signalled }
    }
}
