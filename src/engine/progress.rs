//! Live status bar for verbose CLI runs.

use kdam::{Animation, Bar, BarExt};

use crate::utils::config::FarmConsts;
use crate::{Phase, Status};

/// kdam bar fed from the controller's per-tick [`Status`]. Counts finished workers during a
/// render and finished trials during a benchmark; the status line is the bar description.
pub struct StatusBar {
    bar: Bar,
    trial: u32,
}

impl StatusBar {
    pub fn for_render(workers: u32) -> Self {
        Self {
            bar: kdam::tqdm!(
                total = workers as usize,
                desc = "Rendering",
                animation = Animation::Classic,
                unit = " workers"
            ),
            trial: 0,
        }
    }

    pub fn for_benchmark() -> Self {
        Self {
            bar: kdam::tqdm!(
                total = FarmConsts::MAX_WORKERS as usize,
                desc = "Benchmark",
                animation = Animation::Classic,
                unit = " trials"
            ),
            trial: 1,
        }
    }

    /// Advance from a tick's status.
    pub fn update(&mut self, status: &Status) {
        let desc = match status.phase {
            Phase::Benchmarking => format!("{} ({} running)", status.message, status.active),
            _ => status.message.clone(),
        };
        self.bar.set_description(desc);
        let n = match status.phase {
            Phase::Rendering => status.reaped,
            Phase::Benchmarking if status.trial > self.trial => {
                let done = status.trial - self.trial;
                self.trial = status.trial;
                done as usize
            }
            _ => 0,
        };
        let _ = if n > 0 {
            self.bar.update(n).map(|_| ())
        } else {
            self.bar.refresh()
        };
    }
}

impl Drop for StatusBar {
    fn drop(&mut self) {
        let _ = self.bar.refresh();
        eprintln!();
    }
}
