//! Start-up progress sequence shown before the login screen.
//!
//! [`LoadingSequence`] is the pure counter; [`LoaderHandle`] drives it on the tokio timer
//! and owns the pending tick and completion so both are released when the handle drops.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::debug;

use crate::config::LoaderTimings;

pub const COMPLETE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderTick {
    /// Progress moved but has not reached 100 yet.
    Advanced(u8),
    /// Progress reached 100 on this tick. Reported exactly once.
    Finished,
    /// Ticks arriving after completion. They change nothing.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingSequence {
    progress: u8,
    step: u8,
    finished: bool,
}

impl LoadingSequence {
    /// Counter advancing by `step` per tick. A zero step is clamped to one so the sequence
    /// always terminates; `PortalTimings::from_env` rejects zero before it gets here.
    pub fn new(step: u8) -> Self {
        Self {
            progress: 0,
            step: step.max(1),
            finished: false,
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn tick(&mut self) -> LoaderTick {
        if self.finished {
            return LoaderTick::Stopped;
        }

        self.progress = self.progress.saturating_add(self.step).min(COMPLETE);
        if self.progress == COMPLETE {
            self.finished = true;
            LoaderTick::Finished
        } else {
            LoaderTick::Advanced(self.progress)
        }
    }
}

/// Running loader. Dropping it cancels the ticker and any pending completion signal.
#[derive(Debug)]
pub struct LoaderHandle {
    task: JoinHandle<()>,
    progress: watch::Receiver<u8>,
}

impl LoaderHandle {
    /// Start ticking; `on_complete` runs once, `completion_delay` after progress hits 100.
    pub fn spawn<F>(timings: LoaderTimings, on_complete: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (progress_tx, progress) = watch::channel(0u8);

        let task = tokio::spawn(async move {
            let mut sequence = LoadingSequence::new(timings.step);
            let mut ticker = interval_at(Instant::now() + timings.tick, timings.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match sequence.tick() {
                    LoaderTick::Advanced(value) => {
                        progress_tx.send_replace(value);
                    }
                    LoaderTick::Finished => {
                        progress_tx.send_replace(COMPLETE);
                        break;
                    }
                    LoaderTick::Stopped => break,
                }
            }

            debug!(delay_ms = timings.completion_delay.as_millis() as u64, "loader at 100%");
            sleep(timings.completion_delay).await;
            on_complete();
        });

        Self { task, progress }
    }

    pub fn progress(&self) -> u8 {
        *self.progress.borrow()
    }

    pub fn is_complete(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
