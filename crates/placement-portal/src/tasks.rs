use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::task::JoinHandle;

/// Flag disabling re-entrant actions while an asynchronous call is pending.
#[derive(Debug, Default)]
pub struct BusyFlag {
    busy: AtomicBool,
}

impl BusyFlag {
    /// Enter the busy state, or `None` when an action is already in flight.
    pub fn try_enter(&self) -> Option<BusyGuard<'_>> {
        if self.busy.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(BusyGuard { flag: self })
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Clears the busy state on drop, including when the owning future is cancelled.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a BusyFlag,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
    }
}

/// Spawned timer tasks owned by a view. All of them are aborted when the owner drops.
#[derive(Debug, Default)]
pub struct PendingTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PendingTasks {
    pub fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().expect("task mutex poisoned");
        handles.retain(|pending| !pending.is_finished());
        handles.push(handle);
    }

    pub fn in_flight(&self) -> usize {
        self.handles
            .lock()
            .expect("task mutex poisoned")
            .iter()
            .filter(|pending| !pending.is_finished())
            .count()
    }
}

impl Drop for PendingTasks {
    fn drop(&mut self) {
        let handles = match self.handles.get_mut() {
            Ok(handles) => handles,
            Err(poisoned) => poisoned.into_inner(),
        };
        for handle in handles.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn busy_flag_gates_reentry_until_guard_drops() {
        let flag = BusyFlag::default();
        let guard = flag.try_enter().expect("first entry");
        assert!(flag.is_busy());
        assert!(flag.try_enter().is_none());
        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_enter().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_pending_tasks_aborts_timers() {
        let fired = Arc::new(AtomicUsize::new(0));
        let tasks = PendingTasks::default();
        for _ in 0..3 {
            let fired = fired.clone();
            tasks.track(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                fired.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(tasks.in_flight(), 3);

        drop(tasks);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
