//! Cancellable periodic tasks
//!
//! A `PeriodicTask` runs a closure on a fixed interval in its own thread until it
//! is cancelled. Cancelling is idempotent and also happens on drop, so a task
//! owned by a flow cannot outlive it.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// What the tick closure wants to happen next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// Handle to a running periodic task
pub struct PeriodicTask {
    name: &'static str,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl PeriodicTask {
    /// Spawn a task calling `tick` every `interval`
    ///
    /// The first call happens one interval after spawning.
    pub fn spawn<F>(name: &'static str, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> TickControl + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&ticks);

        let worker = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    counter.fetch_add(1, Ordering::Relaxed);
                    if tick() == TickControl::Stop {
                        break;
                    }
                }
                // Explicit stop or handle dropped
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        debug!("Periodic task '{}' started ({:?})", name, interval);
        Self {
            name,
            stop_tx: Some(stop_tx),
            worker: Some(worker),
            ticks,
        }
    }

    /// Stop the task and wait for its thread; later calls do nothing
    pub fn cancel(&mut self) {
        let Some(stop_tx) = self.stop_tx.take() else {
            return;
        };
        let _ = stop_tx.try_send(());
        drop(stop_tx);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        debug!(
            "Periodic task '{}' cancelled after {} ticks",
            self.name,
            self.ticks()
        );
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop_tx.is_none()
    }

    /// Number of times the closure has run
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_ticks_until_cancelled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut task = PeriodicTask::spawn("test", Duration::from_millis(5), move || {
            seen.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        });

        thread::sleep(Duration::from_millis(60));
        task.cancel();
        let after_cancel = calls.load(Ordering::SeqCst);
        assert!(after_cancel >= 1);
        assert!(task.is_cancelled());

        thread::sleep(Duration::from_millis(30));
        assert_eq!(calls.load(Ordering::SeqCst), after_cancel);
        assert_eq!(task.ticks() as usize, after_cancel);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut task =
            PeriodicTask::spawn("test", Duration::from_millis(5), || TickControl::Continue);
        task.cancel();
        task.cancel();
        assert!(task.is_cancelled());
    }

    #[test]
    fn test_drop_stops_task() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        {
            let _task = PeriodicTask::spawn("test", Duration::from_millis(5), move || {
                seen.fetch_add(1, Ordering::SeqCst);
                TickControl::Continue
            });
            thread::sleep(Duration::from_millis(30));
        }
        let after_drop = calls.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_tick_can_stop_itself() {
        let mut remaining = 3;
        let task = PeriodicTask::spawn("test", Duration::from_millis(2), move || {
            remaining -= 1;
            if remaining == 0 {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        });
        thread::sleep(Duration::from_millis(60));
        assert_eq!(task.ticks(), 3);
    }
}
