//! Periodic pruning on a dedicated thread.
//!
//! A [`PruneSchedule`] owns one OS thread driving a current-thread tokio
//! runtime. The task runs on the first tick, immediately, and then at a fixed
//! rate; missed ticks are caught up. Stopping signals the thread over a
//! oneshot channel and joins it, so no tick runs after `stop` returns. A tick
//! already in progress is allowed to finish.
//!
//! The task itself may stop its own schedule. On the schedule thread `stop`
//! only signals: the loop exits once the current tick returns.

use crate::error::{Error, Result};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::oneshot;

const THREAD_NAME: &str = "hoard-prune";

/// Handle to a running periodic task. Dropping it stops the task.
pub struct PruneSchedule {
    interval: Duration,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PruneSchedule {
    /// Start running `task` every `interval`, beginning now.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidArgument` if `interval` is zero
    /// - `Error::IoError` if the runtime or thread cannot be created
    pub fn start<F>(interval: Duration, mut task: F) -> Result<Self>
    where
        F: FnMut() -> Result<usize> + Send + 'static,
    {
        check_interval(interval)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let mut ticker = tokio::time::interval(interval);
                    loop {
                        tokio::select! {
                            biased;
                            _ = &mut shutdown_rx => break,
                            _ = ticker.tick() => match task() {
                                Ok(0) => {}
                                Ok(count) => debug!("Scheduled prune removed {} entries", count),
                                Err(e) => warn!("Scheduled prune failed: {}", e),
                            },
                        }
                    }
                });
            })?;

        debug!("Prune schedule started (every {:?})", interval);
        Ok(PruneSchedule {
            interval,
            shutdown: Some(shutdown),
            handle: Some(handle),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// `true` while the task thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the task and wait for its thread to exit. Called from the task
    /// itself, it does not wait.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // The receiver is gone only if the thread already exited.
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                debug!("Prune schedule stopping from its own task");
                return;
            }
            if handle.join().is_err() {
                warn!("Prune schedule thread panicked");
            }
            debug!("Prune schedule stopped");
        }
    }
}

impl Drop for PruneSchedule {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

/// Reject intervals a periodic timer cannot run at.
pub(crate) fn check_interval(interval: Duration) -> Result<()> {
    if interval.is_zero() {
        return Err(Error::InvalidArgument(
            "prune interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_zero_interval_rejected() {
        let result = PruneSchedule::start(Duration::ZERO, || Ok(0));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_runs_immediately_and_repeats() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let schedule = PruneSchedule::start(Duration::from_millis(20), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        })
        .expect("Failed to start schedule");

        assert!(schedule.is_running());
        std::thread::sleep(Duration::from_millis(110));
        schedule.stop();

        assert!(ticks.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn test_no_ticks_after_stop() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let schedule = PruneSchedule::start(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        })
        .expect("Failed to start schedule");

        std::thread::sleep(Duration::from_millis(30));
        drop(schedule);
        let after_stop = ticks.load(Ordering::SeqCst);

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_task_can_stop_its_own_schedule() {
        let slot: Arc<Mutex<Option<PruneSchedule>>> = Arc::new(Mutex::new(None));
        let ticks = Arc::new(AtomicUsize::new(0));
        let (task_slot, counter) = (Arc::clone(&slot), Arc::clone(&ticks));
        let schedule = PruneSchedule::start(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let own = task_slot.lock().take();
            if let Some(own) = own {
                own.stop();
            }
            Ok(0)
        })
        .expect("Failed to start schedule");
        *slot.lock() = Some(schedule);

        std::thread::sleep(Duration::from_millis(60));
        assert!(slot.lock().is_none());
        let after_stop = ticks.load(Ordering::SeqCst);
        assert!(after_stop >= 1);

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_task_errors_do_not_stop_schedule() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let schedule = PruneSchedule::start(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::Unsupported("prune".to_string()))
        })
        .expect("Failed to start schedule");

        std::thread::sleep(Duration::from_millis(60));
        assert!(schedule.is_running());
        schedule.stop();
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }
}
