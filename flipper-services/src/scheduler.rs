//! Cancellable periodic tasks
//!
//! Each service owns one task, so a service's own runs never overlap.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTask {
    /// Run `job` after `initial_delay` and then every `period` until stopped
    ///
    /// A zero `initial_delay` fires the first run immediately. Ticks missed
    /// while a run is still in progress are skipped, not queued.
    pub fn spawn<F, Fut>(
        name: impl Into<String>,
        initial_delay: Duration,
        period: Duration,
        mut job: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!("[Scheduler] {} cancelled", task_name);
                        break;
                    }
                    _ = ticker.tick() => {
                        tokio::select! {
                            () = token.cancelled() => {
                                debug!("[Scheduler] {} cancelled mid-run", task_name);
                                break;
                            }
                            () = job() => {}
                        }
                    }
                }
            }
        });

        debug!(
            "[Scheduler] {} scheduled (delay {:?}, every {:?})",
            name, initial_delay, period
        );

        Self {
            name,
            cancel,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Signal the task to stop; a run in progress is dropped at its next await
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop the task and wait for it to exit
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("[Scheduler] {} exited abnormally: {}", self.name, e);
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(initial: Duration, period: Duration) -> (PeriodicTask, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let task = PeriodicTask::spawn("test", initial, period, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (task, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_immediately_then_on_interval() {
        let (task, runs) = counting_task(Duration::ZERO, Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        task.shutdown().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay() {
        let (task, runs) = counting_task(Duration::from_secs(15), Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(14)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        task.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_long_run() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&finished);
        let task = PeriodicTask::spawn("slow", Duration::ZERO, Duration::from_secs(60), move || {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        // Let the first run start
        tokio::time::sleep(Duration::from_millis(10)).await;

        let stopped = tokio::time::timeout(Duration::from_secs(1), task.shutdown()).await;
        assert!(stopped.is_ok(), "shutdown waited for the run to finish");
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
