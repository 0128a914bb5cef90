use futures::future::BoxFuture;
use std::time::Duration;
use tokio::task::JoinHandle;

/// State of a debounced writer
#[derive(Debug)]
pub enum WriterState {
    Idle,
    PendingWrite {
        epoch: u64,
        task: JoinHandle<()>,
    },
}

/// Restart-on-edit debounce
///
/// Every `schedule` aborts the pending task and arms a new one with a fresh
/// epoch. The armed task must call `fire(epoch)` while holding the session
/// lock and only commit when it returns true, so a timer that woke up just
/// as a newer edit re-armed the writer never writes stale data.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    epoch: u64,
    state: WriterState,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            epoch: 0,
            state: WriterState::Idle,
        }
    }

    /// Cancel any pending run and schedule `job` after the delay.
    /// `make_job` receives the epoch the job must present to `fire`.
    pub fn schedule<F>(&mut self, make_job: F)
    where
        F: FnOnce(u64) -> BoxFuture<'static, ()>,
    {
        self.cancel();
        self.epoch += 1;

        let epoch = self.epoch;
        let delay = self.delay;
        let job = make_job(epoch);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
        });

        self.state = WriterState::PendingWrite {
            epoch,
            task,
        };
    }

    pub fn cancel(&mut self) {
        if let WriterState::PendingWrite { task, .. } =
            std::mem::replace(&mut self.state, WriterState::Idle)
        {
            task.abort();
        }
    }

    /// Claim the pending run for `epoch`; false if it was canceled or superseded
    pub fn fire(&mut self, epoch: u64) -> bool {
        match &self.state {
            WriterState::PendingWrite { epoch: pending, .. } if *pending == epoch => {
                // Detach, the task is the one calling us
                self.state = WriterState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, WriterState::PendingWrite { .. })
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// One-second ticker for the recording clock
///
/// Same epoch discipline as `Debouncer`: a tick is only applied if
/// `is_current(epoch)` still holds under the session lock.
#[derive(Debug, Default)]
pub struct Ticker {
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start<F>(&mut self, period: Duration, mut on_tick: F)
    where
        F: FnMut(u64) -> BoxFuture<'static, bool> + Send + 'static,
    {
        self.stop();
        self.epoch += 1;

        let epoch = self.epoch;
        self.task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if !on_tick(epoch).await {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        self.epoch += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.task.is_some() && self.epoch == epoch
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_supersedes_pending_run() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let fired = Arc::new(AtomicU64::new(0));

        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            debouncer.schedule(move |epoch| {
                async move {
                    fired.store(epoch, Ordering::SeqCst);
                }
                .boxed()
            });
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(150)).await;

        // Only the last schedule ran
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert!(!debouncer.fire(2), "superseded epoch is rejected");
        assert!(debouncer.fire(3));
        assert!(!debouncer.fire(3), "a run is claimed once");
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_run() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let fired = Arc::new(AtomicU64::new(0));

        let job_fired = Arc::clone(&fired);
        debouncer.schedule(move |epoch| {
            async move {
                job_fired.store(epoch, Ordering::SeqCst);
            }
            .boxed()
        });
        debouncer.cancel();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!debouncer.fire(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stop_invalidates_epoch() {
        let mut ticker = Ticker::default();
        let ticks = Arc::new(AtomicU64::new(0));

        let last_epoch = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&ticks);
        let seen = Arc::clone(&last_epoch);
        ticker.start(Duration::from_secs(1), move |epoch| {
            counter.fetch_add(1, Ordering::SeqCst);
            seen.store(epoch, Ordering::SeqCst);
            async { true }.boxed()
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        let epoch = last_epoch.load(Ordering::SeqCst);
        assert!(ticker.is_current(epoch));

        ticker.stop();
        assert!(!ticker.is_current(epoch));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }
}
