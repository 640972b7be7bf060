// Debounce scheduler - coalesces rapid calls into one delayed task.
//
// Purely decides *when* work runs, never what it returns: the scheduled
// future carries no result and no error channel. The newest call always
// wins; dropping the scheduler cancels any pending timer so it can never
// fire after teardown.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct DebounceScheduler {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebounceScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Run `task` after the quiet interval, cancelling any pending timer
    /// from a prior call.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let mut slot = self.pending.lock().unwrap();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Cancel any pending timer outright.
    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().unwrap().take() {
            previous.abort();
        }
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn newest_call_wins() {
        let scheduler = DebounceScheduler::new(Duration::from_millis(100));
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        scheduler.schedule(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(30)).await;

        let counter = Arc::clone(&fired);
        scheduler.schedule(async move {
            counter.fetch_add(10, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_pending_timer() {
        let scheduler = DebounceScheduler::new(Duration::from_millis(100));
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        scheduler.schedule(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        scheduler.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_never_fires_after_teardown() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let scheduler = DebounceScheduler::new(Duration::from_millis(100));
            let counter = Arc::clone(&fired);
            scheduler.schedule(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
