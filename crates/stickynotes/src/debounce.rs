//! Trailing-edge debounce for editor saves.
//!
//! Each keystroke reschedules the save; only the last one inside the quiet
//! period runs. A save that has already started is left to finish.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

#[derive(Debug)]
struct Pending {
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

/// Runs the most recently scheduled task once `delay` passes without a newer one.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// The quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task`, replacing any task that has not started yet.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let delay = self.delay;
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            flag.store(true, Ordering::SeqCst);
            task.await;
        });

        self.pending = Some(Pending { handle, fired });
    }

    /// Drop the scheduled task if it has not started. Returns whether one was dropped.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) if !pending.fired.load(Ordering::SeqCst) => {
                pending.handle.abort();
                trace!("Debounced task cancelled");
                true
            }
            _ => false,
        }
    }

    /// Whether a task is waiting out its delay.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.fired.load(Ordering::SeqCst))
    }

    /// Wait for the scheduled task, if any, to run to completion.
    pub async fn wait(&mut self) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.handle.await;
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
