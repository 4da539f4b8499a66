//! Trailing-edge debouncing of an async action.

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

type Action = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
struct Pending {
    // Bumped on every trigger; a timer only fires if it's still the latest.
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Runs an action once a burst of triggers has settled.
///
/// Every [`trigger`](Self::trigger) cancels the pending timer (if any) and
/// starts a new one; the action only runs when a full delay passes without
/// another trigger. At most one timer is pending at any time.
///
/// Triggers may come from any thread. Timers are spawned on the runtime the
/// debouncer was created with.
pub struct Debouncer {
    delay: Duration,
    runtime: Handle,
    action: Action,
    pending: Arc<Mutex<Pending>>,
}
impl Debouncer {
    pub fn new<F, Fut>(runtime: Handle, delay: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            runtime,
            action: Arc::new(move || action().boxed()),
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)starts the timer.
    pub fn trigger(&self) {
        let mut pending = self.pending.lock();
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
        pending.generation = pending.generation.wrapping_add(1);
        let generation = pending.generation;
        let delay = self.delay;
        let action = Arc::clone(&self.action);
        let slot = Arc::clone(&self.pending);
        pending.timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut pending = slot.lock();
                if pending.generation != generation {
                    return;
                }
                // From here on the action is running, not pending: a new
                // trigger starts a fresh timer instead of aborting it.
                pending.timer = None;
            }
            action().await;
        }));
        tracing::debug!(generation, delay_ms = delay.as_millis() as u64, "Scheduled debounced action");
    }

    /// Cancels the pending timer, if any. An action that already started is
    /// left to finish.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock();
        pending.generation = pending.generation.wrapping_add(1);
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().timer.is_some()
    }
}
impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
