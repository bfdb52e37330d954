//! Toast service: a [`ToastQueue`] with a timer attached.
//!
//! The queue itself is passive; it only knows deadlines.  This service owns
//! one background task that sleeps until the earliest deadline and then calls
//! [`ToastQueue::expire_due`].  Every mutation wakes the task so it can
//! recompute what to sleep for.
//!
//! A wake with nothing due does nothing, so a timer that was armed for a
//! toast that has since been dismissed can never remove anything twice.
//! After [`ToastService::shutdown`] (or drop) the task is gone and no more
//! events are published.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use big2_core::domain::toast::{Clock, Severity, Toast, ToastEvent, ToastId, ToastQueue};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

use crate::application::ports::Notifier;

/// [`Clock`] that follows tokio's clock, so paused-time tests drive expiry.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        time::Instant::now().into_std()
    }
}

struct Shared {
    queue: Mutex<ToastQueue>,
    wake: Notify,
    events_tx: broadcast::Sender<ToastEvent>,
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, ToastQueue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` on the queue, publishes what changed and wakes the driver.
    fn mutate<R>(&self, f: impl FnOnce(&mut ToastQueue) -> R) -> R {
        let (result, events) = {
            let mut queue = self.queue();
            let result = f(&mut queue);
            (result, queue.take_events())
        };
        self.publish(events);
        self.wake.notify_one();
        result
    }

    fn publish(&self, events: Vec<ToastEvent>) {
        for event in events {
            let _ = self.events_tx.send(event);
        }
    }
}

/// Process-wide notification queue.
pub struct ToastService {
    shared: Arc<Shared>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl ToastService {
    /// Creates the service and starts its timer task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(capacity: usize, default_duration: Duration) -> Self {
        let queue = ToastQueue::new(Arc::new(TokioClock))
            .with_capacity(capacity)
            .with_default_duration(default_duration);
        let (events_tx, _) = broadcast::channel(64);
        let shared = Arc::new(Shared { queue: Mutex::new(queue), wake: Notify::new(), events_tx });
        let driver = tokio::spawn(drive(Arc::clone(&shared)));
        Self { shared, driver: Mutex::new(Some(driver)) }
    }

    pub fn add(&self, message: impl Into<String>, severity: Severity) -> ToastId {
        self.shared.mutate(|q| q.add(message, severity))
    }

    pub fn add_with_duration(&self, message: impl Into<String>, severity: Severity, duration: Duration) -> ToastId {
        self.shared.mutate(|q| q.add_with_duration(message, severity, duration))
    }

    pub fn remove(&self, id: ToastId) -> bool {
        self.shared.mutate(|q| q.remove(id))
    }

    /// Freezes a toast's countdown, e.g. while it is hovered.
    pub fn pause(&self, id: ToastId) -> bool {
        self.shared.mutate(|q| q.pause(id))
    }

    pub fn resume(&self, id: ToastId) -> bool {
        self.shared.mutate(|q| q.resume(id))
    }

    pub fn clear_all(&self) -> Vec<ToastId> {
        self.shared.mutate(|q| q.clear_all())
    }

    /// Live toasts, oldest first.
    pub fn toasts(&self) -> Vec<Toast> {
        self.shared.queue().toasts().to_vec()
    }

    pub fn remaining(&self, id: ToastId) -> Option<Duration> {
        self.shared.queue().remaining(id)
    }

    pub fn progress(&self, id: ToastId) -> Option<f64> {
        self.shared.queue().progress(id)
    }

    pub fn len(&self) -> usize {
        self.shared.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.queue().is_empty()
    }

    /// Added/removed notifications from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.shared.events_tx.subscribe()
    }

    /// Dismisses everything and stops the timer task.
    pub fn shutdown(&self) {
        self.clear_all();
        if let Some(driver) = self.driver.lock().unwrap_or_else(|e| e.into_inner()).take() {
            driver.abort();
            debug!("toast driver stopped");
        }
    }
}

impl Drop for ToastService {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.lock().unwrap_or_else(|e| e.into_inner()).take() {
            driver.abort();
        }
    }
}

impl Notifier for ToastService {
    fn notify(&self, message: &str, severity: Severity, duration: Option<Duration>) {
        match duration {
            Some(duration) => self.add_with_duration(message, severity, duration),
            None => self.add(message, severity),
        };
    }
}

async fn drive(shared: Arc<Shared>) {
    loop {
        let deadline = shared.queue().next_deadline();
        match deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = shared.wake.notified() => {}
                    _ = time::sleep_until(time::Instant::from_std(deadline)) => {
                        let events = {
                            let mut queue = shared.queue();
                            let expired = queue.expire_due();
                            if !expired.is_empty() {
                                debug!(count = expired.len(), "toasts expired");
                            }
                            queue.take_events()
                        };
                        shared.publish(events);
                    }
                }
            }
            None => shared.wake.notified().await,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
