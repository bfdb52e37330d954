//! Bounded notification queue with wall-clock expiry.
//!
//! Every toast counts down from its duration.  Hovering a toast pauses it:
//! the time left is frozen and restored on resume, so time spent paused never
//! counts.  The queue holds at most [`ToastQueue::capacity`] toasts; adding
//! one more evicts the oldest first.
//!
//! # Lifecycle
//!
//! ```text
//!   add ──► Active{deadline} ◄──► Paused{remaining}
//!               │                      │
//!               ├─ deadline reached ───┼──► Expired
//!               ├─ remove / clear_all ─┴──► Dismissed
//!               └─ queue full on add ─────► Evicted
//! ```
//!
//! The queue does not own a timer.  A driver asks for [`ToastQueue::next_deadline`],
//! sleeps until then, and calls [`ToastQueue::expire_due`].  Because expiry is
//! decided from the clock at the moment of the call, a wake-up that arrives
//! after the toast was already removed finds nothing to do.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of toasts visible at once unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 3;

/// Lifetime of a toast when the caller does not pass one.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(2000);

/// Undrained change notifications kept before the oldest are dropped.
pub const EVENT_LOG_LIMIT: usize = 256;

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Source of the current instant.
///
/// Injected so the queue can be driven by the real clock, by an async
/// runtime's clock, or by a manual clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { now: Mutex::new(Instant::now()) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ── Toast values ──────────────────────────────────────────────────────────────

/// Opaque toast identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToastId(Uuid);

impl ToastId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a toast is styled.  Also used as the `type` of server announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "success" => Ok(Severity::Success),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Countdown state of a live toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastState {
    Active { deadline: Instant },
    Paused { remaining: Duration },
}

/// Why a toast left the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Expired,
    Dismissed,
    Evicted,
}

/// Change notifications, drained with [`ToastQueue::take_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastEvent {
    Added(ToastId),
    Removed { id: ToastId, reason: RemovalReason },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
    pub state: ToastState,
}

impl Toast {
    pub fn is_paused(&self) -> bool {
        matches!(self.state, ToastState::Paused { .. })
    }

    fn remaining_at(&self, now: Instant) -> Duration {
        match self.state {
            ToastState::Active { deadline } => deadline.saturating_duration_since(now),
            ToastState::Paused { remaining } => remaining,
        }
    }
}

// ── ToastQueue ────────────────────────────────────────────────────────────────

/// Bounded, ordered set of live toasts.
///
/// Toasts are kept in creation order; index 0 is the oldest.
pub struct ToastQueue {
    toasts: Vec<Toast>,
    capacity: usize,
    default_duration: Duration,
    clock: Arc<dyn Clock>,
    events: VecDeque<ToastEvent>,
}

impl fmt::Debug for ToastQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastQueue")
            .field("toasts", &self.toasts)
            .field("capacity", &self.capacity)
            .field("default_duration", &self.default_duration)
            .finish_non_exhaustive()
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ToastQueue {
    /// Creates an empty queue with the default capacity and duration.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            toasts: Vec::with_capacity(DEFAULT_CAPACITY),
            capacity: DEFAULT_CAPACITY,
            default_duration: DEFAULT_DURATION,
            clock,
            events: VecDeque::new(),
        }
    }

    /// Sets the capacity.  Values below 1 are raised to 1.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Sets the duration used by [`add`](Self::add).
    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = clamp_duration(duration);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Live toasts, oldest first.
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }

    /// Adds a toast with the default duration.
    pub fn add(&mut self, message: impl Into<String>, severity: Severity) -> ToastId {
        self.add_with_duration(message, severity, self.default_duration)
    }

    /// Adds a toast that expires after `duration` (at least one millisecond).
    ///
    /// If the queue is full, the oldest toast is evicted first.
    pub fn add_with_duration(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        duration: Duration,
    ) -> ToastId {
        while self.toasts.len() >= self.capacity {
            let evicted = self.toasts.remove(0);
            self.record(ToastEvent::Removed {
                id: evicted.id,
                reason: RemovalReason::Evicted,
            });
        }

        let duration = clamp_duration(duration);
        let id = ToastId::new();
        self.toasts.push(Toast {
            id,
            message: message.into(),
            severity,
            duration,
            state: ToastState::Active { deadline: self.clock.now() + duration },
        });
        self.record(ToastEvent::Added(id));
        id
    }

    /// Dismisses a toast.  Returns `false` if it is already gone.
    pub fn remove(&mut self, id: ToastId) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.toasts.remove(idx);
                self.record(ToastEvent::Removed { id, reason: RemovalReason::Dismissed });
                true
            }
            None => false,
        }
    }

    /// Freezes the countdown of an active toast.
    ///
    /// Returns `false` if the toast is unknown or already paused.
    pub fn pause(&mut self, id: ToastId) -> bool {
        let now = self.clock.now();
        let Some(toast) = self.toasts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        match toast.state {
            ToastState::Active { deadline } => {
                toast.state = ToastState::Paused { remaining: deadline.saturating_duration_since(now) };
                true
            }
            ToastState::Paused { .. } => false,
        }
    }

    /// Restarts the countdown of a paused toast from where it stopped.
    ///
    /// Returns `false` if the toast is unknown or not paused.
    pub fn resume(&mut self, id: ToastId) -> bool {
        let now = self.clock.now();
        let Some(toast) = self.toasts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        match toast.state {
            ToastState::Paused { remaining } => {
                toast.state = ToastState::Active { deadline: now + remaining };
                true
            }
            ToastState::Active { .. } => false,
        }
    }

    /// Dismisses every toast, oldest first.  Returns the removed ids.
    pub fn clear_all(&mut self) -> Vec<ToastId> {
        let removed: Vec<ToastId> = self.toasts.drain(..).map(|t| t.id).collect();
        for id in &removed {
            self.record(ToastEvent::Removed { id: *id, reason: RemovalReason::Dismissed });
        }
        removed
    }

    /// Removes every active toast whose deadline has passed.
    ///
    /// Paused toasts never expire.  Returns the expired ids oldest first.
    pub fn expire_due(&mut self) -> Vec<ToastId> {
        let now = self.clock.now();
        let mut expired = Vec::new();
        self.toasts.retain(|toast| match toast.state {
            ToastState::Active { deadline } if deadline <= now => {
                expired.push(toast.id);
                false
            }
            _ => true,
        });
        for id in &expired {
            self.record(ToastEvent::Removed { id: *id, reason: RemovalReason::Expired });
        }
        expired
    }

    /// Time left before the toast expires, or `None` if it is gone.
    pub fn remaining(&self, id: ToastId) -> Option<Duration> {
        let now = self.clock.now();
        self.get(id).map(|t| t.remaining_at(now))
    }

    /// Fraction of the lifetime still left, from 1.0 (new) down to 0.0.
    pub fn progress(&self, id: ToastId) -> Option<f64> {
        let now = self.clock.now();
        self.get(id)
            .map(|t| t.remaining_at(now).as_secs_f64() / t.duration.as_secs_f64())
    }

    /// Earliest deadline among active toasts.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.toasts
            .iter()
            .filter_map(|t| match t.state {
                ToastState::Active { deadline } => Some(deadline),
                ToastState::Paused { .. } => None,
            })
            .min()
    }

    /// Drains the change log accumulated since the last call.
    ///
    /// Only the newest [`EVENT_LOG_LIMIT`] entries are kept between drains.
    pub fn take_events(&mut self) -> Vec<ToastEvent> {
        self.events.drain(..).collect()
    }

    fn record(&mut self, event: ToastEvent) {
        if self.events.len() >= EVENT_LOG_LIMIT {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn position(&self, id: ToastId) -> Option<usize> {
        self.toasts.iter().position(|t| t.id == id)
    }
}

fn clamp_duration(duration: Duration) -> Duration {
    duration.max(Duration::from_millis(1))
}
