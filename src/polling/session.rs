//! Poll session - shared state between one polling loop and its owner
//!
//! Every field is an independent atomic: the owner toggles `paused`, the
//! interval and the location filter at any time, and the loop picks the new
//! values up on its next tick.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use tokio::sync::Notify;
use tracing::debug;

use crate::types::LocationFilter;

/// Lifecycle of a session's polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, loop not started yet
    Idle,
    /// A loop instance owns the session
    Running,
    /// Loop exited after cancellation; never restarts
    Stopped,
}

impl SessionState {
    const IDLE: u8 = 0;
    const RUNNING: u8 = 1;
    const STOPPED: u8 = 2;

    fn from_u8(v: u8) -> Self {
        match v {
            Self::IDLE => SessionState::Idle,
            Self::RUNNING => SessionState::Running,
            _ => SessionState::Stopped,
        }
    }
}

/// Per-item polling state, shared as `Arc<PollSession>`
#[derive(Debug)]
pub struct PollSession {
    item: String,
    state: AtomicU8,
    cancelled: AtomicBool,
    paused: AtomicBool,
    interval_ms: AtomicU64,
    location_filter: AtomicU8,
    refresh_requested: AtomicBool,
    wake: Notify,
}

impl PollSession {
    pub fn new(
        item: impl Into<String>,
        interval_ms: u64,
        location_filter: LocationFilter,
    ) -> Self {
        Self {
            item: item.into(),
            state: AtomicU8::new(SessionState::IDLE),
            cancelled: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            interval_ms: AtomicU64::new(interval_ms),
            location_filter: AtomicU8::new(location_filter.bits()),
            refresh_requested: AtomicBool::new(false),
            wake: Notify::new(),
        }
    }

    /// Item unique name this session watches
    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True while a loop instance is running
    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Claim the session for a loop. Only the first caller on an idle
    /// session wins; running and stopped sessions are left untouched.
    pub(crate) fn try_begin(&self) -> bool {
        self.state
            .compare_exchange(
                SessionState::IDLE,
                SessionState::RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn finish(&self) {
        self.state.store(SessionState::STOPPED, Ordering::Release);
    }

    /// Request termination. The loop stops after finishing its current tick.
    ///
    /// A tick that is already past its fetch does not wait out the rest of
    /// the interval: the remainder wait ends as soon as the session is
    /// cancelled. A fetch in flight is never interrupted, and a cancel during
    /// the short delay still lets that tick fetch once.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            debug!(item = %self.item, "Poll session cancelled");
            self.wake.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Takes effect on the next tick
    pub fn set_interval_ms(&self, interval_ms: u64) {
        self.interval_ms.store(interval_ms, Ordering::Release);
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms.load(Ordering::Acquire)
    }

    /// Takes effect on the next fetch
    pub fn set_location_filter(&self, filter: LocationFilter) {
        self.location_filter.store(filter.bits(), Ordering::Release);
    }

    pub fn location_filter(&self) -> LocationFilter {
        LocationFilter::from_bits(self.location_filter.load(Ordering::Acquire))
    }

    /// Cut the current remainder-of-interval wait short so the next tick
    /// starts after its short delay. Never starts a fetch by itself.
    ///
    /// The request is consumed by the next fetch, so a request made while
    /// paused or before a tick's fetch is answered by that fetch alone.
    pub fn request_refresh(&self) {
        self.refresh_requested.store(true, Ordering::Release);
        self.wake.notify_waiters();
    }

    /// Clear a pending refresh request, returning whether one was pending
    pub(crate) fn take_refresh_request(&self) -> bool {
        self.refresh_requested.swap(false, Ordering::AcqRel)
    }

    /// Resolves once a refresh is pending or the session is cancelled
    pub(crate) async fn woken(&self) {
        loop {
            // Registered before the flags are read, so a notify_waiters()
            // racing with the checks below is not lost.
            let notified = self.wake.notified();
            if self.refresh_requested.load(Ordering::Acquire) || self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
