#![forbid(unsafe_code)]

//! Frame-aligned, single-flight throttle for scroll notifications.
//!
//! Scroll events arrive far more often than the display refreshes. The
//! [`FrameThrottle`] collapses every notification that arrives before the next
//! frame into one callback invocation:
//!
//! - a new notification cancels the pending frame request and schedules the
//!   next one (pending-handle + cancel-if-exists + schedule-next);
//! - the callback runs only for the handle that is currently pending, so it
//!   never runs twice for one frame and never for a superseded request;
//! - [`cancel`](FrameThrottle::cancel) drops the pending request, after which
//!   late frame deliveries are ignored.
//!
//! The callback can be swapped at any time with
//! [`set_callback`](FrameThrottle::set_callback) without touching the pending
//! request or the event subscription.
//!
//! # Thread Safety
//!
//! Not thread-safe; intended for the single UI thread.

use std::fmt;

use crate::host::{FrameHandle, Scheduler};

/// Callback invoked once per frame with the caller-provided context.
pub type FrameCallback<C, H> = Box<dyn FnMut(&mut C, &mut H)>;

/// Counters describing throttle activity since creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThrottleStats {
    /// Notifications received.
    pub notified: u64,
    /// Pending requests cancelled because a newer notification superseded them.
    pub superseded: u64,
    /// Callback invocations.
    pub fired: u64,
    /// Frame deliveries ignored because their handle was not pending.
    pub stale: u64,
}

/// Single-flight frame throttle.
pub struct FrameThrottle<C, H> {
    pending: Option<FrameHandle>,
    callback: FrameCallback<C, H>,
    stats: ThrottleStats,
}

impl<C, H> fmt::Debug for FrameThrottle<C, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameThrottle")
            .field("pending", &self.pending)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<C, H> FrameThrottle<C, H> {
    /// Create a throttle around `callback`.
    pub fn new(callback: impl FnMut(&mut C, &mut H) + 'static) -> Self {
        Self {
            pending: None,
            callback: Box::new(callback),
            stats: ThrottleStats::default(),
        }
    }

    /// Replace the callback. A pending request stays scheduled and will run
    /// the new callback.
    pub fn set_callback(&mut self, callback: impl FnMut(&mut C, &mut H) + 'static) {
        self.callback = Box::new(callback);
    }

    /// Register a notification: cancel any pending frame and request the next.
    pub fn notify(&mut self, scheduler: &mut dyn Scheduler) {
        self.stats.notified += 1;
        if let Some(previous) = self.pending.take() {
            scheduler.cancel_frame(previous);
            self.stats.superseded += 1;
        }
        self.pending = Some(scheduler.request_frame());
    }

    /// Deliver a frame. Runs the callback if `handle` is the pending request.
    ///
    /// Returns `true` if the callback ran.
    pub fn on_frame(&mut self, handle: FrameHandle, context: &mut C, host: &mut H) -> bool {
        if self.pending != Some(handle) {
            self.stats.stale += 1;
            tracing::trace!(
                target: "loopscroll.sampler",
                handle = handle.0,
                "ignoring stale frame"
            );
            return false;
        }
        self.pending = None;
        self.stats.fired += 1;
        (self.callback)(context, host);
        true
    }

    /// Cancel the pending request, if any.
    pub fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(pending) = self.pending.take() {
            scheduler.cancel_frame(pending);
        }
    }

    /// Handle of the pending request.
    #[must_use]
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> ThrottleStats {
        self.stats
    }
}
