#![forbid(unsafe_code)]

//! Host traits: the boundary between the engine and the embedding page.
//!
//! The engine never owns the scroll or resize event sources. The host pushes
//! notifications into [`ScrollSession`](crate::ScrollSession) and in return
//! provides layout measurement, scroll mutation, and scheduling primitives.
//!
//! Scheduling is handle based. A host hands out a [`FrameHandle`] or
//! [`TimerHandle`] when work is scheduled and later reports the same handle
//! back through `on_frame` / `on_timeout`. Handles that were cancelled or
//! superseded in the meantime are ignored by the engine, so hosts do not need
//! perfect cancellation.

use web_time::Duration;

use crate::geometry::ElementRect;

/// Opaque id of a scheduled animation-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Opaque id of a scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Layout reads and scroll writes on the single scrollable viewport.
pub trait Viewport {
    /// Current vertical scroll offset of the document.
    fn scroll_offset(&self) -> f64;

    /// Current viewport height.
    fn viewport_height(&self) -> f64;

    /// Viewport-relative rectangle of the element with the given id.
    ///
    /// Returns `None` when the element is not (yet) rendered.
    fn measure(&self, id: &str) -> Option<ElementRect>;

    /// Instantaneous, non-animated scroll.
    fn jump_to(&mut self, offset: f64);

    /// Animated scroll. The host decides the easing and duration.
    fn smooth_scroll_to(&mut self, offset: f64);
}

/// Frame-aligned and delayed callback scheduling.
pub trait Scheduler {
    /// Schedule a callback for the next display frame.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a previously requested frame. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Schedule a one-shot callback after `delay`.
    fn set_timeout(&mut self, delay: Duration) -> TimerHandle;

    /// Cancel a previously scheduled timer. Unknown handles are ignored.
    fn clear_timeout(&mut self, handle: TimerHandle);
}

/// Everything a [`ScrollSession`](crate::ScrollSession) needs from its page.
pub trait Host: Viewport + Scheduler {}

impl<T: Viewport + Scheduler> Host for T {}
