#![forbid(unsafe_code)]

//! In-memory page that implements the engine's host traits.
//!
//! Scrolling, frame requests and timers are all queued; nothing happens until
//! the driver advances the [`DeterministicClock`]. Smooth scrolls animate over
//! a fixed duration with an ease-in-out curve.

use std::collections::VecDeque;

use loopscroll_core::{ElementRect, FrameHandle, Scheduler, TimerHandle, Viewport};
use web_time::Duration;

use crate::DeterministicClock;
use crate::layout::PageLayout;

/// Default duration of a smooth scroll animation.
pub const DEFAULT_SMOOTH_SCROLL: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    from: f64,
    to: f64,
    start: Duration,
    duration: Duration,
}

impl Animation {
    fn position_at(&self, now: Duration) -> (f64, bool) {
        if self.duration.is_zero() {
            return (self.to, true);
        }
        let elapsed = now.saturating_sub(self.start).as_secs_f64();
        let t = (elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0);
        let eased = if t < 0.5 {
            4.0 * t * t * t
        } else {
            1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
        };
        (self.from + (self.to - self.from) * eased, t >= 1.0)
    }
}

/// A pending one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    /// Handle returned to the engine.
    pub handle: TimerHandle,
    /// Clock time at which the timer is due.
    pub due: Duration,
}

/// How the last change of scroll offset happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollCause {
    /// The reader scrolled.
    User,
    /// Instant jump requested by the engine.
    Jump,
    /// Frame of a smooth scroll animation.
    Smooth,
}

/// Simulated browser page.
#[derive(Debug, Clone)]
pub struct SimulatedPage {
    layout: PageLayout,
    clock: DeterministicClock,
    offset: f64,
    next_handle: u64,
    frames: VecDeque<FrameHandle>,
    timers: Vec<PendingTimer>,
    animation: Option<Animation>,
    smooth_duration: Duration,
    scroll_pending: bool,
    history: Vec<(ScrollCause, f64)>,
}

impl SimulatedPage {
    /// Page at offset 0.
    #[must_use]
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            clock: DeterministicClock::new(),
            offset: 0.0,
            next_handle: 0,
            frames: VecDeque::new(),
            timers: Vec::new(),
            animation: None,
            smooth_duration: DEFAULT_SMOOTH_SCROLL,
            scroll_pending: false,
            history: Vec::new(),
        }
    }

    /// Override the smooth-scroll duration.
    #[must_use]
    pub fn with_smooth_duration(mut self, duration: Duration) -> Self {
        self.smooth_duration = duration;
        self
    }

    fn next_id(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn set_offset(&mut self, offset: f64, cause: ScrollCause) {
        let clamped = offset.clamp(0.0, self.layout.max_scroll());
        if clamped != self.offset {
            self.scroll_pending = true;
        }
        self.offset = clamped;
        self.history.push((cause, clamped));
    }

    /// Reader-initiated scroll. Interrupts a running smooth scroll.
    pub fn user_scroll_to(&mut self, offset: f64) {
        self.animation = None;
        self.set_offset(offset, ScrollCause::User);
    }

    /// Step the smooth-scroll animation to the current clock time.
    pub fn step_animation(&mut self) {
        let Some(animation) = self.animation else {
            return;
        };
        let (position, done) = animation.position_at(self.clock.now());
        self.set_offset(position, ScrollCause::Smooth);
        if done {
            self.animation = None;
        }
    }

    /// Whether the offset changed since the last [`take_scroll_event`](Self::take_scroll_event).
    pub fn take_scroll_event(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }

    /// Pop every queued frame request.
    pub fn take_frames(&mut self) -> Vec<FrameHandle> {
        self.frames.drain(..).collect()
    }

    /// Remove and return the earliest timer due at or before now.
    pub fn pop_due_timer(&mut self) -> Option<TimerHandle> {
        let now = self.clock.now();
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.handle))
            .map(|(i, _)| i)?;
        Some(self.timers.remove(index).handle)
    }

    /// Mutable layout access (hide blocks, resize).
    pub fn layout_mut(&mut self) -> &mut PageLayout {
        &mut self.layout
    }

    /// The layout.
    #[must_use]
    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// The clock.
    #[must_use]
    pub fn clock(&self) -> &DeterministicClock {
        &self.clock
    }

    /// Mutable clock access.
    pub fn clock_mut(&mut self) -> &mut DeterministicClock {
        &mut self.clock
    }

    /// Frame requests not yet delivered.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Timers not yet fired.
    #[must_use]
    pub fn pending_timers(&self) -> &[PendingTimer] {
        &self.timers
    }

    /// Whether a smooth scroll is running.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Every offset change with its cause.
    #[must_use]
    pub fn history(&self) -> &[(ScrollCause, f64)] {
        &self.history
    }

    /// Offsets the engine jumped to.
    #[must_use]
    pub fn jumps(&self) -> Vec<f64> {
        self.history
            .iter()
            .filter(|(cause, _)| *cause == ScrollCause::Jump)
            .map(|(_, offset)| *offset)
            .collect()
    }

    /// Clamp the offset after a re-flow, as a browser does.
    pub fn clamp_offset(&mut self) {
        let max = self.layout.max_scroll();
        if self.offset > max {
            self.offset = max;
            self.scroll_pending = true;
        }
    }
}

impl Viewport for SimulatedPage {
    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn viewport_height(&self) -> f64 {
        self.layout.viewport_height()
    }

    fn measure(&self, id: &str) -> Option<ElementRect> {
        self.layout
            .extent_of(id)
            .map(|rect| ElementRect::new(rect.top - self.offset, rect.height))
    }

    fn jump_to(&mut self, offset: f64) {
        self.animation = None;
        self.set_offset(offset, ScrollCause::Jump);
    }

    fn smooth_scroll_to(&mut self, offset: f64) {
        let to = offset.clamp(0.0, self.layout.max_scroll());
        self.animation = Some(Animation {
            from: self.offset,
            to,
            start: self.clock.now(),
            duration: self.smooth_duration,
        });
    }
}

impl Scheduler for SimulatedPage {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.frames.push_back(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|h| *h != handle);
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id());
        self.timers.push(PendingTimer {
            handle,
            due: self.clock.now().saturating_add(delay),
        });
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        self.timers.retain(|t| t.handle != handle);
    }
}
