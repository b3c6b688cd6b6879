#![forbid(unsafe_code)]

//! Frame-stepped driver for a session on a [`SimulatedPage`].
//!
//! One tick models one display frame, in browser order:
//!
//! 1. advance the clock
//! 2. fire due timers
//! 3. step a running smooth scroll
//! 4. dispatch a scroll event if the offset changed
//! 5. run animation-frame callbacks

use loopscroll_core::{LoopConfig, NavigateError, ScrollSession, ScrollSnapshot, Viewport};
use web_time::Duration;

use crate::HostError;
use crate::layout::{BlockHeight, PageLayout};
use crate::page::SimulatedPage;

/// Duration of one simulated display frame.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Upper bound on ticks spent in [`Simulation::settle`].
const SETTLE_LIMIT: usize = 1_000;

/// A mounted session plus its page.
#[derive(Debug)]
pub struct Simulation {
    session: ScrollSession<SimulatedPage>,
}

impl Simulation {
    /// Mount `config` on `page` and run the first frame.
    pub fn new(page: SimulatedPage, config: LoopConfig) -> Result<Self, HostError> {
        let mut session = ScrollSession::new(page, config)?;
        session.mount();
        let mut sim = Self { session };
        sim.tick();
        Ok(sim)
    }

    /// The default portfolio page: six full-viewport sections.
    pub fn portfolio(viewport_height: f64) -> Result<Self, HostError> {
        let config = LoopConfig::default();
        let layout = PageLayout::looping(config.sections.as_slice(), BlockHeight::Viewports(1.0), viewport_height)?;
        Self::new(SimulatedPage::new(layout), config)
    }

    /// Run one frame of [`FRAME_INTERVAL`].
    pub fn tick(&mut self) -> usize {
        self.tick_by(FRAME_INTERVAL)
    }

    /// Run one frame of length `dt`. Returns the number of samples taken.
    pub fn tick_by(&mut self, dt: Duration) -> usize {
        self.session.host_mut().clock_mut().advance(dt);

        while let Some(timer) = self.session.host_mut().pop_due_timer() {
            self.session.on_timeout(timer);
        }

        self.session.host_mut().step_animation();
        if self.session.host_mut().take_scroll_event() {
            self.session.on_scroll();
        }

        let frames = self.session.host_mut().take_frames();
        let sampled = frames
            .into_iter()
            .filter(|frame| self.session.on_frame(*frame))
            .count();

        tracing::trace!(
            target: "loopscroll.sim",
            now_ms = self.now().as_millis() as u64,
            offset = self.offset(),
            sampled,
            "tick"
        );
        sampled
    }

    /// Run frames until `dt` has elapsed.
    pub fn advance(&mut self, dt: Duration) {
        let mut remaining = dt;
        while !remaining.is_zero() {
            let step = remaining.min(FRAME_INTERVAL);
            self.tick_by(step);
            remaining -= step;
        }
    }

    /// Run frames until no timer, animation or frame is pending.
    ///
    /// Returns the number of ticks run.
    pub fn settle(&mut self) -> usize {
        for ticks in 0..SETTLE_LIMIT {
            let page = self.session.host();
            if page.pending_timers().is_empty() && !page.is_animating() && page.pending_frames() == 0 {
                return ticks;
            }
            self.tick();
        }
        tracing::warn!(target: "loopscroll.sim", limit = SETTLE_LIMIT, "page did not settle");
        SETTLE_LIMIT
    }

    /// The reader scrolls to `offset`; one frame runs.
    pub fn scroll_to(&mut self, offset: f64) {
        self.session.host_mut().user_scroll_to(offset);
        self.tick();
    }

    /// The reader scrolls by `delta`; one frame runs.
    pub fn scroll_by(&mut self, delta: f64) {
        let offset = self.offset() + delta;
        self.scroll_to(offset);
    }

    /// Place the viewport midpoint at `midpoint`; one frame runs.
    pub fn scroll_midpoint_to(&mut self, midpoint: f64) {
        let half = self.session.host().viewport_height() / 2.0;
        self.scroll_to(midpoint - half);
    }

    /// Resize the viewport; one frame runs.
    pub fn resize(&mut self, viewport_height: f64) -> Result<(), HostError> {
        let page = self.session.host_mut();
        page.layout_mut().set_viewport_height(viewport_height)?;
        page.clamp_offset();
        self.session.on_resize();
        self.tick();
        Ok(())
    }

    /// Navigation click; the animation runs on subsequent ticks.
    pub fn navigate(&mut self, id: &str) -> Result<(), NavigateError> {
        self.session.navigate_to_section(id)
    }

    /// Tear the session down.
    pub fn teardown(&mut self) {
        self.session.teardown();
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ScrollSnapshot {
        self.session.snapshot()
    }

    /// Current scroll offset.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.session.host().scroll_offset()
    }

    /// Current clock time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.session.host().clock().now()
    }

    /// Document top of a rendered block.
    #[must_use]
    pub fn top_of(&self, id: &str) -> Option<f64> {
        self.session.host().layout().top_of(id)
    }

    /// The session.
    #[must_use]
    pub fn session(&self) -> &ScrollSession<SimulatedPage> {
        &self.session
    }

    /// Mutable session access.
    pub fn session_mut(&mut self) -> &mut ScrollSession<SimulatedPage> {
        &mut self.session
    }

    /// The page.
    #[must_use]
    pub fn page(&self) -> &SimulatedPage {
        self.session.host()
    }

    /// Mutable page access.
    pub fn page_mut(&mut self) -> &mut SimulatedPage {
        self.session.host_mut()
    }
}
