#![forbid(unsafe_code)]

//! The page session: wires the position cache, frame throttle, section
//! locator and loop engine to a [`Host`].
//!
//! # Event flow
//!
//! ```text
//! mount ──► recompute cache ──► (retry timer while buffers missing)
//! scroll ─► throttle.notify ──► request_frame
//! frame ──► sample: observe offset ─► guard? drop
//!                   locate section ─► loop decision ─► jump / clamp
//! resize ─► recompute cache ──► throttle.notify
//! timer ──► release guard | retry layout
//! ```
//!
//! # Invariants
//!
//! 1. Within one sample the locator runs before the loop engine, and a jump
//!    is applied (and the location refreshed) before the sample returns.
//! 2. While the programmatic-scroll guard is held, samples only record the
//!    offset; no location update, no jump, no clamp. Dropped samples are not
//!    retried.
//! 3. At most one guard-release timer exists; re-arming replaces it.
//! 4. After [`teardown`](ScrollSession::teardown) no host callback mutates
//!    state.

use std::fmt;

use crate::cache::PositionCache;
use crate::config::{ConfigError, LoopConfig};
use crate::host::{FrameHandle, Host, TimerHandle};
use crate::locator::{ProgressIndicator, locate};
use crate::loop_engine::{LoopAction, LoopEngine, LoopInput};
use crate::nav::NavigationModel;
use crate::state::{Direction, ScrollSnapshot, ScrollState};
use crate::throttle::{FrameThrottle, ThrottleStats};

/// Listener notified whenever the snapshot changes.
pub type SnapshotListener = Box<dyn FnMut(&ScrollSnapshot)>;

/// Errors from [`ScrollSession::navigate_to_section`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateError {
    /// No section with this id is configured.
    UnknownSection(String),
    /// The section is configured but the host cannot measure it.
    NotRendered(String),
    /// The session has been torn down.
    TornDown,
}

impl fmt::Display for NavigateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSection(id) => write!(f, "unknown section: {id}"),
            Self::NotRendered(id) => write!(f, "section not rendered: {id}"),
            Self::TornDown => f.write_str("session torn down"),
        }
    }
}

impl std::error::Error for NavigateError {}

/// Counters describing session activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Samples that ran the locator.
    pub samples: u64,
    /// Samples dropped because the guard was held.
    pub guarded_samples: u64,
    /// Samples whose loop logic was skipped because buffers were not measured.
    pub loop_not_ready: u64,
    /// Forward (bottom-to-top) jumps.
    pub forward_jumps: u64,
    /// Backward (top-to-bottom) jumps.
    pub backward_jumps: u64,
    /// Origin clamps.
    pub clamps: u64,
    /// Accepted navigations.
    pub navigations: u64,
    /// Layout re-measurements scheduled after mount.
    pub layout_retries: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRetry {
    handle: TimerHandle,
    attempt: u32,
}

struct SessionCore {
    config: LoopConfig,
    cache: PositionCache,
    engine: LoopEngine,
    state: ScrollState,
    guard_timer: Option<TimerHandle>,
    retry: Option<PendingRetry>,
    revision: u64,
    listener: Option<SnapshotListener>,
    stats: SessionStats,
    torn_down: bool,
}

impl SessionCore {
    fn new(config: LoopConfig) -> Self {
        Self {
            cache: PositionCache::new(config.sections.iter().cloned()),
            engine: LoopEngine::new(config.down_band, config.up_band),
            state: ScrollState::default(),
            guard_timer: None,
            retry: None,
            revision: 0,
            listener: None,
            stats: SessionStats::default(),
            torn_down: false,
            config,
        }
    }

    fn sample<H: Host>(&mut self, host: &mut H) {
        let offset = host.scroll_offset();
        let direction = self.state.observe_offset(offset);
        if self.state.is_programmatic_scroll {
            self.stats.guarded_samples += 1;
            tracing::trace!(
                target: "loopscroll.sampler",
                offset,
                "sample dropped while programmatic scroll in flight"
            );
            return;
        }
        self.stats.samples += 1;

        let before = self.state.snapshot();
        let half_viewport = host.viewport_height() / 2.0;
        let midpoint = offset + half_viewport;
        self.relocate(midpoint);

        if let Some(landed) = self.run_loop(host, direction, offset, midpoint) {
            self.relocate(landed + half_viewport);
        }
        self.commit(before);
    }

    fn relocate(&mut self, midpoint: f64) {
        let location = locate(self.cache.sections(), midpoint, self.config.gap_thresholds);
        self.state.apply_location(location);
    }

    /// Returns the new scroll offset if the viewport was moved.
    fn run_loop<H: Host>(
        &mut self,
        host: &mut H,
        direction: Direction,
        offset: f64,
        midpoint: f64,
    ) -> Option<f64> {
        if !self.cache.buffers_ready() {
            self.cache.recompute(&*host);
            if !self.cache.buffers_ready() {
                self.stats.loop_not_ready += 1;
                tracing::debug!(
                    target: "loopscroll.loop",
                    offset,
                    "loop skipped: buffer zones not measured"
                );
                return None;
            }
        }

        let input = LoopInput {
            direction,
            scroll_offset: offset,
            midpoint,
            loop_count: self.state.loop_count,
        };
        match self.engine.decide(&self.cache, input) {
            LoopAction::Idle => None,
            LoopAction::Forward { target, progress } => {
                self.state.is_programmatic_scroll = true;
                self.state.increment_loops();
                self.stats.forward_jumps += 1;
                tracing::debug!(
                    target: "loopscroll.loop",
                    from = offset,
                    to = target,
                    progress,
                    loop_count = self.state.loop_count,
                    "forward loop jump"
                );
                Some(self.jump(host, target, true))
            }
            LoopAction::Backward { target, progress } => {
                self.state.is_programmatic_scroll = true;
                self.state.decrement_loops();
                self.stats.backward_jumps += 1;
                tracing::debug!(
                    target: "loopscroll.loop",
                    from = offset,
                    to = target,
                    progress,
                    loop_count = self.state.loop_count,
                    "backward loop jump"
                );
                Some(self.jump(host, target, true))
            }
            LoopAction::Clamp { target } => {
                self.stats.clamps += 1;
                tracing::debug!(
                    target: "loopscroll.loop",
                    from = offset,
                    to = target,
                    "clamped at origin"
                );
                Some(self.jump(host, target, false))
            }
        }
    }

    fn jump<H: Host>(&mut self, host: &mut H, target: f64, guarded: bool) -> f64 {
        host.jump_to(target);
        self.state.last_scroll_offset = target;
        if guarded {
            let delay = self.config.jump_guard();
            self.arm_guard(host, delay);
        }
        target
    }

    fn arm_guard<H: Host>(&mut self, host: &mut H, delay: web_time::Duration) {
        self.state.is_programmatic_scroll = true;
        if let Some(previous) = self.guard_timer.take() {
            host.clear_timeout(previous);
        }
        self.guard_timer = Some(host.set_timeout(delay));
    }

    fn schedule_retry<H: Host>(&mut self, host: &mut H, attempt: u32) {
        let policy = self.config.layout_retry;
        if !policy.allows(attempt) {
            self.retry = None;
            tracing::warn!(
                target: "loopscroll.cache",
                attempts = attempt,
                "buffer zones still unmeasured; looping stays off until buffers are measured"
            );
            return;
        }
        let delay = policy.delay(attempt);
        self.stats.layout_retries += 1;
        tracing::debug!(
            target: "loopscroll.cache",
            attempt,
            delay_ms = delay.as_millis() as u64,
            "scheduling layout re-measure"
        );
        self.retry = Some(PendingRetry {
            handle: host.set_timeout(delay),
            attempt,
        });
    }

    fn cancel_retry<H: Host>(&mut self, host: &mut H) {
        if let Some(retry) = self.retry.take() {
            host.clear_timeout(retry.handle);
        }
    }

    fn commit(&mut self, before: ScrollSnapshot) {
        let after = self.state.snapshot();
        if after == before {
            return;
        }
        self.revision = self.revision.wrapping_add(1);
        tracing::trace!(
            target: "loopscroll.locator",
            active = after.active_section_index,
            indicator = after.progress_indicator.value(),
            loop_count = after.loop_count,
            revision = self.revision,
            "snapshot changed"
        );
        if let Some(listener) = self.listener.as_mut() {
            listener(&after);
        }
    }
}

/// One scroll-state machine bound to one page.
pub struct ScrollSession<H: Host + 'static> {
    host: H,
    core: SessionCore,
    throttle: FrameThrottle<SessionCore, H>,
}

impl<H: Host + 'static> fmt::Debug for ScrollSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollSession")
            .field("state", &self.core.state)
            .field("revision", &self.core.revision)
            .field("throttle", &self.throttle)
            .field("torn_down", &self.core.torn_down)
            .finish_non_exhaustive()
    }
}

impl<H: Host + 'static> ScrollSession<H> {
    /// Create a session. Nothing is measured until [`mount`](Self::mount).
    pub fn new(host: H, config: LoopConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        Ok(Self {
            host,
            core: SessionCore::new(config),
            throttle: FrameThrottle::new(|core: &mut SessionCore, host: &mut H| core.sample(host)),
        })
    }

    /// Measure the page once layout has settled and take the first sample.
    ///
    /// If a buffer zone is missing or has no height yet, re-measurement is
    /// retried on the configured bounded schedule.
    pub fn mount(&mut self) {
        if self.core.torn_down {
            return;
        }
        self.core.cache.recompute(&self.host);
        self.core.cancel_retry(&mut self.host);
        if !self.core.cache.buffers_ready() {
            self.core.schedule_retry(&mut self.host, 0);
        }
        tracing::debug!(
            target: "loopscroll.session",
            sections = self.core.cache.len(),
            buffers_ready = self.core.cache.buffers_ready(),
            "session mounted"
        );
        self.throttle.notify(&mut self.host);
    }

    /// Scroll notification from the host.
    pub fn on_scroll(&mut self) {
        if self.core.torn_down {
            return;
        }
        self.throttle.notify(&mut self.host);
    }

    /// Viewport resize notification from the host.
    pub fn on_resize(&mut self) {
        if self.core.torn_down {
            return;
        }
        self.core.cache.recompute(&self.host);
        if self.core.cache.buffers_ready() {
            self.core.cancel_retry(&mut self.host);
        }
        self.throttle.notify(&mut self.host);
    }

    /// Frame delivery from the host. Returns `true` if a sample ran.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        if self.core.torn_down {
            return false;
        }
        self.throttle.on_frame(handle, &mut self.core, &mut self.host)
    }

    /// Timer delivery from the host. Returns `true` if the timer was live.
    pub fn on_timeout(&mut self, handle: TimerHandle) -> bool {
        let core = &mut self.core;
        if core.torn_down {
            return false;
        }
        if core.guard_timer == Some(handle) {
            core.guard_timer = None;
            core.state.is_programmatic_scroll = false;
            tracing::trace!(target: "loopscroll.session", "programmatic scroll guard released");
            return true;
        }
        if let Some(retry) = core.retry.filter(|r| r.handle == handle) {
            core.retry = None;
            core.cache.recompute(&self.host);
            if core.cache.buffers_ready() {
                tracing::debug!(
                    target: "loopscroll.cache",
                    attempt = retry.attempt,
                    "buffer zones measured after retry"
                );
            } else {
                core.schedule_retry(&mut self.host, retry.attempt + 1);
            }
            return true;
        }
        tracing::trace!(target: "loopscroll.session", handle = handle.0, "ignoring stale timer");
        false
    }

    /// Smoothly scroll to a section, updating the active index immediately.
    ///
    /// The guard is held for the configured navigation delay; the host's
    /// animation is assumed to finish within it.
    pub fn navigate_to_section(&mut self, id: &str) -> Result<(), NavigateError> {
        let core = &mut self.core;
        if core.torn_down {
            return Err(NavigateError::TornDown);
        }
        let index = core
            .cache
            .index_of(id)
            .ok_or_else(|| NavigateError::UnknownSection(id.to_owned()))?;
        // The target is resolved against live layout, as at click time.
        core.cache.recompute(&self.host);
        let target = core
            .cache
            .section(index)
            .map(|d| d.top)
            .ok_or_else(|| NavigateError::NotRendered(id.to_owned()))?;

        let before = core.state.snapshot();
        core.state.active_section_index = index;
        core.state.progress_indicator = ProgressIndicator::Idle;
        let delay = core.config.navigate_guard();
        core.arm_guard(&mut self.host, delay);
        self.host.smooth_scroll_to(target);
        core.stats.navigations += 1;
        tracing::debug!(
            target: "loopscroll.nav",
            section = id,
            index,
            to = target,
            "navigating to section"
        );
        core.commit(before);
        Ok(())
    }

    /// Return to the first section and forget all loop traversals.
    pub fn reset(&mut self) {
        let core = &mut self.core;
        if core.torn_down {
            return;
        }
        let before = core.state.snapshot();
        let target = core.cache.section(0).map_or(0.0, |d| d.top);
        core.state.loop_count = 0;
        core.state.active_section_index = 0;
        core.state.progress_indicator = ProgressIndicator::Idle;
        self.host.jump_to(target);
        core.state.last_scroll_offset = target;
        tracing::debug!(target: "loopscroll.session", to = target, "session reset to origin");
        core.commit(before);
    }

    /// Cancel every pending frame and timer. Further callbacks are no-ops.
    pub fn teardown(&mut self) {
        if self.core.torn_down {
            return;
        }
        self.throttle.cancel(&mut self.host);
        if let Some(guard) = self.core.guard_timer.take() {
            self.host.clear_timeout(guard);
        }
        self.core.cancel_retry(&mut self.host);
        self.core.listener = None;
        self.core.torn_down = true;
        tracing::debug!(target: "loopscroll.session", "session torn down");
    }

    /// Register the presenter's change listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: impl FnMut(&ScrollSnapshot) + 'static) {
        self.core.listener = Some(Box::new(listener));
    }

    /// Remove the change listener.
    pub fn clear_listener(&mut self) {
        self.core.listener = None;
    }

    /// Presenter-facing state.
    #[must_use]
    pub fn snapshot(&self) -> ScrollSnapshot {
        self.core.state.snapshot()
    }

    /// Increments whenever [`snapshot`](Self::snapshot) changes.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.core.revision
    }

    /// Navigation rail derived from the current snapshot.
    #[must_use]
    pub fn navigation(&self) -> NavigationModel {
        NavigationModel::from_snapshot(self.core.cache.section_ids(), &self.snapshot())
    }

    /// Full internal state.
    #[must_use]
    pub fn state(&self) -> &ScrollState {
        &self.core.state
    }

    /// Measured positions.
    #[must_use]
    pub fn cache(&self) -> &PositionCache {
        &self.core.cache
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &LoopConfig {
        &self.core.config
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.core.stats
    }

    /// Frame throttle counters.
    #[must_use]
    pub fn throttle_stats(&self) -> ThrottleStats {
        self.throttle.stats()
    }

    /// Whether a layout re-measure is scheduled.
    #[must_use]
    pub fn layout_retry_pending(&self) -> bool {
        self.core.retry.is_some()
    }

    /// Whether [`teardown`](Self::teardown) has run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.core.torn_down
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ElementRect;
    use crate::host::{Scheduler, Viewport};
    use std::cell::RefCell;
    use std::rc::Rc;
    use web_time::Duration;

    const H: f64 = 100.0;

    /// Minimal page: top-1, top-2, a, b, bottom-1, bottom-2, each `H` tall.
    #[derive(Default)]
    struct Page {
        offset: f64,
        next: u64,
        frames: Vec<FrameHandle>,
        timers: Vec<(TimerHandle, Duration)>,
        hide_buffers: bool,
        smooth_target: Option<f64>,
    }

    impl Page {
        fn top_of(id: &str) -> Option<f64> {
            let slot = ["top-1", "top-2", "a", "b", "bottom-1", "bottom-2"]
                .iter()
                .position(|s| *s == id)?;
            Some(slot as f64 * H)
        }
    }

    impl Viewport for Page {
        fn scroll_offset(&self) -> f64 {
            self.offset
        }
        fn viewport_height(&self) -> f64 {
            H
        }
        fn measure(&self, id: &str) -> Option<ElementRect> {
            if self.hide_buffers && (id.starts_with("top-") || id.starts_with("bottom-")) {
                return None;
            }
            Self::top_of(id).map(|top| ElementRect::new(top - self.offset, H))
        }
        fn jump_to(&mut self, offset: f64) {
            self.offset = offset;
        }
        fn smooth_scroll_to(&mut self, offset: f64) {
            self.smooth_target = Some(offset);
        }
    }

    impl Scheduler for Page {
        fn request_frame(&mut self) -> FrameHandle {
            self.next += 1;
            self.frames.push(FrameHandle(self.next));
            FrameHandle(self.next)
        }
        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.frames.retain(|h| *h != handle);
        }
        fn set_timeout(&mut self, delay: Duration) -> TimerHandle {
            self.next += 1;
            self.timers.push((TimerHandle(self.next), delay));
            TimerHandle(self.next)
        }
        fn clear_timeout(&mut self, handle: TimerHandle) {
            self.timers.retain(|(h, _)| *h != handle);
        }
    }

    fn session() -> ScrollSession<Page> {
        let mut s = ScrollSession::new(Page::default(), LoopConfig::with_sections(["a", "b"])).unwrap();
        s.mount();
        pump(&mut s);
        s
    }

    fn pump(s: &mut ScrollSession<Page>) {
        let frames = std::mem::take(&mut s.host_mut().frames);
        for frame in frames {
            s.on_frame(frame);
        }
    }

    fn scroll_to(s: &mut ScrollSession<Page>, offset: f64) {
        s.host_mut().offset = offset;
        s.on_scroll();
        pump(s);
    }

    fn fire_timers(s: &mut ScrollSession<Page>) {
        let timers = std::mem::take(&mut s.host_mut().timers);
        for (timer, _) in timers {
            s.on_timeout(timer);
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = ScrollSession::new(Page::default(), LoopConfig::with_sections(Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn scroll_updates_active_section() {
        let mut s = session();
        scroll_to(&mut s, 3.0 * H - H / 2.0 + 1.0);
        assert_eq!(s.snapshot().active_section_index, 1);
        assert_eq!(s.stats().samples, 2);
    }

    #[test]
    fn forward_jump_sets_guard_and_counts_loop() {
        let mut s = session();
        // Midpoint at bottom-2 progress 0.6.
        scroll_to(&mut s, 5.0 * H + 0.6 * H - H / 2.0);
        assert_eq!(s.snapshot().loop_count, 1);
        assert!(s.state().is_programmatic_scroll);
        assert!((s.host().offset - 0.6 * H).abs() < 1e-9);
        assert_eq!(s.host().timers.len(), 1);
        assert_eq!(s.host().timers[0].1, Duration::from_millis(100));

        // A qualifying sample during the guard is dropped.
        scroll_to(&mut s, 5.0 * H + 0.6 * H - H / 2.0);
        assert_eq!(s.snapshot().loop_count, 1);
        assert_eq!(s.stats().guarded_samples, 1);

        fire_timers(&mut s);
        assert!(!s.state().is_programmatic_scroll);
    }

    #[test]
    fn missing_buffers_skip_loop_and_schedule_retry() {
        let mut page = Page::default();
        page.hide_buffers = true;
        let mut s = ScrollSession::new(page, LoopConfig::with_sections(["a", "b"])).unwrap();
        s.mount();
        assert!(s.layout_retry_pending());
        pump(&mut s);
        assert_eq!(s.stats().loop_not_ready, 1);

        s.host_mut().hide_buffers = false;
        fire_timers(&mut s);
        assert!(!s.layout_retry_pending());
        assert!(s.cache().buffers_ready());
    }

    #[test]
    fn looping_resumes_after_retries_once_buffers_render() {
        let mut page = Page::default();
        page.hide_buffers = true;
        let mut s = ScrollSession::new(page, LoopConfig::with_sections(["a", "b"])).unwrap();
        s.mount();
        pump(&mut s);
        for _ in 0..10 {
            fire_timers(&mut s);
        }
        assert!(!s.layout_retry_pending());
        assert_eq!(s.stats().layout_retries, 5);

        // No resize: the next sample re-measures on its own.
        s.host_mut().hide_buffers = false;
        scroll_to(&mut s, 5.0 * H + 0.6 * H - H / 2.0);
        assert!(s.cache().buffers_ready());
        assert_eq!(s.snapshot().loop_count, 1);
        assert_eq!(s.stats().forward_jumps, 1);
    }

    #[test]
    fn navigate_sets_index_before_animation() {
        let mut s = session();
        s.navigate_to_section("b").unwrap();
        assert_eq!(s.snapshot().active_section_index, 1);
        assert_eq!(s.host().smooth_target, Some(3.0 * H));
        assert!(s.state().is_programmatic_scroll);
        assert_eq!(
            s.navigate_to_section("zzz"),
            Err(NavigateError::UnknownSection("zzz".into()))
        );
    }

    #[test]
    fn listener_sees_each_change_once() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut s = session();
        let sink = Rc::clone(&seen);
        s.set_listener(move |snap| sink.borrow_mut().push(snap.active_section_index));
        scroll_to(&mut s, 3.0 * H);
        scroll_to(&mut s, 3.0 * H + 1.0);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn teardown_cancels_everything() {
        let mut s = session();
        s.navigate_to_section("a").unwrap();
        s.on_scroll();
        let frame = *s.host().frames.last().unwrap();
        s.teardown();
        assert!(s.host().frames.is_empty());
        assert!(s.host().timers.is_empty());
        assert!(!s.on_frame(frame));
        assert_eq!(s.navigate_to_section("a"), Err(NavigateError::TornDown));
    }
}
