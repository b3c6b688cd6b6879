#![forbid(unsafe_code)]

//! Loop engine: decides when to splice the viewport across the document.
//!
//! The engine is a pure decision function over one sample. The session
//! applies the returned [`LoopAction`] (jump, counter change, guard).
//!
//! # Rules (checked in this order, first match wins)
//!
//! 1. **Forward jump**: moving down, midpoint inside `bottom-2` at a progress
//!    within the down band. Target: `top-1.top + (midpoint - bottom-2.top)`.
//! 2. **Backward jump**: moving up, at least one loop taken, midpoint inside
//!    `top-1` at a progress within the up band. Target:
//!    `bottom-2.top + (midpoint - top-1.top)`.
//! 3. **Origin clamp**: moving up, no loop taken, offset above `top-1.top`.
//!    Target: `top-1.top`.
//!
//! The two bands are deliberately disjoint (except for the shared edge) so a
//! landing never sits inside the reverse trigger.

use crate::cache::PositionCache;
use crate::config::TriggerBand;
use crate::geometry::BufferId;
use crate::state::Direction;

/// Inputs of one loop decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopInput {
    /// Direction relative to the previous sample.
    pub direction: Direction,
    /// Current scroll offset.
    pub scroll_offset: f64,
    /// `scroll_offset + viewport_height / 2`.
    pub midpoint: f64,
    /// Current loop counter.
    pub loop_count: u32,
}

/// What the session should do after a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopAction {
    /// Nothing to do.
    Idle,
    /// Jump from `bottom-2` to `top-1` and count one more loop.
    Forward {
        /// New scroll offset.
        target: f64,
        /// Progress inside `bottom-2` that triggered the jump.
        progress: f64,
    },
    /// Jump from `top-1` to `bottom-2` and count one loop less.
    Backward {
        /// New scroll offset.
        target: f64,
        /// Progress inside `top-1` that triggered the jump.
        progress: f64,
    },
    /// Pin the offset to the top of `top-1`.
    Clamp {
        /// New scroll offset.
        target: f64,
    },
}

impl LoopAction {
    /// Whether the action moves the viewport.
    #[must_use]
    pub const fn is_jump(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Trigger bands of the loop state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopEngine {
    down_band: TriggerBand,
    up_band: TriggerBand,
}

impl Default for LoopEngine {
    fn default() -> Self {
        Self::new(TriggerBand::new(0.5, 0.7), TriggerBand::new(0.3, 0.5))
    }
}

impl LoopEngine {
    /// Create an engine with explicit bands.
    #[must_use]
    pub const fn new(down_band: TriggerBand, up_band: TriggerBand) -> Self {
        Self { down_band, up_band }
    }

    /// Decide the action for one sample.
    ///
    /// Returns [`LoopAction::Idle`] when `top-1` or `bottom-2` is not measured;
    /// callers are expected to have refreshed the cache beforehand.
    #[must_use]
    pub fn decide(&self, cache: &PositionCache, input: LoopInput) -> LoopAction {
        let (Some(top), Some(bottom)) = (cache.buffer(BufferId::Top1), cache.buffer(BufferId::Bottom2))
        else {
            return LoopAction::Idle;
        };
        if !top.is_measured() || !bottom.is_measured() {
            return LoopAction::Idle;
        }

        let mid = input.midpoint;
        match input.direction {
            Direction::Down if bottom.contains(mid) => {
                let progress = (mid - bottom.top) / bottom.height;
                if self.down_band.contains(progress) {
                    return LoopAction::Forward {
                        target: top.top + (mid - bottom.top),
                        progress,
                    };
                }
            }
            Direction::Up if input.loop_count > 0 && top.contains(mid) => {
                let progress = (mid - top.top) / top.height;
                if self.up_band.contains(progress) {
                    return LoopAction::Backward {
                        target: bottom.top + (mid - top.top),
                        progress,
                    };
                }
            }
            Direction::Up if input.loop_count == 0 && input.scroll_offset < top.top => {
                return LoopAction::Clamp { target: top.top };
            }
            _ => {}
        }
        LoopAction::Idle
    }
}
