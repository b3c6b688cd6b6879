#![forbid(unsafe_code)]

//! Session-scoped scroll state and the read-only snapshot handed to presenters.

use crate::locator::{Location, ProgressIndicator};

/// Scroll direction derived from two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The offset grew since the previous sample.
    Down,
    /// The offset shrank or stayed the same.
    Up,
}

impl Direction {
    /// `Down` if `current` is greater than `previous`, otherwise `Up`.
    #[inline]
    #[must_use]
    pub fn between(previous: f64, current: f64) -> Self {
        if current > previous {
            Self::Down
        } else {
            Self::Up
        }
    }
}

/// Mutable state of one page session.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollState {
    /// Index of the active section, always within `0..section_count`.
    pub active_section_index: usize,
    /// Discretized position inside the gap after the active section.
    pub progress_indicator: ProgressIndicator,
    /// Net number of downward loop traversals. Never negative.
    pub loop_count: u32,
    /// Offset of the previous sample, used only to derive direction.
    pub last_scroll_offset: f64,
    /// Held while a jump or an animated navigation is in flight.
    pub is_programmatic_scroll: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            active_section_index: 0,
            progress_indicator: ProgressIndicator::Idle,
            loop_count: 0,
            last_scroll_offset: 0.0,
            is_programmatic_scroll: false,
        }
    }
}

impl ScrollState {
    /// Record the offset of a new sample and return the direction relative
    /// to the previous one.
    pub fn observe_offset(&mut self, offset: f64) -> Direction {
        let direction = Direction::between(self.last_scroll_offset, offset);
        self.last_scroll_offset = offset;
        direction
    }

    /// Apply the section locator's result.
    pub fn apply_location(&mut self, location: Location) {
        self.active_section_index = location.index;
        self.progress_indicator = location.indicator;
    }

    /// One more full forward traversal.
    pub fn increment_loops(&mut self) {
        self.loop_count = self.loop_count.saturating_add(1);
    }

    /// One traversal undone; floors at zero.
    pub fn decrement_loops(&mut self) {
        self.loop_count = self.loop_count.saturating_sub(1);
    }

    /// The presenter-facing view of this state.
    #[must_use]
    pub fn snapshot(&self) -> ScrollSnapshot {
        ScrollSnapshot {
            active_section_index: self.active_section_index,
            progress_indicator: self.progress_indicator,
            loop_count: self.loop_count,
        }
    }
}

/// Read-only state consumed by the navigation presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollSnapshot {
    /// Index of the active section.
    pub active_section_index: usize,
    /// Gap progress after the active section.
    pub progress_indicator: ProgressIndicator,
    /// Net loop traversals.
    pub loop_count: u32,
}
