#![forbid(unsafe_code)]

//! Section locator: which section is active and how far through the gap
//! after it the viewport midpoint has travelled.
//!
//! # Invariants
//!
//! 1. The active index is the highest index whose `top <= midpoint`; index 0
//!    when nothing qualifies.
//! 2. The indicator is [`ProgressIndicator::Idle`] unless the midpoint lies
//!    strictly between the active section's bottom and the next section's top.
//! 3. Unmeasured sections never qualify and never bound a gap.

use crate::config::GapThresholds;
use crate::geometry::Descriptor;

/// Three-way discretized position inside the gap between two sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ProgressIndicator {
    /// Not between sections.
    #[default]
    Idle,
    /// First third of the gap.
    Entering,
    /// Middle third of the gap.
    Midway,
    /// Last third of the gap.
    Leaving,
}

impl ProgressIndicator {
    /// Integer form used by presenters: `-1`, `0`, `1` or `2`.
    #[must_use]
    pub const fn value(self) -> i8 {
        match self {
            Self::Idle => -1,
            Self::Entering => 0,
            Self::Midway => 1,
            Self::Leaving => 2,
        }
    }

    /// Index of the lit dot, if any.
    #[must_use]
    pub const fn dot(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Entering => Some(0),
            Self::Midway => Some(1),
            Self::Leaving => Some(2),
        }
    }

    /// Bucket a gap progress value in `[0, 1)`.
    #[must_use]
    pub fn from_progress(progress: f64, thresholds: GapThresholds) -> Self {
        if progress < thresholds.entering_end {
            Self::Entering
        } else if progress < thresholds.midway_end {
            Self::Midway
        } else {
            Self::Leaving
        }
    }
}

/// Result of locating the viewport midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Active section index.
    pub index: usize,
    /// Gap progress after the active section.
    pub indicator: ProgressIndicator,
}

/// Locate `midpoint` among the cached section extents.
#[must_use]
pub fn locate(
    sections: &[Option<Descriptor>],
    midpoint: f64,
    thresholds: GapThresholds,
) -> Location {
    let index = sections
        .iter()
        .rposition(|s| s.as_ref().is_some_and(|d| d.top <= midpoint))
        .unwrap_or(0);

    let indicator = match (sections.get(index), sections.get(index + 1)) {
        (Some(Some(current)), Some(Some(next))) => gap_indicator(current, next, midpoint, thresholds),
        _ => ProgressIndicator::Idle,
    };

    Location { index, indicator }
}

fn gap_indicator(
    current: &Descriptor,
    next: &Descriptor,
    midpoint: f64,
    thresholds: GapThresholds,
) -> ProgressIndicator {
    let gap = next.top - current.bottom;
    if gap <= 0.0 || midpoint <= current.bottom || midpoint >= next.top {
        return ProgressIndicator::Idle;
    }
    // Strictly inside the gap, so the ratio is already in (0, 1).
    let progress = ((midpoint - current.bottom) / gap).clamp(0.0, 1.0 - f64::EPSILON);
    ProgressIndicator::from_progress(progress, thresholds)
}
