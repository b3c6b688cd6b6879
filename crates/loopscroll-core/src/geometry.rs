#![forbid(unsafe_code)]

//! Vertical extents of rendered blocks.
//!
//! All coordinates are CSS-pixel-like `f64` values. [`ElementRect`] is what a
//! host reports (relative to the current viewport); [`Descriptor`] is the
//! absolute, document-space extent stored in the position cache.

use std::fmt;

/// Viewport-relative vertical rectangle of a rendered element.
///
/// `top` is measured from the top edge of the viewport and is negative once
/// the element has scrolled past it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementRect {
    /// Distance from the viewport top to the element top.
    pub top: f64,
    /// Rendered height.
    pub height: f64,
}

impl ElementRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }
}

/// Absolute vertical extent of one section or buffer zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// Logical id of the element.
    pub id: String,
    /// Document-space top edge.
    pub top: f64,
    /// Document-space bottom edge (`top + height`).
    pub bottom: f64,
    /// Rendered height.
    pub height: f64,
}

impl Descriptor {
    /// Convert a viewport-relative rectangle into document space by adding
    /// the scroll offset at which it was measured.
    #[must_use]
    pub fn from_rect(id: impl Into<String>, rect: ElementRect, scroll_offset: f64) -> Self {
        let top = rect.top + scroll_offset;
        Self {
            id: id.into(),
            top,
            bottom: top + rect.height,
            height: rect.height,
        }
    }

    /// Create a descriptor directly from document-space top and height.
    #[must_use]
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            bottom: top + height,
            height,
        }
    }

    /// Whether `y` lies within `[top, bottom]` (both edges inclusive).
    #[inline]
    #[must_use]
    pub fn contains(&self, y: f64) -> bool {
        y >= self.top && y <= self.bottom
    }

    /// Relative position of `y` inside this extent, `0.0` at `top`.
    ///
    /// Returns `None` for zero-height extents, which carry no usable scale.
    #[inline]
    #[must_use]
    pub fn progress_at(&self, y: f64) -> Option<f64> {
        (self.height > 0.0).then(|| (y - self.top) / self.height)
    }

    /// A descriptor is usable once it has been measured with a positive height.
    #[inline]
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.height > 0.0 && self.top.is_finite() && self.bottom.is_finite()
    }
}

/// The four fixed spacer zones that make the loop jump invisible.
///
/// Two sit at the very start of the document (`top-1`, `top-2`) and two at
/// the very end (`bottom-1`, `bottom-2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferId {
    /// First spacer at the document start. Landing zone of downward jumps.
    Top1,
    /// Second spacer at the document start.
    Top2,
    /// First spacer at the document end.
    Bottom1,
    /// Last spacer at the document end. Trigger zone of downward jumps.
    Bottom2,
}

impl BufferId {
    /// All buffers in document order.
    pub const ALL: [BufferId; 4] = [Self::Top1, Self::Top2, Self::Bottom1, Self::Bottom2];

    /// Stable element id used by the render tree.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top1 => "top-1",
            Self::Top2 => "top-2",
            Self::Bottom1 => "bottom-1",
            Self::Bottom2 => "bottom-2",
        }
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        match self {
            Self::Top1 => 0,
            Self::Top2 => 1,
            Self::Bottom1 => 2,
            Self::Bottom2 => 3,
        }
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
