#![forbid(unsafe_code)]

//! Position cache: measured extents of every section and buffer zone.
//!
//! [`PositionCache::recompute`] is a pure overwrite. Elements the host cannot
//! measure are stored as `None`, which callers read as "not ready" and degrade
//! around (the locator skips them, the loop engine does nothing).

use crate::geometry::{BufferId, Descriptor};
use crate::host::Viewport;

/// Document-space extents of the known sections and the four buffer zones.
#[derive(Debug, Clone, Default)]
pub struct PositionCache {
    section_ids: Vec<String>,
    sections: Vec<Option<Descriptor>>,
    buffers: [Option<Descriptor>; 4],
    generation: u64,
}

impl PositionCache {
    /// Create an empty cache for the given ordered section ids.
    ///
    /// Nothing is measured until the first [`recompute`](Self::recompute).
    #[must_use]
    pub fn new<I, S>(section_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let section_ids: Vec<String> = section_ids.into_iter().map(Into::into).collect();
        let sections = vec![None; section_ids.len()];
        Self {
            section_ids,
            sections,
            buffers: Default::default(),
            generation: 0,
        }
    }

    /// Re-measure every section and buffer through the host.
    pub fn recompute(&mut self, viewport: &dyn Viewport) {
        let offset = viewport.scroll_offset();
        for (slot, id) in self.sections.iter_mut().zip(&self.section_ids) {
            *slot = viewport
                .measure(id)
                .map(|rect| Descriptor::from_rect(id.as_str(), rect, offset));
        }
        for buffer in BufferId::ALL {
            self.buffers[buffer.slot()] = viewport
                .measure(buffer.as_str())
                .map(|rect| Descriptor::from_rect(buffer.as_str(), rect, offset));
        }
        self.generation = self.generation.wrapping_add(1);

        tracing::debug!(
            target: "loopscroll.cache",
            generation = self.generation,
            sections_measured = self.sections.iter().flatten().count(),
            sections_total = self.sections.len(),
            buffers_ready = self.buffers_ready(),
            "position cache recomputed"
        );
    }

    /// Ordered section ids.
    #[must_use]
    pub fn section_ids(&self) -> &[String] {
        &self.section_ids
    }

    /// Number of known sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.section_ids.len()
    }

    /// Whether no sections are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.section_ids.is_empty()
    }

    /// Index of the section with the given id.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.section_ids.iter().position(|s| s == id)
    }

    /// Cached section descriptors in document order.
    #[must_use]
    pub fn sections(&self) -> &[Option<Descriptor>] {
        &self.sections
    }

    /// Cached descriptor of one section.
    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Descriptor> {
        self.sections.get(index).and_then(Option::as_ref)
    }

    /// Cached descriptor of one buffer zone.
    #[must_use]
    pub fn buffer(&self, id: BufferId) -> Option<&Descriptor> {
        self.buffers[id.slot()].as_ref()
    }

    /// Whether the buffers the loop engine jumps between are measured.
    ///
    /// Zero-height entries count as stale: late-mounting layout reports them
    /// before the spacers have their real size.
    #[must_use]
    pub fn buffers_ready(&self) -> bool {
        BufferId::ALL
            .iter()
            .all(|&b| self.buffer(b).is_some_and(Descriptor::is_measured))
    }

    /// Number of completed recomputations.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
