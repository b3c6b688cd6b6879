#![forbid(unsafe_code)]

//! Block layout of a looping page.
//!
//! A page is a vertical stack of blocks. Heights are either fixed pixels or a
//! multiple of the viewport height, so a resize re-flows buffers and
//! transition spacers the same way `100vh` blocks re-flow in a browser.

use std::collections::HashSet;

use loopscroll_core::{BufferId, ElementRect};

use crate::HostError;

/// Id of the head-room block of [`PageLayout::looping`].
pub const LOOP_HEAD: &str = "loop-head";
/// Id of the tail-room block of [`PageLayout::looping`].
pub const LOOP_TAIL: &str = "loop-tail";

/// Height rule of one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockHeight {
    /// Fixed pixel height.
    Px(f64),
    /// Multiple of the viewport height.
    Viewports(f64),
}

impl BlockHeight {
    /// Resolve against a viewport height.
    #[must_use]
    pub fn resolve(self, viewport_height: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Viewports(n) => n * viewport_height,
        }
    }

    fn raw(self) -> f64 {
        match self {
            Self::Px(v) | Self::Viewports(v) => v,
        }
    }
}

/// Role of a block in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Content above the first buffer (hero, banner).
    Header,
    /// One of the four loop buffers.
    Buffer,
    /// A navigable content section.
    Section,
    /// Empty transition block between two sections.
    Spacer,
    /// Content below the last buffer.
    Footer,
}

/// One block of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Element id.
    pub id: String,
    /// Role.
    pub kind: BlockKind,
    /// Height rule.
    pub height: BlockHeight,
}

/// Builder for [`PageLayout`].
#[derive(Debug, Clone, Default)]
pub struct PageLayoutBuilder {
    blocks: Vec<Block>,
}

impl PageLayoutBuilder {
    /// Empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, id: impl Into<String>, kind: BlockKind, height: BlockHeight) -> Self {
        self.blocks.push(Block {
            id: id.into(),
            kind,
            height,
        });
        self
    }

    /// Append a header block.
    #[must_use]
    pub fn header(self, id: impl Into<String>, height: BlockHeight) -> Self {
        self.push(id, BlockKind::Header, height)
    }

    /// Append a full-viewport buffer.
    #[must_use]
    pub fn buffer(self, buffer: BufferId) -> Self {
        self.push(buffer.as_str(), BlockKind::Buffer, BlockHeight::Viewports(1.0))
    }

    /// Append a buffer with a custom height.
    #[must_use]
    pub fn buffer_with_height(self, buffer: BufferId, height: BlockHeight) -> Self {
        self.push(buffer.as_str(), BlockKind::Buffer, height)
    }

    /// Append a content section.
    #[must_use]
    pub fn section(self, id: impl Into<String>, height: BlockHeight) -> Self {
        self.push(id, BlockKind::Section, height)
    }

    /// Append a transition spacer.
    #[must_use]
    pub fn spacer(self, id: impl Into<String>, height: BlockHeight) -> Self {
        self.push(id, BlockKind::Spacer, height)
    }

    /// Append a footer block.
    #[must_use]
    pub fn footer(self, id: impl Into<String>, height: BlockHeight) -> Self {
        self.push(id, BlockKind::Footer, height)
    }

    /// Lay the blocks out for `viewport_height`.
    pub fn build(self, viewport_height: f64) -> Result<PageLayout, HostError> {
        if !(viewport_height.is_finite() && viewport_height > 0.0) {
            return Err(HostError::InvalidViewport(viewport_height));
        }
        let mut seen = HashSet::new();
        for block in &self.blocks {
            if !seen.insert(block.id.as_str()) {
                return Err(HostError::DuplicateId(block.id.clone()));
            }
            let raw = block.height.raw();
            if !(raw.is_finite() && raw >= 0.0) {
                return Err(HostError::InvalidHeight {
                    id: block.id.clone(),
                    height: raw,
                });
            }
        }
        let mut layout = PageLayout {
            blocks: self.blocks,
            tops: Vec::new(),
            hidden: HashSet::new(),
            viewport_height,
        };
        layout.reflow();
        Ok(layout)
    }
}

/// A laid-out page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    blocks: Vec<Block>,
    tops: Vec<f64>,
    hidden: HashSet<String>,
    viewport_height: f64,
}

impl PageLayout {
    /// Start a custom layout.
    #[must_use]
    pub fn builder() -> PageLayoutBuilder {
        PageLayoutBuilder::new()
    }

    /// The standard looping page: two buffers, the sections separated by
    /// one-viewport transition spacers, two buffers.
    ///
    /// One viewport of head room above `top-1` and tail room below
    /// `bottom-2` keeps every jump target inside the scrollable range.
    pub fn looping<S: AsRef<str>>(
        sections: &[S],
        section_height: BlockHeight,
        viewport_height: f64,
    ) -> Result<Self, HostError> {
        let mut builder = Self::builder()
            .header(LOOP_HEAD, BlockHeight::Viewports(1.0))
            .buffer(BufferId::Top1)
            .buffer(BufferId::Top2);
        for (i, id) in sections.iter().enumerate() {
            if i > 0 {
                builder = builder.spacer(format!("transition-{i}"), BlockHeight::Viewports(1.0));
            }
            builder = builder.section(id.as_ref(), section_height);
        }
        builder
            .buffer(BufferId::Bottom1)
            .buffer(BufferId::Bottom2)
            .footer(LOOP_TAIL, BlockHeight::Viewports(1.0))
            .build(viewport_height)
    }

    fn reflow(&mut self) {
        let mut top = 0.0;
        self.tops.clear();
        for block in &self.blocks {
            self.tops.push(top);
            top += block.height.resolve(self.viewport_height);
        }
    }

    /// Change the viewport height and re-flow.
    pub fn set_viewport_height(&mut self, viewport_height: f64) -> Result<(), HostError> {
        if !(viewport_height.is_finite() && viewport_height > 0.0) {
            return Err(HostError::InvalidViewport(viewport_height));
        }
        self.viewport_height = viewport_height;
        self.reflow();
        Ok(())
    }

    /// Current viewport height.
    #[must_use]
    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    /// Total document height.
    #[must_use]
    pub fn document_height(&self) -> f64 {
        match (self.tops.last(), self.blocks.last()) {
            (Some(top), Some(block)) => top + block.height.resolve(self.viewport_height),
            _ => 0.0,
        }
    }

    /// Largest reachable scroll offset.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (self.document_height() - self.viewport_height).max(0.0)
    }

    /// Blocks in document order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Document-space top of a rendered block.
    #[must_use]
    pub fn top_of(&self, id: &str) -> Option<f64> {
        if self.hidden.contains(id) {
            return None;
        }
        let index = self.blocks.iter().position(|b| b.id == id)?;
        self.tops.get(index).copied()
    }

    /// Document-space extent of a rendered block.
    #[must_use]
    pub fn extent_of(&self, id: &str) -> Option<ElementRect> {
        let top = self.top_of(id)?;
        let block = self.blocks.iter().find(|b| b.id == id)?;
        Some(ElementRect::new(top, block.height.resolve(self.viewport_height)))
    }

    /// Stop rendering a block, as if it were not in the DOM.
    pub fn hide(&mut self, id: &str) {
        self.hidden.insert(id.to_owned());
    }

    /// Render a previously hidden block again.
    pub fn show(&mut self, id: &str) {
        self.hidden.remove(id);
    }

    /// Ids of all section blocks, in order.
    #[must_use]
    pub fn section_ids(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Section)
            .map(|b| b.id.clone())
            .collect()
    }
}
