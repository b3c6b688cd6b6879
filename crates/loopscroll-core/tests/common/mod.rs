//! Shared in-memory page for integration tests.
//!
//! Layout (all blocks `BLOCK` tall, viewport `BLOCK` tall, `LEAD` of header
//! above the first buffer):
//!
//! ```text
//! header | top-1 | top-2 | s0 | gap | s1 | gap | ... | s(n-1) | bottom-1 | bottom-2 | tail
//! ```

#![allow(dead_code)]

use loopscroll_core::{ElementRect, FrameHandle, Scheduler, TimerHandle, Viewport};
use web_time::Duration;

pub const BLOCK: f64 = 1000.0;
pub const LEAD: f64 = 600.0;

#[derive(Debug, Default)]
pub struct TestPage {
    pub offset: f64,
    pub sections: usize,
    pub frames: Vec<FrameHandle>,
    pub timers: Vec<(TimerHandle, Duration)>,
    pub jumps: Vec<f64>,
    pub smooth: Vec<f64>,
    next: u64,
}

impl TestPage {
    pub fn new(sections: usize) -> Self {
        Self {
            sections,
            ..Self::default()
        }
    }

    pub fn ids(&self) -> Vec<String> {
        (0..self.sections).map(|i| format!("s{i}")).collect()
    }

    pub fn section_top(i: usize) -> f64 {
        LEAD + 2.0 * BLOCK + 2.0 * BLOCK * i as f64
    }

    pub fn bottom1_top(&self) -> f64 {
        Self::section_top(self.sections) - BLOCK
    }

    pub fn bottom2_top(&self) -> f64 {
        self.bottom1_top() + BLOCK
    }

    /// One block of tail room below `bottom-2`.
    pub fn document_height(&self) -> f64 {
        self.bottom2_top() + 2.0 * BLOCK
    }

    fn top_of(&self, id: &str) -> Option<f64> {
        match id {
            "top-1" => Some(LEAD),
            "top-2" => Some(LEAD + BLOCK),
            "bottom-1" => Some(self.bottom1_top()),
            "bottom-2" => Some(self.bottom2_top()),
            _ => {
                let i: usize = id.strip_prefix('s')?.parse().ok()?;
                (i < self.sections).then(|| Self::section_top(i))
            }
        }
    }
}

impl Viewport for TestPage {
    fn scroll_offset(&self) -> f64 {
        self.offset
    }
    fn viewport_height(&self) -> f64 {
        BLOCK
    }
    fn measure(&self, id: &str) -> Option<ElementRect> {
        self.top_of(id)
            .map(|top| ElementRect::new(top - self.offset, BLOCK))
    }
    fn jump_to(&mut self, offset: f64) {
        self.jumps.push(offset);
        self.offset = offset;
    }
    fn smooth_scroll_to(&mut self, offset: f64) {
        self.smooth.push(offset);
        self.offset = offset;
    }
}

impl Scheduler for TestPage {
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
