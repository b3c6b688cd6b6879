#![forbid(unsafe_code)]

//! `loopscroll-web` hosts a [`ScrollSession`](loopscroll_core::ScrollSession)
//! on a simulated page.
//!
//! Design goals:
//! - **Host-driven I/O**: the driver pushes reader scrolls and viewport
//!   resizes; the page queues frame requests and timers.
//! - **Deterministic time**: the driver advances a monotonic clock
//!   explicitly, so scenarios replay frame by frame.
//! - **No blocking / no threads**.
//!
//! The browser binding in `loopscroll-wasm` implements the same host traits
//! over the real DOM; this crate is what scenario tests and tooling drive.

pub mod layout;
pub mod page;
pub mod sim;

use loopscroll_core::ConfigError;
use web_time::Duration;

pub use layout::{Block, BlockHeight, BlockKind, LOOP_HEAD, LOOP_TAIL, PageLayout, PageLayoutBuilder};
pub use page::{DEFAULT_SMOOTH_SCROLL, PendingTimer, ScrollCause, SimulatedPage};
pub use sim::{FRAME_INTERVAL, Simulation};

/// Host-side error type.
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// Two blocks share an id.
    DuplicateId(String),
    /// A block height is negative or not finite.
    InvalidHeight {
        /// Block id.
        id: String,
        /// Offending value.
        height: f64,
    },
    /// Viewport height is not a positive finite number.
    InvalidViewport(f64),
    /// The engine rejected its configuration.
    InvalidConfig(String),
}

impl core::fmt::Display for HostError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate block id: {id}"),
            Self::InvalidHeight { id, height } => {
                write!(f, "invalid height {height} for block {id}")
            }
            Self::InvalidViewport(h) => write!(f, "invalid viewport height: {h}"),
            Self::InvalidConfig(msg) => write!(f, "invalid engine config: {msg}"),
        }
    }
}

impl std::error::Error for HostError {}

impl From<ConfigError> for HostError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Deterministic monotonic clock controlled by the driver.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}
