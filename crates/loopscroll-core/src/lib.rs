#![forbid(unsafe_code)]

//! `loopscroll-core` is the scroll-state machine behind an endlessly looping
//! single-page document.
//!
//! The page is laid out as two empty buffer zones (`top-1`, `top-2`) above
//! the sections and two buffer zones (`bottom-1`, `bottom-2`) below them.
//! When the reader scrolls deep enough into `bottom-2` the viewport is moved, without
//! animation, to the equivalent spot inside `top-1`; scrolling back up
//! through `top-1` reverses the move. The reader sees one seamless loop.
//!
//! Design goals:
//! - **Host-driven**: the embedding page pushes scroll, resize, frame and
//!   timer notifications; the engine owns no event source.
//! - **Deterministic**: all timing goes through the host's [`Scheduler`], so
//!   a simulated host replays scenarios exactly.
//! - **Single thread**: no locks, no `Send` requirements.
//!
//! # Key Components
//!
//! - [`ScrollSession`] - orchestrates one page
//! - [`PositionCache`] - document-coordinate descriptors of sections and buffers
//! - [`FrameThrottle`] - one sample per display frame
//! - [`locate`] - active section and gap progress
//! - [`LoopEngine`] - jump and clamp decisions
//! - [`NavigationModel`] - what the navigation rail lights up
//! - [`LoopConfig`] - every tunable, loadable from TOML/JSON with the
//!   `config` feature

pub mod cache;
pub mod config;
pub mod geometry;
pub mod host;
pub mod locator;
pub mod loop_engine;
pub mod nav;
pub mod retry;
pub mod session;
pub mod state;
pub mod throttle;

pub use cache::PositionCache;
pub use config::{ConfigError, DEFAULT_SECTIONS, GapThresholds, LoopConfig, TriggerBand};
pub use geometry::{BufferId, Descriptor, ElementRect};
pub use host::{FrameHandle, Host, Scheduler, TimerHandle, Viewport};
pub use locator::{Location, ProgressIndicator, locate};
pub use loop_engine::{LoopAction, LoopEngine, LoopInput};
pub use nav::{DOTS_PER_GAP, NavItem, NavigationModel};
pub use retry::RetryPolicy;
pub use session::{NavigateError, ScrollSession, SessionStats, SnapshotListener};
pub use state::{Direction, ScrollSnapshot, ScrollState};
pub use throttle::{FrameCallback, FrameThrottle, ThrottleStats};
