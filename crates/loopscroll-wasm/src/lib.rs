#![forbid(unsafe_code)]

//! Browser binding for `loopscroll-core`.
//!
//! The exported `LoopScroll` class listens to window `scroll` and `resize`,
//! schedules samples with `requestAnimationFrame`, and holds the guard and
//! layout-retry timers with `setTimeout`. Presenters subscribe with
//! `onChange` and read `snapshot()` / `navigation()`.
//!
//! Everything that does not touch the DOM lives in [`bridge`] so it can be
//! tested natively.

pub mod bridge;

#[cfg(target_arch = "wasm32")]
mod wasm;
