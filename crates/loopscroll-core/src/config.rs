#![forbid(unsafe_code)]

//! Policy-as-data configuration for the scroll engine.
//!
//! Every tunable lives in [`LoopConfig`]. The defaults are the hand-tuned
//! values the engine was calibrated with; `LoopConfig::default()` is what a
//! page gets when it does not load a file.
//!
//! ```toml
//! sections = ["about", "skills", "contact"]
//! jump_guard_ms = 120
//!
//! [down_band]
//! start = 0.5
//! end = 0.7
//! ```
//!
//! The two trigger bands form a hysteresis pair: a jump must land the
//! viewport outside the receiving buffer's trigger band, so the downward band
//! starts where the upward band ends. [`LoopConfig::validate`] rejects
//! configurations that break that ordering.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::retry::RetryPolicy;

/// Default section order of the portfolio page.
pub const DEFAULT_SECTIONS: [&str; 6] = [
    "about",
    "skills",
    "experience",
    "projects",
    "alphabet",
    "contact",
];

/// Inclusive progress range inside a buffer that triggers a jump.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct TriggerBand {
    /// Lower bound (inclusive).
    pub start: f64,
    /// Upper bound (inclusive).
    pub end: f64,
}

impl TriggerBand {
    /// Create a band.
    #[must_use]
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Whether `progress` falls inside the band.
    #[inline]
    #[must_use]
    pub fn contains(&self, progress: f64) -> bool {
        progress >= self.start && progress <= self.end
    }
}

/// Progress thresholds that split a section gap into three dots.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct GapThresholds {
    /// Progress below this lights the first dot.
    pub entering_end: f64,
    /// Progress below this (and at or above `entering_end`) lights the second.
    pub midway_end: f64,
}

impl Default for GapThresholds {
    fn default() -> Self {
        Self {
            entering_end: 0.33,
            midway_end: 0.66,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct LoopConfig {
    /// Section ids in document order. The first is home.
    pub sections: Vec<String>,
    /// Band inside `bottom-2` that triggers the forward jump. Default: 0.5..=0.7.
    pub down_band: TriggerBand,
    /// Band inside `top-1` that triggers the backward jump. Default: 0.3..=0.5.
    pub up_band: TriggerBand,
    /// Gap dot thresholds. Default: 0.33 / 0.66.
    pub gap_thresholds: GapThresholds,
    /// How long the guard is held after a loop jump. Default: 100 ms.
    pub jump_guard_ms: u64,
    /// How long the guard is held after a smooth navigation. Default: 1000 ms.
    pub navigate_guard_ms: u64,
    /// Re-measurement schedule when buffers are missing at mount.
    pub layout_retry: RetryPolicy,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            sections: DEFAULT_SECTIONS.iter().map(|s| (*s).to_owned()).collect(),
            down_band: TriggerBand::new(0.5, 0.7),
            up_band: TriggerBand::new(0.3, 0.5),
            gap_thresholds: GapThresholds::default(),
            jump_guard_ms: 100,
            navigate_guard_ms: 1000,
            layout_retry: RetryPolicy::default(),
        }
    }
}

impl LoopConfig {
    /// Default configuration with a custom section list.
    #[must_use]
    pub fn with_sections<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sections: sections.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Guard duration after a loop jump.
    #[must_use]
    pub fn jump_guard(&self) -> Duration {
        Duration::from_millis(self.jump_guard_ms)
    }

    /// Guard duration after a smooth navigation.
    #[must_use]
    pub fn navigate_guard(&self) -> Duration {
        Duration::from_millis(self.navigate_guard_ms)
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Return `self` if valid, otherwise the collected problems.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Check all parameters. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sections.is_empty() {
            errors.push("sections must not be empty".into());
        }
        for (i, id) in self.sections.iter().enumerate() {
            if id.is_empty() {
                errors.push(format!("sections[{i}] must not be empty"));
            } else if self.sections[..i].contains(id) {
                errors.push(format!("sections[{i}] duplicates id {id:?}"));
            }
        }

        for (name, band) in [("down_band", self.down_band), ("up_band", self.up_band)] {
            if !(0.0..=1.0).contains(&band.start) || !(0.0..=1.0).contains(&band.end) {
                errors.push(format!(
                    "{name} must lie within [0, 1], got [{}, {}]",
                    band.start, band.end
                ));
            }
            if band.start > band.end {
                errors.push(format!(
                    "{name}.start must be <= end, got [{}, {}]",
                    band.start, band.end
                ));
            }
        }

        // Landing past the receiving band is what prevents oscillation.
        if self.down_band.start < self.up_band.end {
            errors.push(format!(
                "down_band.start ({}) must be >= up_band.end ({})",
                self.down_band.start, self.up_band.end
            ));
        }

        let t = self.gap_thresholds;
        if !(t.entering_end > 0.0 && t.entering_end < t.midway_end && t.midway_end < 1.0) {
            errors.push(format!(
                "gap_thresholds must satisfy 0 < entering_end < midway_end < 1, got {} / {}",
                t.entering_end, t.midway_end
            ));
        }

        if self.jump_guard_ms == 0 {
            errors.push("jump_guard_ms must be > 0".into());
        }
        if self.navigate_guard_ms == 0 {
            errors.push("navigate_guard_ms must be > 0".into());
        }
        if self.layout_retry.max_attempts > 0 && self.layout_retry.base_ms == 0 {
            errors.push("layout_retry.base_ms must be > 0 when retries are enabled".into());
        }

        errors
    }
}

/// Errors from loading a [`LoopConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
