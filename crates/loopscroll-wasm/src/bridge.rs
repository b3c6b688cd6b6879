#![forbid(unsafe_code)]

//! DOM-independent glue between the session and JavaScript.

use std::cell::Cell;
use std::rc::Rc;

use loopscroll_core::{ConfigError, LoopConfig, NavItem, ScrollSnapshot};

/// Parse the constructor argument. `None` or blank means defaults.
pub fn config_from_json(json: Option<&str>) -> Result<LoopConfig, ConfigError> {
    match json.map(str::trim) {
        None | Some("") => LoopConfig::default().validated(),
        Some(json) => LoopConfig::from_json_str(json),
    }
}

/// Numeric fields of a snapshot, keyed by their JavaScript names.
#[must_use]
pub fn snapshot_fields(snapshot: &ScrollSnapshot, revision: u64) -> [(&'static str, f64); 4] {
    [
        ("activeSectionIndex", snapshot.active_section_index as f64),
        ("progressIndicator", f64::from(snapshot.progress_indicator.value())),
        ("loopCount", f64::from(snapshot.loop_count)),
        ("revision", revision as f64),
    ]
}

/// Index of the lit dot of a navigation item, or -1.
#[must_use]
pub fn lit_dot(item: &NavItem) -> i32 {
    item.dots
        .iter()
        .position(|lit| *lit)
        .and_then(|i| i32::try_from(i).ok())
        .unwrap_or(-1)
}

/// Latest-wins slot filled by the session listener and drained after the
/// session borrow is released, so JavaScript callbacks may call back in.
#[derive(Debug, Clone, Default)]
pub struct ChangeSlot {
    latest: Rc<Cell<Option<ScrollSnapshot>>>,
}

impl ChangeSlot {
    /// Listener to register on the session.
    pub fn listener(&self) -> impl FnMut(&ScrollSnapshot) + 'static {
        let latest = Rc::clone(&self.latest);
        move |snapshot| latest.set(Some(*snapshot))
    }

    /// Take the pending change, if any.
    pub fn take(&self) -> Option<ScrollSnapshot> {
        self.latest.take()
    }
}
