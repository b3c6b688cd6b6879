#![forbid(unsafe_code)]

//! Navigation presenter model.
//!
//! Derives what a side navigation rail should light up from a
//! [`ScrollSnapshot`]: one square marker per section and three dots in each
//! gap between consecutive sections. A square is lit only while its section
//! is active and the viewport is not between sections; while transitioning,
//! the dot matching the progress indicator in the gap after the active
//! section is lit instead.

use crate::state::ScrollSnapshot;

/// Dots rendered in each gap between two sections.
pub const DOTS_PER_GAP: usize = 3;

/// One section entry of the navigation rail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    /// Section id, passed back to `navigate_to_section`.
    pub id: String,
    /// Display label (title-cased id).
    pub label: String,
    /// Whether the square marker is lit.
    pub active: bool,
    /// Lit state of the dots below this section. Empty for the last section.
    pub dots: Vec<bool>,
}

/// Full navigation rail state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationModel {
    /// One entry per section, in document order.
    pub items: Vec<NavItem>,
    /// Loop counter, for presenters that surface it.
    pub loop_count: u32,
}

impl NavigationModel {
    /// Build the rail for `section_ids` from a snapshot.
    #[must_use]
    pub fn from_snapshot(section_ids: &[String], snapshot: &ScrollSnapshot) -> Self {
        let last = section_ids.len().saturating_sub(1);
        let dot = snapshot.progress_indicator.dot();
        let items = section_ids
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let is_current = index == snapshot.active_section_index;
                let dots = if index < last {
                    (0..DOTS_PER_GAP)
                        .map(|d| is_current && dot == Some(d))
                        .collect()
                } else {
                    Vec::new()
                };
                NavItem {
                    id: id.clone(),
                    label: title_case(id),
                    active: is_current && dot.is_none(),
                    dots,
                }
            })
            .collect();
        Self {
            items,
            loop_count: snapshot.loop_count,
        }
    }

    /// Id of the section whose square is lit, if any.
    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.active)
            .map(|item| item.id.as_str())
    }
}

fn title_case(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
