//! End-to-end scenarios on the simulated portfolio page.
//!
//! Geometry used throughout (viewport `H` = 800, every block one viewport):
//!
//! ```text
//! loop-head 0 | top-1 800 | top-2 1600 | about 2400 | gap 3200 | skills 4000
//! ... | contact 10400 | bottom-1 11200 | bottom-2 12000 | loop-tail 12800
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use loopscroll_core::{
    BufferId, LoopConfig, NavigateError, ProgressIndicator, ScrollSnapshot,
};
use loopscroll_web::{BlockHeight, PageLayout, SimulatedPage, Simulation};
use pretty_assertions::assert_eq;
use web_time::Duration;

const H: f64 = 800.0;
const TOP1: f64 = 800.0;
const BOTTOM2: f64 = 12_000.0;
const GUARD_RELEASE: Duration = Duration::from_millis(150);

fn portfolio() -> Simulation {
    Simulation::portfolio(H).unwrap()
}

/// Sections back to back, no transition spacers.
fn contiguous() -> Simulation {
    let config = LoopConfig::default();
    let mut builder = PageLayout::builder()
        .header("loop-head", BlockHeight::Viewports(1.0))
        .buffer(BufferId::Top1)
        .buffer(BufferId::Top2);
    for id in &config.sections {
        builder = builder.section(id.as_str(), BlockHeight::Viewports(1.0));
    }
    let layout = builder
        .buffer(BufferId::Bottom1)
        .buffer(BufferId::Bottom2)
        .footer("loop-tail", BlockHeight::Viewports(1.0))
        .build(H)
        .unwrap();
    Simulation::new(SimulatedPage::new(layout), config).unwrap()
}

/// Scroll down into the bottom-2 trigger band, then let the guard expire.
fn loop_forward(sim: &mut Simulation) {
    sim.scroll_midpoint_to(BOTTOM2 + 0.6 * H);
    sim.advance(GUARD_RELEASE);
}

// ============================================================================
// Section locator
// ============================================================================

#[test]
fn midpoint_inside_third_section_is_active_without_transition() {
    let mut sim = contiguous();
    let experience = sim.top_of("experience").unwrap();
    sim.scroll_midpoint_to(experience + 10.0);
    let snap = sim.snapshot();
    assert_eq!(snap.active_section_index, 2);
    assert_eq!(snap.progress_indicator, ProgressIndicator::Idle);
    assert_eq!(snap.progress_indicator.value(), -1);
}

#[test]
fn midpoint_halfway_through_gap_is_midway() {
    let mut sim = portfolio();
    let about_bottom = sim.top_of("about").unwrap() + H;
    sim.scroll_midpoint_to(about_bottom + 0.5 * H);
    assert_eq!(sim.snapshot().active_section_index, 0);
    assert_eq!(sim.snapshot().progress_indicator.value(), 1);
}

#[test]
fn walking_a_gap_lights_each_dot_in_turn() {
    let mut sim = portfolio();
    let gap_top = sim.top_of("skills").unwrap() + H;
    let mut seen = Vec::new();
    for fraction in [0.1, 0.4, 0.9] {
        sim.scroll_midpoint_to(gap_top + fraction * H);
        let nav = sim.session().navigation();
        seen.push(nav.items[1].dots.clone());
        assert_eq!(nav.active_id(), None);
    }
    assert_eq!(
        seen,
        vec![
            vec![true, false, false],
            vec![false, true, false],
            vec![false, false, true]
        ]
    );
}

#[test]
fn navigation_square_follows_active_section() {
    let mut sim = portfolio();
    sim.scroll_midpoint_to(sim.top_of("projects").unwrap() + 100.0);
    let nav = sim.session().navigation();
    assert_eq!(nav.active_id(), Some("projects"));
    assert_eq!(nav.items[3].label, "Projects");
}

// ============================================================================
// Loop engine
// ============================================================================

#[test]
fn mount_above_first_buffer_clamps_to_it() {
    let sim = portfolio();
    assert_eq!(sim.offset(), TOP1);
    assert_eq!(sim.page().jumps(), vec![TOP1]);
    assert_eq!(sim.snapshot().loop_count, 0);
}

#[test]
fn upward_scroll_past_origin_clamps_exactly() {
    let mut sim = portfolio();
    sim.scroll_to(1_000.0);
    sim.scroll_to(300.0);
    assert_eq!(sim.offset(), TOP1);
    assert_eq!(sim.session().stats().clamps, 2);
    assert!(!sim.session().state().is_programmatic_scroll, "clamp takes no guard");
}

#[test]
fn forward_jump_lands_at_equivalent_offset_in_top_buffer() {
    let mut sim = portfolio();
    sim.scroll_midpoint_to(BOTTOM2 + 0.6 * H);

    assert_eq!(sim.snapshot().loop_count, 1);
    assert_eq!(sim.offset(), TOP1 + 0.6 * H);
    assert!(sim.session().state().is_programmatic_scroll);
    // Location refreshed from the landing spot in the same frame.
    assert_eq!(sim.snapshot().active_section_index, 0);
}

#[test]
fn forward_band_is_not_entered_from_above_band() {
    let mut sim = portfolio();
    // Progress 0.8: past the band, no jump.
    sim.scroll_midpoint_to(BOTTOM2 + 0.8 * H);
    assert_eq!(sim.snapshot().loop_count, 0);
    // Moving up into the band does not trigger the forward jump either.
    sim.scroll_midpoint_to(BOTTOM2 + 0.6 * H);
    assert_eq!(sim.snapshot().loop_count, 0);
    assert!(sim.page().jumps().iter().all(|j| *j == TOP1));
}

#[test]
fn guard_drops_second_trigger_and_location_updates() {
    let mut sim = portfolio();
    sim.scroll_midpoint_to(BOTTOM2 + 0.6 * H);
    let after_jump = sim.snapshot();

    // Within the 100 ms guard: qualifying again, but nothing changes.
    sim.scroll_midpoint_to(BOTTOM2 + 0.6 * H);
    assert_eq!(sim.snapshot(), after_jump);
    assert_eq!(sim.session().stats().forward_jumps, 1);
    assert!(sim.session().stats().guarded_samples >= 1);

    // Once released the same position qualifies again.
    sim.advance(GUARD_RELEASE);
    sim.scroll_to(2_000.0);
    sim.scroll_midpoint_to(BOTTOM2 + 0.6 * H);
    assert_eq!(sim.snapshot().loop_count, 2);
}

#[test]
fn three_loops_then_upward_trigger_returns_to_bottom_buffer() {
    let mut sim = portfolio();
    for _ in 0..3 {
        loop_forward(&mut sim);
    }
    assert_eq!(sim.snapshot().loop_count, 3);

    sim.scroll_midpoint_to(TOP1 + 0.4 * H);
    assert_eq!(sim.snapshot().loop_count, 2);
    assert_eq!(sim.offset(), BOTTOM2 + 0.4 * H);
    let bottom = sim.session().cache().buffer(BufferId::Bottom2).unwrap();
    assert!(bottom.contains(sim.offset()));
    assert_eq!(sim.snapshot().active_section_index, 5);
}

#[test]
fn loop_count_never_drops_below_zero() {
    let mut sim = portfolio();
    loop_forward(&mut sim);
    sim.scroll_midpoint_to(TOP1 + 0.4 * H);
    sim.advance(GUARD_RELEASE);
    assert_eq!(sim.snapshot().loop_count, 0);

    // Climb back to the top and try the upward band again.
    for offset in [10_000.0, 6_000.0, 2_000.0, 100.0] {
        sim.scroll_to(offset);
    }
    sim.scroll_midpoint_to(TOP1 + 0.4 * H);
    assert_eq!(sim.snapshot().loop_count, 0);
    assert_eq!(sim.session().stats().backward_jumps, 1);
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn navigate_updates_index_before_animation_completes() {
    let mut sim = portfolio();
    sim.navigate("alphabet").unwrap();
    assert_eq!(sim.snapshot().active_section_index, 4);
    assert!(sim.page().is_animating());

    // Mid-animation samples are dropped.
    sim.advance(Duration::from_millis(300));
    assert_eq!(sim.snapshot().active_section_index, 4);

    sim.settle();
    assert_eq!(Some(sim.offset()), sim.top_of("alphabet"));
    assert!(!sim.session().state().is_programmatic_scroll);
}

#[test]
fn navigate_guard_outlasts_loop_guard() {
    let mut sim = portfolio();
    sim.navigate("about").unwrap();
    sim.advance(Duration::from_millis(900));
    assert!(sim.session().state().is_programmatic_scroll);
    sim.advance(Duration::from_millis(200));
    assert!(!sim.session().state().is_programmatic_scroll);
}

#[test]
fn navigate_to_unknown_or_unrendered_section_fails() {
    let mut sim = portfolio();
    assert_eq!(
        sim.navigate("blog"),
        Err(NavigateError::UnknownSection("blog".into()))
    );
    sim.page_mut().layout_mut().hide("contact");
    assert_eq!(
        sim.navigate("contact"),
        Err(NavigateError::NotRendered("contact".into()))
    );
    assert!(!sim.session().state().is_programmatic_scroll);
}

#[test]
fn reset_returns_home_and_forgets_loops() {
    let mut sim = portfolio();
    loop_forward(&mut sim);
    loop_forward(&mut sim);
    sim.session_mut().reset();
    assert_eq!(sim.snapshot(), ScrollSnapshot::default());
    assert_eq!(Some(sim.offset()), sim.top_of("about"));
}

// ============================================================================
// Layout changes
// ============================================================================

#[test]
fn resize_recomputes_positions() {
    let mut sim = portfolio();
    sim.resize(600.0).unwrap();
    let top1 = sim.session().cache().buffer(BufferId::Top1).unwrap().top;
    assert_eq!(top1, 600.0);

    let bottom2 = sim.top_of("bottom-2").unwrap();
    assert_eq!(bottom2, 15.0 * 600.0);
    sim.scroll_midpoint_to(bottom2 + 0.6 * 600.0);
    assert_eq!(sim.snapshot().loop_count, 1);
    assert_eq!(sim.offset(), 600.0 + 0.6 * 600.0);
}

#[test]
fn missing_buffer_defers_looping_until_rendered() {
    let config = LoopConfig::default();
    let mut layout = PageLayout::looping(config.sections.as_slice(), BlockHeight::Viewports(1.0), H).unwrap();
    layout.hide("bottom-2");
    let mut sim = Simulation::new(SimulatedPage::new(layout), config).unwrap();
    assert!(sim.session().layout_retry_pending());

    sim.scroll_midpoint_to(BOTTOM2 - 0.5 * H);
    assert_eq!(sim.snapshot().loop_count, 0);
    assert!(sim.session().stats().loop_not_ready >= 1);

    sim.page_mut().layout_mut().show("bottom-2");
    sim.advance(Duration::from_millis(250));
    assert!(!sim.session().layout_retry_pending());
    assert!(sim.session().cache().buffers_ready());

    sim.scroll_midpoint_to(BOTTOM2 + 0.6 * H);
    assert_eq!(sim.snapshot().loop_count, 1);
}

#[test]
fn zero_height_buffers_never_loop() {
    let config = LoopConfig::with_sections(["a", "b"]);
    let layout = PageLayout::builder()
        .header("head", BlockHeight::Viewports(1.0))
        .buffer_with_height(BufferId::Top1, BlockHeight::Px(0.0))
        .buffer(BufferId::Top2)
        .section("a", BlockHeight::Viewports(1.0))
        .section("b", BlockHeight::Viewports(1.0))
        .buffer(BufferId::Bottom1)
        .buffer(BufferId::Bottom2)
        .footer("tail", BlockHeight::Viewports(1.0))
        .build(H)
        .unwrap();
    let mut sim = Simulation::new(SimulatedPage::new(layout), config).unwrap();
    let bottom2 = sim.top_of("bottom-2").unwrap();
    sim.scroll_midpoint_to(bottom2 + 0.6 * H);
    assert_eq!(sim.snapshot().loop_count, 0);
    assert!(sim.page().jumps().is_empty());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn listener_is_told_about_every_revision() {
    let seen: Rc<RefCell<Vec<ScrollSnapshot>>> = Rc::default();
    let mut sim = portfolio();
    let sink = Rc::clone(&seen);
    sim.session_mut()
        .set_listener(move |snap| sink.borrow_mut().push(*snap));
    let start = sim.session().revision();

    sim.scroll_midpoint_to(sim.top_of("skills").unwrap() + 10.0);
    sim.scroll_midpoint_to(sim.top_of("skills").unwrap() + 20.0);
    sim.scroll_midpoint_to(sim.top_of("skills").unwrap() + H + 0.5 * H);

    let seen = seen.borrow();
    assert_eq!(seen.len() as u64, sim.session().revision() - start);
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].active_section_index, 1);
    assert_eq!(seen[1].progress_indicator, ProgressIndicator::Midway);
}

#[test]
fn teardown_cancels_pending_work_and_freezes_state() {
    let mut sim = portfolio();
    sim.navigate("skills").unwrap();
    sim.page_mut().user_scroll_to(5_000.0);
    sim.session_mut().on_scroll();
    assert!(sim.page().pending_frames() > 0);

    sim.teardown();
    assert_eq!(sim.page().pending_frames(), 0);
    assert!(sim.page().pending_timers().is_empty());

    let frozen = sim.snapshot();
    let samples = sim.session().stats().samples;
    sim.scroll_midpoint_to(BOTTOM2 + 0.6 * H);
    sim.advance(Duration::from_secs(2));
    assert_eq!(sim.snapshot(), frozen);
    assert_eq!(sim.session().stats().samples, samples);
    assert_eq!(sim.navigate("about"), Err(NavigateError::TornDown));
}
