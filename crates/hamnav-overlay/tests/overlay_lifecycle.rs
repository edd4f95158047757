//! End-to-end lifecycle tests: toggle sequencing, deferred hide timing,
//! stale-effect safety, instance independence, and the shared scroll lock.

use hamnav_dom::{Document, Event, EventOutcome, HIDDEN_ATTR, NodeId, PointerEvent};
use hamnav_overlay::controller::{
    NAV_ATTR, NO_SCROLL_CLASS, OPEN_CLASS, PANEL_REF_ATTR, SHAPE_ATTR, TRIGGER_ATTR,
};
use hamnav_overlay::{InstanceId, OverlayConfig, OverlayController, OverlayState};
use web_time::Duration;

struct Markup {
    trigger: NodeId,
    panel: NodeId,
    link: NodeId,
    backdrop: NodeId,
}

/// One trigger/panel pair: shape wrapper around the trigger, panel with a
/// nav region holding one link, plus a bare backdrop region inside the panel.
fn add_instance(doc: &mut Document, suffix: &str, transition: &str) -> Markup {
    let body = doc.body();
    let wrapper = doc.create_element("div");
    doc.set_attribute(wrapper, SHAPE_ATTR, "circle");
    doc.append_child(body, wrapper);

    let trigger = doc.create_element("button");
    doc.set_attribute(trigger, TRIGGER_ATTR, "");
    doc.set_attribute(trigger, PANEL_REF_ATTR, &format!("overlay-{suffix}"));
    doc.append_child(wrapper, trigger);

    let panel = doc.create_element("div");
    doc.set_id(panel, &format!("overlay-{suffix}"));
    doc.set_attribute(panel, HIDDEN_ATTR, "");
    doc.set_transition_duration(panel, transition);
    doc.append_child(body, panel);

    let backdrop = doc.create_element("div");
    doc.append_child(panel, backdrop);

    let nav = doc.create_element("nav");
    doc.set_attribute(nav, NAV_ATTR, "");
    doc.append_child(panel, nav);
    let link = doc.create_element("a");
    doc.set_attribute(link, "href", "/about");
    doc.append_child(nav, link);

    Markup {
        trigger,
        panel,
        link,
        backdrop,
    }
}

fn only_instance(ctrl: &OverlayController) -> InstanceId {
    ctrl.instances().next().expect("one instance wired")
}

#[test]
fn rapid_double_toggle_settles_closed() {
    let mut doc = Document::new();
    let m = add_instance(&mut doc, "1", "0.6s");
    let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
    let id = only_instance(&ctrl);

    ctrl.toggle(&mut doc, id);
    ctrl.toggle(&mut doc, id);
    ctrl.run_until_idle(&mut doc);

    assert_eq!(ctrl.state(id), OverlayState::Closed);
    assert!(doc.has_attribute(m.panel, HIDDEN_ATTR));
    assert!(!ctrl.is_scroll_locked());
    assert!(!doc.has_class(doc.body(), NO_SCROLL_CLASS));
    // The aborted open's deferred panel focus must not have landed.
    assert_ne!(doc.active_element(), Some(m.link));
}

#[test]
fn reopen_before_hide_drops_stale_hide() {
    let mut doc = Document::new();
    let m = add_instance(&mut doc, "1", "0.6s");
    let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
    let id = only_instance(&ctrl);

    ctrl.open(&mut doc, id);
    ctrl.run_until_idle(&mut doc);
    ctrl.close(&mut doc, id);
    // Re-open before the 650ms hide fires.
    ctrl.advance(&mut doc, Duration::from_millis(100));
    ctrl.open(&mut doc, id);
    ctrl.run_until_idle(&mut doc);

    assert_eq!(ctrl.state(id), OverlayState::Open);
    assert!(!doc.has_attribute(m.panel, HIDDEN_ATTR), "stale hide was dropped");
    assert!(ctrl.is_scroll_locked(), "lock survives the aborted close");
    assert!(doc.has_class(doc.body(), NO_SCROLL_CLASS));
}

#[test]
fn two_instances_are_independent() {
    let mut doc = Document::new();
    let m1 = add_instance(&mut doc, "1", "0.3s");
    let m2 = add_instance(&mut doc, "2", "0.3s");
    let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
    assert_eq!(ctrl.len(), 2);
    let ids: Vec<_> = ctrl.instances().collect();

    ctrl.open(&mut doc, ids[0]);

    assert!(!doc.has_attribute(m1.panel, HIDDEN_ATTR));
    assert!(doc.has_attribute(m2.panel, HIDDEN_ATTR), "other panel untouched");
    assert_eq!(doc.attribute(m2.trigger, "aria-expanded"), Some("false"));
    assert_eq!(ctrl.state(ids[1]), OverlayState::Closed);
}

#[test]
fn scroll_lock_is_reference_counted() {
    let mut doc = Document::new();
    let _m1 = add_instance(&mut doc, "1", "0.1s");
    let _m2 = add_instance(&mut doc, "2", "0.1s");
    let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
    let ids: Vec<_> = ctrl.instances().collect();

    ctrl.open(&mut doc, ids[0]);
    ctrl.open(&mut doc, ids[1]);
    ctrl.run_until_idle(&mut doc);

    ctrl.close(&mut doc, ids[0]);
    ctrl.run_until_idle(&mut doc);
    assert!(ctrl.is_scroll_locked(), "second overlay still open");
    assert!(doc.has_class(doc.body(), NO_SCROLL_CLASS));

    ctrl.close(&mut doc, ids[1]);
    ctrl.run_until_idle(&mut doc);
    assert!(!ctrl.is_scroll_locked());
    assert!(!doc.has_class(doc.body(), NO_SCROLL_CLASS));
}

#[test]
fn trigger_click_toggles_and_is_handled() {
    let mut doc = Document::new();
    let m = add_instance(&mut doc, "1", "0.2s");
    let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
    let id = only_instance(&ctrl);

    let click = Event::Pointer(PointerEvent::new(m.trigger));
    assert_eq!(ctrl.handle_event(&mut doc, &click), EventOutcome::Handled);
    assert_eq!(ctrl.state(id), OverlayState::Open);

    assert_eq!(ctrl.handle_event(&mut doc, &click), EventOutcome::Handled);
    assert_eq!(ctrl.state(id), OverlayState::Closed);
}

#[test]
fn click_outside_nav_region_dismisses() {
    let mut doc = Document::new();
    let m = add_instance(&mut doc, "1", "0.2s");
    let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
    let id = only_instance(&ctrl);

    ctrl.open(&mut doc, id);
    ctrl.run_until_idle(&mut doc);

    let click = Event::Pointer(PointerEvent::new(m.backdrop));
    assert_eq!(ctrl.handle_event(&mut doc, &click), EventOutcome::Ignored);
    // Dismissal starts synchronously even though the outcome stays native.
    assert_eq!(ctrl.state(id), OverlayState::Closed);
    assert_eq!(doc.attribute(m.trigger, "aria-expanded"), Some("false"));
}

#[test]
fn click_inside_nav_region_does_not_dismiss() {
    let mut doc = Document::new();
    let m = add_instance(&mut doc, "1", "0.2s");
    let nav = doc.parent(m.link).unwrap();
    let label = doc.create_element("span");
    doc.append_child(nav, label);
    let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
    let id = only_instance(&ctrl);

    ctrl.open(&mut doc, id);
    ctrl.run_until_idle(&mut doc);

    let click = Event::Pointer(PointerEvent::new(label));
    assert_eq!(ctrl.handle_event(&mut doc, &click), EventOutcome::Ignored);
    assert_eq!(ctrl.state(id), OverlayState::Open);
}

#[test]
fn anchor_click_dismisses_shortly_after() {
    let mut doc = Document::new();
    let m = add_instance(&mut doc, "1", "0.2s");
    let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
    let id = only_instance(&ctrl);

    ctrl.open(&mut doc, id);
    ctrl.run_until_idle(&mut doc);

    let click = Event::Pointer(PointerEvent::new(m.link));
    // Native navigation must proceed, so the click itself stays unhandled.
    assert_eq!(ctrl.handle_event(&mut doc, &click), EventOutcome::Ignored);
    assert_eq!(ctrl.state(id), OverlayState::Open, "close is deferred");

    ctrl.advance(&mut doc, Duration::from_millis(50));
    assert_eq!(ctrl.state(id), OverlayState::Closed);
    ctrl.run_until_idle(&mut doc);
    assert!(doc.has_attribute(m.panel, HIDDEN_ATTR));
    assert!(!ctrl.is_scroll_locked());
}

#[test]
fn escape_closes_every_open_instance() {
    let mut doc = Document::new();
    let m1 = add_instance(&mut doc, "1", "0.1s");
    let m2 = add_instance(&mut doc, "2", "0.1s");
    let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
    let ids: Vec<_> = ctrl.instances().collect();

    ctrl.open(&mut doc, ids[0]);
    ctrl.open(&mut doc, ids[1]);
    ctrl.run_until_idle(&mut doc);

    let escape = Event::Key(hamnav_dom::KeyEvent::new(hamnav_dom::KeyCode::Escape));
    assert_eq!(ctrl.handle_event(&mut doc, &escape), EventOutcome::Handled);
    assert_eq!(ctrl.state(ids[0]), OverlayState::Closed);
    assert_eq!(ctrl.state(ids[1]), OverlayState::Closed);

    ctrl.run_until_idle(&mut doc);
    assert!(doc.has_attribute(m1.panel, HIDDEN_ATTR));
    assert!(doc.has_attribute(m2.panel, HIDDEN_ATTR));
    assert!(!ctrl.is_scroll_locked());
}

#[test]
fn seconds_and_millis_transitions_hide_at_the_same_time() {
    for transition in ["0.6s", "600ms"] {
        let mut doc = Document::new();
        let m = add_instance(&mut doc, "1", transition);
        let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
        let id = only_instance(&ctrl);

        ctrl.open(&mut doc, id);
        ctrl.run_until_idle(&mut doc);
        ctrl.close(&mut doc, id);

        ctrl.advance(&mut doc, Duration::from_millis(649));
        assert!(
            !doc.has_attribute(m.panel, HIDDEN_ATTR),
            "{transition}: hidden early"
        );
        ctrl.advance(&mut doc, Duration::from_millis(1));
        assert!(
            doc.has_attribute(m.panel, HIDDEN_ATTR),
            "{transition}: still visible at 650ms"
        );
    }
}

#[test]
fn open_class_lands_on_the_shape_wrapper() {
    let mut doc = Document::new();
    let _m = add_instance(&mut doc, "1", "0.2s");
    let mut ctrl = OverlayController::wire(&mut doc, OverlayConfig::default());
    let id = only_instance(&ctrl);
    let wrapper = ctrl.state_target(id);
    assert_ne!(wrapper, doc.body());

    ctrl.open(&mut doc, id);
    assert!(doc.has_class(wrapper, OPEN_CLASS));
    assert!(!doc.has_class(doc.body(), OPEN_CLASS));

    ctrl.close(&mut doc, id);
    assert!(!doc.has_class(wrapper, OPEN_CLASS));
}
