#![forbid(unsafe_code)]

//! The overlay disclosure state machine.
//!
//! [`OverlayController::wire`] discovers every trigger/panel pair in the host
//! document and owns their lifecycle from then on. Per instance:
//!
//! - `open()` captures focus, unhides the panel, commits layout before
//!   flipping the open class (so the transition runs instead of snapping),
//!   acquires the shared scroll lock, updates the trigger's accessible state,
//!   and defers initial panel focus.
//! - `close()` flips the class and accessible state synchronously, then
//!   defers the actual hide and the focus restore past the panel's computed
//!   transition duration.
//! - `toggle()` derives open/closed from the panel's `hidden` attribute, so
//!   it survives external mutation, and re-syncs the tracked state when the
//!   two disagree.
//!
//! # Invariants
//!
//! 1. State transitions happen only through `open`/`close`; the tracked
//!    [`OverlayState`] is the source of truth, the hidden attribute only a
//!    cross-check in `toggle`.
//! 2. Every `open`/`close` bumps the instance epoch; deferred effects carry
//!    the epoch that scheduled them and are dropped when stale, so rapid
//!    re-toggling can neither focus a hidden panel nor hide a re-opened one.
//! 3. The body scroll lock is reference-counted across instances: closing
//!    one of two open overlays does not release it.
//! 4. `lastFocusedBeforeOpen` is set on open and consumed exactly once, at
//!    close time.
//!
//! # Failure Modes
//!
//! All degraded inputs are silent no-ops: a trigger without a resolvable
//! panel is skipped at wiring, an empty focusable set leaves focus alone,
//! and a focus-restore target that went away falls back to the trigger.

use hamnav_dom::{
    Document, Event, EventOutcome, HIDDEN_ATTR, KeyCode, KeyEvent, NodeId, PointerEvent,
};
use web_time::Duration;

use crate::config::{FallbackPolicy, OverlayConfig};
use crate::focus::{TabDisposition, focusable_set, is_focusable, tab_disposition};
use crate::schedule::Scheduler;

/// Marker attribute identifying a trigger element.
pub const TRIGGER_ATTR: &str = "data-overlay-toggle";

/// Trigger attribute naming the panel's id.
pub const PANEL_REF_ATTR: &str = "aria-controls";

/// Marker attribute on the ancestor that records open/closed state.
pub const SHAPE_ATTR: &str = "data-open-shape";

/// Marker attribute on the panel's navigation region, exempt from
/// click-outside dismissal.
pub const NAV_ATTR: &str = "data-overlay-nav";

/// Class applied to the state target while open.
pub const OPEN_CLASS: &str = "open";

/// Class applied to the body while any overlay is open.
pub const NO_SCROLL_CLASS: &str = "no-scroll";

/// Class applied to wired panels when the hue animation is disabled.
pub const HUE_OFF_CLASS: &str = "hue-off";

const EXPANDED_ATTR: &str = "aria-expanded";
const LABEL_ATTR: &str = "aria-label";

/// Delay before moving focus into a freshly opened panel.
const FOCUS_DELAY: Duration = Duration::from_millis(50);

/// Slack added to the transition duration before hiding a closing panel.
const HIDE_SLACK: Duration = Duration::from_millis(50);

/// Additional delay before restoring focus after the hide.
const RESTORE_SLACK: Duration = Duration::from_millis(10);

/// Delay before closing after an anchor inside the panel is activated,
/// letting the navigation proceed first.
const ACTIVATE_CLOSE_DELAY: Duration = Duration::from_millis(50);

/// Open/closed state of one overlay instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayState {
    /// Panel hidden, trigger collapsed.
    #[default]
    Closed,
    /// Panel visible, focus trapped inside it.
    Open,
}

/// Handle to one wired trigger/panel pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

type Epoch = u64;

#[derive(Debug)]
struct Instance {
    trigger: NodeId,
    panel: NodeId,
    state_target: NodeId,
    state: OverlayState,
    epoch: Epoch,
    last_focused: Option<NodeId>,
    holds_scroll_lock: bool,
}

#[derive(Debug)]
struct Pending {
    instance: usize,
    epoch: Epoch,
    effect: Effect,
}

#[derive(Debug, Clone, Copy)]
enum Effect {
    /// Move focus to the first focusable element in the panel.
    FocusFirst,
    /// Re-hide the panel and release this instance's scroll lock.
    HidePanel,
    /// Restore focus to the captured element, or the trigger as fallback.
    RestoreFocus(Option<NodeId>),
    /// Close after an anchor activation has had time to proceed.
    CloseAfterActivate,
}

/// Controller owning every overlay instance discovered in one document.
#[derive(Debug)]
pub struct OverlayController {
    config: OverlayConfig,
    instances: Vec<Instance>,
    scheduler: Scheduler<Pending>,
    scroll_locks: usize,
}

impl OverlayController {
    /// Discover and wire every trigger in `doc`.
    ///
    /// A trigger is any element carrying [`TRIGGER_ATTR`] whose
    /// [`PANEL_REF_ATTR`] resolves to an element id. Triggers with no
    /// resolvable panel are skipped silently; template authors may add
    /// markup before completing the pairing. The state target is the nearest
    /// [`SHAPE_ATTR`] ancestor, or per [`FallbackPolicy`] the body.
    ///
    /// Wiring normalizes each trigger to the collapsed accessible state and
    /// applies [`HUE_OFF_CLASS`] to panels when the configuration disables
    /// the hue animation.
    pub fn wire(doc: &mut Document, config: OverlayConfig) -> Self {
        let body = doc.body();
        let mut instances = Vec::new();

        for node in doc.descendants(body) {
            if !doc.has_attribute(node, TRIGGER_ATTR) {
                continue;
            }
            let Some(panel_id) = doc.attribute(node, PANEL_REF_ATTR).map(str::to_string) else {
                tracing::debug!(trigger = ?node, "trigger without panel reference, skipping");
                continue;
            };
            let Some(panel) = doc.get_element_by_id(&panel_id) else {
                tracing::debug!(trigger = ?node, panel_id = %panel_id, "panel id unresolved, skipping");
                continue;
            };
            let wrapper = doc.closest(node, |d, n| d.has_attribute(n, SHAPE_ATTR));
            let state_target = match (wrapper, config.fallback_policy) {
                (Some(w), _) => w,
                (None, FallbackPolicy::Permissive) => body,
                (None, FallbackPolicy::Strict) => {
                    tracing::debug!(trigger = ?node, "no shape wrapper under strict policy, skipping");
                    continue;
                }
            };

            if !config.hue_anim_default {
                doc.add_class(panel, HUE_OFF_CLASS);
            }
            doc.set_attribute(node, EXPANDED_ATTR, "false");
            doc.set_attribute(node, LABEL_ATTR, &config.open_label);

            instances.push(Instance {
                trigger: node,
                panel,
                state_target,
                state: OverlayState::Closed,
                epoch: 0,
                last_focused: None,
                holds_scroll_lock: false,
            });
        }

        Self {
            config,
            instances,
            scheduler: Scheduler::new(),
            scroll_locks: 0,
        }
    }

    // --- Queries ---

    /// Number of wired instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instances were wired.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Ids of all wired instances, in document order of their triggers.
    pub fn instances(&self) -> impl Iterator<Item = InstanceId> + '_ {
        (0..self.instances.len()).map(InstanceId)
    }

    /// The instance whose trigger is (or contains) `node`, if any.
    pub fn instance_for_trigger(&self, doc: &Document, node: NodeId) -> Option<InstanceId> {
        self.instances
            .iter()
            .position(|i| doc.contains(i.trigger, node))
            .map(InstanceId)
    }

    /// Tracked state of an instance.
    pub fn state(&self, id: InstanceId) -> OverlayState {
        self.instances[id.0].state
    }

    /// The instance's trigger element.
    pub fn trigger(&self, id: InstanceId) -> NodeId {
        self.instances[id.0].trigger
    }

    /// The instance's panel element.
    pub fn panel(&self, id: InstanceId) -> NodeId {
        self.instances[id.0].panel
    }

    /// The element the open class is recorded on.
    pub fn state_target(&self, id: InstanceId) -> NodeId {
        self.instances[id.0].state_target
    }

    /// Whether any instance currently holds the body scroll lock.
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locks > 0
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Number of deferred effects not yet delivered.
    pub fn pending_effects(&self) -> usize {
        self.scheduler.pending()
    }

    /// The active configuration.
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    // --- Transitions ---

    /// Transition `Closed → Open`.
    ///
    /// No-op when the instance is already open and visible.
    pub fn open(&mut self, doc: &mut Document, id: InstanceId) {
        let idx = id.0;
        let (trigger, panel, state_target) = {
            let inst = &self.instances[idx];
            if inst.state == OverlayState::Open && !doc.has_attribute(inst.panel, HIDDEN_ATTR) {
                return;
            }
            (inst.trigger, inst.panel, inst.state_target)
        };

        let last_focused = doc.active_element();

        // Unhide first, then commit layout, then flip the class: the host
        // must observe the visible panel before the class change or the
        // transition snaps.
        doc.remove_attribute(panel, HIDDEN_ATTR);
        let _ = doc.commit_layout();
        doc.add_class(state_target, OPEN_CLASS);

        if !self.instances[idx].holds_scroll_lock {
            self.acquire_scroll_lock(doc);
            self.instances[idx].holds_scroll_lock = true;
        }

        doc.set_attribute(trigger, EXPANDED_ATTR, "true");
        doc.set_attribute(trigger, LABEL_ATTR, &self.config.close_label);

        let inst = &mut self.instances[idx];
        inst.state = OverlayState::Open;
        inst.last_focused = last_focused;
        inst.epoch += 1;
        let epoch = inst.epoch;

        self.scheduler.schedule(
            FOCUS_DELAY,
            Pending {
                instance: idx,
                epoch,
                effect: Effect::FocusFirst,
            },
        );
    }

    /// Transition `Open → Closed`.
    ///
    /// The accessible state flips synchronously; the hide and the focus
    /// restore are deferred past the panel's computed transition duration.
    /// No-op when the instance is already closed and hidden.
    pub fn close(&mut self, doc: &mut Document, id: InstanceId) {
        let idx = id.0;
        let (trigger, panel, state_target) = {
            let inst = &self.instances[idx];
            if inst.state == OverlayState::Closed && doc.has_attribute(inst.panel, HIDDEN_ATTR) {
                return;
            }
            (inst.trigger, inst.panel, inst.state_target)
        };

        doc.remove_class(state_target, OPEN_CLASS);
        doc.set_attribute(trigger, EXPANDED_ATTR, "false");
        doc.set_attribute(trigger, LABEL_ATTR, &self.config.open_label);

        let hide_delay = self.hide_delay(doc, panel);

        let inst = &mut self.instances[idx];
        inst.state = OverlayState::Closed;
        inst.epoch += 1;
        let epoch = inst.epoch;
        let restore_target = inst.last_focused.take();

        self.scheduler.schedule(
            hide_delay,
            Pending {
                instance: idx,
                epoch,
                effect: Effect::HidePanel,
            },
        );
        self.scheduler.schedule(
            hide_delay + RESTORE_SLACK,
            Pending {
                instance: idx,
                epoch,
                effect: Effect::RestoreFocus(restore_target),
            },
        );
    }

    /// Toggle based on the panel's visible state.
    ///
    /// Visibility is derived from the hidden attribute rather than the
    /// tracked enum, so external mutation of the panel cannot wedge the
    /// instance; a divergence is logged and re-synced before dispatch.
    pub fn toggle(&mut self, doc: &mut Document, id: InstanceId) {
        let idx = id.0;
        let (panel, tracked) = {
            let inst = &self.instances[idx];
            (inst.panel, inst.state)
        };
        let derived = if doc.has_attribute(panel, HIDDEN_ATTR) {
            OverlayState::Closed
        } else {
            OverlayState::Open
        };
        if derived != tracked {
            tracing::debug!(?tracked, ?derived, "tracked state diverged from panel visibility");
            self.instances[idx].state = derived;
        }
        match derived {
            OverlayState::Open => self.close(doc, id),
            OverlayState::Closed => self.open(doc, id),
        }
    }

    // --- Event routing ---

    /// Route a document-level event to the instances it concerns.
    ///
    /// Returns [`EventOutcome::Handled`] when the host must suppress the
    /// native default action. Side effects may be scheduled even for
    /// `Ignored` outcomes (anchor-activation dismissal).
    pub fn handle_event(&mut self, doc: &mut Document, event: &Event) -> EventOutcome {
        match event {
            Event::Key(key) => self.handle_key(doc, *key),
            Event::Pointer(pointer) => self.handle_pointer(doc, *pointer),
        }
    }

    fn handle_key(&mut self, doc: &mut Document, key: KeyEvent) -> EventOutcome {
        match key.code {
            KeyCode::Escape => {
                let open: Vec<usize> = (0..self.instances.len())
                    .filter(|&i| self.instances[i].state == OverlayState::Open)
                    .collect();
                if open.is_empty() {
                    return EventOutcome::Ignored;
                }
                for idx in open {
                    self.close(doc, InstanceId(idx));
                }
                EventOutcome::Handled
            }
            KeyCode::Tab => {
                for idx in 0..self.instances.len() {
                    if self.instances[idx].state != OverlayState::Open {
                        continue;
                    }
                    let set = focusable_set(doc, self.instances[idx].panel);
                    if let TabDisposition::WrapTo(target) =
                        tab_disposition(&set, doc.active_element(), key.shift())
                    {
                        doc.focus(target);
                        return EventOutcome::Handled;
                    }
                }
                EventOutcome::Ignored
            }
            _ => EventOutcome::Ignored,
        }
    }

    fn handle_pointer(&mut self, doc: &mut Document, pointer: PointerEvent) -> EventOutcome {
        let target = pointer.target;

        if let Some(id) = self.instance_for_trigger(doc, target) {
            self.toggle(doc, id);
            return EventOutcome::Handled;
        }

        for idx in 0..self.instances.len() {
            let (panel, state) = {
                let inst = &self.instances[idx];
                (inst.panel, inst.state)
            };
            if state != OverlayState::Open || !doc.contains(panel, target) {
                continue;
            }

            // Clicks outside the navigation region dismiss immediately.
            let in_nav = doc
                .closest(target, |d, n| d.has_attribute(n, NAV_ATTR))
                .is_some();
            if !in_nav {
                self.close(doc, InstanceId(idx));
            }

            // Anchor activation dismisses shortly after, so the navigation
            // proceeds before the layout is torn down.
            if doc.closest(target, |d, n| d.tag(n) == "a").is_some() {
                let epoch = self.instances[idx].epoch;
                self.scheduler.schedule(
                    ACTIVATE_CLOSE_DELAY,
                    Pending {
                        instance: idx,
                        epoch,
                        effect: Effect::CloseAfterActivate,
                    },
                );
            }
            return EventOutcome::Ignored;
        }

        EventOutcome::Ignored
    }

    // --- Timer pump ---

    /// Advance the virtual clock by `dt`, delivering every deferred effect
    /// that comes due, in order, at its own due time.
    pub fn advance(&mut self, doc: &mut Document, dt: Duration) {
        let target = self.scheduler.now() + dt;
        while let Some(due) = self.scheduler.next_due() {
            if due > target {
                break;
            }
            let step = due - self.scheduler.now();
            let fired = self.scheduler.advance(step);
            for pending in fired {
                self.apply(doc, pending);
            }
        }
        let rest = target - self.scheduler.now();
        let _ = self.scheduler.advance(rest);
    }

    /// Deliver every pending effect, advancing the clock as far as needed.
    pub fn run_until_idle(&mut self, doc: &mut Document) {
        while let Some(due) = self.scheduler.next_due() {
            let step = due - self.scheduler.now();
            let fired = self.scheduler.advance(step);
            for pending in fired {
                self.apply(doc, pending);
            }
        }
    }

    fn apply(&mut self, doc: &mut Document, pending: Pending) {
        let idx = pending.instance;
        let (trigger, panel, state, epoch) = {
            let inst = &self.instances[idx];
            (inst.trigger, inst.panel, inst.state, inst.epoch)
        };
        if pending.epoch != epoch {
            tracing::trace!(instance = idx, "dropping stale deferred effect");
            return;
        }
        match pending.effect {
            Effect::FocusFirst => {
                if let Some(&first) = focusable_set(doc, panel).first() {
                    doc.focus(first);
                }
            }
            Effect::HidePanel => {
                doc.set_attribute(panel, HIDDEN_ATTR, "");
                if self.instances[idx].holds_scroll_lock {
                    self.instances[idx].holds_scroll_lock = false;
                    self.release_scroll_lock(doc);
                }
            }
            Effect::RestoreFocus(restore_target) => match restore_target {
                Some(node) if is_focusable(doc, node) => doc.focus(node),
                _ => doc.focus(trigger),
            },
            Effect::CloseAfterActivate => {
                if state == OverlayState::Open {
                    self.close(doc, InstanceId(idx));
                }
            }
        }
    }

    // --- Helpers ---

    fn hide_delay(&self, doc: &Document, panel: NodeId) -> Duration {
        let base = doc
            .computed_transition_duration(panel)
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| self.config.default_transition());
        base + HIDE_SLACK
    }

    fn acquire_scroll_lock(&mut self, doc: &mut Document) {
        if self.scroll_locks == 0 {
            let body = doc.body();
            doc.add_class(body, NO_SCROLL_CLASS);
        }
        self.scroll_locks += 1;
    }

    fn release_scroll_lock(&mut self, doc: &mut Document) {
        self.scroll_locks = self.scroll_locks.saturating_sub(1);
        if self.scroll_locks == 0 {
            let body = doc.body();
            doc.remove_class(body, NO_SCROLL_CLASS);
        }
    }
}
