#![forbid(unsafe_code)]

//! Focusable-element queries and Tab-wrap trapping.
//!
//! The focusable set is always computed on demand, in document order, at the
//! moment Tab handling (or open-time initial focus) needs it — never cached
//! across panel mutations. An empty set is a valid state: focus operations
//! degrade to no-ops and the trap has nothing to do.

use hamnav_dom::{Document, NodeId};

/// Tags that are natively focusable without a `tabindex`.
const NATIVE_FOCUSABLE_TAGS: &[&str] = &["button", "input", "textarea", "select", "details"];

/// Whether an element is eligible for keyboard focus.
///
/// Mirrors the selector
/// `a, button, input, textarea, select, details, [tabindex]:not([tabindex="-1"])`
/// with the usual carve-outs: anchors need an `href`, disabled controls are
/// out, and so is anything detached or inside a hidden subtree.
pub fn is_focusable(doc: &Document, node: NodeId) -> bool {
    if doc.is_disabled(node) || !doc.is_attached(node) || doc.in_hidden_subtree(node) {
        return false;
    }
    if let Some(tabindex) = doc.attribute(node, "tabindex") {
        return tabindex.trim().parse::<i32>().is_ok_and(|t| t >= 0);
    }
    let tag = doc.tag(node);
    if tag == "a" {
        return doc.has_attribute(node, "href");
    }
    NATIVE_FOCUSABLE_TAGS.contains(&tag)
}

/// The ordered sequence of focusable elements inside `panel`, in document
/// order, excluding `panel` itself.
pub fn focusable_set(doc: &Document, panel: NodeId) -> Vec<NodeId> {
    doc.descendants(panel)
        .into_iter()
        .filter(|&n| is_focusable(doc, n))
        .collect()
}

/// What a Tab press should do given the current focusable set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabDisposition {
    /// Focus wraps forward to this element; suppress the native Tab.
    WrapTo(NodeId),

    /// Leave the press to native behavior.
    Native,
}

/// Decide Tab handling for a trapped panel.
///
/// Wraps only at the edges: `Shift+Tab` on the first element goes to the
/// last, `Tab` on the last goes to the first. Everything else — including an
/// empty set or focus outside the set — stays native.
pub fn tab_disposition(set: &[NodeId], active: Option<NodeId>, shift: bool) -> TabDisposition {
    let (Some(&first), Some(&last)) = (set.first(), set.last()) else {
        return TabDisposition::Native;
    };
    match active {
        Some(node) if shift && node == first => TabDisposition::WrapTo(last),
        Some(node) if !shift && node == last => TabDisposition::WrapTo(first),
        _ => TabDisposition::Native,
    }
}
