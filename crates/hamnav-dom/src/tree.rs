#![forbid(unsafe_code)]

//! Element tree: structure, attributes, classes, focus.
//!
//! A [`Document`] is an arena of elements rooted at a synthetic `body`. It
//! models the slice of a live document the overlay controller actually
//! touches: id lookup, attribute and class mutation, ancestor walks, and an
//! active (focused) element.
//!
//! # Invariants
//!
//! - Node ids are never reused within one `Document`; detaching a node keeps
//!   its id valid but unreachable from the body.
//! - `hidden` is an ordinary attribute; visibility is attribute presence,
//!   nothing more.
//! - Focusing a detached, disabled, or hidden-subtree element is a silent
//!   no-op (degraded input, never an error).

use ahash::AHashMap;
use web_time::Duration;

use crate::style::parse_transition_duration;

/// The `hidden` attribute name.
pub const HIDDEN_ATTR: &str = "hidden";

/// Identifier for a node in a [`Document`].
///
/// Plain 32-bit index; documents never free slots, so no generation counter
/// is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Node {
    tag: String,
    id: Option<String>,
    attrs: AHashMap<String, String>,
    classes: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    disabled: bool,
    transition_duration: Option<String>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            attrs: AHashMap::new(),
            classes: Vec::new(),
            parent: None,
            children: Vec::new(),
            disabled: false,
            transition_duration: None,
        }
    }
}

/// An element tree rooted at a synthetic `body`.
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    ids: AHashMap<String, NodeId>,
    active: Option<NodeId>,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the body.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            body: NodeId(0),
            ids: AHashMap::new(),
            active: None,
        };
        doc.body = doc.alloc(Node::new("body"));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("document node count fits in u32"));
        self.nodes.push(node);
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.idx()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.idx()]
    }

    /// The body element.
    #[inline]
    pub fn body(&self) -> NodeId {
        self.body
    }

    // --- Structure ---

    /// Create a detached element with the given tag name.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::new(tag))
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert_ne!(parent, child, "element cannot be its own child");
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Remove `node` from its parent's child list. The node stays valid but
    /// becomes unreachable from the body. Focus moves off a detached subtree.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.node(node).parent {
            self.node_mut(parent).children.retain(|&c| c != node);
            self.node_mut(node).parent = None;
        }
        if let Some(active) = self.active
            && self.contains(node, active)
            && !self.is_attached(active)
        {
            self.active = None;
        }
    }

    /// The node's parent, if attached.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// The node's children, in document order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// The node's tag name.
    pub fn tag(&self, node: NodeId) -> &str {
        &self.node(node).tag
    }

    /// Whether `node` is reachable from the body.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == self.body {
                return true;
            }
            match self.node(cur).parent {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    /// Whether `node` is `ancestor` or a descendant of it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == ancestor {
                return true;
            }
            match self.node(cur).parent {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    /// Nearest self-or-ancestor matching `pred`.
    pub fn closest(&self, node: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if pred(self, n) {
                return Some(n);
            }
            cur = self.node(n).parent;
        }
        None
    }

    /// Descendants of `node` in document (pre-order) order, excluding `node`
    /// itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(node).children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.node(n).children.iter().rev());
        }
        out
    }

    // --- Ids ---

    /// Assign an id, replacing any previous one. Later assignments win the
    /// index slot, matching last-writer behavior for duplicate ids.
    pub fn set_id(&mut self, node: NodeId, id: &str) {
        if let Some(old) = self.node_mut(node).id.take() {
            self.ids.remove(&old);
        }
        self.node_mut(node).id = Some(id.to_string());
        self.ids.insert(id.to_string(), node);
    }

    /// Look up an element by id.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    // --- Attributes ---

    /// Set an attribute value.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.node_mut(node)
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    /// Remove an attribute. No-op when absent.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.node_mut(node).attrs.remove(name);
    }

    /// Read an attribute value.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).attrs.get(name).map(String::as_str)
    }

    /// Whether the attribute is present (any value, including empty).
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.node(node).attrs.contains_key(name)
    }

    // --- Classes ---

    /// Add a class. No-op when already present.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let classes = &mut self.node_mut(node).classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    /// Remove a class. No-op when absent.
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.node_mut(node).classes.retain(|c| c != class);
    }

    /// Whether the class is present.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).classes.iter().any(|c| c == class)
    }

    // --- Disabled state ---

    /// Mark a form control disabled (ineligible for focus).
    pub fn set_disabled(&mut self, node: NodeId, disabled: bool) {
        self.node_mut(node).disabled = disabled;
    }

    /// Whether the element is disabled.
    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.node(node).disabled
    }

    // --- Visibility ---

    /// Whether `node` or any ancestor carries the `hidden` attribute.
    pub fn in_hidden_subtree(&self, node: NodeId) -> bool {
        self.closest(node, |doc, n| doc.has_attribute(n, HIDDEN_ATTR))
            .is_some()
    }

    /// Commit pending layout, returning the number of attached elements.
    ///
    /// Models the synchronous layout read a host performs between unhiding an
    /// element and starting a transition on it (`void el.offsetWidth`). Here
    /// the tree is always consistent, so this is an observation point only.
    pub fn commit_layout(&self) -> usize {
        1 + self.descendants(self.body).len()
    }

    // --- Focus ---

    /// The currently focused element, if any.
    pub fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    /// Move focus to `node`.
    ///
    /// Silent no-op when the target is detached, disabled, or inside a
    /// hidden subtree; the previous focus is kept.
    pub fn focus(&mut self, node: NodeId) {
        if self.is_attached(node) && !self.is_disabled(node) && !self.in_hidden_subtree(node) {
            self.active = Some(node);
        }
    }

    /// Clear focus (as when the host blurs everything).
    pub fn blur(&mut self) {
        self.active = None;
    }

    // --- Computed style ---

    /// Set the element's `transition-duration` style string, e.g. `"0.6s"`.
    pub fn set_transition_duration(&mut self, node: NodeId, value: &str) {
        self.node_mut(node).transition_duration = Some(value.to_string());
    }

    /// The element's computed transition duration, if declared and parsable.
    pub fn computed_transition_duration(&self, node: NodeId) -> Option<Duration> {
        self.node(node)
            .transition_duration
            .as_deref()
            .and_then(parse_transition_duration)
    }
}
