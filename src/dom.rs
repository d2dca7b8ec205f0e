//! Arena-backed HTML tree used by every rewriting stage.
//!
//! ## Why an arena?
//!
//! The pipeline constantly asks sibling- and ancestor-relative questions
//! ("first list after this heading", "is the next element an image?",
//! "replace this text node by three nodes"). Storing nodes in a `Vec` and
//! referring to them by [`NodeId`] keeps parent and ordered child lists as
//! plain indices, so those questions are index arithmetic and no node ever
//! owns a pointer to another.
//!
//! Detached nodes stay in the arena until the [`Dom`] is dropped; only nodes
//! reachable from [`Dom::root`] are visited or serialised.
//!
//! Parsing delegates to `scraper` (html5ever underneath), after which the
//! parsed tree is copied into the arena once. Serialisation is done here.

use scraper::{ElementRef, Html, Node};

/// Tag of the synthetic element holding a parsed fragment.
pub const ROOT_TAG: &str = "#root";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Index of a node inside its [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element: lower-case tag name plus attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable HTML fragment.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// An empty fragment.
    pub fn new() -> Self {
        let root = NodeData {
            kind: NodeKind::Element(Element::new(ROOT_TAG)),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// Parse an HTML fragment (body context). Comments and doctypes are dropped.
    pub fn parse_fragment(html: &str) -> Self {
        let parsed = Html::parse_fragment(html);
        let mut dom = Self::new();
        let root = dom.root;
        dom.import(root, parsed.root_element());
        dom
    }

    fn import(&mut self, parent: NodeId, source: ElementRef<'_>) {
        for child in source.children() {
            match child.value() {
                Node::Text(text) => {
                    let id = self.create_text(&**text);
                    self.append(parent, id);
                }
                Node::Element(el) => {
                    let id = self.create_element(el.name());
                    if let Some(NodeKind::Element(element)) = self.kind_mut(id) {
                        element.attrs = el
                            .attrs()
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .collect();
                    }
                    self.append(parent, id);
                    if let Some(child_ref) = ElementRef::wrap(child) {
                        self.import(id, child_ref);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ── Construction ─────────────────────────────────────────────────────

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag)))
    }

    /// Create an element with the given attributes.
    pub fn create_element_with(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut element = Element::new(tag);
        element.attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.push(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    // ── Node access ──────────────────────────────────────────────────────

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.nodes.get_mut(id.0).map(|n| &mut n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.kind_mut(id) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    /// Text content of a text node (not of an element; see [`Dom::text_content`]).
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(NodeKind::Text(t)) = self.kind_mut(id) {
            *t = text.into();
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn is_one_of(&self, id: NodeId, tags: &[&str]) -> bool {
        self.tag(id).is_some_and(|t| tags.contains(&t))
    }

    /// Rename an element in place.
    pub fn set_tag(&mut self, id: NodeId, tag: &str) {
        if let Some(el) = self.element_mut(id) {
            el.tag = tag.to_string();
        }
    }

    // ── Attributes ───────────────────────────────────────────────────────

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(el) = self.element_mut(id) {
            match el.attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value,
                None => el.attrs.push((name.to_string(), value)),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.retain(|(k, _)| k != name);
        }
    }

    pub fn clear_attrs(&mut self, id: NodeId) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.clear();
        }
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    // ── Structure queries ────────────────────────────────────────────────

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Element children only.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
            .collect()
    }

    /// First direct child element with the given tag.
    pub fn child_by_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children(id).iter().copied().find(|&c| self.is_tag(c, tag))
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Siblings after `id`, in document order.
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match (self.parent(id), self.index_in_parent(id)) {
            (Some(parent), Some(idx)) => self.children(parent)[idx + 1..].to_vec(),
            _ => Vec::new(),
        }
    }

    /// The next sibling that is an element, skipping text nodes.
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.following_siblings(id)
            .into_iter()
            .find(|&s| self.element(s).is_some())
    }

    /// The previous sibling that is an element, skipping text nodes.
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        self.children(parent)[..idx]
            .iter()
            .rev()
            .copied()
            .find(|&s| self.element(s).is_some())
    }

    /// Closest ancestor (excluding `id` itself) satisfying `pred`.
    pub fn ancestor_where(&self, id: NodeId, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if pred(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Pre-order descendants of `id` (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// All attached elements whose tag is in `tags`, in document order.
    pub fn select(&self, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| self.is_one_of(n, tags))
            .collect()
    }

    /// Descendant elements of `id` whose tag is in `tags`, in document order.
    pub fn select_within(&self, id: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_one_of(n, tags))
            .collect()
    }

    /// All attached text nodes, in document order.
    pub fn text_nodes(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| self.text(n).is_some())
            .collect()
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Whether `id` is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────────

    /// Remove `id` from its parent. The node and its subtree stay intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0].children.retain(|&c| c != id);
            self.nodes[id.0].parent = None;
        }
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` at `index` in `parent`'s children (clamped to the end).
    pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `node` directly after `anchor`. No-op if `anchor` is detached.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        if let (Some(parent), Some(idx)) = (self.parent(anchor), self.index_in_parent(anchor)) {
            self.insert_at(parent, idx + 1, node);
        }
    }

    /// Insert `node` directly before `anchor`. No-op if `anchor` is detached.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) {
        if let (Some(parent), Some(idx)) = (self.parent(anchor), self.index_in_parent(anchor)) {
            self.insert_at(parent, idx, node);
        }
    }

    /// Replace `old` by the sequence `new_nodes`, at the same index.
    ///
    /// `new_nodes` may already be attached anywhere, including as siblings of
    /// `old`; they are detached before `old`'s index is taken.
    pub fn splice(&mut self, old: NodeId, new_nodes: &[NodeId]) {
        if self.parent(old).is_none() {
            return;
        }
        for &n in new_nodes.iter().filter(|&&n| n != old) {
            self.detach(n);
        }
        let (Some(parent), Some(idx)) = (self.parent(old), self.index_in_parent(old)) else {
            return;
        };
        self.nodes[parent.0].children.splice(idx..=idx, new_nodes.iter().copied());
        for &n in new_nodes {
            self.nodes[n.0].parent = Some(parent);
        }
        if !new_nodes.contains(&old) {
            self.nodes[old.0].parent = None;
        }
    }

    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        self.splice(old, &[new]);
    }

    /// Hoist the children of `id` into its position and drop `id`.
    pub fn unwrap(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        self.splice(id, &children);
        self.nodes[id.0].children.clear();
    }

    /// Put `wrapper` at the position of `id` and move `id` inside it.
    pub fn wrap(&mut self, id: NodeId, wrapper: NodeId) {
        if self.parent(id).is_none() {
            return;
        }
        self.replace(id, wrapper);
        self.append(wrapper, id);
    }

    /// Drop every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
    }

    /// Replace the children of `id` by a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: impl Into<String>) {
        self.clear_children(id);
        let t = self.create_text(text);
        self.append(id, t);
    }

    /// Replace an element by a text node holding its text content.
    pub fn flatten_to_text(&mut self, id: NodeId) {
        let text = self.text_content(id);
        let node = self.create_text(text);
        self.replace(id, node);
    }

    // ── Serialisation ────────────────────────────────────────────────────

    /// Outer HTML of `id`.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    /// Inner HTML of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let raw = self.is_one_of(id, RAW_TEXT_ELEMENTS);
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, raw, &mut out);
        }
        out
    }

    /// Serialise the whole fragment.
    pub fn to_html(&self) -> String {
        self.inner_html(self.root)
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(t)) => {
                if raw_text {
                    out.push_str(t);
                } else {
                    out.push_str(&html_escape::encode_text(t));
                }
            }
            Some(NodeKind::Element(el)) => {
                out.push('<');
                out.push_str(&el.tag);
                for (k, v) in &el.attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(v));
                    out.push('"');
                }
                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                let raw = RAW_TEXT_ELEMENTS.contains(&el.tag.as_str());
                for &child in self.children(id) {
                    self.write_node(child, raw, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
            None => {}
        }
    }
}
