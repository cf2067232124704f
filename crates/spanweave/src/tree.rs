//! The fragment forest the engine annotates.
//!
//! Hosts build and edit the tree through the `append_*`, `set_text` and
//! `remove` methods. The engine only ever splits fragments, wraps and unwraps
//! nodes, merges its own split pieces back together and attaches [`Marker`]s.
//! Every mutation bumps [`Tree::mutation_count`], which is what the
//! idempotence guarantees are stated against.
use core::fmt;

use crate::error::TreeError;

/// Handle of a node inside a [`Tree`].
///
/// Ids are never reused, so a handle to a removed node stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Slot of this node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural capability of an element.
///
/// Exclusion rules are decided by these roles on ancestors, never by looking
/// at the text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Plain grouping element.
    Container,
    /// Verbatim content (code, preformatted text). Never annotated.
    Verbatim,
    /// A host quotation element. Labeled in place by the quote pass.
    Quote,
    /// A container whose text is exploded into per-grapheme [`Role::Unit`]s.
    Typewriter,
    /// One atomic animation unit holding a single grapheme cluster.
    Unit,
    /// Structure introduced by the engine around a span.
    Wrapper,
}

/// The classification pass that owns a [`Marker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pass {
    /// Quotation labeling.
    Quote,
    /// Typewriter unit explosion.
    Typewriter,
    /// Custom delimited ranges.
    Delimiter,
    /// Locale font runs.
    Locale,
}

impl Pass {
    /// Lowercase name used in logs and reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Pass::Quote => "quote",
            Pass::Typewriter => "typewriter",
            Pass::Delimiter => "delimiter",
            Pass::Locale => "locale",
        }
    }
}

/// How a marker was materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// A [`Role::Wrapper`] element was introduced around the range.
    Wrap,
    /// An existing element was tagged in place.
    Mark,
}

/// Engine-owned state attached to an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Marker {
    /// Owning pass.
    pub pass: Pass,
    /// Wrapper or in-place mark.
    pub kind: MarkerKind,
    /// Classification label, such as `dialogue` or `cjk`.
    pub tag: String,
}

impl Marker {
    /// Marker for a wrapper introduced by `pass`.
    #[must_use]
    pub fn wrap(pass: Pass, tag: impl Into<String>) -> Self {
        Self {
            pass,
            kind: MarkerKind::Wrap,
            tag: tag.into(),
        }
    }

    /// Marker for an existing element tagged by `pass`.
    #[must_use]
    pub fn mark(pass: Pass, tag: impl Into<String>) -> Self {
        Self {
            pass,
            kind: MarkerKind::Mark,
            tag: tag.into(),
        }
    }
}

/// An element node: a role plus the markers attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Structural role.
    pub role: Role,
    markers: Vec<Marker>,
}

impl Element {
    /// Unmarked element with `role`.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            markers: Vec::new(),
        }
    }

    /// Attached markers, at most one per pass.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Marker owned by `pass`, if any.
    #[must_use]
    pub fn marker(&self, pass: Pass) -> Option<&Marker> {
        self.markers.iter().find(|m| m.pass == pass)
    }
}

/// A text leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    text: String,
    /// Set on the right-hand piece of an engine split; clearing merges such a
    /// piece back into its left neighbour.
    split_off: bool,
}

impl Fragment {
    /// The fragment text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether an engine split produced this fragment.
    #[must_use]
    pub fn is_split_piece(&self) -> bool {
        self.split_off
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Element(Element),
    Text(Fragment),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena of fragments and elements, holding any number of roots.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
    mutations: u64,
}

impl Tree {
    /// Empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new root container.
    pub fn create_root(&mut self) -> NodeId {
        let id = self.alloc(NodeKind::Element(Element::new(Role::Container)), None);
        self.roots.push(id);
        id
    }

    /// Roots in creation order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Whether `id` is a live root.
    #[must_use]
    pub fn is_root(&self, id: NodeId) -> bool {
        self.roots.contains(&id)
    }

    /// Whether `id` is a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(Option::is_some)
    }

    /// Append a child element to `parent`.
    ///
    /// # Errors
    ///
    /// Fails when `parent` is missing or is a text fragment.
    pub fn append_element(&mut self, parent: NodeId, role: Role) -> Result<NodeId, TreeError> {
        self.expect_element(parent)?;
        let id = self.alloc(NodeKind::Element(Element::new(role)), Some(parent));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Append a text fragment to `parent`.
    ///
    /// # Errors
    ///
    /// Fails when `parent` is missing or is a text fragment.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, TreeError> {
        self.expect_element(parent)?;
        let id = self.alloc(
            NodeKind::Text(Fragment {
                text: text.to_owned(),
                split_off: false,
            }),
            Some(parent),
        );
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Replace the content of a fragment, as a host edit.
    ///
    /// # Errors
    ///
    /// Fails when `id` is missing or not a fragment.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), TreeError> {
        let fragment = self.fragment_mut(id)?;
        text.clone_into(&mut fragment.text);
        fragment.split_off = false;
        self.mutations += 1;
        Ok(())
    }

    /// Append to a fragment, as streamed content does.
    ///
    /// # Errors
    ///
    /// Fails when `id` is missing or not a fragment.
    pub fn push_text(&mut self, id: NodeId, text: &str) -> Result<(), TreeError> {
        self.fragment_mut(id)?.text.push_str(text);
        self.mutations += 1;
        Ok(())
    }

    /// Remove a node and its whole subtree. Removing a root forgets the root.
    ///
    /// # Errors
    ///
    /// Fails when `id` is missing.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|&c| c != id);
        }
        self.roots.retain(|&r| r != id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next.index()).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
        self.mutations += 1;
        Ok(())
    }

    /// Number of mutations applied so far, by host and engine alike.
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    /// Element behind `id`, if it is one.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.node(id).ok()?.kind {
            NodeKind::Element(ref el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    /// Fragment behind `id`, if it is one.
    #[must_use]
    pub fn fragment(&self, id: NodeId) -> Option<&Fragment> {
        match self.node(id).ok()?.kind {
            NodeKind::Text(ref f) => Some(f),
            NodeKind::Element(_) => None,
        }
    }

    /// Text of the fragment `id`.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.fragment(id).map(Fragment::text)
    }

    /// Parent of `id`; `None` for roots and removed nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok()?.parent
    }

    /// Children of `id`, empty when it has none.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Sibling right before `id`.
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// Concatenated text of every fragment below `id`, in document order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Pre-order walk of `id` and everything below it.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    /// Strict ancestors of `id`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Whether any strict ancestor of `id` satisfies `pred`.
    pub fn has_ancestor(&self, id: NodeId, pred: impl FnMut(&Element) -> bool) -> bool {
        self.ancestors(id).filter_map(|a| self.element(a)).any(pred)
    }

    /// Number of engine markers owned by `pass` below (and including) `id`.
    #[must_use]
    pub fn marker_count(&self, id: NodeId, pass: Pass) -> usize {
        self.descendants(id)
            .filter_map(|n| self.element(n))
            .filter(|el| el.marker(pass).is_some())
            .count()
    }

    /// Number of engine markers below (and including) `id`, any pass.
    #[must_use]
    pub fn total_marker_count(&self, id: NodeId) -> usize {
        self.descendants(id)
            .filter_map(|n| self.element(n))
            .map(|el| el.markers.len())
            .sum()
    }

    /// Split fragment `id` at byte offset `at`.
    ///
    /// `id` keeps `[0, at)`, a new fragment holding `[at, len)` is inserted
    /// right after it and returned.
    ///
    /// # Errors
    ///
    /// `at` must lie strictly inside the fragment and on a char boundary.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> Result<NodeId, TreeError> {
        let parent = self.node(id)?.parent.ok_or(TreeError::Detached(id))?;
        let fragment = self.fragment_mut(id)?;
        let len = fragment.text.len();
        if at == 0 || at >= len {
            return Err(TreeError::SplitOutOfRange { offset: at, len });
        }
        if !fragment.text.is_char_boundary(at) {
            return Err(TreeError::NotCharBoundary(at));
        }
        let tail = fragment.text.split_off(at);
        let piece = self.alloc(
            NodeKind::Text(Fragment {
                text: tail,
                split_off: true,
            }),
            Some(parent),
        );
        let siblings = &mut self.node_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|&c| c == id)
            .ok_or(TreeError::Detached(id))?;
        siblings.insert(pos + 1, piece);
        self.mutations += 1;
        Ok(piece)
    }

    /// Put `id` inside a new [`Role::Wrapper`] element carrying `marker`.
    ///
    /// # Errors
    ///
    /// Fails when `id` is missing or detached.
    pub fn wrap(&mut self, id: NodeId, marker: Marker) -> Result<NodeId, TreeError> {
        self.wrap_as(id, Role::Wrapper, marker)
    }

    /// Like [`Tree::wrap`], but the new element takes `role`.
    ///
    /// # Errors
    ///
    /// Fails when `id` is missing or detached.
    pub fn wrap_as(&mut self, id: NodeId, role: Role, marker: Marker) -> Result<NodeId, TreeError> {
        let parent = self.node(id)?.parent.ok_or(TreeError::Detached(id))?;
        let wrapper = self.alloc(
            NodeKind::Element(Element {
                role,
                markers: vec![marker],
            }),
            Some(parent),
        );
        let siblings = &mut self.node_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|&c| c == id)
            .ok_or(TreeError::Detached(id))?;
        siblings[pos] = wrapper;
        self.node_mut(wrapper)?.children.push(id);
        self.node_mut(id)?.parent = Some(wrapper);
        self.mutations += 1;
        Ok(wrapper)
    }

    /// Replace element `id` by its children, in place.
    ///
    /// # Errors
    ///
    /// Fails when `id` is missing, detached or not an element.
    pub fn unwrap(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.expect_element(id)?;
        let parent = self.node(id)?.parent.ok_or(TreeError::Detached(id))?;
        let node = self.nodes[id.index()].take().ok_or(TreeError::MissingNode(id))?;
        for &child in &node.children {
            self.node_mut(child)?.parent = Some(parent);
        }
        let siblings = &mut self.node_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|&c| c == id)
            .ok_or(TreeError::Detached(id))?;
        let tail = siblings.split_off(pos + 1);
        siblings.pop();
        siblings.extend(node.children);
        siblings.extend(tail);
        self.mutations += 1;
        Ok(())
    }

    /// Attach `marker`, replacing any marker of the same pass.
    ///
    /// Does nothing (and counts no mutation) when the identical marker is
    /// already present.
    ///
    /// # Errors
    ///
    /// Fails when `id` is missing or not an element.
    pub fn set_marker(&mut self, id: NodeId, marker: Marker) -> Result<(), TreeError> {
        let el = self.element_mut(id)?;
        if let Some(existing) = el.markers.iter_mut().find(|m| m.pass == marker.pass) {
            if *existing == marker {
                return Ok(());
            }
            *existing = marker;
        } else {
            el.markers.push(marker);
        }
        self.mutations += 1;
        Ok(())
    }

    /// Drop the marker owned by `pass`. Returns whether one was removed.
    ///
    /// # Errors
    ///
    /// Fails when `id` is missing or not an element.
    pub fn remove_marker(&mut self, id: NodeId, pass: Pass) -> Result<bool, TreeError> {
        let el = self.element_mut(id)?;
        let before = el.markers.len();
        el.markers.retain(|m| m.pass != pass);
        let removed = el.markers.len() != before;
        if removed {
            self.mutations += 1;
        }
        Ok(removed)
    }

    /// Fold every engine split piece below `id` back into the fragment on
    /// its left. Returns the number of merges.
    ///
    /// # Errors
    ///
    /// Fails when `id` is missing.
    pub fn merge_split_pieces(&mut self, id: NodeId) -> Result<usize, TreeError> {
        self.node(id)?;
        let pieces: Vec<NodeId> = self
            .descendants(id)
            .filter(|&n| self.fragment(n).is_some_and(Fragment::is_split_piece))
            .collect();
        let mut merged = 0;
        for piece in pieces {
            let Some(prev) = self.previous_sibling(piece) else {
                continue;
            };
            if self.fragment(prev).is_none() {
                continue;
            }
            let tail = core::mem::take(&mut self.fragment_mut(piece)?.text);
            self.fragment_mut(prev)?.text.push_str(&tail);
            let parent = self.parent(piece).ok_or(TreeError::Detached(piece))?;
            self.node_mut(parent)?.children.retain(|&c| c != piece);
            self.nodes[piece.index()] = None;
            self.mutations += 1;
            merged += 1;
        }
        Ok(merged)
    }

    fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Some(Node {
            kind,
            parent,
            children: Vec::new(),
        }));
        self.mutations += 1;
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(TreeError::MissingNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TreeError::MissingNode(id))
    }

    fn expect_element(&self, id: NodeId) -> Result<(), TreeError> {
        match self.node(id)?.kind {
            NodeKind::Element(_) => Ok(()),
            NodeKind::Text(_) => Err(TreeError::NotElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, TreeError> {
        match self.node_mut(id)?.kind {
            NodeKind::Element(ref mut el) => Ok(el),
            NodeKind::Text(_) => Err(TreeError::NotElement(id)),
        }
    }

    fn fragment_mut(&mut self, id: NodeId) -> Result<&mut Fragment, TreeError> {
        match self.node_mut(id)?.kind {
            NodeKind::Text(ref mut f) => Ok(f),
            NodeKind::Element(_) => Err(TreeError::NotText(id)),
        }
    }
}

/// Iterator returned by [`Tree::descendants`].
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Iterator returned by [`Tree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.parent(id);
        Some(id)
    }
}
