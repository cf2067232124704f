//! Segmented mirror of a streaming root, and minimal-diff reconciliation
//! between successive mirrors.
//!
//! A frame is rebuilt from the annotated root whenever its content moves
//! on. Units whose ordinal is at or past the boundary emitted by the
//! previous frame are new; everything before it renders statically.
//! [`reconcile`] turns the previous frame into the next with as few patches
//! as possible, leaving every node it can keep untouched.
use crate::{
    options::{Granularity, Limits},
    segmentation::{Segmentation, graphemes, words},
    tree::{NodeId, Role, Tree},
};

/// One animation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUnit {
    /// Text of the grapheme or word.
    pub text: String,
    /// Position among the counted units of the frame.
    pub ordinal: usize,
    /// Whether the unit entered in this frame.
    pub is_new: bool,
    /// Entrance delay in steps, counted from the first new unit.
    pub stagger: usize,
    /// `stagger` steps of the configured stream speed.
    pub delay_ms: u64,
    /// Tags of the engine markers above this unit, outermost first.
    pub tags: Vec<String>,
}

/// One node of a [`StreamFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamNode {
    /// A counted unit.
    Unit(StreamUnit),
    /// Whitespace between units. Never new and never counted.
    Space {
        /// The whitespace.
        text: String,
        /// Tags of the engine markers above it, outermost first.
        tags: Vec<String>,
    },
    /// Text mirrored as-is: verbatim content, line breaks, whitespace-only
    /// fragments, and everything once a cap is hit or when no effect runs.
    Static {
        /// The mirrored text.
        text: String,
        /// Tags of the engine markers above it, outermost first.
        tags: Vec<String>,
    },
}

impl StreamNode {
    /// Text this node renders.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            StreamNode::Unit(unit) => &unit.text,
            StreamNode::Space { text, .. } | StreamNode::Static { text, .. } => text,
        }
    }
}

/// What a frame was built from; an unchanged fingerprint at the same
/// granularity means the frame is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fingerprint {
    /// Chars in the root text.
    pub chars: usize,
    /// Last char of the root text.
    pub last: Option<char>,
    /// Engine markers under the root.
    pub markers: usize,
}

impl Fingerprint {
    /// Fingerprint `root` as it stands now.
    #[must_use]
    pub fn of(tree: &Tree, root: NodeId) -> Self {
        let text = tree.text_content(root);
        Self {
            chars: text.chars().count(),
            last: text.chars().next_back(),
            markers: tree.total_marker_count(root),
        }
    }
}

/// Flattened, segmented mirror of one streaming root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFrame {
    /// `None` when no effect segments the text.
    pub granularity: Option<Granularity>,
    /// Nodes in document order.
    pub nodes: Vec<StreamNode>,
    /// Counted units in this frame; the new-unit boundary of the next one.
    pub emitted: usize,
    /// State of the root the frame was built from.
    pub fingerprint: Fingerprint,
    /// Show a trailing caret after the last node.
    pub cursor: bool,
}

impl StreamFrame {
    /// Segment `root` into a frame. Units with an ordinal of at least `base`
    /// are new, and enter `speed_ms` apart.
    #[must_use]
    pub fn build(
        tree: &Tree,
        root: NodeId,
        granularity: Option<Granularity>,
        base: usize,
        mode: Segmentation,
        limits: &Limits,
        speed_ms: u32,
    ) -> Self {
        let mut nodes = Vec::new();
        let mut count = 0usize;
        for node in tree.descendants(root) {
            let Some(text) = tree.text(node) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let tags = tags_above(tree, root, node);
            let verbatim = tree.has_ancestor(node, |el| el.role == Role::Verbatim);
            let Some(granularity) = granularity.filter(|_| !verbatim && !text.trim().is_empty())
            else {
                nodes.push(StreamNode::Static {
                    text: text.to_owned(),
                    tags,
                });
                continue;
            };
            let segments = match granularity {
                Granularity::Grapheme => graphemes(text, mode),
                Granularity::Word => words(text, mode),
            };
            for (start, _, segment) in segments {
                if count >= limits.max_stream_units {
                    tracing::warn!(root = %root, max = limits.max_stream_units, "stream.capped");
                    nodes.push(StreamNode::Static {
                        text: text[start..].to_owned(),
                        tags: tags.clone(),
                    });
                    break;
                }
                if segment.chars().all(|c| c == '\n' || c == '\r') {
                    nodes.push(StreamNode::Static {
                        text: segment.to_owned(),
                        tags: tags.clone(),
                    });
                } else if segment.trim().is_empty() {
                    nodes.push(StreamNode::Space {
                        text: segment.to_owned(),
                        tags: tags.clone(),
                    });
                } else {
                    let stagger = count.saturating_sub(base);
                    nodes.push(StreamNode::Unit(StreamUnit {
                        text: segment.to_owned(),
                        ordinal: count,
                        is_new: count >= base,
                        stagger,
                        delay_ms: u64::try_from(stagger).map_or(u64::MAX, |s| {
                            s.saturating_mul(u64::from(speed_ms))
                        }),
                        tags: tags.clone(),
                    }));
                    count += 1;
                }
            }
        }
        Self {
            granularity,
            nodes,
            emitted: count,
            fingerprint: Fingerprint::of(tree, root),
            cursor: false,
        }
    }

    /// Concatenated text of every node.
    #[must_use]
    pub fn text(&self) -> String {
        self.nodes.iter().map(StreamNode::text).collect()
    }

    /// Units that entered in this frame.
    pub fn new_units(&self) -> impl Iterator<Item = &StreamUnit> {
        self.nodes.iter().filter_map(|n| match n {
            StreamNode::Unit(unit) if unit.is_new => Some(unit),
            _ => None,
        })
    }
}

fn tags_above(tree: &Tree, root: NodeId, node: NodeId) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for ancestor in tree.ancestors(node) {
        if let Some(el) = tree.element(ancestor) {
            tags.extend(el.markers().iter().rev().map(|m| m.tag.clone()));
        }
        if ancestor == root {
            break;
        }
    }
    tags.reverse();
    tags
}

/// A single edit turning one frame into the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    /// Replace the node at `index` in place.
    Update {
        /// Position in the frame being patched.
        index: usize,
        /// Replacement node.
        node: StreamNode,
    },
    /// Insert before `index`.
    Insert {
        /// Position the node ends up at.
        index: usize,
        /// Inserted node.
        node: StreamNode,
    },
    /// Remove the node at `index`.
    Remove {
        /// Position of the removed node.
        index: usize,
    },
}

/// Middles larger than this many table cells are updated positionally.
const MAX_DIFF_CELLS: usize = 1 << 20;

/// Smallest in-order patch list turning `prev` into `next`.
///
/// The common prefix and suffix are never touched. The differing middle is
/// aligned by edit distance, so nodes that survive an insertion or removal
/// elsewhere in the middle are kept as they are. A middle too large to
/// align falls back to position-by-position updates.
#[must_use]
pub fn reconcile(prev: &[StreamNode], next: &[StreamNode]) -> Vec<Patch> {
    let prefix = prev.iter().zip(next).take_while(|(a, b)| a == b).count();
    let max_suffix = prev.len().min(next.len()) - prefix;
    let suffix = prev
        .iter()
        .rev()
        .zip(next.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    let old_mid = &prev[prefix..prev.len() - suffix];
    let new_mid = &next[prefix..next.len() - suffix];

    let cells = (old_mid.len() + 1).saturating_mul(new_mid.len() + 1);
    if cells > MAX_DIFF_CELLS {
        return positional(prefix, old_mid, new_mid);
    }
    aligned(prefix, old_mid, new_mid)
}

/// Edit-distance alignment of `old` against `new`.
///
/// `cost[i][j]` is the number of patches turning `old[i..]` into `new[j..]`;
/// walking it forward from the origin emits the patches in order.
fn aligned(offset: usize, old: &[StreamNode], new: &[StreamNode]) -> Vec<Patch> {
    let width = new.len() + 1;
    let mut cost = vec![0u32; (old.len() + 1) * width];
    let at = |i: usize, j: usize| i * width + j;
    for i in (0..=old.len()).rev() {
        for j in (0..=new.len()).rev() {
            cost[at(i, j)] = if i == old.len() {
                u32::try_from(new.len() - j).unwrap_or(u32::MAX)
            } else if j == new.len() {
                u32::try_from(old.len() - i).unwrap_or(u32::MAX)
            } else if old[i] == new[j] {
                cost[at(i + 1, j + 1)]
            } else {
                1 + cost[at(i + 1, j + 1)]
                    .min(cost[at(i, j + 1)])
                    .min(cost[at(i + 1, j)])
            };
        }
    }

    let mut patches = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < old.len() || j < new.len() {
        let index = offset + j;
        if i < old.len() && j < new.len() && old[i] == new[j] {
            i += 1;
            j += 1;
        } else if i < old.len() && j < new.len() && cost[at(i, j)] == 1 + cost[at(i + 1, j + 1)] {
            patches.push(Patch::Update {
                index,
                node: new[j].clone(),
            });
            i += 1;
            j += 1;
        } else if j < new.len() && (i == old.len() || cost[at(i, j)] == 1 + cost[at(i, j + 1)]) {
            patches.push(Patch::Insert {
                index,
                node: new[j].clone(),
            });
            j += 1;
        } else {
            patches.push(Patch::Remove { index });
            i += 1;
        }
    }
    patches
}

fn positional(offset: usize, old: &[StreamNode], new: &[StreamNode]) -> Vec<Patch> {
    let shared = old.len().min(new.len());
    let mut patches = Vec::new();
    for (i, (before, after)) in old.iter().zip(new).enumerate() {
        if before != after {
            patches.push(Patch::Update {
                index: offset + i,
                node: after.clone(),
            });
        }
    }
    for (i, node) in new.iter().enumerate().skip(shared) {
        patches.push(Patch::Insert {
            index: offset + i,
            node: node.clone(),
        });
    }
    for _ in shared..old.len() {
        patches.push(Patch::Remove {
            index: offset + shared,
        });
    }
    patches
}

/// Apply `patches` in order.
pub fn apply_patches(nodes: &mut Vec<StreamNode>, patches: &[Patch]) {
    for patch in patches {
        match patch {
            Patch::Update { index, node } => {
                if let Some(slot) = nodes.get_mut(*index) {
                    slot.clone_from(node);
                }
            }
            Patch::Insert { index, node } => nodes.insert((*index).min(nodes.len()), node.clone()),
            Patch::Remove { index } => {
                if *index < nodes.len() {
                    nodes.remove(*index);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Marker, Pass};

    const SPEED: u32 = 20;

    fn unit(text: &str, ordinal: usize, base: usize) -> StreamNode {
        let stagger = ordinal.saturating_sub(base);
        StreamNode::Unit(StreamUnit {
            text: text.into(),
            ordinal,
            is_new: ordinal >= base,
            stagger,
            delay_ms: u64::try_from(stagger).unwrap() * u64::from(SPEED),
            tags: vec![],
        })
    }

    fn space() -> StreamNode {
        StreamNode::Space {
            text: " ".into(),
            tags: vec![],
        }
    }

    #[cfg(feature = "clusters")]
    #[test]
    fn only_appended_words_are_new() {
        let mut tree = Tree::new();
        let root = tree.create_root();
        let frag = tree.append_text(root, "one two three four five").unwrap();
        let limits = Limits::default();
        let mode = Segmentation::Clusters;

        let first = StreamFrame::build(&tree, root, Some(Granularity::Word), 0, mode, &limits, SPEED);
        assert_eq!(first.emitted, 5);
        assert_eq!(first.new_units().count(), 5);

        tree.push_text(frag, " six seven").unwrap();
        let next = StreamFrame::build(
            &tree,
            root,
            Some(Granularity::Word),
            first.emitted,
            mode,
            &limits,
            SPEED,
        );
        assert_eq!(next.emitted, 7);
        let fresh: Vec<_> = next
            .new_units()
            .map(|u| (u.text.as_str(), u.stagger, u.delay_ms))
            .collect();
        assert_eq!(fresh, vec![("six", 0, 0), ("seven", 1, 20)]);
        assert_eq!(next.text(), tree.text_content(root));
    }

    #[test]
    fn graphemes_carry_marker_tags() {
        let mut tree = Tree::new();
        let root = tree.create_root();
        tree.append_text(root, "a ").unwrap();
        let frag = tree.append_text(root, "bc").unwrap();
        tree.wrap(frag, Marker::wrap(Pass::Delimiter, "custom")).unwrap();
        let code = tree.append_element(root, Role::Verbatim).unwrap();
        tree.append_text(code, "x y").unwrap();

        let frame = StreamFrame::build(
            &tree,
            root,
            Some(Granularity::Grapheme),
            1,
            Segmentation::CodePoints,
            &Limits::default(),
            SPEED,
        );
        assert_eq!(frame.emitted, 3);
        assert_eq!(
            frame.nodes,
            vec![
                unit("a", 0, 1),
                space(),
                StreamNode::Unit(StreamUnit {
                    text: "b".into(),
                    ordinal: 1,
                    is_new: true,
                    stagger: 0,
                    delay_ms: 0,
                    tags: vec!["custom".into()],
                }),
                StreamNode::Unit(StreamUnit {
                    text: "c".into(),
                    ordinal: 2,
                    is_new: true,
                    stagger: 1,
                    delay_ms: 20,
                    tags: vec!["custom".into()],
                }),
                StreamNode::Static {
                    text: "x y".into(),
                    tags: vec![],
                },
            ]
        );
    }

    #[test]
    fn unit_cap_mirrors_the_rest_statically() {
        let mut tree = Tree::new();
        let root = tree.create_root();
        tree.append_text(root, "abcd").unwrap();
        let limits = Limits {
            max_stream_units: 2,
            ..Limits::default()
        };
        let frame = StreamFrame::build(
            &tree,
            root,
            Some(Granularity::Grapheme),
            0,
            Segmentation::CodePoints,
            &limits,
            SPEED,
        );
        assert_eq!(frame.emitted, 2);
        assert_eq!(frame.nodes.len(), 3);
        assert_eq!(frame.text(), "abcd");
    }

    #[test]
    fn reconcile_keeps_prefix_and_appends() {
        let prev = vec![unit("a", 0, 0), space(), unit("b", 1, 0)];
        let next = vec![unit("a", 0, 0), space(), unit("b", 1, 0), space(), unit("c", 2, 0)];
        let patches = reconcile(&prev, &next);
        assert_eq!(
            patches,
            vec![
                Patch::Insert { index: 3, node: space() },
                Patch::Insert { index: 4, node: unit("c", 2, 0) },
            ]
        );
        let mut replay = prev.clone();
        apply_patches(&mut replay, &patches);
        assert_eq!(replay, next);
    }

    #[test]
    fn reconcile_updates_middle_and_removes_tail() {
        let prev = vec![unit("a", 0, 0), unit("x", 1, 0), unit("y", 2, 0), unit("z", 3, 0)];
        let next = vec![unit("a", 0, 0), unit("q", 1, 0), unit("z", 3, 0)];
        let patches = reconcile(&prev, &next);
        assert_eq!(
            patches,
            vec![
                Patch::Update { index: 1, node: unit("q", 1, 0) },
                Patch::Remove { index: 2 },
            ]
        );
        let mut replay = prev.clone();
        apply_patches(&mut replay, &patches);
        assert_eq!(replay, next);
    }

    #[test]
    fn reconcile_keeps_nodes_around_a_middle_insert() {
        let prev = vec![unit("a", 0, 0), unit("b", 1, 0), unit("c", 2, 0), unit("d", 3, 0)];
        let next = vec![
            unit("a", 0, 0),
            unit("x", 1, 0),
            unit("b", 1, 0),
            unit("c", 2, 0),
            unit("y", 3, 0),
        ];
        let patches = reconcile(&prev, &next);
        assert_eq!(
            patches,
            vec![
                Patch::Insert { index: 1, node: unit("x", 1, 0) },
                Patch::Update { index: 4, node: unit("y", 3, 0) },
            ]
        );
        let mut replay = prev.clone();
        apply_patches(&mut replay, &patches);
        assert_eq!(replay, next);
    }

    #[test]
    fn reconcile_removes_from_the_middle_only() {
        let prev = vec![unit("a", 0, 0), space(), unit("b", 1, 0), space(), unit("c", 2, 0)];
        let next = vec![unit("a", 0, 0), space(), unit("c", 2, 0)];
        let patches = reconcile(&prev, &next);
        assert_eq!(patches.len(), 2);
        assert!(patches.iter().all(|p| matches!(p, Patch::Remove { .. })));
        let mut replay = prev.clone();
        apply_patches(&mut replay, &patches);
        assert_eq!(replay, next);
    }

    #[test]
    fn identical_frames_need_no_patches() {
        let frame = vec![unit("a", 0, 0), space()];
        assert!(reconcile(&frame, &frame).is_empty());
        assert!(reconcile(&[], &[]).is_empty());
    }
}
