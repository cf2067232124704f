//! Materialises spans as markers on the tree, and takes them back off.
use rustc_hash::FxHashMap;

use crate::{
    error::TreeError,
    span::Span,
    text_view::TextView,
    tree::{Marker, MarkerKind, NodeId, Pass, Role, Tree},
};

/// Outcome of [`apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    /// Spans split out and wrapped.
    pub wrapped: usize,
    /// Units tagged in place.
    pub marked: usize,
    /// Set when `limit` stopped the pass early.
    pub capped: bool,
}

impl Applied {
    /// Markers created, wrapped or in place.
    #[must_use]
    pub fn total(&self) -> usize {
        self.wrapped + self.marked
    }
}

/// Materialise `spans` for `pass`.
///
/// Spans are cut per fragment and each fragment's segments are applied
/// from the right, so splitting never shifts an offset still to be used. A
/// segment covering the whole text of a [`Role::Unit`] tags the unit in
/// place; every other segment is split out and wrapped. No more than
/// `limit` markers are created.
///
/// # Errors
///
/// Only fails on a stale view, which the engine never hands in.
pub fn apply(
    tree: &mut Tree,
    view: &TextView,
    spans: &[Span],
    pass: Pass,
    limit: usize,
) -> Result<Applied, TreeError> {
    let mut order: Vec<NodeId> = Vec::new();
    let mut segments: FxHashMap<NodeId, Vec<(usize, usize, &'static str)>> = FxHashMap::default();
    for span in spans {
        for piece in view.pieces(span) {
            segments
                .entry(piece.node)
                .or_insert_with(|| {
                    order.push(piece.node);
                    Vec::new()
                })
                .push((piece.start, piece.end, span.tag()));
        }
    }

    let mut applied = Applied::default();
    for node in order {
        let Some(mut segs) = segments.remove(&node) else {
            continue;
        };
        let full_len = tree.text(node).map_or(0, str::len);
        segs.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        for (start, end, tag) in segs {
            if applied.total() >= limit {
                applied.capped = true;
                tracing::warn!(pass = pass.name(), limit, "annotate.capped");
                return Ok(applied);
            }
            if start == 0 && end >= full_len {
                if let Some(unit) = unit_parent(tree, node) {
                    tree.set_marker(unit, Marker::mark(pass, tag))?;
                    applied.marked += 1;
                    continue;
                }
            }
            wrap_range(tree, node, start, end, Marker::wrap(pass, tag))?;
            applied.wrapped += 1;
        }
    }
    Ok(applied)
}

fn unit_parent(tree: &Tree, node: NodeId) -> Option<NodeId> {
    tree.parent(node)
        .filter(|&p| tree.element(p).is_some_and(|el| el.role == Role::Unit))
}

/// Split `[start, end)` out of fragment `node` and wrap it.
fn wrap_range(
    tree: &mut Tree,
    node: NodeId,
    start: usize,
    end: usize,
    marker: Marker,
) -> Result<NodeId, TreeError> {
    let middle = if start > 0 {
        tree.split_text(node, start)?
    } else {
        node
    };
    let len = tree.text(middle).map_or(0, str::len);
    let wanted = end - start;
    if wanted < len {
        tree.split_text(middle, wanted)?;
    }
    tree.wrap(middle, marker)
}

/// Remove every marker `pass` created under `root`.
///
/// Wrappers are replaced by their children, in-place tags are dropped, and
/// the fragments split apart by the engine are merged back together.
/// Returns the number of markers removed.
///
/// # Errors
///
/// Fails only when `root` does not exist.
pub fn clear(tree: &mut Tree, root: NodeId, pass: Pass) -> Result<usize, TreeError> {
    if !tree.contains(root) {
        return Err(TreeError::MissingNode(root));
    }
    let owned: Vec<(NodeId, MarkerKind)> = tree
        .descendants(root)
        .filter(|&n| n != root)
        .filter_map(|n| Some((n, tree.element(n)?.marker(pass)?.kind)))
        .collect();
    for &(node, kind) in &owned {
        match kind {
            MarkerKind::Wrap => tree.unwrap(node)?,
            MarkerKind::Mark => {
                tree.remove_marker(node, pass)?;
            }
        }
    }
    let merged = tree.merge_split_pieces(root)?;
    if !owned.is_empty() {
        tracing::debug!(root = %root, pass = pass.name(), cleared = owned.len(), merged, "annotate.clear");
    }
    Ok(owned.len())
}
