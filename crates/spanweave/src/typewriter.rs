//! Per-grapheme animation units for [`Role::Typewriter`] containers.
use crate::{
    error::TreeError,
    segmentation::{Segmentation, graphemes},
    tree::{Marker, NodeId, Pass, Role, Tree},
};

const UNIT_TAG: &str = "unit";

/// Start offset of one typewriter container in a chained sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterTiming {
    /// The [`Role::Typewriter`] element.
    pub container: NodeId,
    /// Delay before the first unit, in ms.
    pub start_ms: u64,
    /// Counted units: visible clusters plus two per quotation.
    pub units: usize,
    /// The start offset differs from the previous run, so the host should
    /// restart this container's animation.
    pub restarted: bool,
}

fn is_line_break(segment: &str) -> bool {
    segment.chars().all(|c| c == '\n' || c == '\r')
}

/// Outermost typewriter containers under `root`, in document order.
#[must_use]
pub fn containers(tree: &Tree, root: NodeId) -> Vec<NodeId> {
    tree.descendants(root)
        .filter(|&n| tree.element(n).is_some_and(|el| el.role == Role::Typewriter))
        .filter(|&n| !tree.has_ancestor(n, |el| el.role == Role::Typewriter))
        .collect()
}

/// Split one fragment into units. Line breaks stay plain text, and a run of
/// them stays a single piece.
fn explode(tree: &mut Tree, fragment: NodeId, mode: Segmentation) -> Result<usize, TreeError> {
    let text = tree.text(fragment).ok_or(TreeError::NotText(fragment))?.to_owned();
    let mut pieces: Vec<(usize, bool)> = Vec::new();
    for (start, _, segment) in graphemes(&text, mode) {
        let unit = !is_line_break(segment);
        if !unit && pieces.last().is_some_and(|&(_, u)| !u) {
            continue;
        }
        pieces.push((start, unit));
    }
    let mut nodes = Vec::with_capacity(pieces.len());
    for &(start, unit) in pieces.iter().skip(1).rev() {
        nodes.push((tree.split_text(fragment, start)?, unit));
    }
    if let Some(&(_, unit)) = pieces.first() {
        nodes.push((fragment, unit));
    }
    let mut made = 0;
    for (node, unit) in nodes {
        if unit {
            tree.wrap_as(node, Role::Unit, Marker::wrap(Pass::Typewriter, UNIT_TAG))?;
            made += 1;
        }
    }
    Ok(made)
}

/// Counted units under `container`: every unit with visible text plus two
/// for each quotation (its open and close marks).
#[must_use]
pub fn count_units(tree: &Tree, container: NodeId) -> usize {
    tree.descendants(container)
        .filter_map(|n| Some((n, tree.element(n)?)))
        .map(|(n, el)| match el.role {
            Role::Unit if !tree.text_content(n).trim().is_empty() => 1,
            Role::Quote => 2,
            Role::Wrapper if el.marker(Pass::Quote).is_some() => 2,
            _ => 0,
        })
        .sum()
}

/// Turn every raw fragment under `container` into units, then record the
/// unit count on the container. Returns the count.
///
/// Already processed text is left alone, so calling this again only
/// recounts.
///
/// # Errors
///
/// Fails when `container` is missing or not an element.
pub fn ensure_processed(
    tree: &mut Tree,
    container: NodeId,
    mode: Segmentation,
) -> Result<usize, TreeError> {
    let raw: Vec<NodeId> = tree
        .descendants(container)
        .filter(|&n| tree.text(n).is_some_and(|t| !t.is_empty()))
        .filter(|&n| !tree.has_ancestor(n, |el| el.role == Role::Unit))
        .collect();
    let mut made = 0;
    for fragment in raw {
        made += explode(tree, fragment, mode)?;
    }
    let count = count_units(tree, container);
    tree.set_marker(container, Marker::mark(Pass::Typewriter, count.to_string()))?;
    if made > 0 {
        tracing::trace!(container = %container, made, count, "typewriter.explode");
    }
    Ok(count)
}

/// Process every container under `root` and chain their start offsets:
/// each container starts once the previous ones have played at `step_ms`
/// per unit. `previous` holds the timings of the last run.
///
/// # Errors
///
/// Propagates tree errors from [`ensure_processed`].
pub fn run(
    tree: &mut Tree,
    root: NodeId,
    mode: Segmentation,
    step_ms: u32,
    previous: &[TypewriterTiming],
) -> Result<Vec<TypewriterTiming>, TreeError> {
    let mut start_ms = 0u64;
    let mut out = Vec::new();
    for container in containers(tree, root) {
        let units = ensure_processed(tree, container, mode)?;
        let restarted = previous
            .iter()
            .find(|t| t.container == container)
            .is_none_or(|t| t.start_ms != start_ms);
        out.push(TypewriterTiming {
            container,
            start_ms,
            units,
            restarted,
        });
        start_ms += units as u64 * u64::from(step_ms);
    }
    Ok(out)
}
