//! A read-only, concatenated view over the fragments of one root.
//!
//! The view is rebuilt at the start of every pass and never outlives it.
//! Offsets are UTF-8 byte offsets into [`TextView::text`]; every entry starts
//! and ends on a char boundary because fragments are whole strings.
use crate::{
    options::Limits,
    span::Span,
    tree::{NodeId, Tree},
};

/// One fragment's slot in the concatenated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Fragment this slot holds.
    pub node: NodeId,
    /// Start byte offset in the view.
    pub start: usize,
    /// End byte offset in the view, exclusive.
    pub end: usize,
}

/// A span cut down to a single fragment, in fragment-local offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// Fragment the piece lies in.
    pub node: NodeId,
    /// Start byte offset in the fragment.
    pub start: usize,
    /// End byte offset in the fragment, exclusive.
    pub end: usize,
}

/// Concatenated fragment text of one root, with per-fragment slots.
#[derive(Debug, Clone, Default)]
pub struct TextView {
    text: String,
    entries: Vec<Entry>,
    capped: bool,
}

impl TextView {
    /// Concatenate every non-empty fragment under `root` in document order.
    ///
    /// Fragments for which `exclude` returns `true` are skipped. Once either
    /// cap in `limits` is reached no further fragments are admitted; the
    /// fragment that crosses the character cap is still included whole.
    pub fn build(
        tree: &Tree,
        root: NodeId,
        limits: &Limits,
        mut exclude: impl FnMut(&Tree, NodeId) -> bool,
    ) -> Self {
        let mut view = TextView::default();
        let mut chars = 0usize;
        for node in tree.descendants(root) {
            let Some(text) = tree.text(node) else {
                continue;
            };
            if text.is_empty() || exclude(tree, node) {
                continue;
            }
            if view.entries.len() >= limits.max_fragments || chars >= limits.max_text_chars {
                view.capped = true;
                tracing::warn!(root = %root, fragments = view.entries.len(), chars, "text_view.capped");
                break;
            }
            let start = view.text.len();
            view.text.push_str(text);
            view.entries.push(Entry {
                node,
                start,
                end: view.text.len(),
            });
            chars += text.chars().count();
        }
        view
    }

    /// The concatenated text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fragment slots in document order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Whether no fragment was admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a cap stopped the view from admitting every fragment.
    #[must_use]
    pub fn is_capped(&self) -> bool {
        self.capped
    }

    /// Index of the entry owning global byte `offset`.
    #[must_use]
    pub fn locate(&self, offset: usize) -> Option<usize> {
        let idx = self.entries.partition_point(|e| e.end <= offset);
        self.entries
            .get(idx)
            .filter(|e| e.start <= offset)
            .map(|_| idx)
    }

    /// Cut `span` into per-fragment pieces, in document order.
    #[must_use]
    pub fn pieces(&self, span: &Span) -> Vec<Piece> {
        let mut out = Vec::new();
        let Some(first) = self.locate(span.start) else {
            return out;
        };
        for entry in &self.entries[first..] {
            if entry.start >= span.end {
                break;
            }
            let start = span.start.max(entry.start) - entry.start;
            let end = span.end.min(entry.end) - entry.start;
            if end > start {
                out.push(Piece {
                    node: entry.node,
                    start,
                    end,
                });
            }
        }
        out
    }
}
