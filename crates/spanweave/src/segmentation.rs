//! Grapheme and word segmentation, with a code-point fallback.
//!
//! Cluster tables come from `bstr` behind the `clusters` feature. Without
//! them graphemes degrade to single code points and words degrade to one
//! segment per input, which is still lossless.
#[cfg(feature = "clusters")]
use bstr::ByteSlice;

/// Which segmentation the engine uses for clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Segmentation {
    /// Extended grapheme clusters and Unicode word boundaries, when
    /// available.
    #[default]
    Clusters,
    /// One unit per code point.
    CodePoints,
}

/// Whether cluster-level segmentation was compiled in.
#[must_use]
pub const fn clusters_available() -> bool {
    cfg!(feature = "clusters")
}

impl Segmentation {
    /// The best segmentation this build supports.
    #[must_use]
    pub const fn detect() -> Self {
        if clusters_available() {
            Segmentation::Clusters
        } else {
            Segmentation::CodePoints
        }
    }

    fn uses_clusters(self) -> bool {
        clusters_available() && self == Segmentation::Clusters
    }
}

/// `(start, end, segment)` triples; offsets are bytes into the input.
pub type Segment<'a> = (usize, usize, &'a str);

/// Split `text` into grapheme clusters (or code points).
#[must_use]
pub fn graphemes(text: &str, mode: Segmentation) -> Vec<Segment<'_>> {
    if mode.uses_clusters() {
        #[cfg(feature = "clusters")]
        return text.as_bytes().grapheme_indices().collect();
    }
    text.char_indices()
        .map(|(i, c)| (i, i + c.len_utf8(), &text[i..i + c.len_utf8()]))
        .collect()
}

/// Split `text` at word boundaries, keeping the breaks (spaces,
/// punctuation) as their own segments.
#[must_use]
pub fn words(text: &str, mode: Segmentation) -> Vec<Segment<'_>> {
    if mode.uses_clusters() {
        #[cfg(feature = "clusters")]
        return text.as_bytes().words_with_break_indices().collect();
    }
    if text.is_empty() {
        Vec::new()
    } else {
        vec![(0, text.len(), text)]
    }
}
