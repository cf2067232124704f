use crate::{locale_data::LocaleKey, quote::QuoteCategory};

/// A half-open byte range over a [`TextView`](crate::TextView), tagged with
/// the classification that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset.
    pub start: usize,
    /// End byte offset, exclusive.
    pub end: usize,
    /// What produced the span.
    pub kind: SpanKind,
}

/// Classification of a [`Span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// A custom open/close delimited range, tokens included.
    Delimited,
    /// A matched quotation, marks included.
    Quote(QuoteCategory),
    /// A locale run.
    Locale(LocaleKey),
}

impl Span {
    /// Span over `start..end`.
    #[must_use]
    pub fn new(start: usize, end: usize, kind: SpanKind) -> Self {
        Self { start, end, kind }
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Marker tag the annotator stores for this span.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }
}

impl SpanKind {
    /// Marker tag for spans of this kind.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            SpanKind::Delimited => "custom",
            SpanKind::Quote(category) => category.tag(),
            SpanKind::Locale(key) => key.as_str(),
        }
    }
}

/// Whether `spans` is sorted by start and pairwise disjoint.
#[must_use]
pub fn sorted_and_disjoint(spans: &[Span]) -> bool {
    spans.windows(2).all(|w| w[0].end <= w[1].start) && spans.iter().all(|s| s.start < s.end)
}
