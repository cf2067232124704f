//! Custom open/close delimiter scanning.
use bstr::ByteSlice;

use crate::span::{Span, SpanKind};

/// Find non-overlapping `open … close` ranges in `text`, leftmost first.
///
/// Each span covers both tokens. An opener with no closer after it is
/// skipped and scanning resumes right after it. At most `max` spans are
/// returned; blank tokens yield none.
#[must_use]
pub fn find_delimited(text: &str, open: &str, close: &str, max: usize) -> Vec<Span> {
    let mut spans = Vec::new();
    if text.is_empty() || open.is_empty() || close.is_empty() {
        return spans;
    }
    let haystack = text.as_bytes();
    let mut cursor = 0;
    while cursor < haystack.len() && spans.len() < max {
        let Some(rel) = haystack[cursor..].find(open) else {
            break;
        };
        let open_at = cursor + rel;
        let search_from = open_at + open.len();
        let Some(rel) = haystack[search_from..].find(close) else {
            cursor = search_from;
            continue;
        };
        let end = search_from + rel + close.len();
        tracing::trace!(start = open_at, end, "delimiter.span");
        spans.push(Span::new(open_at, end, SpanKind::Delimited));
        cursor = end;
    }
    if spans.len() >= max {
        tracing::warn!(max, "delimiter.capped");
    }
    spans
}

/// Occurrences of `token` in `text`, counted up to `cap`.
#[must_use]
pub fn count_occurrences(text: &str, token: &str, cap: usize) -> usize {
    if token.is_empty() {
        return 0;
    }
    text.as_bytes().find_iter(token).take(cap).count()
}
