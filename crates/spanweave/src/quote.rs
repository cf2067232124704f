//! Quotation matching and labeling.
//!
//! Matching works on the text of a single fragment. Labeling never looks at
//! raw text again; it only inspects the boundaries of an already matched
//! quotation.

/// An opening and closing quotation mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePair {
    /// Opening mark.
    pub open: &'static str,
    /// Closing mark.
    pub close: &'static str,
}

const fn pair(open: &'static str, close: &'static str) -> QuotePair {
    QuotePair { open, close }
}

/// Pairs matched in raw text, in priority order for equal start offsets.
pub const DEFAULT_PAIRS: &[QuotePair] = &[
    pair("\"", "\""),
    pair("“", "”"),
    pair("‘", "’"),
    pair("«", "»"),
    pair("「", "」"),
    pair("『", "』"),
    pair("＂", "＂"),
    pair("＇", "＇"),
    pair("'", "'"),
];

/// Pairs whose quotations count as dialogue.
pub const DIALOGUE_PAIRS: &[QuotePair] = &[
    pair("\"", "\""),
    pair("“", "”"),
    pair("＂", "＂"),
    pair("'", "'"),
    pair("‘", "’"),
    pair("＇", "＇"),
];

const APOSTROPHES: &[&str] = &["'", "’", "＇"];

/// A matched quotation in fragment-local byte offsets, marks included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteMatch {
    /// Byte offset of the opening mark.
    pub start: usize,
    /// Byte offset just past the closing mark.
    pub end: usize,
    /// Index into the pair table that matched.
    pub pair: usize,
}

/// Label of a quotation, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteCategory {
    /// Bounded by the configured custom delimiters.
    Custom,
    /// Bounded by one of [`DIALOGUE_PAIRS`].
    Dialogue,
    /// Any other quotation.
    Plain,
}

impl QuoteCategory {
    /// Marker tag for this category.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            QuoteCategory::Custom => "custom",
            QuoteCategory::Dialogue => "dialogue",
            QuoteCategory::Plain => "plain",
        }
    }
}

/// An apostrophe-like token between two ASCII word characters is part of a
/// word (`it's`), not a quotation mark.
fn is_valid_mark(text: &str, at: usize, token: &str) -> bool {
    if !APOSTROPHES.contains(&token) {
        return true;
    }
    let before = text[..at].chars().next_back();
    let after = text[at + token.len()..].chars().next();
    let word = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    !(word(before) && word(after))
}

fn find_mark(text: &str, from: usize, token: &str) -> Option<usize> {
    let mut cursor = from;
    while let Some(rel) = text.get(cursor..)?.find(token) {
        let at = cursor + rel;
        if is_valid_mark(text, at, token) {
            return Some(at);
        }
        cursor = at + token.len();
    }
    None
}

/// The first valid position of a token at or after `from`.
#[derive(Debug, Clone, Copy)]
struct NextMark {
    from: usize,
    found: Option<usize>,
}

/// [`find_mark`], reusing the previous answer while it is still ahead of
/// `from`. Keeps a forward-moving scan linear in the length of `text`.
fn next_mark(cache: &mut Option<NextMark>, text: &str, from: usize, token: &str) -> Option<usize> {
    if let Some(hit) = cache.filter(|h| h.from <= from && h.found.is_none_or(|at| at >= from)) {
        return hit.found;
    }
    let found = find_mark(text, from, token);
    *cache = Some(NextMark { from, found });
    found
}

/// Match quotations in `text` using `pairs`.
///
/// At every step the earliest valid opener among all pairs wins (table order
/// breaks ties). Its closer must come from the same pair; an opener with no
/// closer is left as literal text and scanning resumes right after it.
#[must_use]
pub fn find_quotes(text: &str, pairs: &[QuotePair]) -> Vec<QuoteMatch> {
    let mut out = Vec::new();
    let mut openers: Vec<Option<NextMark>> = vec![None; pairs.len()];
    let mut closers: Vec<Option<NextMark>> = vec![None; pairs.len()];
    let mut cursor = 0;
    while cursor < text.len() {
        let best = pairs
            .iter()
            .zip(&mut openers)
            .enumerate()
            .filter_map(|(i, (p, cache))| next_mark(cache, text, cursor, p.open).map(|at| (at, i)))
            .min();
        let Some((open_at, index)) = best else {
            break;
        };
        let QuotePair { open, close } = pairs[index];
        let body = open_at + open.len();
        match next_mark(&mut closers[index], text, body, close) {
            Some(close_at) => {
                let end = close_at + close.len();
                out.push(QuoteMatch {
                    start: open_at,
                    end,
                    pair: index,
                });
                cursor = end;
            }
            None => cursor = body,
        }
    }
    out
}

fn bounded_by(text: &str, open: &str, close: &str) -> bool {
    text.len() >= open.len() + close.len() && text.starts_with(open) && text.ends_with(close)
}

/// Label the text of a matched quotation.
///
/// `custom` carries trimmed custom tokens when they are configured; dialogue
/// labels are only produced when `dialogue` is set.
#[must_use]
pub fn classify(text: &str, custom: Option<(&str, &str)>, dialogue: bool) -> QuoteCategory {
    let text = text.trim();
    if custom.is_some_and(|(open, close)| bounded_by(text, open, close)) {
        return QuoteCategory::Custom;
    }
    if dialogue && DIALOGUE_PAIRS.iter().any(|p| bounded_by(text, p.open, p.close)) {
        return QuoteCategory::Dialogue;
    }
    QuoteCategory::Plain
}
