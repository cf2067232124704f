//! Per-cluster script classification and run building.
use crate::{
    locale_data::{LocaleKey, NEUTRAL_PRIORITY, SCRIPT_PRIORITY, is_combining_or_variation},
    segmentation::{Segmentation, graphemes},
    span::{Span, SpanKind},
    text_view::TextView,
};

/// Set of configured locale keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActiveKeys(u16);

impl ActiveKeys {
    /// Whether `key` is configured.
    #[must_use]
    pub fn contains(self, key: LocaleKey) -> bool {
        self.0 & (1 << key as u16) != 0
    }

    /// Add `key` to the set.
    pub fn insert(&mut self, key: LocaleKey) {
        self.0 |= 1 << key as u16;
    }

    /// Whether no key is configured.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<LocaleKey> for ActiveKeys {
    fn from_iter<I: IntoIterator<Item = LocaleKey>>(iter: I) -> Self {
        let mut keys = ActiveKeys::default();
        for key in iter {
            keys.insert(key);
        }
        keys
    }
}

fn first_significant(cluster: &str) -> Option<u32> {
    cluster
        .chars()
        .map(u32::from)
        .find(|&cp| !is_combining_or_variation(cp))
}

/// Category of one grapheme cluster given the category before it.
///
/// Whitespace and clusters made only of combining marks inherit `prev`.
/// Digits, punctuation and emoji inherit `prev` unless their own key is
/// active. A letter outside every active script has no category.
#[must_use]
pub fn classify_cluster(
    cluster: &str,
    active: ActiveKeys,
    prev: Option<LocaleKey>,
) -> Option<LocaleKey> {
    if cluster.trim().is_empty() {
        return prev;
    }
    let Some(cp) = first_significant(cluster) else {
        return prev;
    };
    if let Some(neutral) = NEUTRAL_PRIORITY.into_iter().find(|k| k.contains(cp)) {
        return if active.contains(neutral) {
            Some(neutral)
        } else {
            prev
        };
    }
    SCRIPT_PRIORITY
        .into_iter()
        .find(|&k| active.contains(k) && k.contains(cp))
}

/// A maximal stretch of clusters sharing one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// Byte offset of the first cluster.
    pub start: usize,
    /// Byte offset just past the last cluster.
    pub end: usize,
    /// Category shared by every cluster of the run.
    pub key: LocaleKey,
}

/// Merge the clusters of `text` into runs, seeded with `carry`.
///
/// Returns the runs that have a category and the category of the last
/// cluster, which seeds the next fragment.
#[must_use]
pub fn build_runs(
    text: &str,
    active: ActiveKeys,
    carry: Option<LocaleKey>,
    mode: Segmentation,
) -> (Vec<Run>, Option<LocaleKey>) {
    let mut runs = Vec::new();
    let mut prev = carry;
    let mut current: Option<(usize, Option<LocaleKey>)> = None;
    for (start, _, cluster) in graphemes(text, mode) {
        let key = classify_cluster(cluster, active, prev);
        match current {
            None => current = Some((start, key)),
            Some((run_start, run_key)) if run_key != key => {
                if let Some(run_key) = run_key {
                    runs.push(Run {
                        start: run_start,
                        end: start,
                        key: run_key,
                    });
                }
                current = Some((start, key));
            }
            Some(_) => {}
        }
        prev = key;
    }
    if let Some((start, Some(key))) = current {
        if start < text.len() {
            runs.push(Run {
                start,
                end: text.len(),
                key,
            });
        }
    }
    (runs, prev)
}

/// Locale spans over every fragment of `view`, carrying the category from
/// one fragment into the next. Spans never cross a fragment.
#[must_use]
pub fn locale_spans(
    view: &TextView,
    active: ActiveKeys,
    mode: Segmentation,
    carry: Option<LocaleKey>,
) -> (Vec<Span>, Option<LocaleKey>) {
    let mut spans = Vec::new();
    let mut carry = carry;
    for entry in view.entries() {
        let (runs, last) = build_runs(&view.text()[entry.start..entry.end], active, carry, mode);
        carry = last;
        spans.extend(runs.into_iter().map(|r| {
            Span::new(
                entry.start + r.start,
                entry.start + r.end,
                SpanKind::Locale(r.key),
            )
        }));
    }
    (spans, carry)
}
