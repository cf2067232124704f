use quickcheck::QuickCheck;

use crate::{
    delimiter::find_delimited,
    locale::{ActiveKeys, build_runs},
    locale_data::LocaleKey,
    quote::{DEFAULT_PAIRS, find_quotes},
    segmentation::Segmentation,
    span::{Span, SpanKind, sorted_and_disjoint},
    tests::utils::{quickcheck_tests, text_from},
};

/// Property: delimiter spans are ordered, disjoint and bounded by the tokens.
#[test]
fn delimiter_spans_are_disjoint_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(picks: Vec<u8>) -> bool {
        let text = text_from(&picks);
        let spans = find_delimited(&text, "<<", ">>", usize::MAX);
        sorted_and_disjoint(&spans)
            && spans.iter().all(|s| {
                let body = &text[s.start..s.end];
                body.len() >= 4 && body.starts_with("<<") && body.ends_with(">>")
            })
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}

/// Property: quotation matches never overlap and start and end on a pair.
#[test]
fn quote_matches_are_disjoint_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(picks: Vec<u8>) -> bool {
        let text = text_from(&picks);
        let matches = find_quotes(&text, DEFAULT_PAIRS);
        let spans: Vec<Span> = matches
            .iter()
            .map(|m| Span::new(m.start, m.end, SpanKind::Delimited))
            .collect();
        sorted_and_disjoint(&spans)
            && matches.iter().all(|m| {
                let pair = DEFAULT_PAIRS[m.pair];
                let body = &text[m.start..m.end];
                body.starts_with(pair.open) && body.ends_with(pair.close)
            })
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}

/// Property: locale runs are ordered, disjoint, non-empty and never join two
/// adjacent runs of the same key.
#[test]
fn locale_runs_are_maximal_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(picks: Vec<u8>, with_digits: bool) -> bool {
        let text = text_from(&picks);
        let mut active: ActiveKeys = [LocaleKey::Latin, LocaleKey::Cjk].into_iter().collect();
        if with_digits {
            active.insert(LocaleKey::Digits);
        }
        let (runs, _) = build_runs(&text, active, None, Segmentation::CodePoints);
        let spans: Vec<Span> = runs
            .iter()
            .map(|r| Span::new(r.start, r.end, SpanKind::Locale(r.key)))
            .collect();
        sorted_and_disjoint(&spans)
            && spans.iter().all(|s| !s.is_empty() && s.end <= text.len())
            && runs
                .windows(2)
                .all(|w| w[0].end < w[1].start || w[0].key != w[1].key)
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Vec<u8>, bool) -> bool);
}
