//! The four classification passes, as the engine drives them.
//!
//! Every pass exposes the same three steps: whether it is active under the
//! current options, the [`Signature`] it is gated on, and the work itself.
use crate::{
    annotator::{self, Applied},
    delimiter::{count_occurrences, find_delimited},
    error::TreeError,
    locale::{ActiveKeys, classify_cluster, locale_spans},
    locale_data::LocaleKey,
    options::EngineOptions,
    quote::{DEFAULT_PAIRS, QuoteCategory, classify, find_quotes},
    signature::{Signature, config_hash},
    span::{Span, SpanKind},
    text_view::TextView,
    tree::{Element, Marker, MarkerKind, NodeId, Pass, Role, Tree},
};

/// Passes in the order they run on a root.
pub(crate) const PASS_ORDER: [Pass; 4] = [Pass::Quote, Pass::Typewriter, Pass::Delimiter, Pass::Locale];

pub(crate) fn is_active(pass: Pass, options: &EngineOptions) -> bool {
    match pass {
        Pass::Quote => options.dialogue_active(),
        Pass::Typewriter => options.typewriter.enabled,
        Pass::Delimiter => options.custom_tokens().is_some(),
        Pass::Locale => !options.locale_rules().is_empty(),
    }
}

/// Passes that are torn down and rebuilt from scratch when they rerun.
/// The others only ever add to what is already there.
pub(crate) fn rebuilds(pass: Pass) -> bool {
    matches!(pass, Pass::Delimiter | Pass::Locale)
}

fn is_verbatim(el: &Element) -> bool {
    el.role == Role::Verbatim
}

fn count_elements(tree: &Tree, root: NodeId, mut pred: impl FnMut(&Element) -> bool) -> usize {
    tree.descendants(root)
        .filter_map(|n| tree.element(n))
        .filter(|el| pred(el))
        .count()
}

pub(crate) fn signature(
    tree: &Tree,
    root: NodeId,
    pass: Pass,
    options: &EngineOptions,
    text: &str,
) -> Signature {
    let text_len = text.chars().count();
    let markers = tree.marker_count(root, pass);
    let cap = options.limits.signature_token_cap;
    let (config, tokens) = match pass {
        Pass::Quote => (
            config_hash(&(options.dialogue.font.trim(), options.custom_label_tokens())),
            vec![count_elements(tree, root, |el| el.role == Role::Quote)],
        ),
        Pass::Typewriter => (
            config_hash(&(options.typewriter.step_ms, options.segmentation)),
            vec![count_elements(tree, root, |el| el.role == Role::Typewriter)],
        ),
        Pass::Delimiter => {
            let (open, close) = options.custom_tokens().unwrap_or_default();
            (
                config_hash(&(open, close, options.custom.font.trim())),
                vec![
                    count_occurrences(text, open, cap),
                    count_occurrences(text, close, cap),
                ],
            )
        }
        Pass::Locale => (
            config_hash(&(options.locale_rules(), options.segmentation)),
            Vec::new(),
        ),
    };
    Signature {
        config,
        text_len,
        tokens,
        markers,
    }
}

/// Wrap new quotations found in raw fragments, then (re)label every host
/// quotation and quote wrapper under `root`.
///
/// A quotation that sits inside a custom-delimited span loses its dialogue
/// label: host quotations are unmarked and wrappers fall back to plain. The
/// delimited spans are found from the text itself, since the delimiter pass
/// has been cleared whenever this one reruns.
pub(crate) fn run_quotes(
    tree: &mut Tree,
    root: NodeId,
    options: &EngineOptions,
) -> Result<usize, TreeError> {
    let custom = options.custom_label_tokens();
    let dialogue = options.dialogue_active();
    let view = TextView::build(tree, root, &options.limits, |t, n| {
        t.has_ancestor(n, |el| {
            is_verbatim(el)
                || matches!(el.role, Role::Quote | Role::Unit)
                || el.marker(Pass::Quote).is_some()
        })
    });
    let text = view.text();
    let mut spans = Vec::new();
    for entry in view.entries() {
        for m in find_quotes(&text[entry.start..entry.end], DEFAULT_PAIRS) {
            let (start, end) = (entry.start + m.start, entry.start + m.end);
            let category = classify(&text[start..end], custom, dialogue);
            spans.push(Span::new(start, end, SpanKind::Quote(category)));
        }
    }
    let applied = annotator::apply(tree, &view, &spans, Pass::Quote, options.limits.max_quote_spans)?;

    let delimited = Delimited::scan(tree, root, options);
    let quotes: Vec<(NodeId, bool)> = tree
        .descendants(root)
        .filter_map(|n| {
            let el = tree.element(n)?;
            let wrapper = el.marker(Pass::Quote).is_some_and(|m| m.kind == MarkerKind::Wrap);
            (el.role == Role::Quote || wrapper).then_some((n, wrapper))
        })
        .collect();
    for (node, wrapper) in quotes {
        let inside = delimited.covers(tree, node);
        if inside && !wrapper {
            tree.remove_marker(node, Pass::Quote)?;
            continue;
        }
        let tag = if inside {
            QuoteCategory::Plain.tag()
        } else {
            classify(&tree.text_content(node), custom, dialogue).tag()
        };
        let marker = if wrapper {
            Marker::wrap(Pass::Quote, tag)
        } else {
            Marker::mark(Pass::Quote, tag)
        };
        tree.set_marker(node, marker)?;
    }
    Ok(applied.total())
}

/// Custom-delimited spans of a root, over the text the delimiter pass scans.
struct Delimited {
    view: TextView,
    spans: Vec<Span>,
}

impl Delimited {
    fn scan(tree: &Tree, root: NodeId, options: &EngineOptions) -> Self {
        let Some((open, close)) = options.custom_tokens() else {
            return Self {
                view: TextView::default(),
                spans: Vec::new(),
            };
        };
        let view = TextView::build(tree, root, &options.limits, |t, n| t.has_ancestor(n, is_verbatim));
        let spans = find_delimited(view.text(), open, close, options.limits.max_delimiter_spans);
        Self { view, spans }
    }

    /// Whether the text of `node` lies inside a single delimited span.
    fn covers(&self, tree: &Tree, node: NodeId) -> bool {
        if self.spans.is_empty() {
            return false;
        }
        let mut range: Option<(usize, usize)> = None;
        for entry in self.view.entries() {
            if entry.node == node || tree.ancestors(entry.node).any(|a| a == node) {
                let (start, end) = range.unwrap_or((entry.start, entry.end));
                range = Some((start.min(entry.start), end.max(entry.end)));
            }
        }
        range.is_some_and(|(start, end)| {
            self.spans.iter().any(|s| s.start <= start && end <= s.end)
        })
    }
}

pub(crate) fn run_delimiter(
    tree: &mut Tree,
    root: NodeId,
    options: &EngineOptions,
) -> Result<Applied, TreeError> {
    let Some((open, close)) = options.custom_tokens() else {
        return Ok(Applied::default());
    };
    let view = TextView::build(tree, root, &options.limits, |t, n| t.has_ancestor(n, is_verbatim));
    let spans = find_delimited(view.text(), open, close, options.limits.max_delimiter_spans);
    annotator::apply(tree, &view, &spans, Pass::Delimiter, usize::MAX)
}

/// Locale runs over plain text, then per-unit marks carried in document
/// order. Units under a custom delimiter never carry a locale mark.
pub(crate) fn run_locale(
    tree: &mut Tree,
    root: NodeId,
    options: &EngineOptions,
) -> Result<Applied, TreeError> {
    let active: ActiveKeys = options.locale_rules().into_iter().map(|(k, _)| k).collect();
    let view = TextView::build(tree, root, &options.limits, |t, n| {
        t.has_ancestor(n, |el| {
            is_verbatim(el)
                || el.role == Role::Unit
                || el.marker(Pass::Delimiter).is_some()
                || el.marker(Pass::Locale).is_some()
        })
    });
    let (spans, _) = locale_spans(&view, active, options.segmentation, None);
    let mut applied = annotator::apply(
        tree,
        &view,
        &spans,
        Pass::Locale,
        options.limits.max_locale_wraps,
    )?;

    let units: Vec<NodeId> = tree
        .descendants(root)
        .filter(|&n| tree.element(n).is_some_and(|el| el.role == Role::Unit))
        .collect();
    let mut prev: Option<LocaleKey> = None;
    for unit in units {
        let delimited = tree
            .element(unit)
            .is_some_and(|el| el.marker(Pass::Delimiter).is_some())
            || tree.has_ancestor(unit, |el| el.marker(Pass::Delimiter).is_some());
        if delimited {
            tree.remove_marker(unit, Pass::Locale)?;
            continue;
        }
        let key = classify_cluster(&tree.text_content(unit), active, prev);
        match key {
            Some(key) => {
                tree.set_marker(unit, Marker::mark(Pass::Locale, key.as_str()))?;
                applied.marked += 1;
            }
            None => {
                tree.remove_marker(unit, Pass::Locale)?;
            }
        }
        prev = key;
    }
    Ok(applied)
}
