#![allow(clippy::struct_excessive_bools)]

use crate::{locale_data::LocaleKey, segmentation::Segmentation};

/// Configuration for an [`Engine`](crate::Engine).
///
/// Storage and editing of these values belongs to the host; the engine only
/// reads them. Every field has a default, so partial documents deserialize
/// cleanly when the `serde` feature is on.
///
/// # Examples
///
/// ```rust
/// use spanweave::{CustomDelimiterOptions, EngineOptions};
///
/// let options = EngineOptions {
///     custom: CustomDelimiterOptions {
///         font: "Fira Sans".into(),
///         open: "<<".into(),
///         close: ">>".into(),
///         wrap_enabled: None,
///     },
///     ..Default::default()
/// }
/// .normalized();
/// assert_eq!(options.custom_tokens(), Some(("<<", ">>")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineOptions {
    /// Master switch. When `false` every pass clears its markers.
    ///
    /// # Default
    ///
    /// `true`
    pub fonts_enabled: bool,

    /// Dialogue quote pass.
    pub dialogue: DialogueOptions,

    /// Custom delimiter pass.
    pub custom: CustomDelimiterOptions,

    /// Per-script locale runs.
    pub locale: LocaleOptions,

    /// Streaming buffer behaviour.
    pub stream: StreamOptions,

    /// Per-grapheme typewriter units.
    pub typewriter: TypewriterOptions,

    /// Grapheme segmentation to use. Falls back to code points when cluster
    /// tables are not compiled in.
    ///
    /// # Default
    ///
    /// [`Segmentation::detect`]
    pub segmentation: Segmentation,

    /// Hard caps bounding the cost of one pass.
    pub limits: Limits,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            fonts_enabled: true,
            dialogue: DialogueOptions::default(),
            custom: CustomDelimiterOptions::default(),
            locale: LocaleOptions::default(),
            stream: StreamOptions::default(),
            typewriter: TypewriterOptions::default(),
            segmentation: Segmentation::detect(),
            limits: Limits::default(),
        }
    }
}

/// Dialogue quotation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DialogueOptions {
    /// Font description for dialogue. The pass is active only when this is
    /// non-blank.
    pub font: String,
}

/// Custom open/close delimiter pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CustomDelimiterOptions {
    /// Font description for delimited ranges.
    pub font: String,
    /// Opening token. Trimmed before use.
    pub open: String,
    /// Closing token. Trimmed before use.
    pub close: String,
    /// Explicit switch. Unset means "on when font, open and close are all
    /// non-blank".
    pub wrap_enabled: Option<bool>,
}

/// Locale font runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocaleOptions {
    /// Run the locale pass at all.
    pub enabled: bool,
    /// Checked in order; the first rule per known key wins.
    pub rules: Vec<LocaleFontRule>,
}

/// Maps a range key (`"cjk"`, `"latin"`, …) to a font description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocaleFontRule {
    /// Key of a character range, matched after trimming.
    pub range_key: String,
    /// Font description applied to runs of that range.
    pub font: String,
}

impl LocaleFontRule {
    /// Rule mapping `range_key` to `font`.
    #[must_use]
    pub fn new(range_key: impl Into<String>, font: impl Into<String>) -> Self {
        Self {
            range_key: range_key.into(),
            font: font.into(),
        }
    }
}

/// How a root that is still receiving content is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", rename_all = "lowercase"))]
pub enum RenderMode {
    /// The host shows the live root as-is; annotation waits for the end of
    /// generation.
    #[default]
    Live,
    /// The engine annotates the root on every tick and maintains a
    /// segmented [`StreamFrame`](crate::StreamFrame) for it.
    Buffered,
}

impl From<&str> for RenderMode {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "buffer" | "buffered" => RenderMode::Buffered,
            _ => RenderMode::Live,
        }
    }
}

impl From<String> for RenderMode {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

/// Entrance animation for newly streamed units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", rename_all = "lowercase"))]
pub enum StreamEffect {
    /// No animation; fragments are mirrored whole.
    #[default]
    None,
    /// Graphemes appear one by one, with an optional caret.
    Typewriter,
    /// Words fade in from a blur.
    Blur,
    /// Words fade in with a glow.
    Glow,
}

impl From<&str> for StreamEffect {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "typewriter" => StreamEffect::Typewriter,
            "blur" => StreamEffect::Blur,
            "glow" => StreamEffect::Glow,
            _ => StreamEffect::None,
        }
    }
}

impl From<String> for StreamEffect {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

/// Unit size used when segmenting a streaming buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// One unit per grapheme cluster.
    Grapheme,
    /// One unit per word, with whitespace between units.
    Word,
}

impl StreamEffect {
    /// Segmentation granularity the effect animates at; `None` when the
    /// buffer is mirrored without animation.
    #[must_use]
    pub fn granularity(self) -> Option<Granularity> {
        match self {
            StreamEffect::None => None,
            StreamEffect::Typewriter => Some(Granularity::Grapheme),
            StreamEffect::Blur | StreamEffect::Glow => Some(Granularity::Word),
        }
    }
}

/// Mirroring and animation of a streaming root.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamOptions {
    /// # Default
    ///
    /// [`RenderMode::Live`]
    pub render_mode: RenderMode,
    /// # Default
    ///
    /// [`StreamEffect::None`]
    pub effect: StreamEffect,
    /// Delay between the entrances of consecutive new units, clamped to
    /// 10..=80 ms.
    ///
    /// # Default
    ///
    /// `20`
    pub speed_ms: u32,
    /// Show a trailing caret. Only honoured by the typewriter effect.
    ///
    /// # Default
    ///
    /// `true`
    pub cursor: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Live,
            effect: StreamEffect::None,
            speed_ms: DEFAULT_STEP_MS,
            cursor: true,
        }
    }
}

pub(crate) const DEFAULT_STEP_MS: u32 = 20;
const MIN_STREAM_STEP_MS: u32 = 10;
const MAX_STREAM_STEP_MS: u32 = 80;

/// Typewriter timing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TypewriterOptions {
    /// Explode [`Role::Typewriter`](crate::Role::Typewriter) containers into
    /// per-grapheme units.
    ///
    /// # Default
    ///
    /// `true`
    pub enabled: bool,
    /// Delay per unit used to chain consecutive containers. Zero falls back
    /// to 20 ms.
    ///
    /// # Default
    ///
    /// `20`
    pub step_ms: u32,
}

impl Default for TypewriterOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            step_ms: DEFAULT_STEP_MS,
        }
    }
}

/// Caps that bound worst-case work per pass. Reaching one stops admitting
/// more work for that pass; nothing already committed is undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Limits {
    /// Characters admitted into one text view.
    pub max_text_chars: usize,
    /// Fragments admitted into one text view.
    pub max_fragments: usize,
    /// Spans emitted by one delimiter scan.
    pub max_delimiter_spans: usize,
    /// Quotations wrapped by one quote pass.
    pub max_quote_spans: usize,
    /// Wrappers created by one locale pass.
    pub max_locale_wraps: usize,
    /// Units emitted into one stream frame.
    pub max_stream_units: usize,
    /// Upper bound on each token count recorded in a signature.
    pub signature_token_cap: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_text_chars: 50_000,
            max_fragments: 20_000,
            max_delimiter_spans: 200,
            max_quote_spans: 12_000,
            max_locale_wraps: 12_000,
            max_stream_units: 20_000,
            signature_token_cap: 50,
        }
    }
}

impl EngineOptions {
    /// Apply the documented defaults and clamps.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.stream.speed_ms = self
            .stream
            .speed_ms
            .clamp(MIN_STREAM_STEP_MS, MAX_STREAM_STEP_MS);
        if self.custom.wrap_enabled.is_none() {
            let c = &self.custom;
            self.custom.wrap_enabled = Some(
                !c.font.trim().is_empty() && !c.open.trim().is_empty() && !c.close.trim().is_empty(),
            );
        }
        if self.typewriter.step_ms == 0 {
            self.typewriter.step_ms = DEFAULT_STEP_MS;
        }
        if !crate::segmentation::clusters_available() {
            self.segmentation = Segmentation::CodePoints;
        }
        self
    }

    /// Whether the dialogue quote pass runs.
    #[must_use]
    pub fn dialogue_active(&self) -> bool {
        self.fonts_enabled && !self.dialogue.font.trim().is_empty()
    }

    /// Trimmed `(open, close)` when the custom delimiter pass runs.
    #[must_use]
    pub fn custom_tokens(&self) -> Option<(&str, &str)> {
        let c = &self.custom;
        let enabled = self.fonts_enabled
            && c.wrap_enabled.unwrap_or(false)
            && !c.font.trim().is_empty();
        let (open, close) = (c.open.trim(), c.close.trim());
        (enabled && !open.is_empty() && !close.is_empty()).then_some((open, close))
    }

    /// Trimmed custom tokens used to label quotes, regardless of whether the
    /// custom delimiter pass itself is on.
    #[must_use]
    pub fn custom_label_tokens(&self) -> Option<(&str, &str)> {
        let (open, close) = (self.custom.open.trim(), self.custom.close.trim());
        (!open.is_empty() && !close.is_empty()).then_some((open, close))
    }

    /// Active `(key, font)` pairs in first-seen key order. Unknown keys and
    /// blank fonts are dropped; a repeated key keeps its slot and takes the
    /// later font.
    #[must_use]
    pub fn locale_rules(&self) -> Vec<(LocaleKey, &str)> {
        let mut rules: Vec<(LocaleKey, &str)> = Vec::new();
        if !self.fonts_enabled || !self.locale.enabled {
            return rules;
        }
        for rule in &self.locale.rules {
            let Some(key) = LocaleKey::from_key(rule.range_key.trim()) else {
                tracing::debug!(range_key = %rule.range_key, "locale.rule.unknown_key");
                continue;
            };
            let font = rule.font.trim();
            if font.is_empty() {
                continue;
            }
            match rules.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = font,
                None => rules.push((key, font)),
            }
        }
        rules
    }

    /// Whether the streaming caret is shown.
    #[must_use]
    pub fn cursor_active(&self) -> bool {
        self.stream.cursor && self.stream.effect == StreamEffect::Typewriter
    }
}
