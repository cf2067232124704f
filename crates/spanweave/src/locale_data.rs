//! Fixed code-point range tables for the locale classifier.

/// A script or symbol category the locale pass can tag a run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocaleKey {
    /// Han ideographs, their extensions and compatibility forms.
    Cjk,
    /// Hiragana and katakana together, half-width forms included.
    JpKana,
    /// Hiragana only.
    JpHiragana,
    /// Katakana, its phonetic extensions and half-width forms.
    JpKatakana,
    /// Hangul syllables and jamo.
    Hangul,
    /// Bopomofo (Zhuyin).
    Bopomofo,
    /// Latin-1 and the Latin extended blocks.
    Latin,
    /// Cyrillic letters.
    Cyrillic,
    /// Greek letters.
    Greek,
    /// Arabic letters and presentation forms.
    Arabic,
    /// Hebrew letters.
    Hebrew,
    /// Devanagari.
    Devanagari,
    /// Thai.
    Thai,
    /// ASCII and full-width digits. Neutral unless configured.
    Digits,
    /// ASCII, general, CJK and full-width punctuation. Neutral unless
    /// configured.
    Punctuation,
    /// Pictographs and dingbats. Neutral unless configured.
    Emoji,
}

impl LocaleKey {
    /// Every key, in declaration order.
    pub const ALL: [LocaleKey; 16] = [
        LocaleKey::Cjk,
        LocaleKey::JpKana,
        LocaleKey::JpHiragana,
        LocaleKey::JpKatakana,
        LocaleKey::Hangul,
        LocaleKey::Bopomofo,
        LocaleKey::Latin,
        LocaleKey::Cyrillic,
        LocaleKey::Greek,
        LocaleKey::Arabic,
        LocaleKey::Hebrew,
        LocaleKey::Devanagari,
        LocaleKey::Thai,
        LocaleKey::Digits,
        LocaleKey::Punctuation,
        LocaleKey::Emoji,
    ];

    /// Configuration key and marker tag of this category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LocaleKey::Cjk => "cjk",
            LocaleKey::JpKana => "jp_kana",
            LocaleKey::JpHiragana => "jp_hiragana",
            LocaleKey::JpKatakana => "jp_katakana",
            LocaleKey::Hangul => "hangul",
            LocaleKey::Bopomofo => "bopomofo",
            LocaleKey::Latin => "latin",
            LocaleKey::Cyrillic => "cyrillic",
            LocaleKey::Greek => "greek",
            LocaleKey::Arabic => "arabic",
            LocaleKey::Hebrew => "hebrew",
            LocaleKey::Devanagari => "devanagari",
            LocaleKey::Thai => "thai",
            LocaleKey::Digits => "digits",
            LocaleKey::Punctuation => "punctuation",
            LocaleKey::Emoji => "emoji",
        }
    }

    /// Parse a configuration range key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        LocaleKey::ALL.into_iter().find(|k| k.as_str() == key)
    }

    /// Inclusive code-point ranges covered by this key.
    #[must_use]
    pub fn ranges(self) -> &'static [(u32, u32)] {
        match self {
            LocaleKey::Cjk => &[
                (0x3400, 0x4DBF),
                (0x4E00, 0x9FFF),
                (0xF900, 0xFAFF),
                (0x2_0000, 0x2_A6DF),
                (0x2_A700, 0x2_B73F),
                (0x2_B740, 0x2_B81F),
                (0x2_B820, 0x2_CEAF),
                (0x2_CEB0, 0x2_EBEF),
            ],
            LocaleKey::JpKana => &[
                (0x3040, 0x309F),
                (0x30A0, 0x30FF),
                (0x31F0, 0x31FF),
                (0xFF65, 0xFF9F),
            ],
            LocaleKey::JpHiragana => &[(0x3040, 0x309F)],
            LocaleKey::JpKatakana => &[(0x30A0, 0x30FF), (0x31F0, 0x31FF), (0xFF65, 0xFF9F)],
            LocaleKey::Hangul => &[
                (0x1100, 0x11FF),
                (0x3130, 0x318F),
                (0xA960, 0xA97F),
                (0xAC00, 0xD7AF),
                (0xD7B0, 0xD7FF),
            ],
            LocaleKey::Bopomofo => &[(0x3100, 0x312F), (0x31A0, 0x31BF)],
            LocaleKey::Latin => &[(0x0000, 0x00FF), (0x0100, 0x024F), (0x1E00, 0x1EFF)],
            LocaleKey::Cyrillic => &[(0x0400, 0x052F)],
            LocaleKey::Greek => &[(0x0370, 0x03FF)],
            LocaleKey::Arabic => &[
                (0x0600, 0x06FF),
                (0x0750, 0x077F),
                (0x08A0, 0x08FF),
                (0xFB50, 0xFDFF),
                (0xFE70, 0xFEFF),
            ],
            LocaleKey::Hebrew => &[(0x0590, 0x05FF)],
            LocaleKey::Devanagari => &[(0x0900, 0x097F)],
            LocaleKey::Thai => &[(0x0E00, 0x0E7F)],
            LocaleKey::Digits => &[(0x0030, 0x0039), (0xFF10, 0xFF19)],
            LocaleKey::Punctuation => &[
                (0x0020, 0x002F),
                (0x003A, 0x0040),
                (0x005B, 0x0060),
                (0x007B, 0x007E),
                (0x2000, 0x206F),
                (0x3000, 0x303F),
                (0xFF00, 0xFFEF),
            ],
            LocaleKey::Emoji => &[(0x2600, 0x27BF), (0x1_F000, 0x1_FAFF)],
        }
    }

    /// Whether code point `cp` falls in one of this key's ranges.
    #[must_use]
    pub fn contains(self, cp: u32) -> bool {
        self.ranges().iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
    }

    /// Symbol categories that inherit the previous run unless configured.
    #[must_use]
    pub fn is_neutral(self) -> bool {
        matches!(self, LocaleKey::Digits | LocaleKey::Punctuation | LocaleKey::Emoji)
    }
}

/// Script keys in the order they are tried; the neutral keys are checked
/// before these.
pub const SCRIPT_PRIORITY: [LocaleKey; 13] = [
    LocaleKey::JpHiragana,
    LocaleKey::JpKatakana,
    LocaleKey::JpKana,
    LocaleKey::Hangul,
    LocaleKey::Bopomofo,
    LocaleKey::Cjk,
    LocaleKey::Latin,
    LocaleKey::Cyrillic,
    LocaleKey::Greek,
    LocaleKey::Arabic,
    LocaleKey::Hebrew,
    LocaleKey::Devanagari,
    LocaleKey::Thai,
];

/// Neutral keys in the order they are tried.
pub const NEUTRAL_PRIORITY: [LocaleKey; 3] =
    [LocaleKey::Digits, LocaleKey::Punctuation, LocaleKey::Emoji];

/// Combining marks, variation selectors and the zero-width joiner. These
/// never decide the category of a cluster.
#[must_use]
pub fn is_combining_or_variation(cp: u32) -> bool {
    matches!(
        cp,
        0x0300..=0x036F
            | 0x1AB0..=0x1AFF
            | 0x1DC0..=0x1DFF
            | 0x20D0..=0x20FF
            | 0xFE20..=0xFE2F
            | 0xFE00..=0xFE0F
            | 0xE_0100..=0xE_01EF
            | 0x200D
    )
}
