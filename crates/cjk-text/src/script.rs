//! Script classification by Unicode block

/// Script class used to pick a theme font slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Script {
    #[default]
    Latin,
    EastAsian,
}

/// Check if a character belongs to a CJK block
///
/// Covers ideographs (including extensions and compatibility forms),
/// kana, hangul, bopomofo, CJK symbols/punctuation and full-width forms.
pub fn is_cjk_char(c: char) -> bool {
    matches!(c,
        '\u{1100}'..='\u{11FF}' |   // Hangul Jamo
        '\u{2E80}'..='\u{2FDF}' |   // CJK Radicals, Kangxi Radicals
        '\u{3000}'..='\u{303F}' |   // CJK Symbols and Punctuation
        '\u{3040}'..='\u{30FF}' |   // Hiragana, Katakana
        '\u{3100}'..='\u{312F}' |   // Bopomofo
        '\u{3130}'..='\u{318F}' |   // Hangul Compatibility Jamo
        '\u{31F0}'..='\u{31FF}' |   // Katakana Phonetic Extensions
        '\u{3200}'..='\u{33FF}' |   // Enclosed CJK, CJK Compatibility
        '\u{3400}'..='\u{4DBF}' |   // Extension A
        '\u{4E00}'..='\u{9FFF}' |   // Unified Ideographs
        '\u{AC00}'..='\u{D7AF}' |   // Hangul Syllables
        '\u{F900}'..='\u{FAFF}' |   // Compatibility Ideographs
        '\u{FE30}'..='\u{FE4F}' |   // Compatibility Forms
        '\u{FF00}'..='\u{FFEF}' |   // Halfwidth and Fullwidth Forms
        '\u{20000}'..='\u{2FA1F}'   // Extensions B..F, Compatibility Supplement
    )
}

/// Dominant script of a text run
///
/// Whitespace is ignored. East-Asian wins when CJK characters are at least
/// as numerous as the rest; text without any CJK character is Latin.
pub fn dominant_script(text: &str) -> Script {
    let (cjk, other) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(cjk, other), c| {
            if is_cjk_char(c) {
                (cjk + 1, other)
            } else {
                (cjk, other + 1)
            }
        });

    if cjk > 0 && cjk >= other {
        Script::EastAsian
    } else {
        Script::Latin
    }
}
