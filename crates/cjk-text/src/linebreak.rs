//! Line breaking utilities for mixed Latin and CJK text
//!
//! Latin text breaks at whitespace only. CJK text has no word separators, so
//! a break is allowed at every character boundary, except before closing
//! punctuation and after opening brackets (kinsoku rules).

use crate::script::is_cjk_char;

/// Kind of a text segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Run of non-whitespace, non-CJK characters
    Word,
    /// Single CJK character
    Cjk,
    /// Run of whitespace
    Space,
}

/// A breakable unit of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// The segment text (a slice of the input)
    pub text: &'a str,
    /// Segment kind
    pub kind: SegmentKind,
    /// No line break is allowed before this segment
    pub glue: bool,
}

impl Segment<'_> {
    /// Check if the segment is whitespace
    pub fn is_space(&self) -> bool {
        self.kind == SegmentKind::Space
    }
}

/// Check if a character must not start a line
fn is_closing_punctuation(c: char) -> bool {
    matches!(
        c,
        ')' | ']' | '}' | ',' | '.' | '!' | '?' | ':' | ';' | '%' | '”' | '’'
            | '、' | '。' | '，' | '．' | '）' | '」' | '』' | '】' | '〕' | '〉' | '》'
            | '｝' | '］' | '！' | '？' | '：' | '；' | '・' | '…' | '‥' | 'ー' | '々'
            | 'ゝ' | 'ゞ' | 'ぁ' | 'ぃ' | 'ぅ' | 'ぇ' | 'ぉ' | 'っ' | 'ゃ' | 'ゅ' | 'ょ'
            | 'ゎ' | 'ァ' | 'ィ' | 'ゥ' | 'ェ' | 'ォ' | 'ッ' | 'ャ' | 'ュ' | 'ョ' | 'ヮ'
            | 'ヵ' | 'ヶ'
    )
}

/// Check if a character must not end a line
fn is_opening_punctuation(c: char) -> bool {
    matches!(
        c,
        '(' | '[' | '{' | '“' | '‘' | '（' | '「' | '『' | '【' | '〔' | '〈' | '《' | '｛' | '［'
    )
}

/// Check if breaking between two adjacent characters is allowed
///
/// Whitespace is handled by the caller; this only covers characters that
/// touch each other. Returns true if a line break is allowed between `left`
/// and `right`.
fn can_break_between(left: char, right: char) -> bool {
    if is_closing_punctuation(right) || is_opening_punctuation(left) {
        return false;
    }

    is_cjk_char(left) || is_cjk_char(right)
}

/// Split text into words, whitespace runs and single CJK characters
///
/// Each non-space segment carries a `glue` flag telling whether a line break
/// before it is forbidden. The first segment is never glued.
pub fn segment(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut current: Option<(usize, SegmentKind)> = None;

    for (idx, c) in text.char_indices() {
        let kind = classify(c);
        match current {
            // Words and whitespace runs extend; CJK characters stand alone
            Some((_, open)) if open == kind && kind != SegmentKind::Cjk => continue,
            Some((from, open)) => segments.push(Segment {
                text: &text[from..idx],
                kind: open,
                glue: false,
            }),
            None => {}
        }
        current = Some((idx, kind));
    }

    if let Some((from, kind)) = current {
        segments.push(Segment {
            text: &text[from..],
            kind,
            glue: false,
        });
    }

    for i in 1..segments.len() {
        let (prev, cur) = (segments[i - 1], segments[i]);
        if prev.is_space() || cur.is_space() {
            continue;
        }
        if let (Some(left), Some(right)) = (prev.text.chars().next_back(), cur.text.chars().next())
        {
            segments[i].glue = !can_break_between(left, right);
        }
    }

    segments
}

fn classify(c: char) -> SegmentKind {
    if c.is_whitespace() {
        SegmentKind::Space
    } else if is_cjk_char(c) {
        SegmentKind::Cjk
    } else {
        SegmentKind::Word
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts<'a>(segments: &[Segment<'a>]) -> Vec<&'a str> {
        segments.iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_segment_latin_words() {
        let segments = segment("Hello  world");
        assert_eq!(texts(&segments), vec!["Hello", "  ", "world"]);
        assert_eq!(segments[0].kind, SegmentKind::Word);
        assert_eq!(segments[1].kind, SegmentKind::Space);
        assert!(segments.iter().all(|s| !s.glue));
    }

    #[test]
    fn test_segment_cjk_per_character() {
        let segments = segment("短い");
        assert_eq!(texts(&segments), vec!["短", "い"]);
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Cjk));
        assert!(!segments[1].glue);
    }

    #[test]
    fn test_segment_mixed() {
        let segments = segment("PDF変換");
        assert_eq!(texts(&segments), vec!["PDF", "変", "換"]);
        // Latin/CJK boundary is breakable
        assert!(!segments[1].glue);
    }

    #[test]
    fn test_segment_closing_punctuation_is_glued() {
        let segments = segment("です。");
        assert_eq!(texts(&segments), vec!["で", "す", "。"]);
        assert!(segments[2].glue);
    }

    #[test]
    fn test_segment_opening_bracket_glues_next() {
        let segments = segment("「本」");
        assert_eq!(texts(&segments), vec!["「", "本", "」"]);
        assert!(segments[1].glue);
        assert!(segments[2].glue);
    }

    #[test]
    fn test_segment_latin_punctuation_after_cjk() {
        let segments = segment("漢字, ok");
        assert_eq!(texts(&segments), vec!["漢", "字", ",", " ", "ok"]);
        assert!(segments[2].glue);
        assert!(!segments[4].glue);
    }

    #[test]
    fn test_segment_empty() {
        assert!(segment("").is_empty());
    }

    #[test]
    fn test_can_break_between() {
        assert!(can_break_between('短', 'い'));
        assert!(can_break_between('a', '漢'));
        assert!(!can_break_between('a', 'b'));
        assert!(!can_break_between('漢', '。'));
        assert!(!can_break_between('「', '漢'));
    }
}
