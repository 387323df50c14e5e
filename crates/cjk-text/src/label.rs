//! Label/body splitting for list items

/// Colons that separate a label from its body (full-width and ASCII)
pub const LABEL_SEPARATORS: [char; 2] = ['：', ':'];

/// A list item split at its first colon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSplit<'a> {
    /// Label including the colon, if the item has one
    pub label: Option<&'a str>,
    /// Remaining text, verbatim (leading whitespace is kept)
    pub body: &'a str,
}

/// Split a list item at the first colon (`:` or `：`, whichever comes first)
///
/// Items without a colon have no label and the whole item as body.
pub fn split_label_body(item: &str) -> LabelSplit<'_> {
    match item.char_indices().find(|(_, c)| LABEL_SEPARATORS.contains(c)) {
        Some((idx, colon)) => {
            let end = idx + colon.len_utf8();
            LabelSplit {
                label: Some(&item[..end]),
                body: &item[end..],
            }
        }
        None => LabelSplit {
            label: None,
            body: item,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_ascii_colon() {
        let split = split_label_body("A: hello");
        assert_eq!(split.label, Some("A:"));
        assert_eq!(split.body, " hello");
    }

    #[test]
    fn test_split_fullwidth_colon() {
        let split = split_label_body("項目：説明");
        assert_eq!(split.label, Some("項目："));
        assert_eq!(split.body, "説明");
    }

    #[test]
    fn test_split_first_colon_wins() {
        let split = split_label_body("time: 10:30");
        assert_eq!(split.label, Some("time:"));
        assert_eq!(split.body, " 10:30");

        let split = split_label_body("a：b:c");
        assert_eq!(split.label, Some("a："));
        assert_eq!(split.body, "b:c");

        let split = split_label_body("a:b：c");
        assert_eq!(split.label, Some("a:"));
        assert_eq!(split.body, "b：c");
    }

    #[test]
    fn test_split_no_colon() {
        let split = split_label_body("plain item");
        assert_eq!(split.label, None);
        assert_eq!(split.body, "plain item");
    }

    #[test]
    fn test_split_label_only() {
        let split = split_label_body("Label:");
        assert_eq!(split.label, Some("Label:"));
        assert_eq!(split.body, "");
    }

    #[test]
    fn test_split_empty() {
        let split = split_label_body("");
        assert_eq!(split.label, None);
        assert_eq!(split.body, "");
    }
}
