//! CJK Text - script handling for text fitting
//!
//! This crate provides:
//! - Latin / East-Asian script classification by Unicode block
//! - Line-break opportunities for mixed Latin and CJK text
//! - Label/body splitting of list items at the first colon (`:` or `：`)
//!
//! # Example
//!
//! ```
//! use cjk_text::{dominant_script, segment, split_label_body, Script};
//!
//! assert_eq!(dominant_script("短いテキスト"), Script::EastAsian);
//!
//! let segments = segment("Hello 世界");
//! assert_eq!(segments.len(), 4); // "Hello", " ", "世", "界"
//!
//! let split = split_label_body("Label: body");
//! assert_eq!(split.label, Some("Label:"));
//! assert_eq!(split.body, " body");
//! ```

mod label;
mod linebreak;
mod script;

pub use label::{split_label_body, LabelSplit, LABEL_SEPARATORS};
pub use linebreak::{segment, Segment, SegmentKind};
pub use script::{dominant_script, is_cjk_char, Script};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports_work_together() {
        let item = "見出し：本文です";
        let split = split_label_body(item);
        assert_eq!(split.label, Some("見出し："));
        assert_eq!(dominant_script(split.body), Script::EastAsian);
        assert_eq!(segment(split.body).len(), 4);
    }
}
