//! Font size fitting
//!
//! The solver wraps paragraphs greedily with real glyph advances and walks
//! the font size down from the maximum until the wrapped text is no taller
//! than the budget. Wrapping follows `cjk_text::segment`: Latin words break
//! at whitespace, CJK text between characters except where kinsoku rules
//! glue two segments together.

use crate::{Result, TemplateError};
use cjk_text::{segment, split_label_body};
use pptx_core::{
    pt_to_px, LineSpacing, ParagraphFormat, TextMeasurer, TextParagraph, TextRun, MAX_FONT_SIZE_PT,
};

/// Slack for float comparisons in pixels
const EPSILON_PX: f32 = 1e-3;

/// Minimum line pitch as a multiple of the em
const MIN_PITCH_EM: f32 = 1.2;

/// Space available to text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitBudget {
    /// Content width in points (frame minus insets)
    pub width_pt: f32,
    /// Content height in points
    pub height_pt: f32,
    pub max_font_size: u32,
    /// Hard floor; text that does not fit at this size overflows
    pub min_font_size: u32,
}

impl FitBudget {
    pub fn new(width_pt: f32, height_pt: f32, max_font_size: u32, min_font_size: u32) -> Self {
        Self {
            width_pt,
            height_pt,
            max_font_size,
            min_font_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.width_pt.is_finite() || self.width_pt <= 0.0 {
            return Err(TemplateError::InvalidBudget(format!(
                "width must be positive, got {}pt",
                self.width_pt
            )));
        }
        if !self.height_pt.is_finite() || self.height_pt <= 0.0 {
            return Err(TemplateError::InvalidBudget(format!(
                "height must be positive, got {}pt",
                self.height_pt
            )));
        }
        if self.min_font_size == 0 {
            return Err(TemplateError::InvalidBudget(
                "minimum font size must be positive".to_string(),
            ));
        }
        if self.max_font_size > MAX_FONT_SIZE_PT {
            return Err(TemplateError::InvalidBudget(format!(
                "maximum font size {} exceeds {MAX_FONT_SIZE_PT}pt",
                self.max_font_size
            )));
        }
        if self.min_font_size > self.max_font_size {
            return Err(TemplateError::InvalidBudget(format!(
                "minimum font size {} exceeds maximum {}",
                self.min_font_size, self.max_font_size
            )));
        }
        Ok(())
    }
}

/// A run of text measured with the regular or the bold face
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// A paragraph of runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// One non-bold run
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::plain(text)],
        }
    }

    /// Split a list item into a bold label (colon included) and a plain body
    ///
    /// Items without a colon become a single plain run.
    pub fn from_list_item(item: &str) -> Self {
        let split = split_label_body(item);
        let mut runs = Vec::with_capacity(2);
        match split.label {
            Some(label) => {
                runs.push(Run::bold(label));
                if !split.body.is_empty() {
                    runs.push(Run::plain(split.body));
                }
            }
            None => runs.push(Run::plain(split.body)),
        }
        Self { runs }
    }

    /// One plain paragraph per line; `\n` and `\r\n` both end a line
    pub fn lines(text: &str) -> Vec<Self> {
        split_lines(text).map(Self::plain).collect()
    }

    /// Paragraphs of a list item spanning several lines
    ///
    /// Only the first line is split into label and body; later lines are
    /// plain paragraphs.
    pub fn list_item_lines(item: &str) -> Vec<Self> {
        let mut lines = split_lines(item);
        let first = Self::from_list_item(lines.next().unwrap_or_default());
        std::iter::once(first).chain(lines.map(Self::plain)).collect()
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Document paragraph with every run at `size`
    ///
    /// With `explicit_bold` each run's bold flag is written; otherwise the
    /// template's own bold setting is kept.
    pub fn to_text_paragraph(&self, size: u32, explicit_bold: bool) -> TextParagraph {
        let runs = self
            .runs
            .iter()
            .map(|run| {
                let written = TextRun::plain(run.text.clone()).with_size(size);
                if explicit_bold {
                    written.with_bold(run.bold)
                } else {
                    written
                }
            })
            .collect();
        TextParagraph { runs }
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Outcome of a fit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitResult {
    /// Chosen size in points
    pub font_size: u32,
    /// Wrapped line count at that size
    pub line_count: usize,
    /// Even the minimum size did not fit
    pub overflow: bool,
}

/// A breakable unit after gluing, with the whitespace before it
#[derive(Debug, Clone, Copy)]
struct Item {
    space_before_px: f32,
    width_px: f32,
}

/// Finds the largest font size at which paragraphs fit a budget
pub struct FitSolver<'f> {
    regular: TextMeasurer<'f>,
    bold: Option<TextMeasurer<'f>>,
    format: ParagraphFormat,
}

impl<'f> FitSolver<'f> {
    pub fn new(regular: TextMeasurer<'f>) -> Self {
        Self {
            regular,
            bold: None,
            format: ParagraphFormat::default(),
        }
    }

    /// Measure bold runs with a separate face
    pub fn with_bold(mut self, bold: Option<TextMeasurer<'f>>) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_format(mut self, format: ParagraphFormat) -> Self {
        self.format = format;
        self
    }

    /// Largest size in `[min, max]` whose wrapped height fits the budget
    ///
    /// When no size fits the minimum is returned with `overflow` set.
    pub fn solve(&self, paragraphs: &[Paragraph], budget: &FitBudget) -> Result<FitResult> {
        budget.validate()?;

        if paragraphs.is_empty() {
            return Ok(FitResult {
                font_size: budget.max_font_size,
                line_count: 0,
                overflow: false,
            });
        }

        let width_px = pt_to_px(budget.width_pt);
        let height_px = pt_to_px(budget.height_pt);

        for size in (budget.min_font_size..=budget.max_font_size).rev() {
            let lines = self.line_count_px(paragraphs, width_px, size as f32);
            let height = self.height_px(paragraphs.len(), lines, size as f32);
            tracing::debug!(size, lines, height, budget = height_px, "fit candidate");
            if height <= height_px + EPSILON_PX {
                return Ok(FitResult {
                    font_size: size,
                    line_count: lines,
                    overflow: false,
                });
            }
        }

        let size = budget.min_font_size;
        let lines = self.line_count_px(paragraphs, width_px, size as f32);
        tracing::warn!(
            "text overflows {:.1}x{:.1}pt even at {size}pt ({lines} lines)",
            budget.width_pt,
            budget.height_pt
        );
        Ok(FitResult {
            font_size: size,
            line_count: lines,
            overflow: true,
        })
    }

    /// Whether paragraphs fit the budget at a size
    pub fn fits(&self, paragraphs: &[Paragraph], budget: &FitBudget, size: u32) -> bool {
        let lines = self.line_count_px(paragraphs, pt_to_px(budget.width_pt), size as f32);
        self.height_px(paragraphs.len(), lines, size as f32)
            <= pt_to_px(budget.height_pt) + EPSILON_PX
    }

    /// Total wrapped lines of all paragraphs at a size
    pub fn line_count(&self, paragraphs: &[Paragraph], width_pt: f32, size_pt: f32) -> usize {
        self.line_count_px(paragraphs, pt_to_px(width_pt), size_pt)
    }

    /// Height in pixels of wrapped text
    ///
    /// Every line takes one pitch; paragraph spacing applies between
    /// paragraphs only.
    pub fn text_height(&self, paragraphs: &[Paragraph], width_pt: f32, size_pt: f32) -> f32 {
        let lines = self.line_count(paragraphs, width_pt, size_pt);
        self.height_px(paragraphs.len(), lines, size_pt)
    }

    /// Distance between baselines in pixels
    pub fn line_pitch(&self, size_pt: f32) -> f32 {
        match self.format.line_spacing {
            LineSpacing::Proportional(ratio) => {
                let single = self
                    .regular
                    .line_height(size_pt)
                    .max(MIN_PITCH_EM * self.regular.em_px(size_pt));
                single * ratio
            }
            LineSpacing::Exact(points) => pt_to_px(points),
        }
    }

    fn height_px(&self, paragraph_count: usize, lines: usize, size_pt: f32) -> f32 {
        let gaps = paragraph_count.saturating_sub(1) as f32;
        let spacing = pt_to_px(self.format.space_before_pt + self.format.space_after_pt);
        lines as f32 * self.line_pitch(size_pt) + gaps * spacing
    }

    fn line_count_px(&self, paragraphs: &[Paragraph], width_px: f32, size_pt: f32) -> usize {
        paragraphs
            .iter()
            .map(|paragraph| self.wrap(paragraph, width_px, size_pt))
            .sum()
    }

    /// Greedy wrap of one paragraph; an empty paragraph is one line
    fn wrap(&self, paragraph: &Paragraph, width_px: f32, size_pt: f32) -> usize {
        let mut lines = 1;
        let mut current: Option<f32> = None;

        for item in self.items(paragraph, size_pt) {
            current = Some(match current {
                None => item.width_px,
                Some(used) => {
                    let extended = used + item.space_before_px + item.width_px;
                    if extended <= width_px + EPSILON_PX {
                        extended
                    } else {
                        // A unit wider than the line still takes a line of its own
                        lines += 1;
                        item.width_px
                    }
                }
            });
        }

        lines
    }

    /// Breakable units of a paragraph in pixels
    ///
    /// Runs are joined before segmenting so a word spanning two runs stays
    /// whole; each character is measured with its own run's face.
    fn items(&self, paragraph: &Paragraph, size_pt: f32) -> Vec<Item> {
        let text = paragraph.text();
        let bold_ranges = self.bold_ranges(paragraph);

        let mut items: Vec<Item> = Vec::new();
        let mut pending_space = 0.0;
        let mut offset = 0;

        for seg in segment(&text) {
            let width = self.measure(seg.text, offset, &bold_ranges, size_pt);
            offset += seg.text.len();

            if seg.is_space() {
                if !items.is_empty() {
                    pending_space += width;
                }
                continue;
            }

            match items.last_mut() {
                Some(last) if seg.glue && pending_space == 0.0 => last.width_px += width,
                _ => {
                    items.push(Item {
                        space_before_px: pending_space,
                        width_px: width,
                    });
                    pending_space = 0.0;
                }
            }
        }

        items
    }

    /// Byte ranges of the joined text that belong to bold runs
    fn bold_ranges(&self, paragraph: &Paragraph) -> Vec<(usize, usize)> {
        let mut ranges = Vec::new();
        let mut start = 0;
        for run in &paragraph.runs {
            let end = start + run.text.len();
            if run.bold {
                ranges.push((start, end));
            }
            start = end;
        }
        ranges
    }

    /// Width of a slice starting at `offset` of the joined text
    ///
    /// Units are summed per face and scaled once.
    fn measure(
        &self,
        text: &str,
        offset: usize,
        bold_ranges: &[(usize, usize)],
        size_pt: f32,
    ) -> f32 {
        let bold = self.bold.as_ref().unwrap_or(&self.regular);
        let mut regular_units = 0u64;
        let mut bold_units = 0u64;

        for (idx, c) in text.char_indices() {
            let at = offset + idx;
            if bold_ranges.iter().any(|&(from, to)| at >= from && at < to) {
                bold_units += u64::from(bold.advance_units(c));
            } else {
                regular_units += u64::from(self.regular.advance_units(c));
            }
        }

        self.regular.units_to_px(regular_units, size_pt) + bold.units_to_px(bold_units, size_pt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pptx_core::testing::synthetic_font;
    use pptx_core::{FontFile, FontStyle, LoadedFont, DPI};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    /// A synthetic face held in memory
    fn loaded_font(subfamily: &str) -> LoadedFont {
        LoadedFont {
            file: FontFile {
                path: PathBuf::from(format!("TestSans-{subfamily}.ttf")),
                face_index: 0,
                family: "Test Sans".to_string(),
                subfamily: subfamily.to_string(),
                full_name: None,
                style: if subfamily == "Bold" {
                    FontStyle::Bold
                } else {
                    FontStyle::Regular
                },
            },
            data: synthetic_font("Test Sans", subfamily),
        }
    }

    fn face(font: &LoadedFont) -> TextMeasurer<'_> {
        TextMeasurer::new(font).unwrap()
    }

    fn px_to_pt(px: f32) -> f32 {
        px * 72.0 / DPI
    }

    #[test]
    fn test_budget_validation() {
        assert!(FitBudget::new(100.0, 50.0, 24, 6).validate().is_ok());
        assert!(FitBudget::new(100.0, 50.0, MAX_FONT_SIZE_PT, 6).validate().is_ok());
        for budget in [
            FitBudget::new(0.0, 50.0, 24, 6),
            FitBudget::new(100.0, 0.0, 24, 6),
            FitBudget::new(-1.0, 50.0, 24, 6),
            FitBudget::new(f32::NAN, 50.0, 24, 6),
            FitBudget::new(100.0, f32::INFINITY, 24, 6),
            FitBudget::new(100.0, 50.0, 24, 0),
            FitBudget::new(100.0, 50.0, 10, 12),
            FitBudget::new(100.0, 50.0, 50_000_000, 6),
            FitBudget::new(100.0, 50.0, MAX_FONT_SIZE_PT + 1, 6),
        ] {
            assert!(matches!(
                budget.validate(),
                Err(TemplateError::InvalidBudget(_))
            ));
        }
    }

    #[test]
    fn test_solve_rejects_zero_area() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        let paragraphs = [Paragraph::plain("Hello")];
        assert!(matches!(
            solver.solve(&paragraphs, &FitBudget::new(0.0, 100.0, 24, 6)),
            Err(TemplateError::InvalidBudget(_))
        ));
        assert!(matches!(
            solver.solve(&paragraphs, &FitBudget::new(100.0, 0.0, 24, 6)),
            Err(TemplateError::InvalidBudget(_))
        ));
    }

    #[test]
    fn test_list_item_split() {
        assert_eq!(
            Paragraph::from_list_item("A: hello").runs,
            vec![Run::bold("A:"), Run::plain(" hello")]
        );
        assert_eq!(
            Paragraph::from_list_item("見出し：本文").runs,
            vec![Run::bold("見出し："), Run::plain("本文")]
        );
        assert_eq!(
            Paragraph::from_list_item("no label").runs,
            vec![Run::plain("no label")]
        );
        assert_eq!(Paragraph::from_list_item("Only:").runs, vec![Run::bold("Only:")]);
    }

    #[test]
    fn test_line_breaks_start_paragraphs() {
        assert_eq!(
            Paragraph::lines("a\nb\r\nc"),
            vec![Paragraph::plain("a"), Paragraph::plain("b"), Paragraph::plain("c")]
        );
        assert_eq!(Paragraph::lines("single"), vec![Paragraph::plain("single")]);
        assert_eq!(Paragraph::lines(""), vec![Paragraph::plain("")]);

        assert_eq!(
            Paragraph::list_item_lines("A: first\nsecond: line"),
            vec![
                Paragraph {
                    runs: vec![Run::bold("A:"), Run::plain(" first")]
                },
                Paragraph::plain("second: line"),
            ]
        );

        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        assert_eq!(solver.line_count(&Paragraph::lines("a\nb\nc"), 100.0, 10.0), 3);
    }

    #[test]
    fn test_to_text_paragraph() {
        let paragraph = Paragraph::from_list_item("A: hello");
        let written = paragraph.to_text_paragraph(18, true);
        assert_eq!(
            written.runs,
            vec![
                TextRun::plain("A:").with_size(18).with_bold(true),
                TextRun::plain(" hello").with_size(18).with_bold(false),
            ]
        );

        let kept = Paragraph::plain("Title").to_text_paragraph(30, false);
        assert_eq!(kept.runs, vec![TextRun::plain("Title").with_size(30)]);
    }

    #[test]
    fn test_short_cjk_wraps_per_character() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        let text = [Paragraph::plain("短い")];

        // Each character is one em: 10pt wide at 10pt
        assert_eq!(solver.line_count(&text, 30.0, 10.0), 1);
        assert_eq!(solver.line_count(&text, 20.0, 10.0), 1);
        assert_eq!(solver.line_count(&text, 15.0, 10.0), 2);
        assert_eq!(solver.line_count(&text, 5.0, 10.0), 2);
    }

    #[test]
    fn test_latin_wraps_at_spaces() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        // "aaaa" is 4 x 500 units = 20pt at 10pt, a space 2.5pt
        let text = [Paragraph::plain("aaaa aaaa aaaa")];

        assert_eq!(solver.line_count(&text, 65.0, 10.0), 1);
        assert_eq!(solver.line_count(&text, 45.0, 10.0), 2);
        assert_eq!(solver.line_count(&text, 25.0, 10.0), 3);
    }

    #[test]
    fn test_closing_punctuation_stays_with_previous_character() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        // Room for two characters per line; "。" may not start a line
        let text = [Paragraph::plain("あい。")];
        assert_eq!(solver.line_count(&text, 20.0, 10.0), 2);
        // Without the glue the third character would wrap alone as well
        let plain = [Paragraph::plain("あいう")];
        assert_eq!(solver.line_count(&plain, 20.0, 10.0), 2);
        assert_eq!(solver.line_count(&text, 10.0, 10.0), 2);
        assert_eq!(solver.line_count(&plain, 10.0, 10.0), 3);
    }

    #[test]
    fn test_wide_token_takes_one_line() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        let text = [Paragraph::plain("Supercalifragilisticexpialidocious")];

        assert_eq!(solver.line_count(&text, 10.0, 24.0), 1);

        let result = solver.solve(&text, &FitBudget::new(10.0, 5.0, 24, 6)).unwrap();
        assert_eq!(
            result,
            FitResult {
                font_size: 6,
                line_count: 1,
                overflow: true
            }
        );
    }

    #[test]
    fn test_empty_paragraph_is_one_line() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        let text = [Paragraph::plain(""), Paragraph::default()];
        assert_eq!(solver.line_count(&text, 100.0, 12.0), 2);
    }

    #[test]
    fn test_empty_paragraph_list_gets_max() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        let result = solver.solve(&[], &FitBudget::new(100.0, 10.0, 24, 6)).unwrap();
        assert_eq!(result.font_size, 24);
        assert!(!result.overflow);
    }

    #[test]
    fn test_solve_picks_largest_fitting_size() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        // One line pitch is 1.2em; "aaaa" is 2em wide
        let text = [Paragraph::plain("aaaa")];
        let budget = FitBudget::new(200.0, 24.0, 40, 6);

        let result = solver.solve(&text, &budget).unwrap();
        assert_eq!(result.font_size, 20);
        assert_eq!(result.line_count, 1);
        assert!(!result.overflow);
        assert!(solver.fits(&text, &budget, 20));
        assert!(!solver.fits(&text, &budget, 21));
    }

    #[test]
    fn test_fits_is_monotonic() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        let text = [
            Paragraph::plain("The quick brown fox jumps over the lazy dog"),
            Paragraph::from_list_item("項目：日本語のテキストと English words"),
        ];
        let budget = FitBudget::new(180.0, 90.0, 60, 1);

        let mut seen_failure = false;
        for size in 1..=60 {
            let fits = solver.fits(&text, &budget, size);
            if seen_failure {
                assert!(!fits, "size {size} fits after a smaller size did not");
            }
            seen_failure |= !fits;
        }
        assert!(seen_failure);
    }

    #[test]
    fn test_solve_is_deterministic() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        let text = [
            Paragraph::from_list_item("A: hello world"),
            Paragraph::from_list_item("B: 日本語の説明文です"),
        ];
        let budget = FitBudget::new(120.0, 60.0, 24, 6);

        let first = solver.solve(&text, &budget).unwrap();
        for _ in 0..5 {
            assert_eq!(solver.solve(&text, &budget).unwrap(), first);
        }
    }

    #[test]
    fn test_line_pitch() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        // Metric height is one em, so the 1.2em minimum applies
        assert!((px_to_pt(solver.line_pitch(10.0)) - 12.0).abs() < 1e-4);

        let data = loaded_font("Regular");
        let double = FitSolver::new(face(&data)).with_format(ParagraphFormat {
            line_spacing: LineSpacing::Proportional(2.0),
            ..Default::default()
        });
        assert!((px_to_pt(double.line_pitch(10.0)) - 24.0).abs() < 1e-4);

        let exact = FitSolver::new(face(&data)).with_format(ParagraphFormat {
            line_spacing: LineSpacing::Exact(15.0),
            ..Default::default()
        });
        assert!((px_to_pt(exact.line_pitch(10.0)) - 15.0).abs() < 1e-4);
        assert!((px_to_pt(exact.line_pitch(40.0)) - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_paragraph_spacing_between_paragraphs_only() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data)).with_format(ParagraphFormat {
            space_before_pt: 6.0,
            space_after_pt: 4.0,
            ..Default::default()
        });

        let one = [Paragraph::plain("a")];
        assert!((px_to_pt(solver.text_height(&one, 100.0, 10.0)) - 12.0).abs() < 1e-3);

        let three = [Paragraph::plain("a"), Paragraph::plain("b"), Paragraph::plain("c")];
        // 3 lines x 12pt + 2 gaps x 10pt
        assert!((px_to_pt(solver.text_height(&three, 100.0, 10.0)) - 56.0).abs() < 1e-3);
    }

    #[test]
    fn test_bold_runs_use_bold_face() {
        let regular = loaded_font("Regular");
        let solver = FitSolver::new(face(&regular));
        let text = [Paragraph {
            runs: vec![Run::bold("aaaa"), Run::plain(" aaaa")],
        }];
        // Regular face: 20pt + 2.5pt space + 20pt fits a 45pt line
        assert_eq!(solver.line_count(&text, 45.0, 10.0), 1);

        // Bold letters advance 600 units, so the label grows to 24pt
        let bold = loaded_font("Bold");
        let with_bold = FitSolver::new(face(&regular)).with_bold(Some(face(&bold)));
        assert_eq!(with_bold.line_count(&text, 45.0, 10.0), 2);

        // Plain runs keep the regular face
        let plain = [Paragraph::plain("aaaa aaaa")];
        assert_eq!(with_bold.line_count(&plain, 45.0, 10.0), 1);
    }

    #[test]
    fn test_word_spanning_runs_is_not_split() {
        let data = loaded_font("Regular");
        let solver = FitSolver::new(face(&data));
        // "Label:" + "body" joins into one ten-character word (50pt at 10pt)
        let text = [Paragraph {
            runs: vec![Run::bold("Label:"), Run::plain("body")],
        }];
        assert_eq!(solver.line_count(&text, 40.0, 10.0), 1);
    }
}
