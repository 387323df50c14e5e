//! Text measurement with real glyph metrics

use crate::font::LoadedFont;
use crate::Result;
use cjk_text::is_cjk_char;
use ttf_parser::Face;

/// Rendering resolution used for all pixel measurements
pub const DPI: f32 = 96.0;

/// Convert a point size to pixels at [`DPI`]
pub fn pt_to_px(pt: f32) -> f32 {
    pt * DPI / 72.0
}

/// Measures text using one font face
///
/// Widths are summed in font units and scaled once, so measuring a string
/// piecewise gives the same result as measuring it whole.
pub struct TextMeasurer<'a> {
    face: Face<'a>,
    units_per_em: f32,
    space_advance: u16,
    line_height_units: f32,
}

impl<'a> TextMeasurer<'a> {
    pub fn new(font: &'a LoadedFont) -> Result<Self> {
        Ok(Self::from_face(font.face()?))
    }

    pub fn from_face(face: Face<'a>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let space_advance = face
            .glyph_index(' ')
            .and_then(|id| face.glyph_hor_advance(id))
            .filter(|adv| *adv > 0)
            .unwrap_or(units_per_em / 2);
        let metric_height =
            face.ascender() as i32 - face.descender() as i32 + face.line_gap() as i32;
        let line_height_units = if metric_height > 0 {
            metric_height as f32
        } else {
            units_per_em as f32 * 1.2
        };

        Self {
            face,
            units_per_em: units_per_em as f32,
            space_advance,
            line_height_units,
        }
    }

    pub fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    /// Advance of a character in font units
    ///
    /// Characters without a glyph advance by a full em when CJK and by the
    /// space width otherwise.
    pub fn advance_units(&self, c: char) -> u32 {
        let advance = self
            .face
            .glyph_index(c)
            .filter(|id| id.0 != 0)
            .and_then(|id| self.face.glyph_hor_advance(id));
        match advance {
            Some(adv) => adv as u32,
            None if is_cjk_char(c) => self.units_per_em as u32,
            None => self.space_advance as u32,
        }
    }

    /// Width of text in font units
    pub fn width_units(&self, text: &str) -> u64 {
        text.chars().map(|c| u64::from(self.advance_units(c))).sum()
    }

    /// Convert font units to pixels at a point size
    pub fn units_to_px(&self, units: u64, size_pt: f32) -> f32 {
        units as f32 / self.units_per_em * pt_to_px(size_pt)
    }

    /// Width of text in pixels at a point size
    pub fn measure_width(&self, text: &str, size_pt: f32) -> f32 {
        self.units_to_px(self.width_units(text), size_pt)
    }

    /// Font line height (ascender - descender + line gap) in pixels
    pub fn line_height(&self, size_pt: f32) -> f32 {
        self.line_height_units / self.units_per_em * pt_to_px(size_pt)
    }

    /// One em in pixels
    pub fn em_px(&self, size_pt: f32) -> f32 {
        pt_to_px(size_pt)
    }
}
