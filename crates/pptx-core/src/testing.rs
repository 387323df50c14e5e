//! Test fixtures built in memory: a synthetic TrueType font and a minimal
//! presentation package.
//!
//! The synthetic font maps printable ASCII, kana, CJK unified ideographs
//! and full-width forms. Metrics (units per em 1000):
//!
//! | glyphs            | advance |
//! |-------------------|---------|
//! | space             | 250     |
//! | other ASCII       | 500 (600 in bold faces) |
//! | kana, CJK, full-width | 1000 |
//!
//! Ascender 800, descender -200, no line gap.

use crate::package::{Package, CONTENT_TYPES_PART};
use crate::shape::{Frame, PlaceholderRef};
use crate::theme::ThemeFontSet;
use crate::Result;
use quick_xml::escape::escape;
use std::path::Path;

pub const UNITS_PER_EM: u16 = 1000;
pub const SPACE_ADVANCE: u16 = 250;
pub const LATIN_ADVANCE: u16 = 500;
/// ASCII advance of faces whose subfamily contains "bold"
pub const BOLD_LATIN_ADVANCE: u16 = 600;
pub const CJK_ADVANCE: u16 = 1000;
pub const ASCENDER: i16 = 800;
pub const DESCENDER: i16 = -200;

/// (first char, last char, first glyph id)
const CMAP_RANGES: [(u16, u16, u16); 4] = [
    (0x0020, 0x007E, 1),
    (0x3040, 0x30FF, 96),
    (0x4E00, 0x9FFF, 288),
    (0xFF01, 0xFF5E, 21_280),
];
const NUM_GLYPHS: u16 = 21_374;
/// notdef, 95 ASCII glyphs and the first CJK glyph carry explicit metrics;
/// later glyphs reuse the last advance
const NUM_H_METRICS: u16 = 97;

/// Build a TrueType font with the given family and subfamily names
///
/// The full name is `"{family} {subfamily}"`.
pub fn synthetic_font(family: &str, subfamily: &str) -> Vec<u8> {
    let full_name = format!("{family} {subfamily}");
    let sub = subfamily.to_lowercase();
    let bold = sub.contains("bold");
    let mac_style = u16::from(bold) | (u16::from(sub.contains("italic")) << 1);

    let tables: [(&[u8; 4], Vec<u8>); 6] = [
        (b"cmap", cmap_table()),
        (b"head", head_table(mac_style)),
        (b"hhea", hhea_table()),
        (b"hmtx", hmtx_table(bold)),
        (b"maxp", maxp_table()),
        (b"name", name_table(&[(1, family), (2, subfamily), (4, &full_name)])),
    ];

    let num_tables = tables.len() as u16;
    let mut font = Vec::new();
    font.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    font.extend_from_slice(&num_tables.to_be_bytes());
    font.extend_from_slice(&64u16.to_be_bytes()); // searchRange
    font.extend_from_slice(&2u16.to_be_bytes()); // entrySelector
    font.extend_from_slice(&(num_tables * 16 - 64).to_be_bytes()); // rangeShift

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in &tables {
        font.extend_from_slice(*tag);
        font.extend_from_slice(&0u32.to_be_bytes()); // checksum, not verified
        font.extend_from_slice(&(offset as u32).to_be_bytes());
        font.extend_from_slice(&(data.len() as u32).to_be_bytes());

        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    font.extend_from_slice(&body);
    font
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_i16(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn cmap_table() -> Vec<u8> {
    let mut segments: Vec<(u16, u16, u16)> = CMAP_RANGES
        .iter()
        .map(|&(start, end, gid)| (start, end, gid.wrapping_sub(start)))
        .collect();
    // Required terminating segment
    segments.push((0xFFFF, 0xFFFF, 1));

    let seg_count = segments.len() as u16;
    let mut sub = Vec::new();
    push_u16(&mut sub, 4); // format
    push_u16(&mut sub, 16 + 8 * seg_count); // length
    push_u16(&mut sub, 0); // language
    push_u16(&mut sub, seg_count * 2);
    push_u16(&mut sub, 8); // searchRange
    push_u16(&mut sub, 2); // entrySelector
    push_u16(&mut sub, seg_count * 2 - 8); // rangeShift
    for (_, end, _) in &segments {
        push_u16(&mut sub, *end);
    }
    push_u16(&mut sub, 0); // reservedPad
    for (start, _, _) in &segments {
        push_u16(&mut sub, *start);
    }
    for (_, _, delta) in &segments {
        push_u16(&mut sub, *delta);
    }
    for _ in &segments {
        push_u16(&mut sub, 0); // idRangeOffset
    }

    let mut table = Vec::new();
    push_u16(&mut table, 0); // version
    push_u16(&mut table, 1); // numTables
    push_u16(&mut table, 3); // platform: Windows
    push_u16(&mut table, 1); // encoding: Unicode BMP
    table.extend_from_slice(&12u32.to_be_bytes());
    table.extend_from_slice(&sub);
    table
}

fn head_table(mac_style: u16) -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    t.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // fontRevision
    t.extend_from_slice(&0u32.to_be_bytes()); // checkSumAdjustment
    t.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
    push_u16(&mut t, 0); // flags
    push_u16(&mut t, UNITS_PER_EM);
    t.extend_from_slice(&0i64.to_be_bytes()); // created
    t.extend_from_slice(&0i64.to_be_bytes()); // modified
    push_i16(&mut t, 0); // xMin
    push_i16(&mut t, DESCENDER); // yMin
    push_i16(&mut t, CJK_ADVANCE as i16); // xMax
    push_i16(&mut t, ASCENDER); // yMax
    push_u16(&mut t, mac_style);
    push_u16(&mut t, 8); // lowestRecPPEM
    push_i16(&mut t, 2); // fontDirectionHint
    push_i16(&mut t, 0); // indexToLocFormat
    push_i16(&mut t, 0); // glyphDataFormat
    t
}

fn hhea_table() -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    push_i16(&mut t, ASCENDER);
    push_i16(&mut t, DESCENDER);
    push_i16(&mut t, 0); // lineGap
    push_u16(&mut t, CJK_ADVANCE); // advanceWidthMax
    push_i16(&mut t, 0); // minLeftSideBearing
    push_i16(&mut t, 0); // minRightSideBearing
    push_i16(&mut t, CJK_ADVANCE as i16); // xMaxExtent
    push_i16(&mut t, 1); // caretSlopeRise
    push_i16(&mut t, 0); // caretSlopeRun
    push_i16(&mut t, 0); // caretOffset
    for _ in 0..4 {
        push_i16(&mut t, 0); // reserved
    }
    push_i16(&mut t, 0); // metricDataFormat
    push_u16(&mut t, NUM_H_METRICS);
    t
}

fn hmtx_table(bold: bool) -> Vec<u8> {
    let letter = if bold { BOLD_LATIN_ADVANCE } else { LATIN_ADVANCE };
    let mut t = Vec::new();
    for gid in 0..NUM_H_METRICS {
        let advance = match gid {
            0 => LATIN_ADVANCE,
            1 => SPACE_ADVANCE,
            2..=95 => letter,
            _ => CJK_ADVANCE,
        };
        push_u16(&mut t, advance);
        push_i16(&mut t, 0);
    }
    for _ in NUM_H_METRICS..NUM_GLYPHS {
        push_i16(&mut t, 0);
    }
    t
}

fn maxp_table() -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0x0000_5000u32.to_be_bytes()); // version 0.5
    push_u16(&mut t, NUM_GLYPHS);
    t
}

fn name_table(records: &[(u16, &str)]) -> Vec<u8> {
    let encoded: Vec<Vec<u8>> = records
        .iter()
        .map(|(_, s)| s.encode_utf16().flat_map(u16::to_be_bytes).collect())
        .collect();

    let count = records.len() as u16;
    let mut t = Vec::new();
    push_u16(&mut t, 0); // format
    push_u16(&mut t, count);
    push_u16(&mut t, 6 + 12 * count); // stringOffset

    let mut offset = 0u16;
    for ((name_id, _), bytes) in records.iter().zip(&encoded) {
        push_u16(&mut t, 3); // platform: Windows
        push_u16(&mut t, 1); // encoding: Unicode BMP
        push_u16(&mut t, 0x0409); // language: en-US
        push_u16(&mut t, *name_id);
        push_u16(&mut t, bytes.len() as u16);
        push_u16(&mut t, offset);
        offset += bytes.len() as u16;
    }
    for bytes in &encoded {
        t.extend_from_slice(bytes);
    }
    t
}

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A shape placed on a test slide, layout or master
#[derive(Debug, Clone, Default)]
pub struct TestShape {
    pub name: String,
    pub frame: Option<Frame>,
    pub placeholder: Option<PlaceholderRef>,
    pub paragraphs: Vec<String>,
    pub latin: Option<String>,
    pub east_asian: Option<String>,
    /// Extra `a:bodyPr` attributes
    pub body_attrs: Vec<(String, String)>,
    /// Raw inner XML of `a:lstStyle`
    pub list_style: Option<String>,
    pub has_text_body: bool,
}

impl TestShape {
    /// A plain text box with a frame
    pub fn text_box(name: &str, frame: Frame) -> Self {
        Self {
            name: name.to_string(),
            frame: Some(frame),
            has_text_body: true,
            ..Default::default()
        }
    }

    /// A placeholder without own frame
    pub fn placeholder(name: &str, ph_type: Option<&str>, idx: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            placeholder: Some(PlaceholderRef {
                ph_type: ph_type.map(str::to_string),
                idx,
            }),
            has_text_body: true,
            ..Default::default()
        }
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.paragraphs.push(text.to_string());
        self
    }

    /// Typefaces written on the first run (or the end-of-paragraph properties)
    pub fn with_fonts(mut self, latin: Option<&str>, east_asian: Option<&str>) -> Self {
        self.latin = latin.map(str::to_string);
        self.east_asian = east_asian.map(str::to_string);
        self
    }

    pub fn with_body_attr(mut self, key: &str, value: &str) -> Self {
        self.body_attrs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_list_style(mut self, inner_xml: &str) -> Self {
        self.list_style = Some(inner_xml.to_string());
        self
    }

    pub fn without_text_body(mut self) -> Self {
        self.has_text_body = false;
        self
    }

    fn to_xml(&self, id: u32) -> String {
        let ph = match &self.placeholder {
            Some(ph) => {
                let mut attrs = String::new();
                if let Some(t) = &ph.ph_type {
                    attrs.push_str(&format!(r#" type="{t}""#));
                }
                if let Some(idx) = ph.idx {
                    attrs.push_str(&format!(r#" idx="{idx}""#));
                }
                format!("<p:ph{attrs}/>")
            }
            None => String::new(),
        };
        let sp_pr = match self.frame {
            Some(f) => format!(
                r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
                f.x, f.y, f.cx, f.cy
            ),
            None => "<p:spPr/>".to_string(),
        };
        let tx_body = if self.has_text_body {
            self.text_body_xml()
        } else {
            String::new()
        };
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{}"/><p:cNvSpPr/><p:nvPr>{ph}</p:nvPr></p:nvSpPr>{sp_pr}{tx_body}</p:sp>"#,
            escape(self.name.as_str())
        )
    }

    fn text_body_xml(&self) -> String {
        let body_attrs: String = self
            .body_attrs
            .iter()
            .map(|(k, v)| format!(r#" {k}="{}""#, escape(v.as_str())))
            .collect();
        let mut fonts = String::new();
        if let Some(latin) = &self.latin {
            fonts.push_str(&format!(r#"<a:latin typeface="{}"/>"#, escape(latin.as_str())));
        }
        if let Some(ea) = &self.east_asian {
            fonts.push_str(&format!(r#"<a:ea typeface="{}"/>"#, escape(ea.as_str())));
        }
        let rpr = |name: &str| {
            if fonts.is_empty() {
                format!(r#"<{name} lang="en-US"/>"#)
            } else {
                format!(r#"<{name} lang="en-US">{fonts}</{name}>"#)
            }
        };

        let paragraphs: String = if self.paragraphs.is_empty() {
            format!("<a:p>{}</a:p>", rpr("a:endParaRPr"))
        } else {
            self.paragraphs
                .iter()
                .map(|text| {
                    format!(
                        "<a:p><a:r>{}<a:t>{}</a:t></a:r></a:p>",
                        rpr("a:rPr"),
                        escape(text.as_str())
                    )
                })
                .collect()
        };
        let list_style = match &self.list_style {
            Some(inner) => format!("<a:lstStyle>{inner}</a:lstStyle>"),
            None => "<a:lstStyle/>".to_string(),
        };
        format!("<p:txBody><a:bodyPr{body_attrs}/>{list_style}{paragraphs}</p:txBody>")
    }
}

/// Builds a one-slide presentation
#[derive(Debug, Clone, Default)]
pub struct TemplateBuilder {
    theme: ThemeFontSet,
    slide_shapes: Vec<TestShape>,
    layout_shapes: Vec<TestShape>,
    master_shapes: Vec<TestShape>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theme_fonts(mut self, theme: ThemeFontSet) -> Self {
        self.theme = theme;
        self
    }

    pub fn shape(mut self, shape: TestShape) -> Self {
        self.slide_shapes.push(shape);
        self
    }

    pub fn layout_shape(mut self, shape: TestShape) -> Self {
        self.layout_shapes.push(shape);
        self
    }

    pub fn master_shape(mut self, shape: TestShape) -> Self {
        self.master_shapes.push(shape);
        self
    }

    /// Serialize to PPTX bytes
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut package = Package::default();
        let mut put = |name: &str, xml: String| package.set_part(name, xml.into_bytes());

        put(CONTENT_TYPES_PART, content_types());
        put(
            "_rels/.rels",
            rels(&[("rId1", "officeDocument", "ppt/presentation.xml")]),
        );
        put("ppt/presentation.xml", presentation());
        put(
            "ppt/_rels/presentation.xml.rels",
            rels(&[
                ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
                ("rId2", "slide", "slides/slide1.xml"),
                ("rId3", "theme", "theme/theme1.xml"),
            ]),
        );
        put(
            "ppt/slides/slide1.xml",
            shape_tree_part("p:sld", "", &self.slide_shapes, ""),
        );
        put(
            "ppt/slides/_rels/slide1.xml.rels",
            rels(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]),
        );
        put(
            "ppt/slideLayouts/slideLayout1.xml",
            shape_tree_part("p:sldLayout", r#" type="obj" preserve="1""#, &self.layout_shapes, ""),
        );
        put(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
        );
        put(
            "ppt/slideMasters/slideMaster1.xml",
            shape_tree_part(
                "p:sldMaster",
                "",
                &self.master_shapes,
                r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            ),
        );
        put(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            rels(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                ("rId2", "theme", "../theme/theme1.xml"),
            ]),
        );
        put("ppt/theme/theme1.xml", theme(&self.theme));

        package.to_bytes()
    }

    /// Write the package to a file
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.build()?)?;
        Ok(())
    }
}

fn content_types() -> String {
    format!(
        concat!(
            "{}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
            "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
            "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
            "<Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>",
            "<Override PartName=\"/ppt/slides/slide1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>",
            "<Override PartName=\"/ppt/slideLayouts/slideLayout1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml\"/>",
            "<Override PartName=\"/ppt/slideMasters/slideMaster1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml\"/>",
            "<Override PartName=\"/ppt/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>",
            "</Types>"
        ),
        DECL
    )
}

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(r#"{DECL}<Relationships xmlns="{NS_PKG_RELS}">{body}</Relationships>"#)
}

fn presentation() -> String {
    format!(
        r#"{DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    )
}

fn shape_tree_part(root: &str, root_attrs: &str, shapes: &[TestShape], trailer: &str) -> String {
    let shapes: String = shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| shape.to_xml(i as u32 + 2))
        .collect();
    let color_map = if root == "p:sldMaster" {
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#
    } else {
        "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"
    };
    format!(
        r#"{DECL}<{root} xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"{root_attrs}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld>{color_map}{trailer}</{root}>"#
    )
}

fn theme(fonts: &ThemeFontSet) -> String {
    let face = |slot: &Option<String>| escape(slot.as_deref().unwrap_or("")).into_owned();
    let colors: String = [
        ("dk1", "000000"),
        ("lt1", "FFFFFF"),
        ("dk2", "44546A"),
        ("lt2", "E7E6E6"),
        ("accent1", "4472C4"),
        ("accent2", "ED7D31"),
        ("accent3", "A5A5A5"),
        ("accent4", "FFC000"),
        ("accent5", "5B9BD5"),
        ("accent6", "70AD47"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ]
    .iter()
    .map(|(name, rgb)| format!(r#"<a:{name}><a:srgbClr val="{rgb}"/></a:{name}>"#))
    .collect();

    format!(
        r#"{DECL}<a:theme xmlns:a="{NS_A}" name="Test"><a:themeElements><a:clrScheme name="Test">{colors}</a:clrScheme><a:fontScheme name="Test"><a:majorFont><a:latin typeface="{}"/><a:ea typeface="{}"/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{}"/><a:ea typeface="{}"/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Test"><a:fillStyleLst/><a:lnStyleLst/><a:effectStyleLst/><a:bgFillStyleLst/></a:fmtScheme></a:themeElements></a:theme>"#,
        face(&fonts.major_latin),
        face(&fonts.major_east_asian),
        face(&fonts.minor_latin),
        face(&fonts.minor_east_asian),
    )
}
