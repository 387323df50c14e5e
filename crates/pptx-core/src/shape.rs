//! Shape-level DrawingML: frames, insets, paragraph formats and run writing

use crate::theme::FontDeclaration;
use crate::units;
use crate::xml::{XmlElement, XmlNode};

/// Element names of shapes that can appear in a shape tree
pub(crate) const SHAPE_ELEMENTS: [&str; 5] =
    ["p:sp", "p:pic", "p:graphicFrame", "p:grpSp", "p:cxnSp"];

const AUTOFIT_ELEMENTS: [&str; 3] = ["a:noAutofit", "a:normAutofit", "a:spAutoFit"];

/// Largest font size DrawingML accepts (`sz` 400000)
pub const MAX_FONT_SIZE_PT: u32 = 4000;

/// Default left/right body inset (0.1 inch)
pub const DEFAULT_HORIZONTAL_INSET: i64 = 91_440;
/// Default top/bottom body inset (0.05 inch)
pub const DEFAULT_VERTICAL_INSET: i64 = 45_720;

/// Position and size in EMU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    /// Read `a:off`/`a:ext` of an `a:xfrm` (or `p:xfrm`) element
    pub(crate) fn from_xfrm(xfrm: &XmlElement) -> Option<Self> {
        let off = xfrm.child("a:off")?;
        let ext = xfrm.child("a:ext")?;
        Some(Self {
            x: off.attr("x")?.parse().ok()?,
            y: off.attr("y")?.parse().ok()?,
            cx: ext.attr("cx")?.parse().ok()?,
            cy: ext.attr("cy")?.parse().ok()?,
        })
    }

    pub(crate) fn to_xfrm(self) -> XmlElement {
        XmlElement::new("a:xfrm")
            .with_child(
                XmlElement::new("a:off")
                    .with_attr("x", self.x.to_string())
                    .with_attr("y", self.y.to_string()),
            )
            .with_child(
                XmlElement::new("a:ext")
                    .with_attr("cx", self.cx.to_string())
                    .with_attr("cy", self.cy.to_string()),
            )
    }

    pub fn width_pt(&self) -> f32 {
        units::emu_to_pt(self.cx)
    }

    pub fn height_pt(&self) -> f32 {
        units::emu_to_pt(self.cy)
    }
}

/// Text body insets in EMU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insets {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Default for Insets {
    fn default() -> Self {
        Self {
            left: DEFAULT_HORIZONTAL_INSET,
            top: DEFAULT_VERTICAL_INSET,
            right: DEFAULT_HORIZONTAL_INSET,
            bottom: DEFAULT_VERTICAL_INSET,
        }
    }
}

impl Insets {
    /// Override with the insets an `a:bodyPr` declares
    pub(crate) fn apply_body_pr(&mut self, body_pr: &XmlElement) {
        let read = |key: &str| body_pr.attr(key).and_then(|v| v.parse::<i64>().ok());
        if let Some(v) = read("lIns") {
            self.left = v;
        }
        if let Some(v) = read("tIns") {
            self.top = v;
        }
        if let Some(v) = read("rIns") {
            self.right = v;
        }
        if let Some(v) = read("bIns") {
            self.bottom = v;
        }
    }

    pub fn horizontal_pt(&self) -> f32 {
        units::emu_to_pt(self.left + self.right)
    }

    pub fn vertical_pt(&self) -> f32 {
        units::emu_to_pt(self.top + self.bottom)
    }
}

/// Kind of shape element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Shape,
    Picture,
    GraphicFrame,
    Group,
    Connector,
}

impl ShapeKind {
    fn from_element(name: &str) -> Option<Self> {
        match name {
            "p:sp" => Some(Self::Shape),
            "p:pic" => Some(Self::Picture),
            "p:graphicFrame" => Some(Self::GraphicFrame),
            "p:grpSp" => Some(Self::Group),
            "p:cxnSp" => Some(Self::Connector),
            _ => None,
        }
    }
}

/// `p:ph` reference of a placeholder shape
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaceholderRef {
    pub ph_type: Option<String>,
    pub idx: Option<u32>,
}

impl PlaceholderRef {
    pub fn is_title(&self) -> bool {
        matches!(self.ph_type.as_deref(), Some("title" | "ctrTitle"))
    }

    /// Type used to find the master placeholder
    pub(crate) fn master_type(&self) -> &str {
        match self.ph_type.as_deref() {
            Some("title" | "ctrTitle") => "title",
            None | Some("body" | "subTitle" | "obj") => "body",
            Some(other) => other,
        }
    }
}

/// Line spacing of a paragraph
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineSpacing {
    /// Multiple of single spacing (1.0 = single)
    Proportional(f32),
    /// Exact line pitch in points
    Exact(f32),
}

impl Default for LineSpacing {
    fn default() -> Self {
        Self::Proportional(1.0)
    }
}

/// Paragraph spacing that affects text height
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParagraphFormat {
    pub line_spacing: LineSpacing,
    pub space_before_pt: f32,
    pub space_after_pt: f32,
}

impl ParagraphFormat {
    /// Resolve from paragraph-property elements, highest priority first
    ///
    /// Each property is taken from the first element that declares it.
    pub(crate) fn resolve<'a>(chain: impl IntoIterator<Item = &'a XmlElement>) -> Self {
        let mut line_spacing = None;
        let mut before = None;
        let mut after = None;

        for ppr in chain {
            if line_spacing.is_none() {
                line_spacing = ppr.child("a:lnSpc").and_then(parse_line_spacing);
            }
            if before.is_none() {
                before = ppr.child("a:spcBef").and_then(|el| parse_spacing_points(el, "spcBef"));
            }
            if after.is_none() {
                after = ppr.child("a:spcAft").and_then(|el| parse_spacing_points(el, "spcAft"));
            }
        }

        Self {
            line_spacing: line_spacing.unwrap_or_default(),
            space_before_pt: before.unwrap_or(0.0),
            space_after_pt: after.unwrap_or(0.0),
        }
    }
}

fn parse_line_spacing(ln_spc: &XmlElement) -> Option<LineSpacing> {
    if let Some(pct) = ln_spc.child("a:spcPct") {
        // 1/1000 of a percent
        let val: f32 = pct.attr("val")?.parse().ok()?;
        return Some(LineSpacing::Proportional(val / 100_000.0));
    }
    if let Some(pts) = ln_spc.child("a:spcPts") {
        // 1/100 of a point
        let val: f32 = pts.attr("val")?.parse().ok()?;
        return Some(LineSpacing::Exact(val / 100.0));
    }
    None
}

fn parse_spacing_points(spacing: &XmlElement, what: &str) -> Option<f32> {
    if let Some(pts) = spacing.child("a:spcPts") {
        let val: f32 = pts.attr("val")?.parse().ok()?;
        return Some(val / 100.0);
    }
    if spacing.child("a:spcPct").is_some() {
        tracing::warn!("percentage {what} is not supported; treating as 0pt");
        return Some(0.0);
    }
    None
}

/// A run of text with optional bold and size overrides
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextRun {
    pub text: String,
    /// `None` keeps the template run's weight
    pub bold: Option<bool>,
    /// Size in whole points; `None` keeps the template run's size
    pub size: Option<u32>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
}

/// A paragraph of runs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextParagraph {
    pub runs: Vec<TextRun>,
}

impl TextParagraph {
    pub fn single(run: TextRun) -> Self {
        Self { runs: vec![run] }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Autofit mode written to `a:bodyPr`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoFit {
    /// `a:noAutofit`: text keeps the written size
    None,
    /// `a:normAutofit`: the host application shrinks text on overflow
    Shrink,
}

/// Resolved view of a shape on a slide
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeInfo {
    pub name: String,
    pub id: u32,
    pub kind: ShapeKind,
    /// Own or inherited position and size
    pub frame: Option<Frame>,
    pub insets: Insets,
    pub placeholder: Option<PlaceholderRef>,
    pub has_text_body: bool,
    /// Font declarations in priority order (own run, paragraph, list
    /// style, layout, master)
    pub font_declarations: Vec<FontDeclaration>,
    pub paragraph_format: ParagraphFormat,
}

impl ShapeInfo {
    pub fn is_title(&self) -> bool {
        self.placeholder.as_ref().is_some_and(PlaceholderRef::is_title)
    }
}

/// Non-visual properties element (`p:nvSpPr`, `p:nvPicPr`, ...)
fn non_visual(shape: &XmlElement) -> Option<&XmlElement> {
    shape.elements().next().filter(|el| el.name.starts_with("p:nv"))
}

pub(crate) fn shape_name(shape: &XmlElement) -> Option<&str> {
    non_visual(shape)?.child("p:cNvPr")?.attr("name")
}

pub(crate) fn shape_id(shape: &XmlElement) -> Option<u32> {
    non_visual(shape)?.child("p:cNvPr")?.attr("id")?.parse().ok()
}

pub(crate) fn placeholder_of(shape: &XmlElement) -> Option<PlaceholderRef> {
    let ph = non_visual(shape)?.find("p:nvPr/p:ph")?;
    Some(PlaceholderRef {
        ph_type: ph.attr("type").map(str::to_string),
        idx: ph.attr("idx").and_then(|v| v.parse().ok()),
    })
}

fn is_shape(el: &XmlElement) -> bool {
    SHAPE_ELEMENTS.contains(&el.name.as_str())
}

/// Find a top-level shape by name
pub(crate) fn find_shape<'a>(sp_tree: &'a XmlElement, name: &str) -> Option<&'a XmlElement> {
    sp_tree
        .elements()
        .find(|el| is_shape(el) && shape_name(el) == Some(name))
}

/// Index into `sp_tree.children` of a top-level shape
pub(crate) fn shape_position(sp_tree: &XmlElement, name: &str) -> Option<usize> {
    sp_tree.children.iter().position(
        |node| matches!(node, XmlNode::Element(el) if is_shape(el) && shape_name(el) == Some(name)),
    )
}

pub(crate) fn shape_names(sp_tree: &XmlElement) -> Vec<String> {
    sp_tree
        .elements()
        .filter(|el| is_shape(el))
        .filter_map(shape_name)
        .map(str::to_string)
        .collect()
}

/// Highest `cNvPr` id anywhere in the tree
pub(crate) fn max_shape_id(el: &XmlElement) -> u32 {
    el.elements()
        .map(|child| {
            let own = if child.name == "p:cNvPr" {
                child.attr("id").and_then(|v| v.parse().ok()).unwrap_or(0)
            } else {
                0
            };
            own.max(max_shape_id(child))
        })
        .max()
        .unwrap_or(0)
}

/// Find the placeholder a slide placeholder inherits from in a layout
///
/// Matches by `idx` when the reference has one, otherwise by type.
pub(crate) fn find_layout_placeholder<'a>(
    sp_tree: &'a XmlElement,
    ph: &PlaceholderRef,
) -> Option<&'a XmlElement> {
    let placeholders = || {
        sp_tree
            .elements()
            .filter(|el| is_shape(el))
            .filter_map(|el| placeholder_of(el).map(|p| (el, p)))
    };
    match ph.idx {
        Some(idx) => placeholders()
            .find(|(_, p)| p.idx == Some(idx))
            .or_else(|| {
                ph.ph_type
                    .as_ref()
                    .and_then(|_| placeholders().find(|(_, p)| p.ph_type == ph.ph_type))
            })
            .map(|(el, _)| el),
        None => placeholders()
            .find(|(_, p)| p.ph_type == ph.ph_type)
            .map(|(el, _)| el),
    }
}

/// Find the master placeholder of the same kind
pub(crate) fn find_master_placeholder<'a>(
    sp_tree: &'a XmlElement,
    ph: &PlaceholderRef,
) -> Option<&'a XmlElement> {
    let wanted = ph.master_type();
    sp_tree
        .elements()
        .filter(|el| is_shape(el))
        .find(|el| placeholder_of(el).is_some_and(|p| p.master_type() == wanted))
}

/// Own position and size of a shape
pub(crate) fn frame_of(shape: &XmlElement) -> Option<Frame> {
    let xfrm = match shape.name.as_str() {
        "p:graphicFrame" => shape.child("p:xfrm"),
        "p:grpSp" => shape.find("p:grpSpPr/a:xfrm"),
        _ => shape.find("p:spPr/a:xfrm"),
    }?;
    Frame::from_xfrm(xfrm)
}

pub(crate) fn kind_of(shape: &XmlElement) -> Option<ShapeKind> {
    ShapeKind::from_element(&shape.name)
}

pub(crate) fn body_pr(shape: &XmlElement) -> Option<&XmlElement> {
    shape.find("p:txBody/a:bodyPr")
}

pub(crate) fn list_style_level1(shape: &XmlElement) -> Option<&XmlElement> {
    shape.find("p:txBody/a:lstStyle/a:lvl1pPr")
}

pub(crate) fn first_paragraph(shape: &XmlElement) -> Option<&XmlElement> {
    shape.find("p:txBody/a:p")
}

/// Run properties of the first run (or the end-of-paragraph properties)
pub(crate) fn first_run_properties(shape: &XmlElement) -> Option<&XmlElement> {
    let p = first_paragraph(shape)?;
    p.find("a:r/a:rPr").or_else(|| p.child("a:endParaRPr"))
}

/// Read paragraphs of a text body
pub(crate) fn read_paragraphs(tx_body: &XmlElement) -> Vec<TextParagraph> {
    tx_body
        .children_named("a:p")
        .map(|p| TextParagraph {
            runs: p
                .children_named("a:r")
                .map(|r| {
                    let rpr = r.child("a:rPr");
                    TextRun {
                        text: r.child("a:t").map(XmlElement::text).unwrap_or_default(),
                        bold: rpr
                            .and_then(|rpr| rpr.attr("b"))
                            .map(|b| b == "1" || b == "true"),
                        size: rpr
                            .and_then(|rpr| rpr.attr("sz"))
                            .and_then(|sz| sz.parse::<u32>().ok())
                            .map(|sz| sz / 100),
                    }
                })
                .collect(),
        })
        .collect()
}

/// Replace all paragraphs of a text body
///
/// The first paragraph's `a:pPr` and the first run's `a:rPr` are reused as
/// templates so written text keeps the shape's formatting.
pub(crate) fn replace_paragraphs(tx_body: &mut XmlElement, paragraphs: &[TextParagraph]) {
    let first_p = tx_body.child("a:p");
    let ppr_template = first_p.and_then(|p| p.child("a:pPr")).cloned();
    let rpr_template = first_p
        .and_then(|p| p.find("a:r/a:rPr").or_else(|| p.child("a:endParaRPr")))
        .map(|rpr| {
            let mut rpr = rpr.clone();
            rpr.name = "a:rPr".to_string();
            rpr
        })
        .unwrap_or_else(|| XmlElement::new("a:rPr").with_attr("lang", "en-US"));

    tx_body.remove_children(&["a:p"]);

    if paragraphs.is_empty() {
        tx_body.push(XmlElement::new("a:p"));
        return;
    }

    for paragraph in paragraphs {
        let mut p = XmlElement::new("a:p");
        if let Some(ppr) = &ppr_template {
            p.push(ppr.clone());
        }
        for run in &paragraph.runs {
            let mut rpr = rpr_template.clone();
            if let Some(size) = run.size {
                rpr.set_attr("sz", (size.min(MAX_FONT_SIZE_PT) * 100).to_string());
            }
            if let Some(bold) = run.bold {
                rpr.set_attr("b", if bold { "1" } else { "0" });
            }
            rpr.remove_attr("dirty");
            p.push(
                XmlElement::new("a:r")
                    .with_child(rpr)
                    .with_child(XmlElement::new("a:t").with_text(run.text.clone())),
            );
        }
        tx_body.push(p);
    }
}

/// Turn on word wrap and set the autofit mode of a text body
pub(crate) fn set_body_autofit(tx_body: &mut XmlElement, autofit: AutoFit) {
    let body_pr = tx_body.child_or_insert("a:bodyPr");
    body_pr.set_attr("wrap", "square");
    body_pr.remove_children(&AUTOFIT_ELEMENTS);

    let element = match autofit {
        AutoFit::None => XmlElement::new("a:noAutofit"),
        AutoFit::Shrink => XmlElement::new("a:normAutofit"),
    };
    // Autofit comes right after an optional a:prstTxWarp
    let index = body_pr
        .children
        .iter()
        .position(|node| matches!(node, XmlNode::Element(el) if el.name == "a:prstTxWarp"))
        .map(|i| i + 1)
        .unwrap_or(0);
    body_pr.insert(index, element);
}
