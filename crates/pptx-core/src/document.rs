//! Presentation document wrapper

use crate::image::{fit_centered, ImageSource};
use crate::package::{resolve_target, Package};
use crate::shape::{self, AutoFit, Frame, Insets, ParagraphFormat, ShapeInfo, TextParagraph};
use crate::theme::{FontDeclaration, ThemeFontSet};
use crate::xml::{XmlDocument, XmlElement, XmlNode};
use crate::{PptxError, Result};
use std::path::Path;

const SHAPE_TREE: &str = "p:cSld/p:spTree";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Slide deck providing shape lookup and text/picture replacement
#[derive(Debug, Clone)]
pub struct PptxDocument {
    package: Package,
    /// Slide part names in presentation order
    slide_parts: Vec<String>,
}

impl PptxDocument {
    /// Open a presentation from a file path
    ///
    /// # Example
    /// ```ignore
    /// let doc = PptxDocument::open("template.pptx")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_package(Package::open(path)?)
    }

    /// Open a presentation from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(data)?)
    }

    fn from_package(package: Package) -> Result<Self> {
        let presentation = package
            .related_part("", "officeDocument")?
            .ok_or_else(|| PptxError::OpenError("package has no main document".to_string()))?;
        let pres_xml = package.xml_part(&presentation)?;
        let pres_rels = package.relationships(&presentation)?;

        let mut slide_parts = Vec::new();
        if let Some(list) = pres_xml.root.child("p:sldIdLst") {
            for sld_id in list.children_named("p:sldId") {
                let rel = sld_id
                    .attr("r:id")
                    .and_then(|id| pres_rels.get(id))
                    .ok_or_else(|| {
                        PptxError::OpenError("slide id without relationship".to_string())
                    })?;
                slide_parts.push(resolve_target(&presentation, &rel.target));
            }
        }

        tracing::debug!("opened presentation with {} slides", slide_parts.len());
        Ok(Self {
            package,
            slide_parts,
        })
    }

    /// Get the number of slides
    pub fn slide_count(&self) -> usize {
        self.slide_parts.len()
    }

    fn slide_part(&self, index: usize) -> Result<&str> {
        self.slide_parts
            .get(index)
            .map(String::as_str)
            .ok_or(PptxError::InvalidSlide(index, self.slide_parts.len()))
    }

    fn slide_xml(&self, index: usize) -> Result<(String, XmlDocument)> {
        let part = self.slide_part(index)?.to_string();
        let xml = self.package.xml_part(&part)?;
        Ok((part, xml))
    }

    fn layout_part(&self, slide_part: &str) -> Result<Option<String>> {
        self.package.related_part(slide_part, "slideLayout")
    }

    fn master_part(&self, layout_part: &str) -> Result<Option<String>> {
        self.package.related_part(layout_part, "slideMaster")
    }

    /// Theme fonts of a slide (slide → layout → master → theme)
    ///
    /// A broken chain yields an empty set, so every slot falls back to the
    /// default families.
    pub fn theme_fonts(&self, slide_index: usize) -> Result<ThemeFontSet> {
        let slide_part = self.slide_part(slide_index)?;
        let theme_part = match self.layout_part(slide_part)? {
            Some(layout) => match self.master_part(&layout)? {
                Some(master) => self.package.related_part(&master, "theme")?,
                None => None,
            },
            None => None,
        };

        match theme_part {
            Some(part) if self.package.contains(&part) => {
                Ok(ThemeFontSet::from_theme_xml(&self.package.xml_part(&part)?))
            }
            _ => {
                tracing::warn!("slide {slide_index} has no theme; using default fonts");
                Ok(ThemeFontSet::default())
            }
        }
    }

    /// Names of the top-level shapes on a slide
    pub fn shape_names(&self, slide_index: usize) -> Result<Vec<String>> {
        let (_, xml) = self.slide_xml(slide_index)?;
        Ok(shape::shape_names(shape_tree(&xml)?))
    }

    /// Look up a top-level shape by name
    ///
    /// Placeholders inherit their frame, insets, fonts and paragraph spacing
    /// from the matching layout and master placeholders.
    pub fn shape(&self, slide_index: usize, name: &str) -> Result<ShapeInfo> {
        let (part, xml) = self.slide_xml(slide_index)?;
        let sp = shape::find_shape(shape_tree(&xml)?, name)
            .ok_or_else(|| PptxError::ShapeNotFound(name.to_string()))?;

        let placeholder = shape::placeholder_of(sp);
        let (layout_xml, master_xml) = match &placeholder {
            Some(_) => self.inheritance_parts(&part)?,
            None => (None, None),
        };
        let layout_sp = match (&placeholder, &layout_xml) {
            (Some(ph), Some(doc)) => {
                shape_tree(doc).ok().and_then(|tree| shape::find_layout_placeholder(tree, ph))
            }
            _ => None,
        };
        let master_sp = match (&placeholder, &master_xml) {
            (Some(ph), Some(doc)) => {
                shape_tree(doc).ok().and_then(|tree| shape::find_master_placeholder(tree, ph))
            }
            _ => None,
        };
        // Own shape first, then layout, then master
        let chain: Vec<&XmlElement> = [Some(sp), layout_sp, master_sp].into_iter().flatten().collect();

        let frame = chain.iter().find_map(|el| shape::frame_of(el));

        let mut insets = Insets::default();
        for el in chain.iter().rev() {
            if let Some(body_pr) = shape::body_pr(el) {
                insets.apply_body_pr(body_pr);
            }
        }

        let mut declaration_sources: Vec<&XmlElement> = Vec::new();
        declaration_sources.extend(shape::first_run_properties(sp));
        declaration_sources.extend(shape::first_paragraph(sp).and_then(|p| p.find("a:pPr/a:defRPr")));
        for el in &chain {
            declaration_sources.extend(shape::list_style_level1(el).and_then(|l| l.child("a:defRPr")));
        }
        let font_declarations = declaration_sources
            .into_iter()
            .map(FontDeclaration::from_run_properties)
            .filter(|decl| !decl.is_empty())
            .collect();

        let mut ppr_sources: Vec<&XmlElement> = Vec::new();
        ppr_sources.extend(shape::first_paragraph(sp).and_then(|p| p.child("a:pPr")));
        ppr_sources.extend(chain.iter().filter_map(|el| shape::list_style_level1(el)));
        let paragraph_format = ParagraphFormat::resolve(ppr_sources);

        Ok(ShapeInfo {
            name: name.to_string(),
            id: shape::shape_id(sp).unwrap_or(0),
            kind: shape::kind_of(sp).unwrap_or(crate::ShapeKind::Shape),
            frame,
            insets,
            placeholder,
            has_text_body: sp.child("p:txBody").is_some(),
            font_declarations,
            paragraph_format,
        })
    }

    /// Layout and master parts a slide inherits from
    fn inheritance_parts(
        &self,
        slide_part: &str,
    ) -> Result<(Option<XmlDocument>, Option<XmlDocument>)> {
        let Some(layout) = self.layout_part(slide_part)? else {
            return Ok((None, None));
        };
        let layout_xml = self.package.xml_part(&layout)?;
        let master_xml = match self.master_part(&layout)? {
            Some(master) => Some(self.package.xml_part(&master)?),
            None => None,
        };
        Ok((Some(layout_xml), master_xml))
    }

    /// Read the paragraphs of a shape's text body
    pub fn read_paragraphs(&self, slide_index: usize, name: &str) -> Result<Vec<TextParagraph>> {
        let (_, xml) = self.slide_xml(slide_index)?;
        let sp = shape::find_shape(shape_tree(&xml)?, name)
            .ok_or_else(|| PptxError::ShapeNotFound(name.to_string()))?;
        let tx_body = sp
            .child("p:txBody")
            .ok_or_else(|| PptxError::NoTextFrame(name.to_string()))?;
        Ok(shape::read_paragraphs(tx_body))
    }

    /// Autofit element currently set on a shape's body (`a:noAutofit`, ...)
    pub fn autofit_of(&self, slide_index: usize, name: &str) -> Result<Option<String>> {
        let (_, xml) = self.slide_xml(slide_index)?;
        let sp = shape::find_shape(shape_tree(&xml)?, name)
            .ok_or_else(|| PptxError::ShapeNotFound(name.to_string()))?;
        Ok(shape::body_pr(sp).and_then(|body_pr| {
            body_pr
                .elements()
                .find(|el| el.name.ends_with("Autofit") || el.name == "a:spAutoFit")
                .map(|el| el.name.clone())
        }))
    }

    /// Replace all text of a shape
    ///
    /// Word wrap is turned on and the body's autofit mode is set.
    pub fn write_text(
        &mut self,
        slide_index: usize,
        name: &str,
        paragraphs: &[TextParagraph],
        autofit: AutoFit,
    ) -> Result<()> {
        let (part, mut xml) = self.slide_xml(slide_index)?;
        let tree = shape_tree_mut(&mut xml)?;
        let index = shape::shape_position(tree, name)
            .ok_or_else(|| PptxError::ShapeNotFound(name.to_string()))?;
        let XmlNode::Element(sp) = &mut tree.children[index] else {
            return Err(PptxError::ShapeNotFound(name.to_string()));
        };
        let tx_body = sp
            .child_mut("p:txBody")
            .ok_or_else(|| PptxError::NoTextFrame(name.to_string()))?;

        shape::replace_paragraphs(tx_body, paragraphs);
        shape::set_body_autofit(tx_body, autofit);

        self.package.set_xml_part(&part, &xml);
        Ok(())
    }

    /// Replace a shape with a picture fitted inside its frame
    ///
    /// The picture keeps the image's aspect ratio, is centred in the frame,
    /// takes the shape's place in the z-order and is named `<name>_Fit`.
    /// Returns the picture's frame.
    pub fn replace_with_picture(
        &mut self,
        slide_index: usize,
        name: &str,
        image_path: impl AsRef<Path>,
    ) -> Result<Frame> {
        let image = ImageSource::load(image_path)?;
        let frame = self
            .shape(slide_index, name)?
            .frame
            .ok_or_else(|| PptxError::NoFrame(name.to_string()))?;
        let placed = fit_centered(frame, image.width, image.height);

        let (part, mut xml) = self.slide_xml(slide_index)?;

        let media_part = self.next_media_part(image.format.extension());
        self.package.set_part(&media_part, image.data);
        self.package
            .ensure_default_content_type(image.format.extension(), image.format.content_type())?;

        let mut rels = self.package.relationships(&part)?;
        let media_file = media_part.rsplit('/').next().unwrap_or(&media_part);
        let rel_id = rels.add("image", &format!("../media/{media_file}"));
        self.package.set_relationships(&part, &rels);

        if xml.root.attr("xmlns:r").is_none() {
            xml.root.set_attr("xmlns:r", NS_R);
        }
        let pic_id = shape::max_shape_id(&xml.root) + 1;
        let pic = picture_element(pic_id, &format!("{name}_Fit"), &rel_id, placed);

        let tree = shape_tree_mut(&mut xml)?;
        let index = shape::shape_position(tree, name)
            .ok_or_else(|| PptxError::ShapeNotFound(name.to_string()))?;
        tree.children[index] = XmlNode::Element(pic);

        self.package.set_xml_part(&part, &xml);
        tracing::info!("replaced '{name}' with picture '{name}_Fit'");
        Ok(placed)
    }

    fn next_media_part(&self, extension: &str) -> String {
        (1..)
            .map(|n| format!("ppt/media/image{n}.{extension}"))
            .find(|candidate| !self.package.contains(candidate))
            .unwrap_or_else(|| format!("ppt/media/image.{extension}"))
    }

    /// Access the underlying package
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.package.save(path)
    }

    /// Save the document to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package.to_bytes()
    }
}

fn shape_tree(doc: &XmlDocument) -> Result<&XmlElement> {
    doc.root
        .find(SHAPE_TREE)
        .ok_or_else(|| PptxError::XmlError(format!("{} has no shape tree", doc.root.name)))
}

fn shape_tree_mut(doc: &mut XmlDocument) -> Result<&mut XmlElement> {
    let root_name = doc.root.name.clone();
    doc.root
        .find_mut(SHAPE_TREE)
        .ok_or_else(|| PptxError::XmlError(format!("{root_name} has no shape tree")))
}

fn picture_element(id: u32, name: &str, rel_id: &str, frame: Frame) -> XmlElement {
    let nv_pic_pr = XmlElement::new("p:nvPicPr")
        .with_child(
            XmlElement::new("p:cNvPr")
                .with_attr("id", id.to_string())
                .with_attr("name", name),
        )
        .with_child(
            XmlElement::new("p:cNvPicPr")
                .with_child(XmlElement::new("a:picLocks").with_attr("noChangeAspect", "1")),
        )
        .with_child(XmlElement::new("p:nvPr"));

    let blip_fill = XmlElement::new("p:blipFill")
        .with_child(XmlElement::new("a:blip").with_attr("r:embed", rel_id))
        .with_child(XmlElement::new("a:stretch").with_child(XmlElement::new("a:fillRect")));

    let sp_pr = XmlElement::new("p:spPr").with_child(frame.to_xfrm()).with_child(
        XmlElement::new("a:prstGeom")
            .with_attr("prst", "rect")
            .with_child(XmlElement::new("a:avLst")),
    );

    XmlElement::new("p:pic")
        .with_child(nv_pic_pr)
        .with_child(blip_fill)
        .with_child(sp_pr)
}
