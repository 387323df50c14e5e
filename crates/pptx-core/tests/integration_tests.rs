//! Integration tests for pptx-core
//!
//! These tests build a small presentation through the public package API and
//! exercise the document operations end to end.

use pptx_core::{
    AutoFit, Frame, Package, PptxDocument, PptxError, TextParagraph, TextRun, ThemeFontSet,
};

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn rels(entries: &[(&str, &str, &str)]) -> Vec<u8> {
    let body: String = entries
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
    )
    .into_bytes()
}

fn sp_tree(shapes: &str) -> String {
    format!(
        r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld>"#
    )
}

/// Two slides; slide 2 has a title placeholder and a body text box
fn create_test_pptx() -> Vec<u8> {
    let mut package = Package::default();
    package.set_part(
        "[Content_Types].xml",
        br#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/></Types>"#.to_vec(),
    );
    package.set_part("_rels/.rels", rels(&[("rId1", "officeDocument", "ppt/presentation.xml")]));
    package.set_part(
        "ppt/presentation.xml",
        format!(r#"<p:presentation {NS}><p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst></p:presentation>"#).into_bytes(),
    );
    package.set_part(
        "ppt/_rels/presentation.xml.rels",
        rels(&[
            ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
            ("rId2", "slide", "slides/slide1.xml"),
            ("rId3", "slide", "slides/slide2.xml"),
        ]),
    );
    package.set_part("ppt/slides/slide1.xml", format!("<p:sld {NS}>{}</p:sld>", sp_tree("")).into_bytes());
    package.set_part(
        "ppt/slides/_rels/slide1.xml.rels",
        rels(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]),
    );

    let slide2 = sp_tree(concat!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/>"#,
        r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Old title</a:t></a:r></a:p></p:txBody></p:sp>"#,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes &amp; Tips"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>"#,
        r#"<p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="1270000" cy="635000"/></a:xfrm></p:spPr>"#,
        r#"<p:txBody><a:bodyPr><a:spAutoFit/></a:bodyPr><a:lstStyle/><a:p><a:endParaRPr lang="ja-JP"/></a:p></p:txBody></p:sp>"#,
    ));
    package.set_part("ppt/slides/slide2.xml", format!("<p:sld {NS}>{slide2}</p:sld>").into_bytes());
    package.set_part(
        "ppt/slides/_rels/slide2.xml.rels",
        rels(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]),
    );

    let layout = sp_tree(concat!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Layout Title"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>"#,
        r#"<p:spPr><a:xfrm><a:off x="838200" y="365125"/><a:ext cx="10515600" cy="1325563"/></a:xfrm></p:spPr></p:sp>"#,
    ));
    package.set_part(
        "ppt/slideLayouts/slideLayout1.xml",
        format!("<p:sldLayout {NS}>{layout}</p:sldLayout>").into_bytes(),
    );
    package.set_part(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
    );
    package.set_part(
        "ppt/slideMasters/slideMaster1.xml",
        format!("<p:sldMaster {NS}>{}</p:sldMaster>", sp_tree("")).into_bytes(),
    );
    package.set_part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        rels(&[("rId1", "theme", "../theme/theme1.xml")]),
    );
    package.set_part(
        "ppt/theme/theme1.xml",
        br#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:themeElements><a:fontScheme name="T"><a:majorFont><a:latin typeface="Georgia"/><a:ea typeface="MS Mincho"/></a:majorFont><a:minorFont><a:latin typeface="Verdana"/><a:ea typeface=""/></a:minorFont></a:fontScheme></a:themeElements></a:theme>"#.to_vec(),
    );

    package.to_bytes().unwrap()
}

#[test]
fn test_open_from_bytes() {
    let doc = PptxDocument::open_from_bytes(&create_test_pptx()).unwrap();
    assert_eq!(doc.slide_count(), 2);
    assert!(doc.shape_names(0).unwrap().is_empty());
    assert_eq!(doc.shape_names(1).unwrap(), vec!["Title", "Notes & Tips"]);
}

#[test]
fn test_open_from_file_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.pptx");
    let output = dir.path().join("out.pptx");
    std::fs::write(&input, create_test_pptx()).unwrap();

    let doc = PptxDocument::open(&input).unwrap();
    doc.save(&output).unwrap();

    let reopened = PptxDocument::open(&output).unwrap();
    assert_eq!(reopened.slide_count(), 2);
}

#[test]
fn test_open_missing_file() {
    let result = PptxDocument::open("/nonexistent/deck.pptx");
    assert!(matches!(result, Err(PptxError::OpenError(_))));
}

#[test]
fn test_invalid_slide_index() {
    let doc = PptxDocument::open_from_bytes(&create_test_pptx()).unwrap();
    assert!(matches!(doc.shape(5, "Title"), Err(PptxError::InvalidSlide(5, 2))));
}

#[test]
fn test_theme_fonts_through_layout_chain() {
    let doc = PptxDocument::open_from_bytes(&create_test_pptx()).unwrap();
    assert_eq!(
        doc.theme_fonts(1).unwrap(),
        ThemeFontSet {
            major_latin: Some("Georgia".into()),
            major_east_asian: Some("MS Mincho".into()),
            minor_latin: Some("Verdana".into()),
            minor_east_asian: None,
        }
    );
}

#[test]
fn test_title_frame_comes_from_layout() {
    let doc = PptxDocument::open_from_bytes(&create_test_pptx()).unwrap();
    let title = doc.shape(1, "Title").unwrap();
    assert!(title.is_title());
    assert_eq!(
        title.frame,
        Some(Frame { x: 838_200, y: 365_125, cx: 10_515_600, cy: 1_325_563 })
    );
}

#[test]
fn test_write_text_replaces_autofit() {
    let mut doc = PptxDocument::open_from_bytes(&create_test_pptx()).unwrap();
    let paragraphs = vec![TextParagraph::single(TextRun::plain("新しい").with_size(20))];
    doc.write_text(1, "Notes & Tips", &paragraphs, AutoFit::Shrink).unwrap();

    let reopened = PptxDocument::open_from_bytes(&doc.to_bytes().unwrap()).unwrap();
    let read = reopened.read_paragraphs(1, "Notes & Tips").unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].text(), "新しい");
    assert_eq!(read[0].runs[0].size, Some(20));
    assert_eq!(
        reopened.autofit_of(1, "Notes & Tips").unwrap().as_deref(),
        Some("a:normAutofit")
    );
    // Untouched shape keeps its text
    assert_eq!(reopened.read_paragraphs(1, "Title").unwrap()[0].text(), "Old title");
}
