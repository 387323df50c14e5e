//! Placeholder filling

use crate::fit::{FitBudget, FitResult, FitSolver, Paragraph};
use crate::schema::{FillConfig, Placeholder};
use crate::{Result, TemplateError};
use cjk_text::{dominant_script, Script};
use pptx_core::{
    default_family, resolve_font_reference, AutoFit, FontCatalog, FontFile, FontReference,
    FontStyle, Frame, LoadedFont, PptxDocument, PptxError, ScanDepth, ShapeInfo, TextMeasurer,
    ThemeFontClass, ThemeFontSet,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Font a placeholder was measured with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFont {
    pub family: String,
    pub style: FontStyle,
    /// Chosen size in points
    pub size: u32,
}

/// What was done to one placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    /// Text measured and written at the solved size
    Fitted { font: ResolvedFont, fit: FitResult },
    /// Text written at the maximum size with shrink-on-overflow
    BestEffort { font_size: u32 },
    /// Shape replaced by a picture
    Picture { frame: Frame },
    /// Shape has no text body
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilledPlaceholder {
    /// Key in the configuration
    pub key: String,
    /// Shape name on the slide
    pub shape: String,
    pub outcome: FillOutcome,
}

/// Fonts available to one fill run
///
/// Holds the catalog, the template's theme fonts and every face loaded so
/// far. Nothing outlives the run.
pub struct FontContext {
    catalog: Option<FontCatalog>,
    themes: ThemeFontSet,
    loaded: HashMap<(PathBuf, u32), LoadedFont>,
}

impl FontContext {
    pub fn new(catalog: Option<FontCatalog>, themes: ThemeFontSet) -> Self {
        Self {
            catalog,
            themes,
            loaded: HashMap::new(),
        }
    }

    /// Build the catalog from `fontDir`, if configured
    pub fn from_config(config: &FillConfig, themes: ThemeFontSet) -> Result<Self> {
        let catalog = match &config.font_dir {
            Some(dir) => {
                let depth = if config.font_dir_recursive {
                    ScanDepth::Recursive
                } else {
                    ScanDepth::TopLevel
                };
                Some(FontCatalog::build(dir, depth).map_err(|e| match e {
                    PptxError::FontDirectory { path, source } => TemplateError::ResourceError {
                        path,
                        message: source.to_string(),
                    },
                    other => other.into(),
                })?)
            }
            None => None,
        };
        Ok(Self::new(catalog, themes))
    }

    pub fn catalog(&self) -> Option<&FontCatalog> {
        self.catalog.as_ref()
    }

    pub fn themes(&self) -> &ThemeFontSet {
        &self.themes
    }

    /// Number of faces currently loaded
    pub fn cached(&self) -> usize {
        self.loaded.len()
    }

    /// Family name a shape's text is set in
    ///
    /// The first typeface declared on the shape or inherited from its
    /// layout wins; otherwise the theme's major (title) or minor font.
    pub fn family_for(&self, shape: &ShapeInfo, script: Script, is_title: bool) -> String {
        let reference = shape
            .font_declarations
            .iter()
            .find_map(|decl| decl.for_script(script))
            .cloned()
            .unwrap_or_else(|| {
                let class = if is_title || shape.is_title() {
                    ThemeFontClass::Major
                } else {
                    ThemeFontClass::Minor
                };
                FontReference::Theme(class, Some(script))
            });
        resolve_font_reference(&reference, &self.themes, script)
    }

    /// Regular and bold faces for a family
    ///
    /// Falls back to a file-name match and then to the script's default
    /// family. The bold face is `None` when the family has no distinct one.
    pub fn find_faces(&self, family: &str, script: Script) -> Option<(FontFile, Option<FontFile>)> {
        let catalog = self.catalog.as_ref()?;

        let by_family = |name: &str| {
            let regular = catalog.lookup(name, FontStyle::Regular).ok()?;
            let bold = catalog
                .lookup(name, FontStyle::Bold)
                .ok()
                .filter(|bold| bold.path != regular.path || bold.face_index != regular.face_index)
                .cloned();
            Some((regular.clone(), bold))
        };

        if let Some(faces) = by_family(family) {
            return Some(faces);
        }
        if let Some(file) = catalog.find_by_file_name(family) {
            tracing::debug!("font '{family}' matched file {}", file.path.display());
            return Some((file.clone(), None));
        }

        let fallback = default_family(script);
        if fallback != family {
            if let Some(faces) = by_family(fallback) {
                tracing::warn!("font '{family}' not found; measuring with '{fallback}'");
                return Some(faces);
            }
        }
        None
    }

    /// Make sure a face is loaded
    fn load(&mut self, file: &FontFile) -> Result<()> {
        let key = (file.path.clone(), file.face_index);
        if self.loaded.contains_key(&key) {
            return Ok(());
        }
        let Some(catalog) = &self.catalog else {
            return Err(TemplateError::ConfigError(
                "no font directory configured".to_string(),
            ));
        };
        let font = catalog.load(file)?;
        self.loaded.insert(key, font);
        Ok(())
    }

    fn loaded(&self, file: &FontFile) -> Option<&LoadedFont> {
        self.loaded.get(&(file.path.clone(), file.face_index))
    }

    /// Find and load the faces for a family
    fn prepare(&mut self, family: &str, script: Script) -> Option<(FontFile, Option<FontFile>)> {
        let (regular, bold) = self.find_faces(family, script)?;
        if let Err(e) = self.load(&regular) {
            tracing::warn!("cannot load {}: {e}", regular.path.display());
            return None;
        }
        let bold = bold.filter(|file| match self.load(file) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("cannot load {}: {e}; using regular for bold", file.path.display());
                false
            }
        });
        Some((regular, bold))
    }

    /// Drop all loaded faces
    pub fn clear(&mut self) {
        tracing::debug!("releasing {} loaded font face(s)", self.loaded.len());
        self.loaded.clear();
    }
}

/// Writes configured values into a document
pub struct TemplateFiller<'a> {
    config: &'a FillConfig,
}

impl<'a> TemplateFiller<'a> {
    pub fn new(config: &'a FillConfig) -> Self {
        Self { config }
    }

    /// Fill every placeholder in configuration order
    ///
    /// Stops at the first fatal error; the document may then be partly
    /// filled and should not be saved.
    pub fn fill(
        &self,
        doc: &mut PptxDocument,
        fonts: &mut FontContext,
    ) -> Result<Vec<FilledPlaceholder>> {
        let mut filled = Vec::with_capacity(self.config.placeholders.len());
        for (key, placeholder) in self.config.placeholders.iter() {
            let outcome = self.fill_placeholder(doc, fonts, key, placeholder)?;
            tracing::info!(
                "filled placeholder '{key}' ({}) -> {}",
                placeholder.kind(),
                describe(&outcome)
            );
            filled.push(FilledPlaceholder {
                key: key.to_string(),
                shape: placeholder.name().to_string(),
                outcome,
            });
        }
        Ok(filled)
    }

    fn fill_placeholder(
        &self,
        doc: &mut PptxDocument,
        fonts: &mut FontContext,
        key: &str,
        placeholder: &Placeholder,
    ) -> Result<FillOutcome> {
        let slide = self.config.slide_index;
        let name = placeholder.name();
        let shape = doc.shape(slide, name).map_err(|e| match e {
            PptxError::ShapeNotFound(_) => TemplateError::ShapeNotFound {
                key: key.to_string(),
                name: name.to_string(),
            },
            other => other.into(),
        })?;

        let (max, min) = placeholder.font_size_range().unwrap_or_default();
        match placeholder {
            Placeholder::Image(image) => {
                let frame = doc.replace_with_picture(slide, name, &image.value)?;
                Ok(FillOutcome::Picture { frame })
            }
            Placeholder::Text(text) => {
                let paragraphs = Paragraph::lines(&text.value);
                let request = TextRequest {
                    paragraphs: &paragraphs,
                    max,
                    min,
                    is_title: text.is_title,
                    explicit_bold: false,
                };
                self.fill_text(doc, fonts, &shape, request)
            }
            Placeholder::List(list) => {
                let paragraphs: Vec<Paragraph> = list
                    .value
                    .iter()
                    .flat_map(|item| Paragraph::list_item_lines(item))
                    .collect();
                let request = TextRequest {
                    paragraphs: &paragraphs,
                    max,
                    min,
                    is_title: false,
                    explicit_bold: true,
                };
                self.fill_text(doc, fonts, &shape, request)
            }
        }
    }

    fn fill_text(
        &self,
        doc: &mut PptxDocument,
        fonts: &mut FontContext,
        shape: &ShapeInfo,
        request: TextRequest<'_>,
    ) -> Result<FillOutcome> {
        if !shape.has_text_body {
            tracing::warn!("shape '{}' has no text body; skipped", shape.name);
            return Ok(FillOutcome::Skipped);
        }

        let (size, autofit, outcome) = match self.solve(fonts, shape, &request) {
            Some((font, fit)) => (
                fit.font_size,
                AutoFit::None,
                FillOutcome::Fitted { font, fit },
            ),
            None => (
                request.max,
                AutoFit::Shrink,
                FillOutcome::BestEffort {
                    font_size: request.max,
                },
            ),
        };

        let written: Vec<_> = request
            .paragraphs
            .iter()
            .map(|p| p.to_text_paragraph(size, request.explicit_bold))
            .collect();
        doc.write_text(self.config.slide_index, &shape.name, &written, autofit)?;
        Ok(outcome)
    }

    /// Measure and solve; `None` selects the best-effort path
    fn solve(
        &self,
        fonts: &mut FontContext,
        shape: &ShapeInfo,
        request: &TextRequest<'_>,
    ) -> Option<(ResolvedFont, FitResult)> {
        if fonts.catalog().is_none() {
            tracing::debug!("no font directory; '{}' left to autofit", shape.name);
            return None;
        }
        let Some(frame) = shape.frame else {
            tracing::warn!("shape '{}' has no size; left to autofit", shape.name);
            return None;
        };

        let budget = FitBudget::new(
            frame.width_pt() - shape.insets.horizontal_pt(),
            frame.height_pt() - shape.insets.vertical_pt(),
            request.max,
            request.min,
        );

        let script = request
            .paragraphs
            .iter()
            .flat_map(|p| p.runs.iter())
            .map(|run| run.text.as_str())
            .find(|text| !text.trim().is_empty())
            .map(dominant_script)
            .unwrap_or_default();
        let family = fonts.family_for(shape, script, request.is_title);

        let Some((regular, bold)) = fonts.prepare(&family, script) else {
            tracing::warn!(
                "font '{family}' for '{}' not found; left to autofit",
                shape.name
            );
            return None;
        };

        let fonts: &FontContext = fonts;
        let regular_measurer = measurer(fonts, &regular)?;
        let bold_measurer = bold.as_ref().and_then(|file| measurer(fonts, file));
        let solver = FitSolver::new(regular_measurer)
            .with_bold(bold_measurer)
            .with_format(shape.paragraph_format);

        match solver.solve(request.paragraphs, &budget) {
            Ok(fit) => {
                let font = ResolvedFont {
                    family: regular.family.clone(),
                    style: regular.style,
                    size: fit.font_size,
                };
                Some((font, fit))
            }
            Err(e) => {
                tracing::warn!("shape '{}': {e}; left to autofit", shape.name);
                None
            }
        }
    }
}

/// Text to write into one shape
struct TextRequest<'p> {
    paragraphs: &'p [Paragraph],
    max: u32,
    min: u32,
    is_title: bool,
    /// Write each run's bold flag instead of keeping the template's
    explicit_bold: bool,
}

fn measurer<'f>(fonts: &'f FontContext, file: &FontFile) -> Option<TextMeasurer<'f>> {
    let font = fonts.loaded(file)?;
    match TextMeasurer::new(font) {
        Ok(measurer) => Some(measurer),
        Err(e) => {
            tracing::warn!("{e}");
            None
        }
    }
}

fn describe(outcome: &FillOutcome) -> String {
    match outcome {
        FillOutcome::Fitted { font, fit } if fit.overflow => {
            format!("{} {}pt (overflow)", font.family, font.size)
        }
        FillOutcome::Fitted { font, .. } => format!("{} {}pt", font.family, font.size),
        FillOutcome::BestEffort { font_size } => format!("{font_size}pt, shrink on overflow"),
        FillOutcome::Picture { frame } => format!("picture {}x{} EMU", frame.cx, frame.cy),
        FillOutcome::Skipped => "skipped".to_string(),
    }
}

fn open_template(path: &Path) -> Result<PptxDocument> {
    PptxDocument::open(path).map_err(|e| TemplateError::ResourceError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the template, fill every placeholder and save the output
///
/// The output file is only written once every placeholder succeeded.
pub fn fill_presentation(config: &FillConfig) -> Result<Vec<FilledPlaceholder>> {
    let mut doc = open_template(&config.template_pptx)?;
    tracing::info!(
        "loaded template {} ({} slides)",
        config.template_pptx.display(),
        doc.slide_count()
    );
    if config.slide_index >= doc.slide_count() {
        return Err(PptxError::InvalidSlide(config.slide_index, doc.slide_count()).into());
    }

    let themes = doc.theme_fonts(config.slide_index)?;
    let mut fonts = FontContext::from_config(config, themes)?;
    let filled = TemplateFiller::new(config).fill(&mut doc, &mut fonts)?;
    fonts.clear();

    doc.save(&config.output_pptx)?;
    tracing::info!("saved {}", config.output_pptx.display());
    Ok(filled)
}
