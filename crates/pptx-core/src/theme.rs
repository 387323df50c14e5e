//! Theme font scheme and font reference resolution

use crate::xml::{XmlDocument, XmlElement};
use cjk_text::Script;

/// Latin family used when the theme defines none
pub const DEFAULT_LATIN_FAMILY: &str = "Calibri";

/// East-Asian family used when the theme defines none
pub const DEFAULT_EAST_ASIAN_FAMILY: &str = "Yu Gothic";

/// Major (headings) or minor (body) theme font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeFontClass {
    Major,
    Minor,
}

/// The four theme font slots
///
/// Empty typefaces in the theme are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeFontSet {
    pub major_latin: Option<String>,
    pub major_east_asian: Option<String>,
    pub minor_latin: Option<String>,
    pub minor_east_asian: Option<String>,
}

impl ThemeFontSet {
    /// Read `a:fontScheme` from a theme part
    ///
    /// Elements are matched by local name so any DrawingML prefix works.
    pub fn from_theme_xml(theme: &XmlDocument) -> Self {
        let Some(scheme) = theme.root.find_local("themeElements/fontScheme") else {
            tracing::debug!("theme has no font scheme");
            return Self::default();
        };

        let slot = |class: &str, script: &str| {
            scheme
                .find_local(&format!("{class}/{script}"))
                .and_then(|el| el.attr("typeface"))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            major_latin: slot("majorFont", "latin"),
            major_east_asian: slot("majorFont", "ea"),
            minor_latin: slot("minorFont", "latin"),
            minor_east_asian: slot("minorFont", "ea"),
        }
    }

    /// Family in a slot, if the theme defines it
    pub fn slot(&self, class: ThemeFontClass, script: Script) -> Option<&str> {
        let slot = match (class, script) {
            (ThemeFontClass::Major, Script::Latin) => &self.major_latin,
            (ThemeFontClass::Major, Script::EastAsian) => &self.major_east_asian,
            (ThemeFontClass::Minor, Script::Latin) => &self.minor_latin,
            (ThemeFontClass::Minor, Script::EastAsian) => &self.minor_east_asian,
        };
        slot.as_deref()
    }
}

/// Default family for a script
pub fn default_family(script: Script) -> &'static str {
    match script {
        Script::Latin => DEFAULT_LATIN_FAMILY,
        Script::EastAsian => DEFAULT_EAST_ASIAN_FAMILY,
    }
}

/// A typeface as written in a run property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontReference {
    /// A concrete family name
    Named(String),
    /// A theme token; the script is set when the token names one (`+mj-ea`)
    Theme(ThemeFontClass, Option<Script>),
}

impl FontReference {
    /// Parse a `typeface` attribute value
    ///
    /// Returns `None` for empty values. Complex-script tokens (`+mj-cs`)
    /// map to the Latin slot.
    pub fn parse(typeface: &str) -> Option<Self> {
        let typeface = typeface.trim();
        if typeface.is_empty() {
            return None;
        }
        let theme = match typeface {
            "+mj-lt" | "+mj-cs" => Some((ThemeFontClass::Major, Script::Latin)),
            "+mn-lt" | "+mn-cs" => Some((ThemeFontClass::Minor, Script::Latin)),
            "+mj-ea" => Some((ThemeFontClass::Major, Script::EastAsian)),
            "+mn-ea" => Some((ThemeFontClass::Minor, Script::EastAsian)),
            _ => None,
        };
        Some(match theme {
            Some((class, script)) => Self::Theme(class, Some(script)),
            None => Self::Named(typeface.to_string()),
        })
    }

    pub fn is_theme(&self) -> bool {
        matches!(self, Self::Theme(..))
    }
}

/// Resolve a reference to a concrete family name
///
/// Theme tokens use their own script when they carry one, else `script`.
/// Empty theme slots fall back to the script's default family.
pub fn resolve_font_reference(
    reference: &FontReference,
    themes: &ThemeFontSet,
    script: Script,
) -> String {
    match reference {
        FontReference::Named(name) => name.clone(),
        FontReference::Theme(class, token_script) => {
            let script = token_script.unwrap_or(script);
            themes
                .slot(*class, script)
                .unwrap_or_else(|| default_family(script))
                .to_string()
        }
    }
}

/// Latin and East-Asian typefaces declared on one run-property element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontDeclaration {
    pub latin: Option<FontReference>,
    pub east_asian: Option<FontReference>,
}

impl FontDeclaration {
    /// Read `a:latin` / `a:ea` children of an `a:rPr`, `a:defRPr` or `a:endParaRPr`
    pub fn from_run_properties(rpr: &XmlElement) -> Self {
        let typeface = |name: &str| {
            rpr.child_local(name)
                .and_then(|el| el.attr("typeface"))
                .and_then(FontReference::parse)
        };
        Self {
            latin: typeface("latin"),
            east_asian: typeface("ea"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.latin.is_none() && self.east_asian.is_none()
    }

    /// Reference for a script
    ///
    /// East-Asian text prefers the `ea` typeface and Latin text the `latin`
    /// typeface; each falls back to the other.
    pub fn for_script(&self, script: Script) -> Option<&FontReference> {
        match script {
            Script::EastAsian => self.east_asian.as_ref().or(self.latin.as_ref()),
            Script::Latin => self.latin.as_ref().or(self.east_asian.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const THEME: &str = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office"><a:themeElements><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Aptos Display"/><a:ea typeface="Noto Serif JP"/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Aptos"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme></a:themeElements></a:theme>"#;

    fn themes() -> ThemeFontSet {
        ThemeFontSet::from_theme_xml(&XmlDocument::parse(THEME.as_bytes()).unwrap())
    }

    #[test]
    fn test_from_theme() {
        let set = themes();
        assert_eq!(set.major_latin.as_deref(), Some("Aptos Display"));
        assert_eq!(set.major_east_asian.as_deref(), Some("Noto Serif JP"));
        assert_eq!(set.minor_latin.as_deref(), Some("Aptos"));
        assert_eq!(set.minor_east_asian, None);
    }

    #[test]
    fn test_from_theme_with_other_prefix() {
        let xml = THEME.replace("a:", "d:").replace("xmlns:a=", "xmlns:d=");
        let set = ThemeFontSet::from_theme_xml(&XmlDocument::parse(xml.as_bytes()).unwrap());
        assert_eq!(set, themes());

        let unprefixed = r#"<theme xmlns="http://schemas.openxmlformats.org/drawingml/2006/main"><themeElements><fontScheme><majorFont><latin typeface="Georgia"/></majorFont><minorFont><ea typeface="Meiryo"/></minorFont></fontScheme></themeElements></theme>"#;
        let set = ThemeFontSet::from_theme_xml(&XmlDocument::parse(unprefixed.as_bytes()).unwrap());
        assert_eq!(set.major_latin.as_deref(), Some("Georgia"));
        assert_eq!(set.minor_east_asian.as_deref(), Some("Meiryo"));
        assert_eq!(set.minor_latin, None);
    }

    #[test]
    fn test_from_theme_without_scheme() {
        let doc = XmlDocument::parse(b"<a:theme><a:themeElements/></a:theme>").unwrap();
        assert_eq!(ThemeFontSet::from_theme_xml(&doc), ThemeFontSet::default());
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            FontReference::parse("+mj-lt"),
            Some(FontReference::Theme(ThemeFontClass::Major, Some(Script::Latin)))
        );
        assert_eq!(
            FontReference::parse("+mn-ea"),
            Some(FontReference::Theme(ThemeFontClass::Minor, Some(Script::EastAsian)))
        );
        assert_eq!(
            FontReference::parse("+mn-cs"),
            Some(FontReference::Theme(ThemeFontClass::Minor, Some(Script::Latin)))
        );
        assert_eq!(
            FontReference::parse("Meiryo"),
            Some(FontReference::Named("Meiryo".to_string()))
        );
        assert_eq!(FontReference::parse(""), None);
    }

    #[test]
    fn test_resolve_named() {
        let reference = FontReference::Named("Meiryo".to_string());
        assert_eq!(
            resolve_font_reference(&reference, &themes(), Script::Latin),
            "Meiryo"
        );
    }

    #[test]
    fn test_resolve_theme_tokens() {
        let set = themes();
        let major_ea = FontReference::parse("+mj-ea").unwrap();
        assert_eq!(
            resolve_font_reference(&major_ea, &set, Script::Latin),
            "Noto Serif JP"
        );

        // Class-only reference follows the script hint
        let minor = FontReference::Theme(ThemeFontClass::Minor, None);
        assert_eq!(resolve_font_reference(&minor, &set, Script::Latin), "Aptos");
    }

    #[test]
    fn test_resolve_empty_slot_uses_default() {
        let set = themes();
        let minor_ea = FontReference::parse("+mn-ea").unwrap();
        assert_eq!(
            resolve_font_reference(&minor_ea, &set, Script::EastAsian),
            DEFAULT_EAST_ASIAN_FAMILY
        );

        let empty = ThemeFontSet::default();
        let major = FontReference::Theme(ThemeFontClass::Major, None);
        assert_eq!(
            resolve_font_reference(&major, &empty, Script::Latin),
            DEFAULT_LATIN_FAMILY
        );
    }

    #[test]
    fn test_declaration_for_script() {
        let rpr = XmlElement::new("a:rPr")
            .with_child(XmlElement::new("a:latin").with_attr("typeface", "Arial"))
            .with_child(XmlElement::new("a:ea").with_attr("typeface", "+mn-ea"));
        let decl = FontDeclaration::from_run_properties(&rpr);

        assert_eq!(
            decl.for_script(Script::Latin),
            Some(&FontReference::Named("Arial".to_string()))
        );
        assert!(decl.for_script(Script::EastAsian).unwrap().is_theme());

        let latin_only = FontDeclaration::from_run_properties(
            &XmlElement::new("a:rPr")
                .with_child(XmlElement::new("a:latin").with_attr("typeface", "Arial")),
        );
        assert_eq!(
            latin_only.for_script(Script::EastAsian),
            Some(&FontReference::Named("Arial".to_string()))
        );
        assert!(FontDeclaration::default().is_empty());
    }
}
