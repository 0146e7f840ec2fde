//! Style configuration: the cosmetic knobs of the generated document.
//!
//! Every visual parameter lives in [`StyleConfig`] and is passed explicitly
//! into the render call; the stylesheet is derived from it on each call
//! (see [`crate::pipeline::stylesheet`]). The defaults reproduce the primary
//! dark theme; [`StylePreset`] names the alternates.
//!
//! `StyleConfig` deserialises from JSON with every field optional, so a style
//! file only needs the keys it changes:
//!
//! ```rust
//! use edgequake_md2pdf::StyleConfig;
//!
//! let style = StyleConfig::from_json_str(r#"{ "margin": "1.5cm", "palette": { "main_heading": "teal" } }"#).unwrap();
//! assert_eq!(style.margin.to_string(), "1.5cm");
//! assert_eq!(style.palette.main_heading, "teal");
//! assert_eq!(style.palette.sub_heading, "#d94f8b");
//! ```

use crate::error::Md2PdfError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ── Length ───────────────────────────────────────────────────────────────

/// Unit of a CSS [`Length`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Mm,
    Cm,
    In,
    Pt,
    Px,
}

impl LengthUnit {
    fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Mm => "mm",
            LengthUnit::Cm => "cm",
            LengthUnit::In => "in",
            LengthUnit::Pt => "pt",
            LengthUnit::Px => "px",
        }
    }

    fn per_inch(self) -> f64 {
        match self {
            LengthUnit::Mm => 25.4,
            LengthUnit::Cm => 2.54,
            LengthUnit::In => 1.0,
            LengthUnit::Pt => 72.0,
            LengthUnit::Px => 96.0,
        }
    }
}

/// An absolute CSS length such as `2cm` or `0.5in`.
///
/// Serialised as its CSS text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub const fn cm(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::Cm,
        }
    }

    pub const fn mm(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::Mm,
        }
    }

    pub const fn inches(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::In,
        }
    }

    /// Convert to inches, the unit the print engine expects.
    pub fn to_inches(self) -> f64 {
        self.value / self.unit.per_inch()
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Length {
    type Err = Md2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| Md2PdfError::InvalidStyle(format!("length '{s}' has no unit")))?;
        let (num, unit) = s.split_at(split);
        let unit = match unit {
            "mm" => LengthUnit::Mm,
            "cm" => LengthUnit::Cm,
            "in" => LengthUnit::In,
            "pt" => LengthUnit::Pt,
            "px" => LengthUnit::Px,
            other => {
                return Err(Md2PdfError::InvalidStyle(format!(
                    "unsupported length unit '{other}' (use mm, cm, in, pt or px)"
                )))
            }
        };
        let value: f64 = num
            .trim()
            .parse()
            .map_err(|_| Md2PdfError::InvalidStyle(format!("invalid length '{s}'")))?;
        if !value.is_finite() {
            return Err(Md2PdfError::InvalidStyle(format!("invalid length '{s}'")));
        }
        Ok(Length { value, unit })
    }
}

impl TryFrom<String> for Length {
    type Error = Md2PdfError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Length> for String {
    fn from(l: Length) -> Self {
        l.to_string()
    }
}

// ── Page size ────────────────────────────────────────────────────────────

/// Paper size of the generated PDF.
///
/// Parsed from a name (`A4`, `letter`) or an explicit `"<width> <height>"`
/// pair such as `"210mm 297mm"`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Custom { width: Length, height: Length },
}

impl PageSize {
    /// Portrait `(width, height)` in inches.
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            PageSize::A3 => (Length::mm(297.0).to_inches(), Length::mm(420.0).to_inches()),
            PageSize::A4 => (Length::mm(210.0).to_inches(), Length::mm(297.0).to_inches()),
            PageSize::A5 => (Length::mm(148.0).to_inches(), Length::mm(210.0).to_inches()),
            PageSize::Letter => (8.5, 11.0),
            PageSize::Legal => (8.5, 14.0),
            PageSize::Custom { width, height } => (width.to_inches(), height.to_inches()),
        }
    }

    /// Value for the CSS `@page { size: … }` descriptor.
    pub fn css_size(&self) -> String {
        match self {
            PageSize::Custom { width, height } => format!("{width} {height}"),
            named => named.to_string(),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::A3 => f.write_str("A3"),
            PageSize::A4 => f.write_str("A4"),
            PageSize::A5 => f.write_str("A5"),
            PageSize::Letter => f.write_str("letter"),
            PageSize::Legal => f.write_str("legal"),
            PageSize::Custom { width, height } => write!(f, "{width} {height}"),
        }
    }
}

impl FromStr for PageSize {
    type Err = Md2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "a3" => return Ok(PageSize::A3),
            "a4" => return Ok(PageSize::A4),
            "a5" => return Ok(PageSize::A5),
            "letter" => return Ok(PageSize::Letter),
            "legal" => return Ok(PageSize::Legal),
            _ => {}
        }
        let mut parts = trimmed.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(w), Some(h), None) => Ok(PageSize::Custom {
                width: w.parse()?,
                height: h.parse()?,
            }),
            _ => Err(Md2PdfError::InvalidStyle(format!(
                "unknown page size '{trimmed}' (use A3, A4, A5, letter, legal or '<width> <height>')"
            ))),
        }
    }
}

impl TryFrom<String> for PageSize {
    type Error = Md2PdfError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PageSize> for String {
    fn from(p: PageSize) -> Self {
        p.to_string()
    }
}

// ── Palette ──────────────────────────────────────────────────────────────

/// Colours used by the stylesheet. Values are CSS colour expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Page background on screen.
    pub background: String,
    /// Body text.
    pub text: String,
    /// h1–h3.
    pub main_heading: String,
    /// h4–h6.
    pub sub_heading: String,
    /// Tint behind inline code and code blocks.
    pub code_background: String,
    /// Table cell borders.
    pub border: String,
    /// Tint of the table header row.
    pub table_header_background: String,
    /// Form field (`input`, `textarea`) background.
    pub input_background: String,
    /// Form field border.
    pub input_border: String,
    /// Background under `@media print`.
    pub print_background: String,
    /// Text colour under `@media print`.
    pub print_text: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: "#1a1a1a".into(),
            text: "#ffffff".into(),
            main_heading: "#fbb022".into(),
            sub_heading: "#d94f8b".into(),
            code_background: "rgba(51, 51, 51, 0.7)".into(),
            border: "#444".into(),
            table_header_background: "rgba(85, 85, 85, 0.7)".into(),
            input_background: "rgba(34, 34, 34, 0.7)".into(),
            input_border: "#4A90E2".into(),
            print_background: "white".into(),
            print_text: "black".into(),
        }
    }
}

impl Palette {
    fn entries(&self) -> [(&'static str, &str); 11] {
        [
            ("background", &self.background),
            ("text", &self.text),
            ("main_heading", &self.main_heading),
            ("sub_heading", &self.sub_heading),
            ("code_background", &self.code_background),
            ("border", &self.border),
            ("table_header_background", &self.table_header_background),
            ("input_background", &self.input_background),
            ("input_border", &self.input_border),
            ("print_background", &self.print_background),
            ("print_text", &self.print_text),
        ]
    }
}

// ── StyleConfig ──────────────────────────────────────────────────────────

/// Presentation parameters for one rendered document.
///
/// Built with [`StyleConfig::default()`] (the primary theme), from a
/// [`StylePreset`], or deserialised from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Paper size. Default: A4.
    pub page_size: PageSize,

    /// Rotate the page to landscape. Default: false.
    pub landscape: bool,

    /// Page margin applied on all four sides. Default: 2cm.
    pub margin: Length,

    /// Padding inside `<body>`, on top of the page margin. Default: 2cm.
    pub padding: Length,

    /// CSS `font-family` for body text. Default: `Arial, sans-serif`.
    pub font_family: String,

    /// CSS `font-family` for code. Default: `'Courier New', monospace`.
    pub mono_font_family: String,

    /// Body font size in points. Default: 12.
    pub font_size_pt: f32,

    /// Unitless CSS line height. Default: 1.6.
    pub line_height: f32,

    pub palette: Palette,

    /// syntect theme whose token colours are added to the stylesheet,
    /// e.g. `"base16-ocean.dark"`. `None` leaves highlighted spans uncoloured.
    pub code_theme: Option<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            landscape: false,
            margin: Length::cm(2.0),
            padding: Length::cm(2.0),
            font_family: "Arial, sans-serif".into(),
            mono_font_family: "'Courier New', monospace".into(),
            font_size_pt: 12.0,
            line_height: 1.6,
            palette: Palette::default(),
            code_theme: None,
        }
    }
}

impl StyleConfig {
    /// Parse a style from JSON. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, Md2PdfError> {
        let style: StyleConfig = serde_json::from_str(json)
            .map_err(|e| Md2PdfError::InvalidStyle(format!("style JSON: {e}")))?;
        style.validate()?;
        Ok(style)
    }

    /// Load and validate a JSON style file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Md2PdfError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Md2PdfError::InvalidStyle(format!("cannot read style file {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Page `(width, height)` in inches after applying orientation.
    pub fn page_dimensions_in(&self) -> (f64, f64) {
        let (w, h) = self.page_size.dimensions_in();
        if self.landscape {
            (h, w)
        } else {
            (w, h)
        }
    }

    /// Check the style can produce a printable page.
    ///
    /// String values are interpolated into CSS, so characters that could
    /// close a declaration or block are rejected.
    pub fn validate(&self) -> Result<(), Md2PdfError> {
        let mut fields: Vec<(&str, &str)> = vec![
            ("font_family", &self.font_family),
            ("mono_font_family", &self.mono_font_family),
        ];
        fields.extend(self.palette.entries());
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(Md2PdfError::InvalidStyle(format!("{name} must not be empty")));
            }
            if value.contains(['{', '}', ';', '<', '>']) {
                return Err(Md2PdfError::InvalidStyle(format!(
                    "{name} contains a forbidden character: {value:?}"
                )));
            }
        }

        if !(self.font_size_pt.is_finite() && self.font_size_pt > 0.0) {
            return Err(Md2PdfError::InvalidStyle(format!(
                "font_size_pt must be positive, got {}",
                self.font_size_pt
            )));
        }
        if !(self.line_height.is_finite() && self.line_height > 0.0) {
            return Err(Md2PdfError::InvalidStyle(format!(
                "line_height must be positive, got {}",
                self.line_height
            )));
        }
        if self.margin.value < 0.0 || self.padding.value < 0.0 {
            return Err(Md2PdfError::InvalidStyle(
                "margin and padding must not be negative".into(),
            ));
        }

        let (w, h) = self.page_dimensions_in();
        let inset = 2.0 * (self.margin.to_inches() + self.padding.to_inches());
        if inset >= w || inset >= h {
            return Err(Md2PdfError::InvalidStyle(format!(
                "margin {} plus padding {} leave no printable area on a {} page",
                self.margin, self.padding, self.page_size
            )));
        }
        Ok(())
    }
}

// ── Presets ──────────────────────────────────────────────────────────────

/// Named style presets.
///
/// | Preset | Look |
/// |--------|------|
/// | `Primary` | dark page, amber/pink headings, 2cm margins (default) |
/// | `Compact` | primary palette with 1.5cm margins and 1cm padding |
/// | `Midnight` | dark blue page, cyan/green headings |
/// | `Paper` | white page with dark text on screen as well as in print |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    #[default]
    Primary,
    Compact,
    Midnight,
    Paper,
}

impl StylePreset {
    pub const ALL: [StylePreset; 4] = [
        StylePreset::Primary,
        StylePreset::Compact,
        StylePreset::Midnight,
        StylePreset::Paper,
    ];

    /// Build the [`StyleConfig`] for this preset.
    pub fn style(self) -> StyleConfig {
        match self {
            StylePreset::Primary => StyleConfig::default(),
            StylePreset::Compact => StyleConfig {
                margin: Length::cm(1.5),
                padding: Length::cm(1.0),
                font_size_pt: 11.0,
                ..StyleConfig::default()
            },
            StylePreset::Midnight => StyleConfig {
                palette: Palette {
                    background: "#0d1117".into(),
                    text: "#e6edf3".into(),
                    main_heading: "#58a6ff".into(),
                    sub_heading: "#3fb950".into(),
                    code_background: "rgba(110, 118, 129, 0.25)".into(),
                    border: "#30363d".into(),
                    table_header_background: "rgba(56, 139, 253, 0.15)".into(),
                    input_background: "rgba(22, 27, 34, 0.8)".into(),
                    input_border: "#58a6ff".into(),
                    ..Palette::default()
                },
                code_theme: Some("base16-ocean.dark".into()),
                ..StyleConfig::default()
            },
            StylePreset::Paper => StyleConfig {
                palette: Palette {
                    background: "#ffffff".into(),
                    text: "#1f2328".into(),
                    code_background: "rgba(175, 184, 193, 0.2)".into(),
                    border: "#d0d7de".into(),
                    table_header_background: "#f6f8fa".into(),
                    input_background: "#ffffff".into(),
                    ..Palette::default()
                },
                code_theme: Some("InspiredGitHub".into()),
                ..StyleConfig::default()
            },
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StylePreset::Primary => "primary",
            StylePreset::Compact => "compact",
            StylePreset::Midnight => "midnight",
            StylePreset::Paper => "paper",
        };
        f.write_str(name)
    }
}

impl FromStr for StylePreset {
    type Err = Md2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StylePreset::ALL
            .into_iter()
            .find(|p| p.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Md2PdfError::InvalidStyle(format!("unknown preset '{s}'")))
    }
}
