//! Syntax highlighting for fenced code blocks via syntect.
//!
//! Highlighting is class-based: tokens become `<span class="hl-…">` elements
//! and colours come from a separate stylesheet generated for the chosen
//! theme ([`theme_css`]). Keeping colours out of the markup means the same
//! HTML can be restyled by swapping one CSS block, and a document rendered
//! without a theme still gets readable monospace code.
//!
//! The default syntax and theme sets are loaded once per process; loading
//! them costs tens of milliseconds.

use crate::error::Md2PdfError;
use once_cell::sync::Lazy;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::debug;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Class prefix for highlighted tokens, so theme rules never collide with
/// the document stylesheet.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Reduce an info string such as `rust,ignore` or `python {.numberLines}`
/// to its language token.
pub fn language_token(info: &str) -> Option<&str> {
    info.split(|c: char| c == ',' || c.is_whitespace() || c == '{')
        .next()
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Highlight `code` as `lang`, returning the inner HTML for a `<code>` element.
///
/// Returns `None` when the language is unknown or highlighting fails; the
/// caller then falls back to escaped plain text.
pub fn highlight_code(code: &str, lang: &str) -> Option<String> {
    let syntax = SYNTAX_SET.find_syntax_by_token(lang)?;
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            debug!("Highlighting '{}' failed, using plain text: {}", lang, e);
            return None;
        }
    }
    Some(generator.finalize())
}

/// CSS rules colouring highlighted tokens with the named syntect theme.
pub fn theme_css(theme_name: &str) -> Result<String, Md2PdfError> {
    let theme = THEME_SET.themes.get(theme_name).ok_or_else(|| {
        Md2PdfError::InvalidStyle(format!(
            "unknown code theme '{}' (available: {})",
            theme_name,
            available_themes().join(", ")
        ))
    })?;
    css_for_theme_with_class_style(theme, CLASS_STYLE)
        .map_err(|e| Md2PdfError::InvalidStyle(format!("code theme '{theme_name}': {e}")))
}

/// Names of the bundled syntect themes, sorted.
pub fn available_themes() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = THEME_SET.themes.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_token_strips_attributes() {
        assert_eq!(language_token("rust"), Some("rust"));
        assert_eq!(language_token("rust,ignore"), Some("rust"));
        assert_eq!(language_token("python {.numberLines}"), Some("python"));
        assert_eq!(language_token("  "), None);
        assert_eq!(language_token(""), None);
    }

    #[test]
    fn known_language_produces_prefixed_spans() {
        let html = highlight_code("fn main() {}\n", "rust").expect("rust is bundled");
        assert!(html.contains("<span class=\"hl-"), "got: {html}");
        assert!(html.contains("main"));
    }

    #[test]
    fn highlighted_output_escapes_markup() {
        let html = highlight_code("x = \"<b>\"\n", "python").expect("python is bundled");
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;b&gt;"));
    }

    #[test]
    fn unknown_language_falls_back() {
        assert!(highlight_code("whatever", "no-such-language-xyz").is_none());
    }

    #[test]
    fn bundled_theme_css_uses_prefix() {
        let css = theme_css("base16-ocean.dark").unwrap();
        assert!(css.contains(".hl-"));
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let err = theme_css("not-a-theme").unwrap_err();
        assert!(err.to_string().contains("InspiredGitHub"));
    }
}
