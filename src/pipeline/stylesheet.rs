//! CSS stylesheet generation from a [`StyleConfig`].
//!
//! Palette values become CSS custom properties on `:root` and every rule
//! refers to them through `var(…)`, so the rule block itself is a constant
//! template. The print-media override swaps the page to the print palette
//! while keeping the heading accents.

use super::highlight;
use crate::error::Md2PdfError;
use crate::style::StyleConfig;

/// Rules that only reference custom properties; identical for every style.
const BASE_RULES: &str = r#"
/* Base Styles */
html {
  -webkit-print-color-adjust: exact;
  print-color-adjust: exact;
}

body {
  margin: 0;
  padding: var(--body-padding);
  background-color: var(--background-color);
  color: var(--text-color);
  font-family: var(--font-family);
  line-height: var(--line-height);
  font-size: var(--font-size);
  word-wrap: break-word;
}

/* Typography */
h1, h2, h3 {
  color: var(--main-title-color);
  margin: 1em 0 0.5em;
  page-break-after: avoid;
}

h4, h5, h6 {
  color: var(--sub-title-color);
  margin: 1em 0 0.5em;
  page-break-after: avoid;
}

p {
  margin-bottom: 0.5em;
}

blockquote {
  margin: 0 0 1em;
  padding: 0 1em;
  border-left: 4px solid var(--border-color);
}

img {
  max-width: 100%;
}

/* Code Blocks */
code {
  background-color: var(--code-background);
  padding: 2px 4px;
  border-radius: 4px;
  font-family: var(--mono-font-family);
  font-size: 0.9em;
}

pre {
  background-color: var(--code-background);
  padding: 1em;
  border-radius: 4px;
  font-family: var(--mono-font-family);
  white-space: pre-wrap;
  word-wrap: break-word;
  overflow-x: auto;
}

pre code {
  background-color: transparent;
  padding: 0;
  border-radius: 0;
}

/* Tables */
table {
  border-collapse: collapse;
  width: 100%;
  margin-bottom: 1em;
}

th, td {
  border: 1px solid var(--border-color);
  padding: 8px;
  text-align: left;
}

th {
  background-color: var(--table-header-background);
  font-weight: bold;
}

/* Form Elements */
input, textarea {
  border: 1px solid var(--input-border-color);
  color: var(--text-color);
  background-color: var(--input-background);
  padding: 8px;
  border-radius: 4px;
}

/* Print Styles */
@media print {
  body {
    background-color: var(--print-background);
    color: var(--print-text-color);
  }

  h1, h2, h3 {
    color: var(--main-title-color);
  }

  h4, h5, h6 {
    color: var(--sub-title-color);
  }
}
"#;

/// Build the complete stylesheet for `style`.
///
/// Fails only when `style.code_theme` names a theme that is not bundled.
pub fn render_stylesheet(style: &StyleConfig) -> Result<String, Md2PdfError> {
    let p = &style.palette;
    let orientation = if style.landscape { " landscape" } else { "" };

    let mut css = format!(
        r#"/* Global Variables */
:root {{
  --text-color: {text};
  --background-color: {background};
  --main-title-color: {main};
  --sub-title-color: {sub};
  --code-background: {code_bg};
  --border-color: {border};
  --table-header-background: {th_bg};
  --input-background: {input_bg};
  --input-border-color: {input_border};
  --print-background: {print_bg};
  --print-text-color: {print_text};
  --font-family: {font};
  --mono-font-family: {mono};
  --font-size: {size}pt;
  --line-height: {line_height};
  --body-padding: {padding};
}}

/* Print Settings */
@page {{
  size: {page_size}{orientation};
  margin: {margin};
}}
"#,
        text = p.text,
        background = p.background,
        main = p.main_heading,
        sub = p.sub_heading,
        code_bg = p.code_background,
        border = p.border,
        th_bg = p.table_header_background,
        input_bg = p.input_background,
        input_border = p.input_border,
        print_bg = p.print_background,
        print_text = p.print_text,
        font = style.font_family,
        mono = style.mono_font_family,
        size = style.font_size_pt,
        line_height = style.line_height,
        padding = style.padding,
        page_size = style.page_size.css_size(),
        margin = style.margin,
    );
    css.push_str(BASE_RULES);

    if let Some(theme) = style.code_theme.as_deref() {
        css.push_str("\n/* Syntax Highlighting */\n");
        css.push_str(&highlight::theme_css(theme)?);
    }
    Ok(css)
}
