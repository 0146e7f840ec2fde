//! Wrap an HTML fragment and its stylesheet into a standalone document.

use super::markdown::escape_html;

/// Compose the complete HTML document handed to the PDF engine.
///
/// The `<title>` doubles as the PDF's Title metadata entry.
pub fn compose_document(fragment: &str, stylesheet: &str, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
{stylesheet}
</style>
</head>
<body>
{fragment}
</body>
</html>
"#,
        title = escape_html(title),
    )
}
