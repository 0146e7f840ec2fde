//! Pre-processing: deterministic normalisation of Markdown before parsing.
//!
//! Markdown arrives from editors, web pages and exports with artefacts the
//! parser would faithfully reproduce in the PDF: a UTF-8 BOM rendered as a
//! stray glyph, `\r` characters from Windows files, zero-width characters
//! copied from web pages, and (when asked for) YAML front-matter that would
//! otherwise be rendered as a horizontal rule followed by a `key: value`
//! heading.
//!
//! Front-matter lifting is opt-in. Without it, a leading `---` /
//! `key: value` / `---` block is ordinary Markdown (a thematic break and a
//! setext heading) and is rendered as such.
//!
//! ## Rule Order
//!
//! The BOM is stripped first so front-matter detection sees `---` at offset
//! 0; line endings are normalised before any line-based rule runs.
//!
//! Trailing whitespace is deliberately left alone: two trailing spaces are a
//! Markdown hard line break.

use once_cell::sync::Lazy;
use regex::Regex;

/// Markdown ready for the parser plus metadata lifted out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    /// Normalised Markdown body (front-matter removed).
    pub markdown: String,
    /// `title:` value from the front-matter block, if any.
    pub title: Option<String>,
}

/// Apply all pre-processing rules to raw Markdown input.
///
/// Rules (applied in order):
/// 1. Strip a leading byte-order mark
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Strip invisible Unicode (zero-width spaces and joiners, word joiner, BOM)
/// 4. Extract and remove a leading front-matter block, if `front_matter` is set
pub fn prepare_markdown(input: &str, front_matter: bool) -> Preprocessed {
    let s = strip_bom(input);
    let s = normalise_line_endings(s);
    let s = remove_invisible_chars(&s);
    if front_matter {
        extract_front_matter(&s)
    } else {
        Preprocessed {
            markdown: s,
            title: None,
        }
    }
}

// ── Rule 1: Strip BOM ────────────────────────────────────────────────────────

fn strip_bom(input: &str) -> &str {
    input.strip_prefix('\u{FEFF}').unwrap_or(input)
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}'], "")
}

// ── Rule 4: Front-matter ─────────────────────────────────────────────────────
//
// Only a block at the very start of the document counts, and its first line
// must look like a `key: value` pair. That keeps a document which merely
// opens with a `---` thematic break from losing its first section.

static RE_FRONT_MATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\n([A-Za-z0-9_-]+:.*?)\n(?:---|\.\.\.)[ \t]*(?:\n|\z)").unwrap()
});

static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^title:[ \t]*(.+?)[ \t]*$").unwrap());

fn extract_front_matter(input: &str) -> Preprocessed {
    let Some(caps) = RE_FRONT_MATTER.captures(input) else {
        return Preprocessed {
            markdown: input.to_string(),
            title: None,
        };
    };

    let block = caps.get(1).map_or("", |m| m.as_str());
    let title = RE_TITLE
        .captures(block)
        .map(|t| unquote(&t[1]).to_string())
        .filter(|t| !t.is_empty());

    let body_start = caps.get(0).map_or(0, |m| m.end());
    Preprocessed {
        markdown: input[body_start..].to_string(),
        title,
    }
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom("\u{FEFF}# Hi"), "# Hi");
        assert_eq!(strip_bom("# Hi"), "# Hi");
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{2060}!";
        assert_eq!(remove_invisible_chars(input), "helloworld!");
    }

    #[test]
    fn test_hard_line_break_preserved() {
        let out = prepare_markdown("line one  \nline two", false);
        assert_eq!(out.markdown, "line one  \nline two");
    }

    #[test]
    fn test_front_matter_title_extracted() {
        let input = "---\ntitle: \"Quarterly Report\"\nauthor: Ada\n---\n# Body\n";
        let out = prepare_markdown(input, true);
        assert_eq!(out.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(out.markdown, "# Body\n");
    }

    #[test]
    fn test_front_matter_without_title() {
        let out = prepare_markdown("---\nauthor: Ada\n---\ntext", true);
        assert_eq!(out.title, None);
        assert_eq!(out.markdown, "text");
    }

    #[test]
    fn test_front_matter_with_dots_terminator() {
        let out = prepare_markdown("---\ntitle: 'Notes'\n...\nbody", true);
        assert_eq!(out.title.as_deref(), Some("Notes"));
        assert_eq!(out.markdown, "body");
    }

    #[test]
    fn test_leading_thematic_break_is_not_front_matter() {
        let input = "---\n\nIntro paragraph\n\n---\nmore";
        let out = prepare_markdown(input, true);
        assert_eq!(out.title, None);
        assert_eq!(out.markdown, input);
    }

    #[test]
    fn test_bom_and_crlf_before_front_matter() {
        let input = "\u{FEFF}---\r\ntitle: Spec\r\n---\r\nBody\r\n";
        let out = prepare_markdown(input, true);
        assert_eq!(out.title.as_deref(), Some("Spec"));
        assert_eq!(out.markdown, "Body\n");
    }

    #[test]
    fn test_front_matter_kept_when_disabled() {
        let input = "\u{FEFF}---\r\nNote: keep this\r\n---\r\nBody\r\n";
        let out = prepare_markdown(input, false);
        assert_eq!(out.title, None);
        assert_eq!(out.markdown, "---\nNote: keep this\n---\nBody\n");
    }

    #[test]
    fn test_empty_input() {
        let out = prepare_markdown("", true);
        assert_eq!(out.markdown, "");
        assert_eq!(out.title, None);
    }
}
