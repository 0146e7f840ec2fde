//! Error types for the edgequake-md2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PdfError`]: **Fatal**: a document cannot be produced at all
//!   (input missing, browser unavailable, renderer fault). Returned as
//!   `Err(Md2PdfError)` from [`crate::render`] and the `convert*` functions.
//!
//! * [`DocumentError`]: **Non-fatal**: one document of a batch failed while
//!   the others are fine. Stored inside [`crate::output::DocumentResult`] so
//!   callers can inspect partial success instead of losing the whole batch.
//!
//! Malformed Markdown is never an error: the parser renders what it cannot
//! interpret as literal text.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a file path, `-`, or a valid HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path, '-' or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The input bytes are not valid UTF-8 text.
    #[error("Input '{input}' is not valid UTF-8 (invalid byte at offset {offset})")]
    NotUtf8 { input: String, offset: usize },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The rendering engine could not be started (no browser found, launch refused).
    #[error(
        "PDF engine unavailable: {0}\n\n\
The default engine drives a local Chrome/Chromium install.\n\
  • Install Chrome or Chromium and make sure it is on PATH.\n\
  • Or set CHROME=/path/to/chrome (or pass --chrome-path).\n\
  • Or build with `--features fetch` to download Chromium on first use.\n"
    )]
    EngineUnavailable(String),

    /// The engine started but failed to turn the HTML into a PDF.
    #[error("PDF rendering failed: {detail}")]
    RenderFailed { detail: String },

    /// Rendering exceeded the configured timeout.
    #[error("PDF rendering timed out after {secs}s\nIncrease --timeout for very large documents.")]
    RenderTimeout { secs: u64 },

    /// The engine returned bytes that do not start with the `%PDF-` signature.
    #[error("Engine produced invalid PDF output ({len} bytes, first bytes: {magic:?})")]
    InvalidPdfOutput { len: usize, magic: Vec<u8> },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A style configuration failed validation or could not be parsed.
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    // ── Batch errors ──────────────────────────────────────────────────────
    /// Every document in a batch failed.
    #[error("All {total} documents failed. First error: {first_error}")]
    AllDocumentsFailed { total: usize, first_error: String },

    /// Some documents failed; returned by [`crate::output::BatchOutput::into_result`].
    #[error("{failed}/{total} documents failed ({success} succeeded)")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Md2PdfError {
    /// True for failures of the HTML → PDF step, as opposed to input or
    /// configuration problems.
    pub fn is_render_error(&self) -> bool {
        matches!(
            self,
            Md2PdfError::EngineUnavailable(_)
                | Md2PdfError::RenderFailed { .. }
                | Md2PdfError::RenderTimeout { .. }
                | Md2PdfError::InvalidPdfOutput { .. }
        )
    }
}

/// A non-fatal error for a single document in a batch.
///
/// The batch continues unless every document fails.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// Input could not be resolved or read.
    #[error("{input}: could not read input: {detail}")]
    InputFailed { input: String, detail: String },

    /// The render step failed.
    #[error("{input}: rendering failed: {detail}")]
    RenderFailed { input: String, detail: String },

    /// The render step timed out.
    #[error("{input}: rendering timed out after {secs}s")]
    Timeout { input: String, secs: u64 },

    /// The PDF could not be written to disk.
    #[error("{input}: could not write output: {detail}")]
    WriteFailed { input: String, detail: String },

    /// The style or configuration was rejected before rendering started.
    #[error("{input}: invalid configuration: {detail}")]
    ConfigFailed { input: String, detail: String },
}

impl DocumentError {
    /// Classify a fatal error raised while processing `input`.
    pub fn from_fatal(input: &str, err: &Md2PdfError) -> Self {
        let input = input.to_string();
        let detail = err.to_string();
        match err {
            Md2PdfError::FileNotFound { .. }
            | Md2PdfError::PermissionDenied { .. }
            | Md2PdfError::InvalidInput { .. }
            | Md2PdfError::NotUtf8 { .. }
            | Md2PdfError::DownloadFailed { .. }
            | Md2PdfError::DownloadTimeout { .. } => DocumentError::InputFailed { input, detail },

            Md2PdfError::InvalidConfig(_) | Md2PdfError::InvalidStyle(_) => {
                DocumentError::ConfigFailed { input, detail }
            }

            Md2PdfError::RenderTimeout { secs } => DocumentError::Timeout { input, secs: *secs },

            Md2PdfError::OutputWriteFailed { .. } => DocumentError::WriteFailed { input, detail },

            // Internal covers a render task that panicked or was cancelled.
            Md2PdfError::EngineUnavailable(_)
            | Md2PdfError::RenderFailed { .. }
            | Md2PdfError::InvalidPdfOutput { .. }
            | Md2PdfError::Internal(_)
            | Md2PdfError::AllDocumentsFailed { .. }
            | Md2PdfError::PartialFailure { .. } => DocumentError::RenderFailed { input, detail },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_timeout_display() {
        let e = Md2PdfError::RenderTimeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
        assert!(e.is_render_error());
    }

    #[test]
    fn engine_unavailable_mentions_chrome_env() {
        let e = Md2PdfError::EngineUnavailable("no browser".into());
        let msg = e.to_string();
        assert!(msg.contains("no browser"));
        assert!(msg.contains("CHROME="));
    }

    #[test]
    fn input_errors_are_not_render_errors() {
        let e = Md2PdfError::FileNotFound {
            path: PathBuf::from("missing.md"),
        };
        assert!(!e.is_render_error());
        assert!(e.to_string().contains("missing.md"));
    }

    #[test]
    fn document_error_classifies_fatal_errors() {
        let timeout = DocumentError::from_fatal("a.md", &Md2PdfError::RenderTimeout { secs: 5 });
        assert!(matches!(timeout, DocumentError::Timeout { secs: 5, .. }));

        let render = DocumentError::from_fatal(
            "b.md",
            &Md2PdfError::RenderFailed {
                detail: "crash".into(),
            },
        );
        assert!(matches!(render, DocumentError::RenderFailed { .. }));
        assert!(render.to_string().starts_with("b.md"));

        let input = DocumentError::from_fatal(
            "c.md",
            &Md2PdfError::NotUtf8 {
                input: "c.md".into(),
                offset: 3,
            },
        );
        assert!(matches!(input, DocumentError::InputFailed { .. }));

        let style = DocumentError::from_fatal(
            "d.md",
            &Md2PdfError::InvalidStyle("unknown code theme 'nope'".into()),
        );
        assert!(matches!(style, DocumentError::ConfigFailed { .. }));
        assert!(style.to_string().contains("invalid configuration"));

        let config = DocumentError::from_fatal("e.md", &Md2PdfError::InvalidConfig("x".into()));
        assert!(matches!(config, DocumentError::ConfigFailed { .. }));

        let internal = DocumentError::from_fatal("f.md", &Md2PdfError::Internal("panic".into()));
        assert!(matches!(internal, DocumentError::RenderFailed { .. }));
    }

    #[test]
    fn document_error_serialises() {
        let e = DocumentError::Timeout {
            input: "x.md".into(),
            secs: 60,
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("Timeout"));
    }
}
