//! Result types returned by the conversion entry points.

use crate::error::{DocumentError, Md2PdfError};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::PathBuf;

/// A rendered document.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Complete PDF file.
    pub pdf: Vec<u8>,
    /// The intermediate HTML document handed to the engine.
    pub html: String,
    /// Title embedded in the document.
    pub title: String,
    pub stats: RenderStats,
}

impl RenderOutput {
    /// The PDF as a reader positioned at its first byte.
    pub fn into_reader(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.pdf)
    }
}

/// Sizes and timings of one render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    pub markdown_bytes: usize,
    pub html_bytes: usize,
    pub pdf_bytes: usize,
    /// Markdown → HTML document, including stylesheet generation.
    pub html_duration_ms: u64,
    /// Time spent inside the PDF engine.
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Outcome of one document in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// 1-based position in the submitted batch.
    pub index: usize,
    /// Input as given (path, URL).
    pub input: String,
    /// Where the PDF was written.
    pub output: PathBuf,
    /// Present on success.
    pub stats: Option<RenderStats>,
    /// Present on failure.
    pub error: Option<DocumentError>,
}

impl DocumentResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_documents: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_pdf_bytes: u64,
    pub total_duration_ms: u64,
}

/// All results of a batch conversion, in submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    pub documents: Vec<DocumentResult>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Treat any failed document as an error.
    pub fn into_result(self) -> Result<Self, Md2PdfError> {
        if self.stats.failed > 0 {
            return Err(Md2PdfError::PartialFailure {
                success: self.stats.succeeded,
                failed: self.stats.failed,
                total: self.stats.total_documents,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn reader_starts_at_offset_zero() {
        let out = RenderOutput {
            pdf: b"%PDF-1.7 body".to_vec(),
            html: String::new(),
            title: "Document".into(),
            stats: RenderStats::default(),
        };
        let mut reader = out.into_reader();
        assert_eq!(reader.position(), 0);
        let mut head = [0u8; 5];
        reader.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"%PDF-");
    }

    #[test]
    fn into_result_flags_partial_failure() {
        let batch = BatchOutput {
            documents: vec![],
            stats: BatchStats {
                total_documents: 3,
                succeeded: 2,
                failed: 1,
                ..BatchStats::default()
            },
        };
        let err = batch.into_result().unwrap_err();
        assert!(err.to_string().contains("1/3"), "got: {err}");
    }

    #[test]
    fn document_result_serialises() {
        let r = DocumentResult {
            index: 1,
            input: "a.md".into(),
            output: PathBuf::from("a.pdf"),
            stats: Some(RenderStats {
                pdf_bytes: 10,
                ..RenderStats::default()
            }),
            error: None,
        };
        assert!(r.is_success());
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["stats"]["pdf_bytes"], 10);
    }
}
