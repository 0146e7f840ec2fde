//! HTML → PDF rendering: the [`PdfEngine`] seam and its headless-Chromium
//! implementation.
//!
//! ## Why a trait?
//!
//! Layout, font shaping and pagination are delegated wholesale to an
//! external engine. The trait keeps that dependency at arm's length: the
//! pipeline only needs "styled HTML in, PDF bytes out", and tests can inject
//! a stub engine to exercise everything upstream without a browser.
//!
//! ## Why a browser per call?
//!
//! [`ChromeEngine`] launches an isolated headless browser for every render
//! and tears it down afterwards. Nothing is shared between calls, so
//! concurrent renders cannot interfere and a crashed renderer never poisons
//! later documents. The cost is browser start-up time (a few hundred ms).
//!
//! All methods are blocking; async callers run them on
//! `tokio::task::spawn_blocking` (see [`crate::convert`]).

use crate::error::Md2PdfError;
use crate::style::StyleConfig;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Documents up to this size are passed inline as a `data:` URL; larger
/// ones go through a temp file to stay clear of browser URL limits.
pub const DATA_URL_LIMIT: usize = 1024 * 1024;

/// PDF file signature every engine output must start with.
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Page geometry and print flags for one render, in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSetup {
    pub paper_width_in: f64,
    pub paper_height_in: f64,
    pub margin_in: f64,
    /// Paint backgrounds (code tints, table header rows).
    pub print_background: bool,
    /// Add a "page / total" footer.
    pub page_numbers: bool,
}

impl PageSetup {
    /// Derive the page geometry from a style.
    pub fn from_style(style: &StyleConfig, page_numbers: bool) -> Self {
        let (w, h) = style.page_dimensions_in();
        Self {
            paper_width_in: w,
            paper_height_in: h,
            margin_in: style.margin.to_inches(),
            print_background: true,
            page_numbers,
        }
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::from_style(&StyleConfig::default(), false)
    }
}

/// An HTML + CSS to PDF renderer.
///
/// Implementations must be `Send + Sync`: one engine instance is shared
/// across concurrent batch conversions.
pub trait PdfEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Render a complete HTML document to PDF bytes.
    fn render_pdf(&self, html: &str, page: &PageSetup) -> Result<Vec<u8>, Md2PdfError>;
}

/// Check that `bytes` look like a PDF file.
pub fn validate_pdf(bytes: &[u8]) -> Result<(), Md2PdfError> {
    if bytes.starts_with(PDF_SIGNATURE) {
        Ok(())
    } else {
        Err(Md2PdfError::InvalidPdfOutput {
            len: bytes.len(),
            magic: bytes.iter().take(8).copied().collect(),
        })
    }
}

// ── Chrome engine ────────────────────────────────────────────────────────

/// Renders through headless Chrome/Chromium using `Page.printToPDF`.
///
/// The browser binary is taken from `executable`, else the `CHROME`
/// environment variable, else the usual install locations on `PATH`.
#[derive(Debug, Clone)]
pub struct ChromeEngine {
    /// Explicit browser binary.
    pub executable: Option<PathBuf>,
    /// Keep Chrome's sandbox on. Containers running as root usually need it off.
    pub sandbox: bool,
    /// Per-operation timeout for launch, navigation and printing. The three
    /// operations run back to back, so a whole render can take up to three
    /// times this.
    pub timeout: Duration,
}

impl Default for ChromeEngine {
    fn default() -> Self {
        Self {
            executable: None,
            sandbox: true,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ChromeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn launch(&self) -> Result<Browser, Md2PdfError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.sandbox)
            .path(self.executable.clone())
            .idle_browser_timeout(self.timeout)
            .build()
            .map_err(|e| Md2PdfError::EngineUnavailable(format!("launch options: {e}")))?;

        Browser::new(options).map_err(|e| Md2PdfError::EngineUnavailable(e.to_string()))
    }
}

impl PdfEngine for ChromeEngine {
    fn name(&self) -> &str {
        "chrome"
    }

    fn render_pdf(&self, html: &str, page: &PageSetup) -> Result<Vec<u8>, Md2PdfError> {
        let start = Instant::now();
        let browser = self.launch()?;
        debug!("Browser launched in {}ms", start.elapsed().as_millis());

        let tab = browser.new_tab().map_err(|e| render_failed("open tab", e))?;
        tab.set_default_timeout(self.timeout);

        // `_staged` keeps a large document's temp file alive until printing ends.
        let (url, _staged) = stage_document(html)?;
        tab.navigate_to(&url)
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| render_failed("load document", e))?;

        let pdf = tab
            .print_to_pdf(Some(print_options(page)))
            .map_err(|e| render_failed("print to PDF", e))?;

        info!(
            "Chrome rendered {} bytes HTML → {} bytes PDF in {}ms",
            html.len(),
            pdf.len(),
            start.elapsed().as_millis()
        );
        Ok(pdf)
    }
}

fn render_failed(stage: &str, e: impl std::fmt::Display) -> Md2PdfError {
    Md2PdfError::RenderFailed {
        detail: format!("{stage}: {e}"),
    }
}

/// Turn the document into a URL the browser can load.
fn stage_document(html: &str) -> Result<(String, Option<NamedTempFile>), Md2PdfError> {
    if html.len() <= DATA_URL_LIMIT {
        let url = format!("data:text/html;charset=utf-8;base64,{}", STANDARD.encode(html));
        return Ok((url, None));
    }

    let mut file = tempfile::Builder::new()
        .prefix("md2pdf-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| Md2PdfError::Internal(format!("tempfile: {e}")))?;
    file.write_all(html.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| Md2PdfError::Internal(format!("tempfile write: {e}")))?;

    let url = reqwest::Url::from_file_path(file.path())
        .map_err(|_| Md2PdfError::Internal(format!("bad temp path {}", file.path().display())))?;
    debug!("Staged {} bytes of HTML at {}", html.len(), url);
    Ok((url.to_string(), Some(file)))
}

const FOOTER_TEMPLATE: &str = r#"<div style="font-size: 8px; width: 100%; text-align: center; color: #888;"><span class="pageNumber"></span> / <span class="totalPages"></span></div>"#;

fn print_options(page: &PageSetup) -> PrintToPdfOptions {
    PrintToPdfOptions {
        landscape: Some(false),
        display_header_footer: Some(page.page_numbers),
        header_template: page.page_numbers.then(|| "<span></span>".to_string()),
        footer_template: page.page_numbers.then(|| FOOTER_TEMPLATE.to_string()),
        print_background: Some(page.print_background),
        scale: Some(1.0),
        paper_width: Some(page.paper_width_in),
        paper_height: Some(page.paper_height_in),
        margin_top: Some(page.margin_in),
        margin_bottom: Some(page.margin_in),
        margin_left: Some(page.margin_in),
        margin_right: Some(page.margin_in),
        // The stylesheet's @page rule already carries size and orientation.
        prefer_css_page_size: Some(true),
        ..Default::default()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A browser-free engine for pipeline tests.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Emits a tiny PDF whose body records the HTML length.
    #[derive(Default)]
    pub struct StubEngine {
        pub calls: AtomicUsize,
    }

    impl PdfEngine for StubEngine {
        fn name(&self) -> &str {
            "stub"
        }

        fn render_pdf(&self, html: &str, page: &PageSetup) -> Result<Vec<u8>, Md2PdfError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!(
                "%PDF-1.7\n% html={} w={:.2} h={:.2}\n%%EOF\n",
                html.len(),
                page.paper_width_in,
                page.paper_height_in
            )
            .into_bytes())
        }
    }

    /// Always fails, like a crashed renderer.
    pub struct FailingEngine;

    impl PdfEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        fn render_pdf(&self, _html: &str, _page: &PageSetup) -> Result<Vec<u8>, Md2PdfError> {
            Err(Md2PdfError::RenderFailed {
                detail: "renderer crashed".into(),
            })
        }
    }

    /// Returns bytes that are not a PDF.
    pub struct GarbageEngine;

    impl PdfEngine for GarbageEngine {
        fn name(&self) -> &str {
            "garbage"
        }

        fn render_pdf(&self, _html: &str, _page: &PageSetup) -> Result<Vec<u8>, Md2PdfError> {
            Ok(b"<html>oops</html>".to_vec())
        }
    }
}
