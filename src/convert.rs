//! Conversion entry points.
//!
//! ## Sync core, async shell
//!
//! [`render`], [`render_html`] and [`render_document`] are plain blocking
//! functions: Markdown text in, PDF bytes out. The async `convert*` family
//! adds input resolution (path, URL, stdin) and runs the blocking render on
//! `spawn_blocking` under a timeout so a wedged browser cannot stall the
//! runtime. Use [`crate::stream::convert_stream`] when you want batch results
//! as each document finishes.

use crate::config::RenderConfig;
use crate::error::Md2PdfError;
use crate::output::{BatchOutput, BatchStats, RenderOutput, RenderStats};
use crate::pipeline::{compose, engine, input, markdown, preprocess, stylesheet};
use crate::stream::{convert_stream, BatchJob};
use crate::style::StyleConfig;
use futures::StreamExt;
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Title used when neither the config, front-matter nor an `h1` names the document.
pub const DEFAULT_TITLE: &str = "Document";

/// Render Markdown text to a PDF buffer positioned at offset 0.
///
/// `style` defaults to [`StyleConfig::default()`], the primary theme.
///
/// # Errors
/// Markdown never fails to parse. Errors come from style validation or from
/// the engine (browser missing, crash, timeout, output that is not a PDF).
pub fn render(markdown: &str, style: Option<&StyleConfig>) -> Result<Cursor<Vec<u8>>, Md2PdfError> {
    let config = RenderConfig::with_style(style.cloned().unwrap_or_default());
    render_document(markdown, &config).map(RenderOutput::into_reader)
}

/// Build the complete HTML document that would be handed to the engine.
///
/// Useful for inspecting layout in a browser; no engine is involved.
pub fn render_html(markdown: &str, config: &RenderConfig) -> Result<String, Md2PdfError> {
    prepare(markdown, config).map(|doc| doc.html)
}

/// Render Markdown text to PDF, keeping the intermediate HTML and stats.
pub fn render_document(markdown: &str, config: &RenderConfig) -> Result<RenderOutput, Md2PdfError> {
    let total_start = Instant::now();

    let doc = prepare(markdown, config)?;
    let html_duration_ms = total_start.elapsed().as_millis() as u64;

    let pdf_engine = config.resolve_engine();
    debug!("Rendering '{}' with the {} engine", doc.title, pdf_engine.name());
    let render_start = Instant::now();
    let pdf = pdf_engine.render_pdf(&doc.html, &config.page_setup())?;
    engine::validate_pdf(&pdf)?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let stats = RenderStats {
        markdown_bytes: markdown.len(),
        html_bytes: doc.html.len(),
        pdf_bytes: pdf.len(),
        html_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Rendered '{}': {} bytes Markdown → {} bytes PDF in {}ms",
        doc.title, stats.markdown_bytes, stats.pdf_bytes, stats.total_duration_ms
    );

    Ok(RenderOutput {
        pdf,
        html: doc.html,
        title: doc.title,
        stats,
    })
}

struct PreparedDocument {
    html: String,
    title: String,
}

fn prepare(markdown: &str, config: &RenderConfig) -> Result<PreparedDocument, Md2PdfError> {
    config.style.validate()?;
    let css = stylesheet::render_stylesheet(&config.style)?;
    let pre = preprocess::prepare_markdown(markdown, config.front_matter);
    let title = config
        .title
        .clone()
        .or(pre.title)
        .or_else(|| markdown::first_heading(&pre.markdown))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let fragment = markdown::markdown_to_html(&pre.markdown, &config.markdown_options());
    let html = compose::compose_document(&fragment, &css, &title);
    debug!(
        "Composed {} bytes of HTML ({} bytes of CSS)",
        html.len(),
        css.len()
    );
    Ok(PreparedDocument { html, title })
}

/// Async [`render_document`]: runs on the blocking pool under the render timeout.
///
/// A blocking task cannot be cancelled. When the timeout fires, this returns
/// [`Md2PdfError::RenderTimeout`] at once but the task runs on until the
/// engine gives up. The default engine bounds each browser operation with
/// [`RenderConfig::engine_operation_timeout`], so in a batch that hits
/// timeouts up to twice `concurrency` browsers can be alive for a while.
pub async fn render_async(
    markdown: String,
    config: &RenderConfig,
) -> Result<RenderOutput, Md2PdfError> {
    let secs = config.render_timeout_secs;
    let cfg = config.clone();
    let task = tokio::task::spawn_blocking(move || render_document(&markdown, &cfg));

    match tokio::time::timeout(config.render_timeout(), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(Md2PdfError::Internal(format!("render task failed: {join}"))),
        Err(_) => Err(Md2PdfError::RenderTimeout { secs }),
    }
}

/// Convert a Markdown file, URL or `-` (stdin) to PDF.
///
/// # Arguments
/// * `input`: local path, HTTP/HTTPS URL, or `-`
/// * `config`: conversion configuration
///
/// # Errors
/// Input errors (not found, not UTF-8, download failure) and every render
/// error of [`render_document`], plus [`Md2PdfError::RenderTimeout`].
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &RenderConfig,
) -> Result<RenderOutput, Md2PdfError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);
    let text = input::read_input(input_str, config.download_timeout_secs).await?;
    render_async(text, config).await
}

/// Convert and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<RenderStats, Md2PdfError> {
    let output = convert(input_str, config).await?;
    write_atomic(output_path.as_ref(), &output.pdf).await?;
    Ok(output.stats)
}

/// Write `bytes` to `path` through a uniquely named temp file in the same
/// directory, then rename it into place. Concurrent writers never share a
/// temp file, and readers never see a partial PDF.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Md2PdfError> {
    let target = path.to_path_buf();
    let data = bytes.to_vec();
    tokio::task::spawn_blocking(move || persist_atomic(&target, &data))
        .await
        .map_err(|e| Md2PdfError::Internal(format!("write task failed: {e}")))??;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn persist_atomic(path: &Path, bytes: &[u8]) -> Result<(), Md2PdfError> {
    let write_err = |source| Md2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".md2pdf-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally; do not call from inside one.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &RenderConfig,
) -> Result<RenderOutput, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Convert many documents, writing each PDF to its job's output path.
///
/// Up to `config.concurrency` documents render at once. Results come back in
/// submission order.
///
/// # Returns
/// `Ok(BatchOutput)` as long as at least one document succeeded; check
/// `stats.failed` (or call [`BatchOutput::into_result`]) for the rest.
///
/// # Errors
/// [`Md2PdfError::AllDocumentsFailed`] when no document could be converted.
pub async fn convert_batch(
    jobs: Vec<BatchJob>,
    config: &RenderConfig,
) -> Result<BatchOutput, Md2PdfError> {
    let start = Instant::now();
    let total = jobs.len();

    let mut documents: Vec<_> = convert_stream(jobs, config).collect().await;
    documents.sort_by_key(|d| d.index);

    let succeeded = documents.iter().filter(|d| d.is_success()).count();
    if total > 0 && succeeded == 0 {
        let first_error = documents
            .iter()
            .find_map(|d| d.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(Md2PdfError::AllDocumentsFailed { total, first_error });
    }

    let stats = BatchStats {
        total_documents: total,
        succeeded,
        failed: total - succeeded,
        total_pdf_bytes: documents
            .iter()
            .filter_map(|d| d.stats.as_ref())
            .map(|s| s.pdf_bytes as u64)
            .sum(),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Batch complete: {}/{} documents, {}ms total",
        stats.succeeded, stats.total_documents, stats.total_duration_ms
    );

    Ok(BatchOutput { documents, stats })
}
