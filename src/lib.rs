//! # edgequake-md2pdf
//!
//! Convert Markdown documents to styled PDF via HTML and headless Chromium.
//!
//! ## Why HTML in the middle?
//!
//! Laying out text, tables and code across pages is a browser's job. This
//! crate turns Markdown into a standalone HTML document with an embedded
//! print stylesheet and lets Chromium's `Page.printToPDF` paginate it, so
//! `@page` rules, `@media print` overrides and web fonts all behave exactly
//! as they would when printing from a browser.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Input       local file, URL, or stdin
//!  ├─ 2. Preprocess  BOM, line endings, invisible chars, front-matter (opt-in)
//!  ├─ 3. Markdown    tables, footnotes, definition lists, highlighted code
//!  ├─ 4. Compose     HTML document + stylesheet from StyleConfig
//!  ├─ 5. Engine      headless Chromium (CPU-bound, spawn_blocking)
//!  └─ 6. Output      PDF bytes + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_md2pdf::render;
//! use std::io::Read;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut pdf = render("# Hello\n\nSome *text*.", None)?;
//!     let mut bytes = Vec::new();
//!     pdf.read_to_end(&mut bytes)?;
//!     std::fs::write("hello.pdf", bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! Files, URLs and batches go through the async API:
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{convert_to_file, RenderConfig, StylePreset};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenderConfig::builder()
//!         .style(StylePreset::Paper.style())
//!         .page_numbers(true)
//!         .build()?;
//!     let stats = convert_to_file("README.md", "README.pdf", &config).await?;
//!     eprintln!("{} bytes in {}ms", stats.pdf_bytes, stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `fetch` | off     | Download a pinned Chromium build when no local browser is found |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Browser Requirements
//!
//! The default [`ChromeEngine`] needs Chrome or Chromium. It looks at the
//! `CHROME` environment variable, then the usual install locations. Inside
//! containers running as root, disable the sandbox
//! ([`RenderConfigBuilder::sandbox`]).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod style;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RenderConfig, RenderConfigBuilder};
pub use convert::{
    convert, convert_batch, convert_sync, convert_to_file, render, render_async, render_document,
    render_html,
};
pub use error::{DocumentError, Md2PdfError};
pub use output::{BatchOutput, BatchStats, DocumentResult, RenderOutput, RenderStats};
pub use pipeline::engine::{ChromeEngine, PageSetup, PdfEngine};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, disambiguate_outputs, BatchJob, DocumentStream};
pub use style::{Length, LengthUnit, PageSize, Palette, StyleConfig, StylePreset};
