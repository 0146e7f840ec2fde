//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`RenderConfig`], built
//! via its [`RenderConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across threads and to diff two runs to
//! understand why their outputs differ.
//!
//! The cosmetic half lives in [`StyleConfig`]; this module owns everything
//! else: Markdown switches, the engine, timeouts and batch concurrency.

use crate::error::Md2PdfError;
use crate::pipeline::engine::{ChromeEngine, PageSetup, PdfEngine};
use crate::pipeline::markdown::MarkdownOptions;
use crate::progress::ProgressCallback;
use crate::style::StyleConfig;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`RenderConfig::builder()`] or using [`RenderConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::{RenderConfig, StylePreset};
///
/// let config = RenderConfig::builder()
///     .style(StylePreset::Compact.style())
///     .page_numbers(true)
///     .render_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert!(config.page_numbers);
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// Presentation parameters. Default: the primary theme.
    pub style: StyleConfig,

    /// Document title (HTML `<title>`, PDF Title metadata). If None, the
    /// front-matter `title:` (with [`Self::front_matter`]) or the first
    /// `# heading` is used.
    pub title: Option<String>,

    /// Lift a leading `---` … `---` front-matter block out of the body and
    /// use its `title:`. Default: false.
    ///
    /// When off, such a block is rendered as plain Markdown: a thematic
    /// break followed by a setext heading.
    pub front_matter: bool,

    /// Pass raw HTML embedded in the Markdown through. Default: true.
    ///
    /// Turn off for untrusted input: raw HTML is then shown literally.
    pub raw_html: bool,

    /// Syntax-highlight fenced code blocks. Default: true.
    pub highlight: bool,

    /// Print a "page / total" footer. Default: false.
    pub page_numbers: bool,

    /// Upper bound on one HTML → PDF render, in seconds. Default: 60.
    pub render_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Documents rendered at once in batch mode. Default: 4.
    ///
    /// Each in-flight document owns a browser process, so this bounds memory
    /// as much as it bounds parallelism.
    pub concurrency: usize,

    /// Browser binary for the default engine. If None, `CHROME` or `PATH`.
    pub chrome_path: Option<PathBuf>,

    /// Keep the browser sandbox enabled. Default: true.
    pub sandbox: bool,

    /// Pre-constructed engine. Takes precedence over the Chrome settings.
    pub engine: Option<Arc<dyn PdfEngine>>,

    /// Optional progress callback for batch conversions.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            style: StyleConfig::default(),
            title: None,
            front_matter: false,
            raw_html: true,
            highlight: true,
            page_numbers: false,
            render_timeout_secs: 60,
            download_timeout_secs: 120,
            concurrency: 4,
            chrome_path: None,
            sandbox: true,
            engine: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("style", &self.style)
            .field("title", &self.title)
            .field("front_matter", &self.front_matter)
            .field("raw_html", &self.raw_html)
            .field("highlight", &self.highlight)
            .field("page_numbers", &self.page_numbers)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("chrome_path", &self.chrome_path)
            .field("sandbox", &self.sandbox)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }

    /// A default config carrying `style`.
    pub fn with_style(style: StyleConfig) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn markdown_options(&self) -> MarkdownOptions {
        MarkdownOptions {
            raw_html: self.raw_html,
            highlight: self.highlight,
        }
    }

    pub fn page_setup(&self) -> PageSetup {
        PageSetup::from_style(&self.style, self.page_numbers)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    /// Budget for each browser operation of the default engine (launch,
    /// page load, print): a third of the render timeout, at least 1s.
    ///
    /// A render abandoned by the async timeout keeps running on the blocking
    /// pool; with this budget its browser gives up, and is torn down, about
    /// one render timeout later.
    pub fn engine_operation_timeout(&self) -> Duration {
        (self.render_timeout() / 3).max(Duration::from_secs(1))
    }

    /// The injected engine, or a [`ChromeEngine`] built from the Chrome settings.
    pub fn resolve_engine(&self) -> Arc<dyn PdfEngine> {
        if let Some(ref engine) = self.engine {
            return Arc::clone(engine);
        }
        Arc::new(ChromeEngine {
            executable: self.chrome_path.clone(),
            sandbox: self.sandbox,
            timeout: self.engine_operation_timeout(),
        })
    }

    /// Check the invariants `build()` enforces; for configs assembled by hand.
    pub fn validate(&self) -> Result<(), Md2PdfError> {
        self.style.validate()?;
        if self.render_timeout_secs == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "Render timeout must be ≥ 1 second".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(Md2PdfError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(())
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn style(mut self, style: StyleConfig) -> Self {
        self.config.style = style;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn front_matter(mut self, v: bool) -> Self {
        self.config.front_matter = v;
        self
    }

    pub fn raw_html(mut self, v: bool) -> Self {
        self.config.raw_html = v;
        self
    }

    pub fn highlight(mut self, v: bool) -> Self {
        self.config.highlight = v;
        self
    }

    pub fn page_numbers(mut self, v: bool) -> Self {
        self.config.page_numbers = v;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn sandbox(mut self, v: bool) -> Self {
        self.config.sandbox = v;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn PdfEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, Md2PdfError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::engine::testing::StubEngine;
    use crate::style::Length;

    #[test]
    fn defaults() {
        let c = RenderConfig::default();
        assert!(c.raw_html);
        assert!(c.highlight);
        assert!(!c.front_matter);
        assert!(!c.page_numbers);
        assert_eq!(c.render_timeout_secs, 60);
        assert_eq!(c.concurrency, 4);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let c = RenderConfig::builder()
            .title("Report")
            .front_matter(true)
            .raw_html(false)
            .highlight(false)
            .page_numbers(true)
            .concurrency(0)
            .sandbox(false)
            .chrome_path("/usr/bin/chromium")
            .build()
            .unwrap();
        assert_eq!(c.title.as_deref(), Some("Report"));
        assert!(c.front_matter);
        assert_eq!(c.concurrency, 1, "concurrency is clamped to 1");
        assert_eq!(
            c.markdown_options(),
            MarkdownOptions {
                raw_html: false,
                highlight: false
            }
        );
        assert!(c.page_setup().page_numbers);
        assert_eq!(c.resolve_engine().name(), "chrome");
    }

    #[test]
    fn engine_operations_share_the_render_timeout() {
        let c = RenderConfig::builder().render_timeout_secs(60).build().unwrap();
        assert_eq!(c.engine_operation_timeout(), Duration::from_secs(20));
        assert!(c.engine_operation_timeout() * 3 <= c.render_timeout());

        let c = RenderConfig::builder().render_timeout_secs(1).build().unwrap();
        assert_eq!(c.engine_operation_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = RenderConfig::builder().render_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, Md2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn invalid_style_rejected() {
        let style = StyleConfig {
            margin: Length::cm(20.0),
            ..StyleConfig::default()
        };
        let err = RenderConfig::builder().style(style).build().unwrap_err();
        assert!(matches!(err, Md2PdfError::InvalidStyle(_)));
    }

    #[test]
    fn injected_engine_takes_precedence() {
        let c = RenderConfig::builder()
            .engine(Arc::new(StubEngine::default()))
            .build()
            .unwrap();
        assert_eq!(c.resolve_engine().name(), "stub");
        assert!(format!("{c:?}").contains("stub"));
    }
}
