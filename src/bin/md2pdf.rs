//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RenderConfig` and reports results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_md2pdf::pipeline::{highlight, input};
use edgequake_md2pdf::{
    convert, convert_batch, disambiguate_outputs, render_html, BatchJob,
    ConversionProgressCallback, Length, PageSize, ProgressCallback, RenderConfig, StyleConfig,
    StylePreset,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per
/// document. Documents may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Rendering");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_document_start(&self, index: usize, _total: usize, input: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(input.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, pdf_bytes: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{:>7} KiB", pdf_bytes / 1024)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);

        // Keep the log line on one terminal row.
        let first_line = error.lines().next().unwrap_or_default();
        let msg = match first_line.char_indices().nth(100) {
            Some((cut, _)) => format!("{}\u{2026}", &first_line[..cut]),
            None => first_line.to_string(),
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let failed = total_documents.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents rendered successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents rendered  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Basic conversion (writes notes.pdf next to notes.md)
  md2pdf notes.md

  # Choose the output file
  md2pdf README.md -o readme.pdf

  # Light theme with page numbers
  md2pdf --preset paper --page-numbers report.md

  # Several documents into one directory, 8 at a time
  md2pdf -c 8 -o out/ docs/*.md

  # From a URL or stdin
  md2pdf https://example.com/raw/README.md -o readme.pdf
  cat notes.md | md2pdf - > notes.pdf

  # Inspect the intermediate HTML
  md2pdf --html notes.md -o notes.html

  # Custom style file (any subset of fields)
  md2pdf --style-file style.json notes.md

STYLE FILE (JSON, all fields optional):
  {
    "page_size": "letter",
    "margin": "1.5cm",
    "font_family": "Georgia, serif",
    "font_size_pt": 11,
    "palette": { "background": "#ffffff", "text": "#222222" },
    "code_theme": "InspiredGitHub"
  }

ENVIRONMENT VARIABLES:
  CHROME                  Path to the Chrome/Chromium binary
  RUST_LOG                Override the log filter (e.g. edgequake_md2pdf=debug)
  MD2PDF_*                Every flag, e.g. MD2PDF_PRESET=paper

SETUP:
  md2pdf drives a local Chrome or Chromium in headless mode.
  Install one and make sure it is on PATH, or set CHROME=/path/to/chrome.
  Running as root inside a container usually needs --no-sandbox.
"##;

/// Convert Markdown files and URLs to styled PDF.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown files and URLs to styled PDF",
    long_about = "Convert Markdown documents (local files, URLs or stdin) to styled PDF. \
Markdown is rendered to HTML with tables, footnotes, definition lists and highlighted code, \
then printed to PDF by headless Chrome/Chromium.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file paths, HTTP/HTTPS URLs, or `-` for stdin.
    #[arg(required_unless_present = "list_themes")]
    inputs: Vec<String>,

    /// Output file (one input) or directory (several inputs). `-` for stdout.
    #[arg(short, long, env = "MD2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Built-in style: primary, compact, midnight, paper.
    #[arg(long, env = "MD2PDF_PRESET", default_value = "primary")]
    preset: StylePreset,

    /// JSON style file used instead of the preset; missing fields take defaults.
    #[arg(long, env = "MD2PDF_STYLE_FILE")]
    style_file: Option<PathBuf>,

    /// Page size: A3, A4, A5, letter, legal, or "<width> <height>".
    #[arg(long, env = "MD2PDF_PAGE_SIZE")]
    page_size: Option<PageSize>,

    /// Landscape orientation.
    #[arg(long, env = "MD2PDF_LANDSCAPE")]
    landscape: bool,

    /// Page margin, e.g. 2cm, 15mm, 0.75in.
    #[arg(long, env = "MD2PDF_MARGIN")]
    margin: Option<Length>,

    /// CSS font-family for body text.
    #[arg(long, env = "MD2PDF_FONT_FAMILY")]
    font_family: Option<String>,

    /// Document title (defaults to front-matter title or first heading).
    #[arg(long, env = "MD2PDF_TITLE")]
    title: Option<String>,

    /// Treat a leading `---` block of `key: value` lines as front-matter:
    /// drop it from the body and take the title from its `title:` field.
    #[arg(long, env = "MD2PDF_FRONT_MATTER")]
    front_matter: bool,

    /// Syntax-highlighting colour theme (see --list-themes).
    #[arg(long, env = "MD2PDF_CODE_THEME")]
    code_theme: Option<String>,

    /// Disable syntax highlighting of code blocks.
    #[arg(long, env = "MD2PDF_NO_HIGHLIGHT")]
    no_highlight: bool,

    /// Show raw HTML in the Markdown literally instead of passing it through.
    #[arg(long, env = "MD2PDF_ESCAPE_HTML")]
    escape_html: bool,

    /// Print "page / total" in the footer.
    #[arg(long, env = "MD2PDF_PAGE_NUMBERS")]
    page_numbers: bool,

    /// Write the intermediate HTML document instead of a PDF.
    #[arg(long, env = "MD2PDF_HTML")]
    html: bool,

    /// Chrome/Chromium binary (otherwise $CHROME or auto-detect).
    #[arg(long, env = "MD2PDF_CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Disable the browser sandbox (needed as root in most containers).
    #[arg(long, env = "MD2PDF_NO_SANDBOX")]
    no_sandbox: bool,

    /// Per-document render timeout in seconds.
    #[arg(long, env = "MD2PDF_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "MD2PDF_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Number of documents rendered at once.
    #[arg(short, long, env = "MD2PDF_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Print a JSON report (BatchOutput) on stdout.
    #[arg(long, env = "MD2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// List presets and code themes, then exit.
    #[arg(long)]
    list_themes: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.list_themes {
        println!("Presets:");
        for preset in StylePreset::ALL {
            println!("  {preset}");
        }
        println!("\nCode themes:");
        for theme in highlight::available_themes() {
            println!("  {theme}");
        }
        return Ok(());
    }

    // The progress bar only makes sense for PDFs written to files.
    let to_stdout = writes_to_stdout(&cli);
    let progress_cb: Option<ProgressCallback> = if show_progress && !to_stdout && !cli.html {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    if cli.html {
        return write_html(&cli, &config).await;
    }

    // ── Single document to stdout ────────────────────────────────────────
    if to_stdout {
        if cli.inputs.len() != 1 {
            bail!("Only one input can be written to stdout");
        }
        if cli.json {
            bail!("--json cannot be combined with a PDF on stdout");
        }
        let output = convert(&cli.inputs[0], &config)
            .await
            .context("Conversion failed")?;
        io::stdout()
            .lock()
            .write_all(&output.pdf)
            .context("Failed to write to stdout")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} bytes  {}ms",
                green("✔"),
                output.stats.pdf_bytes,
                output.stats.total_duration_ms
            );
        }
        return Ok(());
    }

    // ── Files ────────────────────────────────────────────────────────────
    let jobs = plan_jobs(&cli.inputs, cli.output.as_deref(), "pdf");
    let batch = convert_batch(jobs, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&batch).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        for doc in &batch.documents {
            match (&doc.stats, &doc.error) {
                (Some(stats), _) => eprintln!(
                    "{}  {}  →  {}  {}",
                    green("✔"),
                    doc.input,
                    bold(&doc.output.display().to_string()),
                    dim(&format!("{} bytes, {}ms", stats.pdf_bytes, stats.total_duration_ms)),
                ),
                (None, Some(err)) if !show_progress => eprintln!("{}  {}", red("✗"), err),
                _ => {}
            }
        }
    }

    let failed = batch.stats.failed;
    let total = batch.stats.total_documents;
    batch
        .into_result()
        .with_context(|| format!("{failed} of {total} documents failed"))?;
    Ok(())
}

fn writes_to_stdout(cli: &Cli) -> bool {
    match cli.output.as_deref() {
        Some(p) => p == Path::new("-"),
        None => cli.inputs.len() == 1 && cli.inputs[0] == "-",
    }
}

/// Pair each input with its output path.
///
/// One input: `-o` is the file itself, unless it names a directory.
/// Several inputs: `-o` is a directory. Inputs sharing a file stem get
/// distinct outputs.
fn plan_jobs(inputs: &[String], output: Option<&Path>, extension: &str) -> Vec<BatchJob> {
    if let ([single], Some(path)) = (inputs, output) {
        let is_dir = path.is_dir() || path.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR);
        if !is_dir {
            return vec![BatchJob::new(single.clone(), path)];
        }
    }
    let mut jobs: Vec<BatchJob> = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let mut job = BatchJob::with_default_output(input.clone(), output, i + 1);
            job.output.set_extension(extension);
            job
        })
        .collect();
    disambiguate_outputs(&mut jobs);
    jobs
}

/// `--html`: write the composed HTML document for each input.
async fn write_html(cli: &Cli, config: &RenderConfig) -> Result<()> {
    let to_stdout = writes_to_stdout(cli);
    for job in plan_jobs(&cli.inputs, cli.output.as_deref(), "html") {
        let text = input::read_input(&job.input, config.download_timeout_secs)
            .await
            .with_context(|| format!("Failed to read {}", job.input))?;
        let html = render_html(&text, config)?;
        if to_stdout {
            io::stdout()
                .lock()
                .write_all(html.as_bytes())
                .context("Failed to write to stdout")?;
        } else {
            if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(&job.output, html)
                .await
                .with_context(|| format!("Failed to write {}", job.output.display()))?;
            if !cli.quiet {
                eprintln!("{}  {}", green("✔"), bold(&job.output.display().to_string()));
            }
        }
    }
    Ok(())
}

/// Resolve the style: preset, then style file, then individual flags.
fn build_style(cli: &Cli) -> Result<StyleConfig> {
    let mut style = match cli.style_file {
        Some(ref path) => StyleConfig::from_json_file(path)
            .with_context(|| format!("Failed to load style file {}", path.display()))?,
        None => cli.preset.style(),
    };

    if let Some(size) = cli.page_size {
        style.page_size = size;
    }
    if cli.landscape {
        style.landscape = true;
    }
    if let Some(margin) = cli.margin {
        style.margin = margin;
    }
    if let Some(ref family) = cli.font_family {
        style.font_family = family.clone();
    }
    if let Some(ref theme) = cli.code_theme {
        style.code_theme = Some(theme.clone());
    }
    Ok(style)
}

/// Map CLI args to `RenderConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RenderConfig> {
    let mut builder = RenderConfig::builder()
        .style(build_style(cli)?)
        .front_matter(cli.front_matter)
        .highlight(!cli.no_highlight)
        .raw_html(!cli.escape_html)
        .page_numbers(cli.page_numbers)
        .render_timeout_secs(cli.timeout)
        .download_timeout_secs(cli.download_timeout)
        .concurrency(cli.concurrency)
        .sandbox(!cli.no_sandbox);

    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(ref path) = cli.chrome_path {
        builder = builder.chrome_path(path.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
