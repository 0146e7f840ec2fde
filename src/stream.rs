//! Streaming batch API: emit documents as they complete.
//!
//! ## Why stream?
//!
//! Each document costs a browser launch, so a directory of notes takes a
//! while. A stream lets callers report each finished PDF immediately or
//! stop early, instead of waiting for the slowest document.
//!
//! Results arrive in completion order; sort by `index` if order matters
//! ([`crate::convert::convert_batch`] does this for you).

use crate::config::RenderConfig;
use crate::convert::{render_async, write_atomic};
use crate::error::{DocumentError, Md2PdfError};
use crate::output::{DocumentResult, RenderStats};
use crate::pipeline::input;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of per-document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentResult> + Send>>;

/// One document to convert: where to read it and where to write the PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    /// Path, URL or `-`.
    pub input: String,
    pub output: PathBuf,
}

impl BatchJob {
    pub fn new(input: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Job writing next to the input (or into `out_dir`) with a `.pdf` extension.
    pub fn with_default_output(
        input: impl Into<String>,
        out_dir: Option<&Path>,
        index: usize,
    ) -> Self {
        let input = input.into();
        let output = input::output_path_for(&input, out_dir, index);
        Self { input, output }
    }
}

/// Rename outputs that collide with an earlier job's, so no two jobs of a
/// batch write the same file.
///
/// The first job keeps its path; later ones get `-<index>` appended to the
/// file stem (`notes.pdf`, `notes-2.pdf`, ...), where `index` is the job's
/// 1-based position.
pub fn disambiguate_outputs(jobs: &mut [BatchJob]) {
    let mut taken: HashSet<PathBuf> = HashSet::with_capacity(jobs.len());
    for (i, job) in jobs.iter_mut().enumerate() {
        if taken.insert(job.output.clone()) {
            continue;
        }
        let stem = job
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let ext = job
            .output
            .extension()
            .map(|e| e.to_string_lossy().into_owned());
        let mut n = i + 1;
        loop {
            let name = match ext {
                Some(ref ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            let candidate = job.output.with_file_name(name);
            if taken.insert(candidate.clone()) {
                warn!(
                    "{} would overwrite {}; writing {} instead",
                    job.input,
                    job.output.display(),
                    candidate.display()
                );
                job.output = candidate;
                break;
            }
            n += 1;
        }
    }
}

/// Convert many documents, yielding each result as soon as it is written.
///
/// Up to `config.concurrency` documents are in flight at once. Per-document
/// failures become [`DocumentResult::error`]; the stream itself never fails.
/// Jobs sharing an output path are renamed with [`disambiguate_outputs`].
/// Progress callbacks fire for every document, and `on_batch_complete` fires
/// once the last result has been produced.
pub fn convert_stream(mut jobs: Vec<BatchJob>, config: &RenderConfig) -> DocumentStream {
    disambiguate_outputs(&mut jobs);
    let total = jobs.len();
    info!("Starting batch conversion of {} documents", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
        if total == 0 {
            cb.on_batch_complete(0, 0);
        }
    }

    let concurrency = config.concurrency.max(1);
    let config_clone = config.clone();
    let results = stream::iter(jobs.into_iter().enumerate().map(move |(i, job)| {
        let cfg = config_clone.clone();
        async move { convert_job(i + 1, total, job, &cfg).await }
    }))
    .buffer_unordered(concurrency);

    let callback = config.progress_callback.clone();
    let mut succeeded = 0usize;
    let mut seen = 0usize;
    let s = results.inspect(move |result| {
        seen += 1;
        if result.is_success() {
            succeeded += 1;
        }
        if seen == total {
            if let Some(ref cb) = callback {
                cb.on_batch_complete(total, succeeded);
            }
        }
    });

    Box::pin(s)
}

async fn convert_job(
    index: usize,
    total: usize,
    job: BatchJob,
    config: &RenderConfig,
) -> DocumentResult {
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(index, total, &job.input);
    }

    let outcome = run_job(&job, config).await;

    match outcome {
        Ok(stats) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_complete(index, total, stats.pdf_bytes);
            }
            DocumentResult {
                index,
                input: job.input,
                output: job.output,
                stats: Some(stats),
                error: None,
            }
        }
        Err(e) => {
            warn!("Document {}/{} ({}) failed: {}", index, total, job.input, e);
            let error = DocumentError::from_fatal(&job.input, &e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(index, total, &error.to_string());
            }
            DocumentResult {
                index,
                input: job.input,
                output: job.output,
                stats: None,
                error: Some(error),
            }
        }
    }
}

async fn run_job(job: &BatchJob, config: &RenderConfig) -> Result<RenderStats, Md2PdfError> {
    let text = input::read_input(&job.input, config.download_timeout_secs).await?;
    let output = render_async(text, config).await?;
    write_atomic(&job.output, &output.pdf).await?;
    Ok(output.stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::engine::testing::StubEngine;
    use crate::pipeline::engine::{PageSetup, PdfEngine};
    use crate::progress::ConversionProgressCallback;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct Counting {
        started: AtomicUsize,
        completed: AtomicUsize,
        errors: AtomicUsize,
        batch_success: AtomicUsize,
    }

    impl ConversionProgressCallback for Counting {
        fn on_document_start(&self, _index: usize, _total: usize, _input: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_document_complete(&self, _index: usize, _total: usize, _pdf_bytes: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_document_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_batch_complete(&self, _total: usize, success_count: usize) {
            self.batch_success.store(success_count, Ordering::SeqCst);
        }
    }

    /// Outlasts a one-second render timeout.
    struct SlowEngine;

    impl PdfEngine for SlowEngine {
        fn name(&self) -> &str {
            "slow"
        }
        fn render_pdf(&self, _html: &str, _page: &PageSetup) -> Result<Vec<u8>, Md2PdfError> {
            std::thread::sleep(Duration::from_millis(2500));
            Ok(b"%PDF-1.7\n".to_vec())
        }
    }

    #[tokio::test]
    async fn stream_yields_every_document_and_fires_callbacks() {
        let dir = tempfile::tempdir().unwrap();
        let mut jobs = Vec::new();
        for name in ["a", "b", "c"] {
            let src = dir.path().join(format!("{name}.md"));
            tokio::fs::write(&src, format!("# {name}\n")).await.unwrap();
            jobs.push(BatchJob::with_default_output(src.to_str().unwrap(), None, 0));
        }
        jobs.push(BatchJob::new("/nope/missing.md", dir.path().join("missing.pdf")));

        let counter = Arc::new(Counting::default());
        let config = RenderConfig::builder()
            .engine(Arc::new(StubEngine::default()))
            .concurrency(2)
            .progress_callback(Arc::clone(&counter) as Arc<dyn ConversionProgressCallback>)
            .build()
            .unwrap();

        let results: Vec<DocumentResult> = convert_stream(jobs, &config).collect().await;
        assert_eq!(results.len(), 4);
        assert_eq!(results.iter().filter(|r| r.is_success()).count(), 3);
        assert!(dir.path().join("a.pdf").exists());
        assert!(dir.path().join("c.pdf").exists());

        assert_eq!(counter.started.load(Ordering::SeqCst), 4);
        assert_eq!(counter.completed.load(Ordering::SeqCst), 3);
        assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
        assert_eq!(counter.batch_success.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn slow_engine_times_out_per_document() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("slow.md");
        tokio::fs::write(&src, "slow").await.unwrap();

        let config = RenderConfig::builder()
            .engine(Arc::new(SlowEngine))
            .render_timeout_secs(1)
            .build()
            .unwrap();

        let jobs = vec![BatchJob::new(src.to_str().unwrap(), dir.path().join("slow.pdf"))];
        let results: Vec<DocumentResult> = convert_stream(jobs, &config).collect().await;
        assert!(matches!(
            results[0].error,
            Some(DocumentError::Timeout { secs: 1, .. })
        ));
        assert!(!dir.path().join("slow.pdf").exists());
    }

    #[tokio::test]
    async fn unknown_code_theme_is_a_config_failure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("x.md");
        tokio::fs::write(&src, "```rust\nfn x() {}\n```\n").await.unwrap();

        let mut config = RenderConfig::builder()
            .engine(Arc::new(StubEngine::default()))
            .build()
            .unwrap();
        config.style.code_theme = Some("no-such-theme".into());

        let jobs = vec![BatchJob::new(src.to_str().unwrap(), dir.path().join("x.pdf"))];
        let results: Vec<DocumentResult> = convert_stream(jobs, &config).collect().await;
        assert!(
            matches!(results[0].error, Some(DocumentError::ConfigFailed { .. })),
            "got: {:?}",
            results[0].error
        );
    }

    #[tokio::test]
    async fn same_stem_inputs_keep_separate_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut jobs = Vec::new();
        for (i, (sub, body)) in [("a", "ALPHA"), ("b", "BETA, a longer body")].iter().enumerate() {
            let src_dir = dir.path().join(sub);
            tokio::fs::create_dir_all(&src_dir).await.unwrap();
            let src = src_dir.join("notes.md");
            tokio::fs::write(&src, body).await.unwrap();
            jobs.push(BatchJob::with_default_output(src.to_str().unwrap(), Some(&out), i + 1));
        }
        assert_eq!(jobs[0].output, jobs[1].output);

        let config = RenderConfig::builder()
            .engine(Arc::new(StubEngine::default()))
            .build()
            .unwrap();
        let mut results: Vec<DocumentResult> = convert_stream(jobs, &config).collect().await;
        results.sort_by_key(|r| r.index);

        assert!(results.iter().all(DocumentResult::is_success));
        assert_eq!(results[0].output, out.join("notes.pdf"));
        assert_eq!(results[1].output, out.join("notes-2.pdf"));
        let first = std::fs::read(&results[0].output).unwrap();
        let second = std::fs::read(&results[1].output).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn disambiguation_skips_names_already_taken() {
        let mut jobs = vec![
            BatchJob::new("x/notes.md", "out/notes.pdf"),
            BatchJob::new("y/notes-2.md", "out/notes-2.pdf"),
            BatchJob::new("z/notes.md", "out/notes.pdf"),
            BatchJob::new("w/other.md", "out/other.pdf"),
        ];
        disambiguate_outputs(&mut jobs);
        let outputs: Vec<_> = jobs.iter().map(|j| j.output.clone()).collect();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("out/notes.pdf"),
                PathBuf::from("out/notes-2.pdf"),
                PathBuf::from("out/notes-3.pdf"),
                PathBuf::from("out/other.pdf"),
            ]
        );
    }

    #[test]
    fn default_output_path_follows_input() {
        let job = BatchJob::with_default_output("notes/today.md", None, 1);
        assert_eq!(job.output, PathBuf::from("notes/today.pdf"));
    }
}
