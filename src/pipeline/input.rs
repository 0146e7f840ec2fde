//! Input resolution: turn a user-supplied path, URL or `-` into Markdown text.
//!
//! Markdown is small, so everything is read fully into memory; there is no
//! temp-file staging on the input side. Bytes must be UTF-8: a bad byte is
//! reported with its offset rather than silently replaced.

use crate::error::Md2PdfError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Where a document's Markdown comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// `-`: read standard input to EOF.
    Stdin,
    Local(PathBuf),
    Url(String),
}

impl InputSource {
    /// Classify a command-line style input string.
    pub fn parse(input: &str) -> Result<Self, Md2PdfError> {
        if input.is_empty() {
            return Err(Md2PdfError::InvalidInput {
                input: input.to_string(),
            });
        }
        if input == "-" {
            return Ok(InputSource::Stdin);
        }
        if is_url(input) {
            reqwest::Url::parse(input).map_err(|_| Md2PdfError::InvalidInput {
                input: input.to_string(),
            })?;
            return Ok(InputSource::Url(input.to_string()));
        }
        Ok(InputSource::Local(PathBuf::from(input)))
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read the Markdown text behind `input`.
pub async fn read_input(input: &str, timeout_secs: u64) -> Result<String, Md2PdfError> {
    match InputSource::parse(input)? {
        InputSource::Stdin => read_stdin().await,
        InputSource::Local(path) => read_local(&path).await,
        InputSource::Url(url) => download_url(&url, timeout_secs).await,
    }
}

async fn read_stdin() -> Result<String, Md2PdfError> {
    let mut bytes = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| Md2PdfError::Internal(format!("Failed to read stdin: {e}")))?;
    debug!("Read {} bytes from stdin", bytes.len());
    decode_utf8("<stdin>", bytes)
}

async fn read_local(path: &Path) -> Result<String, Md2PdfError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Md2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Md2PdfError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    decode_utf8(&path.display().to_string(), bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<String, Md2PdfError> {
    info!("Downloading Markdown from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Md2PdfError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            Md2PdfError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Md2PdfError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(classify)?;
    if !response.status().is_success() {
        return Err(Md2PdfError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(classify)?;
    info!("Downloaded {} bytes", bytes.len());
    decode_utf8(url, bytes.to_vec())
}

/// Decode `bytes` as UTF-8, reporting the first invalid offset.
pub fn decode_utf8(input: &str, bytes: Vec<u8>) -> Result<String, Md2PdfError> {
    String::from_utf8(bytes).map_err(|e| Md2PdfError::NotUtf8 {
        input: input.to_string(),
        offset: e.utf8_error().valid_up_to(),
    })
}

/// Default PDF path for an input: same stem, `.pdf` extension.
///
/// Local files land next to the source unless `out_dir` is given. URLs and
/// stdin have no natural location, so they use the last path segment (or
/// `document-<index>`) inside `out_dir` or the working directory.
pub fn output_path_for(input: &str, out_dir: Option<&Path>, index: usize) -> PathBuf {
    let fallback = || format!("document-{index}");
    let (dir, stem) = match InputSource::parse(input) {
        Ok(InputSource::Local(path)) => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(fallback);
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (dir, stem)
        }
        Ok(InputSource::Url(url)) => {
            let stem = reqwest::Url::parse(&url)
                .ok()
                .and_then(|u| {
                    u.path_segments()
                        .and_then(|mut s| s.next_back().map(str::to_string))
                })
                .filter(|last| !last.is_empty())
                .map(|last| {
                    Path::new(&last)
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or(last)
                })
                .unwrap_or_else(fallback);
            (PathBuf::new(), stem)
        }
        _ => (PathBuf::new(), fallback()),
    };
    out_dir
        .map(Path::to_path_buf)
        .unwrap_or(dir)
        .join(format!("{stem}.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.md"));
        assert!(is_url("http://example.com/doc.md"));
        assert!(!is_url("/tmp/doc.md"));
        assert!(!is_url("doc.md"));
        assert!(!is_url(""));
    }

    #[test]
    fn classify_inputs() {
        assert_eq!(InputSource::parse("-").unwrap(), InputSource::Stdin);
        assert_eq!(
            InputSource::parse("notes.md").unwrap(),
            InputSource::Local(PathBuf::from("notes.md"))
        );
        assert!(matches!(
            InputSource::parse("https://example.com/a.md").unwrap(),
            InputSource::Url(_)
        ));
        assert!(matches!(
            InputSource::parse(""),
            Err(Md2PdfError::InvalidInput { .. })
        ));
        assert!(matches!(
            InputSource::parse("http://"),
            Err(Md2PdfError::InvalidInput { .. })
        ));
    }

    #[test]
    fn decode_reports_offset() {
        let err = decode_utf8("x.md", vec![b'a', b'b', 0xff, b'c']).unwrap_err();
        match err {
            Md2PdfError::NotUtf8 { input, offset } => {
                assert_eq!(input, "x.md");
                assert_eq!(offset, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(decode_utf8("x", "é".as_bytes().to_vec()).unwrap(), "é");
    }

    #[tokio::test]
    async fn reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"# Hello\n").unwrap();
        let text = read_input(file.path().to_str().unwrap(), 5).await.unwrap();
        assert_eq!(text, "# Hello\n");
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = tokio_test::block_on(read_input("/definitely/not/here.md", 5)).unwrap_err();
        assert!(matches!(err, Md2PdfError::FileNotFound { .. }));
    }

    #[test]
    fn output_paths() {
        assert_eq!(
            output_path_for("docs/guide.md", None, 1),
            PathBuf::from("docs/guide.pdf")
        );
        assert_eq!(
            output_path_for("docs/guide.md", Some(Path::new("out")), 1),
            PathBuf::from("out/guide.pdf")
        );
        assert_eq!(
            output_path_for("https://example.com/raw/README.md", None, 2),
            PathBuf::from("README.pdf")
        );
        assert_eq!(
            output_path_for("https://example.com/", Some(Path::new("out")), 3),
            PathBuf::from("out/document-3.pdf")
        );
        assert_eq!(output_path_for("-", None, 4), PathBuf::from("document-4.pdf"));
    }
}
