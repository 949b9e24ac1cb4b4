//! Input resolution: turn a user-supplied path or URL into PDF bytes.
//!
//! Both extractors read from memory, so a URL is downloaded straight into a
//! buffer and a local file is read whole. The `%PDF` magic bytes are checked
//! before returning so a mislabelled upload fails here with a clear message
//! rather than deep inside an extractor.

use crate::error::McqError;
use std::path::PathBuf;
use tracing::{debug, info};

/// PDF bytes plus a display name for log and error messages.
#[derive(Debug, Clone)]
pub struct PdfInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<PdfInput, McqError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Wrap in-memory bytes, validating the magic.
pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<PdfInput, McqError> {
    let name = name.into();
    check_magic(&name, &bytes)?;
    Ok(PdfInput { name, bytes })
}

async fn read_local(path_str: &str) -> Result<PdfInput, McqError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(McqError::PermissionDenied { path });
        }
        Err(_) => return Err(McqError::FileNotFound { path }),
    };

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    from_bytes(path.display().to_string(), bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<PdfInput, McqError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| McqError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            McqError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            McqError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(McqError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| McqError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    from_bytes(url, bytes.to_vec())
}

fn check_magic(name: &str, bytes: &[u8]) -> Result<(), McqError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(McqError::NotAPdf {
            source_name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/brief.pdf"));
        assert!(is_url("http://example.com/brief.pdf"));
        assert!(!is_url("/tmp/brief.pdf"));
        assert!(!is_url("brief.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn from_bytes_accepts_pdf_magic() {
        let input = from_bytes("mem", b"%PDF-1.7\n...".to_vec()).unwrap();
        assert_eq!(input.name, "mem");
    }

    #[test]
    fn from_bytes_rejects_other_files() {
        let err = from_bytes("notes.txt", b"hello world".to_vec()).unwrap_err();
        match err {
            McqError::NotAPdf { source_name, magic } => {
                assert_eq!(source_name, "notes.txt");
                assert_eq!(magic, b"hell".to_vec());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_bytes_rejects_short_input() {
        assert!(matches!(
            from_bytes("tiny", b"%P".to_vec()),
            Err(McqError::NotAPdf { .. })
        ));
    }

    #[tokio::test]
    async fn missing_local_file() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, McqError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.pdf");
        std::fs::write(&path, b"%PDF-1.4 fake").unwrap();
        let input = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(input.bytes, b"%PDF-1.4 fake");
    }
}
