// src/pipeline/content_type.rs

//! Media type sniffing from the artifact's leading bytes.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncReadExt;

/// How many leading bytes are inspected.
pub const SNIFF_LEN: usize = 3072;

pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Error)]
#[error("reading {path:?} for content type detection: {source}")]
pub struct DetectionError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Detect the media type of the file at `path`.
///
/// The extension is ignored. Binary signatures come from `infer`; without
/// one, UTF-8 text is `text/plain; charset=utf-8` and the rest is
/// `application/octet-stream`.
pub async fn detect_content_type(path: &Path) -> Result<String, DetectionError> {
    let wrap = |source| DetectionError {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(wrap)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await
        .map_err(wrap)?;

    Ok(sniff(&head).to_string())
}

/// Classify a buffer holding the first bytes of a file.
pub fn sniff(head: &[u8]) -> &'static str {
    if let Some(kind) = infer::get(head) {
        return kind.mime_type();
    }
    if looks_like_utf8_text(head) {
        TEXT_PLAIN_UTF8
    } else {
        OCTET_STREAM
    }
}

fn looks_like_utf8_text(head: &[u8]) -> bool {
    match std::str::from_utf8(head) {
        Ok(text) => !text.contains('\0'),
        // A multi-byte character cut off by the read limit is still text.
        Err(e) if e.error_len().is_none() => {
            let valid = &head[..e.valid_up_to()];
            !valid.contains(&0) && head.len() == SNIFF_LEN
        }
        Err(_) => false,
    }
}
