//! Verified retrieval of remote resources.
//!
//! A [`RetrievalRequest`] downloads a resource while checking the declared
//! content type and length against the expected ones, then the observed
//! length and secure hash once the body has been streamed. Checks whose
//! expectation is unknown are skipped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use apptrack_schema::{HashAlgorithm, SecureHash};
use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::hashing::StreamingHasher;
use crate::paths::filename_from_url;

/// Bytes written (and hashed) per step, the progress callback runs after each.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Content type reported when the server declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Unexpected content type: '{actual}' received vs. '{expected}' waited")]
    ContentType { expected: String, actual: String },

    #[error("Unexpected content length: {actual} received vs. {expected} waited")]
    ContentLength { expected: u64, actual: u64 },

    #[error("Unexpected content: '{actual}' received vs. '{expected}' waited")]
    Content { expected: String, actual: String },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Retrieval aborted after {0:?}")]
    Timeout(Duration),
}

/// What was observed while retrieving a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieved {
    /// Final URL, after redirections.
    pub url: String,
    /// Declared content type, or [`DEFAULT_CONTENT_TYPE`].
    pub content_type: String,
    /// Number of bytes received.
    pub length: u64,
    /// Secure hash of the received bytes.
    pub hash: SecureHash,
    /// Remote file name, from `Content-Disposition` or the URL.
    pub file_name: String,
}

type ProgressFn<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// Request for a verified retrieval.
pub struct RetrievalRequest<'a> {
    client: &'a Client,
    url: &'a str,
    expected_type: Option<String>,
    expected_length: Option<u64>,
    expected_hash: Option<SecureHash>,
    progress: Option<ProgressFn<'a>>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for RetrievalRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalRequest")
            .field("url", &self.url)
            .field("expected_type", &self.expected_type)
            .field("expected_length", &self.expected_length)
            .field("expected_hash", &self.expected_hash)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<'a> RetrievalRequest<'a> {
    pub fn new(client: &'a Client, url: &'a str) -> Self {
        Self {
            client,
            url,
            expected_type: None,
            expected_length: None,
            expected_hash: None,
            progress: None,
            timeout: None,
        }
    }

    /// Expected MIME type. An empty string disables the check.
    pub fn expect_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.expected_type = (!content_type.is_empty()).then_some(content_type);
        self
    }

    /// Expected length in bytes. `None` disables the check.
    pub fn expect_length(mut self, length: Option<u64>) -> Self {
        self.expected_length = length;
        self
    }

    /// Expected secure hash. `None` disables the check.
    pub fn expect_hash(mut self, hash: Option<SecureHash>) -> Self {
        self.expected_hash = hash;
        self
    }

    /// Progress callback, called with the bytes received so far and the
    /// expected total.
    pub fn with_progress(mut self, progress: ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Abort the retrieval if it takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retrieve the resource into `dest`.
    ///
    /// On error, `dest` may have received part of the body.
    pub async fn retrieve<W>(&self, dest: &mut W) -> Result<Retrieved, RetrievalError>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.stream_to(dest))
                .await
                .map_err(|_| RetrievalError::Timeout(limit))?,
            None => self.stream_to(dest).await,
        }
    }

    /// Retrieve the resource into a file of `dir`.
    ///
    /// The body is written to a `.partial` temporary file which is renamed to
    /// `name(&retrieved)` once every check has passed. The temporary file is
    /// removed on any failure.
    pub async fn retrieve_into<F>(
        &self,
        dir: &Path,
        name: F,
    ) -> Result<(PathBuf, Retrieved), RetrievalError>
    where
        F: FnOnce(&Retrieved) -> String + Send,
    {
        tokio::fs::create_dir_all(dir).await?;
        let partial = tempfile::Builder::new()
            .prefix(".apptrack-")
            .suffix(".partial")
            .tempfile_in(dir)?;
        debug!("Retrieving {} to {}", self.url, partial.path().display());

        let mut file = tokio::fs::File::from_std(partial.as_file().try_clone()?);
        let retrieved = self.retrieve(&mut file).await?;
        file.sync_all().await?;
        drop(file);

        let path = dir.join(name(&retrieved));
        partial.persist(&path).map_err(|e| RetrievalError::Io(e.error))?;
        Ok((path, retrieved))
    }

    async fn stream_to<W>(&self, dest: &mut W) -> Result<Retrieved, RetrievalError>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let mut hasher = StreamingHasher::new(self.hash_algorithm());

        let response = self
            .client
            .get(self.url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .await?
            .error_for_status()?;

        let url = response.url().to_string();
        let headers = response.headers();
        let declared_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let file_name = headers
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| filename_from_url(&url).to_string());
        let declared_length = response.content_length();

        self.check_type(declared_type.as_deref())?;
        if let (Some(expected), Some(actual)) = (self.expected_length, declared_length) {
            if expected != actual {
                return Err(RetrievalError::ContentLength { expected, actual });
            }
        }
        let total = self.expected_length.or(declared_length);

        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for piece in chunk.chunks(CHUNK_SIZE) {
                dest.write_all(piece).await?;
                hasher.update(piece);
                received += piece.len() as u64;
                if let Some(progress) = self.progress {
                    progress(received, total);
                }
            }
        }
        dest.flush().await?;

        for expected in [declared_length, self.expected_length].into_iter().flatten() {
            if expected != received {
                return Err(RetrievalError::ContentLength {
                    expected,
                    actual: received,
                });
            }
        }

        let hash = hasher.finalize();
        if let Some(expected) = &self.expected_hash {
            if expected.supported_algorithm().is_some() && !expected.matches_digest(hash.digest()) {
                return Err(RetrievalError::Content {
                    expected: expected.digest().to_string(),
                    actual: hash.digest().to_string(),
                });
            }
        }

        Ok(Retrieved {
            url,
            content_type: declared_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            length: received,
            hash,
            file_name,
        })
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        match &self.expected_hash {
            Some(expected) => expected.supported_algorithm().unwrap_or_else(|| {
                warn!(
                    "Unsupported hash algorithm '{}', secure hash control ignored",
                    expected.algorithm()
                );
                HashAlgorithm::default()
            }),
            None => HashAlgorithm::default(),
        }
    }

    fn check_type(&self, declared: Option<&str>) -> Result<(), RetrievalError> {
        let Some(expected) = &self.expected_type else {
            return Ok(());
        };
        match declared {
            None => {
                warn!("Content-Type header does not exist, content type control ignored");
                Ok(())
            }
            Some(actual) if same_media_type(expected, actual) => Ok(()),
            Some(actual) => Err(RetrievalError::ContentType {
                expected: expected.clone(),
                actual: actual.to_string(),
            }),
        }
    }
}

/// Compare two MIME types, ignoring parameters such as `charset`.
fn same_media_type(expected: &str, actual: &str) -> bool {
    let essence = |s: &str| s.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    essence(expected) == essence(actual)
}

/// File name of an `attachment` disposition, stripped of any path.
fn filename_from_disposition(header: &str) -> Option<String> {
    let (kind, params) = header.split_once(';')?;
    if !kind.trim().eq_ignore_ascii_case("attachment") {
        debug!("Content-Disposition type '{}' is ignored", kind.trim());
        return None;
    }
    params.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        let base = value.rsplit(['/', '\\']).next().unwrap_or("");
        (!base.is_empty()).then(|| base.to_string())
    })
}
