//! Error types for the Docling OCR client.
//!
//! [`DoclingError`] classifies what went wrong inside one upload (credential,
//! transport, job failure, timeout, empty result, upstream HTTP status).
//! [`OcrError`] is what callers see: every `DoclingError` is wrapped exactly
//! once at the orchestrator boundary into a single human-readable message.

use std::path::PathBuf;
use thiserror::Error;

/// Prefix used for every user-facing upload failure.
pub const UPLOAD_ERROR_BASE: &str = "Error uploading document to Docling OCR API:";

/// Failure kinds raised while talking to the Docling service.
#[derive(Debug, Error)]
pub enum DoclingError {
    /// Resolved API key was empty. Raised before any network call.
    #[error("Docling API key is required")]
    MissingCredential,

    /// Network-level failure: connect, DNS, timeout, or an unreadable body.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service reported the conversion job as failed.
    #[error("OCR processing failed: {message}")]
    ServiceJobFailed { message: String },

    /// Attempt budget exhausted while the job was still pending.
    #[error("OCR processing timed out after {attempts} status checks")]
    PollingTimedOut { attempts: u32 },

    /// The service answered but supplied no document.
    #[error("No OCR result returned from Docling service, may be down or the file is not supported.")]
    EmptyResult,

    /// Non-2xx response from the service.
    #[error("Docling API error ({status}): {}", upstream_summary(.detail, .message))]
    UpstreamHttp {
        status: u16,
        detail: Option<String>,
        message: Option<String>,
    },

    /// The source file could not be opened for streaming.
    #[error("Failed to read source file {path:?}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A 2xx body that is not the documented JSON shape.
    #[error("{context}: {source}")]
    InvalidResponse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

fn upstream_summary<'a>(detail: &'a Option<String>, message: &'a Option<String>) -> &'a str {
    detail
        .as_deref()
        .or(message.as_deref())
        .unwrap_or("no detail")
}

impl DoclingError {
    /// Whether a status poll that failed this way may be retried.
    ///
    /// Network trouble, request timeouts (408), rate limiting (429) and
    /// server-side (5xx) responses qualify; a job reported as failed is
    /// authoritative.
    pub fn is_transient(&self) -> bool {
        match self {
            DoclingError::Transport { .. } => true,
            DoclingError::UpstreamHttp { status, .. } => {
                matches!(*status, 408 | 429) || *status >= 500
            }
            _ => false,
        }
    }
}

/// The single error returned by [`crate::ocr::docling::DoclingOcr::upload_ocr`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OcrError {
    message: String,
    #[source]
    source: DoclingError,
}

impl OcrError {
    /// The combined, user-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The failure kind this error was built from.
    pub fn kind(&self) -> &DoclingError {
        &self.source
    }
}

impl From<DoclingError> for OcrError {
    fn from(source: DoclingError) -> Self {
        let message = match &source {
            DoclingError::UpstreamHttp {
                status,
                detail,
                message,
            } => {
                let head = detail.as_deref().unwrap_or(UPLOAD_ERROR_BASE);
                let mut line = format!("{head} (HTTP {status})");
                if let Some(extra) = message.as_deref().filter(|m| Some(*m) != detail.as_deref()) {
                    line.push_str(" - ");
                    line.push_str(extra);
                }
                line
            }
            other => format!("{UPLOAD_ERROR_BASE} {other}"),
        };
        Self { message, source }
    }
}

/// Invalid deployment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Unsupported output format '{0}' (expected one of: md, markdown, html, text, json)")]
    UnsupportedOutputFormat(String),
}
