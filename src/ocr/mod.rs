//! Docling OCR upload pipeline.
//!
//! An upload flows through [`request`] (endpoint + multipart body),
//! [`client`] (HTTP), [`poller`] (async jobs only) and [`normalize`]
//! (format selection). [`docling::DoclingOcr`] ties the stages together and
//! is exposed to hosts through the [`OcrUploadHandler`] trait.

pub mod client;
pub mod docling;
pub mod normalize;
pub mod poller;
pub mod request;
pub mod types;

use crate::auth::SecretLoader;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Identifier stamped into [`UploadResult::filepath`].
pub const DOCLING_OCR_SOURCE: &str = "docling_ocr";

/// A document on local disk, ready to be streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Original filename, sent as the multipart filename.
    pub name: String,
    /// Declared size in bytes; picks sync vs async.
    pub size: u64,
    pub mime_type: Option<String>,
}

/// Everything one upload needs from its caller.
#[derive(Clone)]
pub struct OcrContext {
    pub user_id: Option<String>,
    pub file: SourceFile,
    pub secrets: Arc<dyn SecretLoader>,
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// Original filename of the source document.
    pub filename: String,
    /// Four bytes per UTF-16 unit of `text`.
    pub bytes: u64,
    /// Always [`DOCLING_OCR_SOURCE`].
    pub filepath: String,
    pub text: String,
    pub images: Vec<String>,
}

/// A backend that can turn an uploaded file into text.
#[async_trait::async_trait]
pub trait OcrUploadHandler: Send + Sync {
    fn name(&self) -> &str;
    async fn handle_file_upload(&self, ctx: &OcrContext) -> anyhow::Result<UploadResult>;
}
