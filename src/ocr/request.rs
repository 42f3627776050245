//! Endpoint selection and multipart request assembly.

use crate::config::OcrOptions;
use crate::error::DoclingError;
use crate::ocr::SourceFile;
use reqwest::multipart::{Form, Part};
use reqwest::Body;

/// Payloads at or above 5 MiB use the async endpoint.
pub const SYNC_THRESHOLD_BYTES: u64 = 5 * 1024 * 1024;

pub const SYNC_CONVERT_PATH: &str = "/v1alpha/convert/file";
pub const ASYNC_CONVERT_PATH: &str = "/v1alpha/convert/file/async";

/// Which conversion protocol a payload goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    Sync,
    Async,
}

impl ConversionMode {
    pub fn for_size(file_size: u64, threshold: u64) -> Self {
        if file_size >= threshold {
            ConversionMode::Async
        } else {
            ConversionMode::Sync
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            ConversionMode::Sync => SYNC_CONVERT_PATH,
            ConversionMode::Async => ASYNC_CONVERT_PATH,
        }
    }
}

/// Conversion URL for a payload of `file_size` bytes.
pub fn select_endpoint(file_size: u64, base_url: &str) -> String {
    select_endpoint_with_threshold(file_size, base_url, SYNC_THRESHOLD_BYTES)
}

pub fn select_endpoint_with_threshold(file_size: u64, base_url: &str, threshold: u64) -> String {
    format!(
        "{}{}",
        base_url,
        ConversionMode::for_size(file_size, threshold).path()
    )
}

pub fn status_url(base_url: &str, task_id: &str) -> String {
    format!("{}/v1alpha/status/poll/{}", base_url, task_id)
}

pub fn result_url(base_url: &str, task_id: &str) -> String {
    format!("{}/v1alpha/result/{}", base_url, task_id)
}

impl OcrOptions {
    /// Text fields sent next to the file part, in wire order.
    ///
    /// Page, table and picture images are never requested.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("do_ocr", self.do_ocr.to_string()),
            ("force_ocr", self.force_ocr.to_string()),
            ("ocr_engine", self.engine.clone()),
            ("ocr_lang", self.lang.clone()),
            ("output_format", self.output_format.as_str().to_string()),
            ("generate_page_images", false.to_string()),
            ("generate_table_images", false.to_string()),
            ("generate_picture_images", false.to_string()),
        ]
    }
}

/// Build the submission body: the file streamed under `files`, then the option fields.
pub async fn build_form(file: &SourceFile, options: &OcrOptions) -> Result<Form, DoclingError> {
    let unreadable = |e| DoclingError::FileUnreadable {
        path: file.path.clone(),
        source: e,
    };
    let handle = tokio::fs::File::open(&file.path).await.map_err(unreadable)?;
    // Declared size only picks the endpoint; the part length must match the bytes streamed.
    let length = handle.metadata().await.map_err(unreadable)?.len();

    let mut part = Part::stream_with_length(Body::from(handle), length).file_name(file.name.clone());
    if let Some(mime) = file.mime_type.as_deref().filter(|m| !m.is_empty()) {
        part = part
            .mime_str(mime)
            .map_err(|e| DoclingError::Transport {
                context: format!("Invalid MIME type '{}' for {}", mime, file.name),
                source: e,
            })?;
    }

    let form = options
        .form_fields()
        .into_iter()
        .fold(Form::new().part("files", part), |form, (name, value)| {
            form.text(name, value)
        });
    Ok(form)
}
