//! Pick one text payload out of a multi-format Docling document.

use crate::config::OutputFormat;
use crate::ocr::types::ConversionDocument;

/// Text plus images extracted from a converted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    /// Always empty: this API surface returns no extractable images.
    pub images: Vec<String>,
}

/// Select the content field matching `format`. Empty fields are not substituted.
pub fn normalize(document: &ConversionDocument, format: OutputFormat) -> NormalizedText {
    let text = match format {
        OutputFormat::Markdown => document.md_content.clone(),
        OutputFormat::Html => document.html_content.clone(),
        OutputFormat::Text => document.text_content.clone(),
        OutputFormat::Json => document
            .json_content
            .as_ref()
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::to_string_pretty(v).ok()),
    };

    NormalizedText {
        text: text.unwrap_or_default(),
        images: Vec::new(),
    }
}

/// Size estimate reported with an upload: four bytes per UTF-16 code unit.
///
/// Not an exact byte count; consumers depend on this exact heuristic.
pub fn estimated_bytes(text: &str) -> u64 {
    text.encode_utf16().count() as u64 * 4
}
