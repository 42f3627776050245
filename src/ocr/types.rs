//! Docling API request/response types.

use serde::{Deserialize, Serialize};

/// Multi-format document returned by a conversion. Fields may be absent or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionDocument {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub md_content: Option<String>,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub json_content: Option<serde_json::Value>,
}

/// Lifecycle state reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Started,
    Completed,
    Failed,
    /// Any state string this client does not know; treated as still running.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Envelope around a [`ConversionDocument`] (sync response, async `result`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionResponse {
    #[serde(default)]
    pub document: Option<ConversionDocument>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    #[serde(default)]
    pub processing_time: Option<f64>,
}

/// Body of `POST /v1alpha/convert/file/async`.
#[derive(Debug, Clone, Deserialize)]
pub struct AsyncSubmission {
    pub task_id: String,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One snapshot of an async job, from `GET /v1alpha/status/poll/{task_id}`.
///
/// Every poll yields a fresh value; snapshots are never mutated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversionJob {
    pub task_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /v1alpha/result/{task_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub result: Option<ConversionResponse>,
}

/// Error body for non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// A string, or a FastAPI validation list.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorInfo {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorBody {
    /// `detail` rendered as text.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// `message`, falling back to `error.message`.
    pub fn message_text(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.error.as_ref().and_then(|e| e.message.clone()))
            .filter(|m| !m.is_empty())
    }
}
