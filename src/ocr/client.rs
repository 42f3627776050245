//! Thin bearer-authenticated HTTP wrapper for the Docling API.
//!
//! Every call either returns the parsed 2xx body or a classified
//! [`DoclingError`]: `Transport` for network trouble, `UpstreamHttp` for
//! non-2xx responses, `InvalidResponse` for bodies of the wrong shape.

use crate::error::DoclingError;
use crate::ocr::types::ErrorBody;
use reqwest::multipart::Form;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct DoclingClient {
    client: Client,
}

impl DoclingClient {
    pub fn new(timeout: Duration) -> Result<Self, DoclingError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DoclingError::Transport {
                context: "Failed to build HTTP client".to_string(),
                source: e,
            })?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shared connection pool, custom TLS, tests).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// POST a multipart form. `Ok(None)` means the service sent no body.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        api_key: &str,
        form: Form,
    ) -> Result<Option<T>, DoclingError> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport(format!("Failed to send request to {}", url), e))?;
        read_json(url, response).await
    }

    /// GET a JSON resource. `Ok(None)` means the service sent no body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        api_key: &str,
    ) -> Result<Option<T>, DoclingError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| transport(format!("Failed to send request to {}", url), e))?;
        read_json(url, response).await
    }
}

fn transport(context: String, source: reqwest::Error) -> DoclingError {
    DoclingError::Transport { context, source }
}

async fn read_json<T: DeserializeOwned>(
    url: &str,
    response: Response,
) -> Result<Option<T>, DoclingError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| transport(format!("Failed to read response from {}", url), e))?;

    if !status.is_success() {
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body.message_text().or_else(|| {
            let raw = text.trim();
            (!raw.is_empty() && body.detail.is_none()).then(|| raw.chars().take(500).collect())
        });
        return Err(DoclingError::UpstreamHttp {
            status: status.as_u16(),
            detail: body.detail_text(),
            message,
        });
    }

    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| DoclingError::InvalidResponse {
            context: format!("Failed to parse response from {}", url),
            source: e,
        })
}
