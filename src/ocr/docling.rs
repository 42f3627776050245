//! Docling OCR backend: the public upload entry point.

use super::normalize::{estimated_bytes, normalize};
use super::poller::{AsyncJobPoller, PollPolicy, Sleeper, TokioSleeper};
use super::request::{build_form, ConversionMode};
use super::types::{AsyncSubmission, ConversionResponse};
use super::{OcrContext, OcrUploadHandler, UploadResult, DOCLING_OCR_SOURCE};
use crate::auth::resolve_auth_config;
use crate::config::DoclingOcrConfig;
use crate::error::{DoclingError, OcrError};
use crate::ocr::client::DoclingClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub struct DoclingOcr {
    client: DoclingClient,
    config: DoclingOcrConfig,
    policy: PollPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl DoclingOcr {
    pub fn new(config: DoclingOcrConfig) -> Result<Self, DoclingError> {
        let client = DoclingClient::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: DoclingOcrConfig, client: DoclingClient) -> Self {
        Self {
            client,
            config,
            policy: PollPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &DoclingOcrConfig {
        &self.config
    }

    /// Convert `ctx.file` and return its text in the configured format.
    ///
    /// Failures are not retried here; every failure kind comes back as one
    /// [`OcrError`] carrying a combined message.
    pub async fn upload_ocr(&self, ctx: &OcrContext) -> Result<UploadResult, OcrError> {
        self.run(ctx).await.map_err(|e| {
            let err = OcrError::from(e);
            error!("Docling OCR failed for {}: {}", ctx.file.name, err);
            err
        })
    }

    async fn run(&self, ctx: &OcrContext) -> Result<UploadResult, DoclingError> {
        let auth = resolve_auth_config(
            &self.config.api_key,
            &self.config.base_url,
            ctx.user_id.as_deref(),
            ctx.secrets.as_ref(),
        )
        .await;
        if auth.api_key.is_empty() {
            return Err(DoclingError::MissingCredential);
        }

        let mode = ConversionMode::for_size(ctx.file.size, self.config.sync_threshold_bytes());
        let url = format!("{}{}", auth.base_url, mode.path());
        info!(
            "Docling OCR: submitting {} ({} bytes, {:?})",
            ctx.file.name, ctx.file.size, mode
        );

        let form = build_form(&ctx.file, &self.config.options).await?;
        let response: Option<ConversionResponse> = match mode {
            ConversionMode::Sync => self.client.post_form(&url, &auth.api_key, form).await?,
            ConversionMode::Async => {
                let submission = self
                    .client
                    .post_form::<AsyncSubmission>(&url, &auth.api_key, form)
                    .await?
                    .ok_or(DoclingError::EmptyResult)?;
                AsyncJobPoller::new(
                    &self.client,
                    &auth.base_url,
                    &auth.api_key,
                    self.policy,
                    self.sleeper.as_ref(),
                )
                .run(&submission.task_id)
                .await?
            }
        };

        let document = response
            .and_then(|r| r.document)
            .ok_or(DoclingError::EmptyResult)?;
        let normalized = normalize(&document, self.config.options.output_format);

        info!(
            "Docling OCR: {} converted ({} chars)",
            ctx.file.name,
            normalized.text.chars().count()
        );
        Ok(UploadResult {
            filename: ctx.file.name.clone(),
            bytes: estimated_bytes(&normalized.text),
            filepath: DOCLING_OCR_SOURCE.to_string(),
            text: normalized.text,
            images: normalized.images,
        })
    }
}

#[async_trait::async_trait]
impl OcrUploadHandler for DoclingOcr {
    fn name(&self) -> &str {
        DOCLING_OCR_SOURCE
    }

    async fn handle_file_upload(&self, ctx: &OcrContext) -> anyhow::Result<UploadResult> {
        Ok(self.upload_ocr(ctx).await?)
    }
}
