//! Docling OCR client.
//!
//! Uploads a document to a Docling conversion service and returns its text.
//! Small files go through the synchronous endpoint; large ones are submitted
//! as async jobs and polled to completion.
//!
//! ```no_run
//! use std::sync::Arc;
//! use docling_ocr::{DoclingOcr, DoclingOcrConfig, EnvSecretLoader, OcrContext, SourceFile};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let ocr = DoclingOcr::new(DoclingOcrConfig::from_env(None)?)?;
//! let ctx = OcrContext {
//!     user_id: None,
//!     file: SourceFile {
//!         path: "scan.pdf".into(),
//!         name: "scan.pdf".into(),
//!         size: std::fs::metadata("scan.pdf")?.len(),
//!         mime_type: Some("application/pdf".into()),
//!     },
//!     secrets: Arc::new(EnvSecretLoader),
//! };
//! let result = ocr.upload_ocr(&ctx).await?;
//! println!("{}", result.text);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod ocr;

pub use auth::{AuthConfig, EnvSecretLoader, SecretLoader};
pub use config::{DoclingOcrConfig, OcrOptions, OcrSettings, OutputFormat};
pub use error::{ConfigError, DoclingError, OcrError};
pub use ocr::docling::DoclingOcr;
pub use ocr::{OcrContext, OcrUploadHandler, SourceFile, UploadResult};
