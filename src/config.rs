//! Deployment configuration for the Docling OCR backend.
//!
//! Each option resolves as: configured value → environment variable → hard
//! default. `api_key`/`base_url` stay raw here (they may be literals,
//! `${NAME}` placeholders, or empty); [`crate::auth`] turns them into a
//! concrete [`crate::auth::AuthConfig`] per upload.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_SYNC_THRESHOLD_MB: u64 = 5;
pub const DEFAULT_OCR_ENGINE: &str = "easyocr";
pub const DEFAULT_OCR_LANG: &str = "en";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Raw settings as written in a deployment config file. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrSettings {
    #[serde(default, rename = "apiKey")]
    pub api_key: Option<String>,
    #[serde(default, rename = "baseURL")]
    pub base_url: Option<String>,
    #[serde(default, rename = "syncThresholdMB")]
    pub sync_threshold_mb: Option<u64>,
    #[serde(default, alias = "doOcr")]
    pub do_ocr: Option<bool>,
    #[serde(default, alias = "forceOcr")]
    pub force_ocr: Option<bool>,
    #[serde(default, alias = "ocrEngine")]
    pub ocr_engine: Option<String>,
    #[serde(default, alias = "ocrLang")]
    pub ocr_lang: Option<String>,
    #[serde(default, alias = "outputFormat")]
    pub output_format: Option<String>,
    #[serde(default, alias = "requestTimeoutSecs")]
    pub request_timeout_secs: Option<u64>,
}

impl OcrSettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read OCR settings: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse OCR settings: {:?}", path))
    }
}

/// Output representation requested from the service and read back from it.
///
/// Only these four formats are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Html,
    Text,
    Json,
}

impl OutputFormat {
    /// Form value sent as `output_format`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "md" | "markdown" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedOutputFormat(other.to_string())),
        }
    }
}

/// OCR options sent with every submission. Immutable per upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrOptions {
    pub do_ocr: bool,
    pub force_ocr: bool,
    pub engine: String,
    pub lang: String,
    pub output_format: OutputFormat,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            do_ocr: true,
            force_ocr: false,
            engine: DEFAULT_OCR_ENGINE.to_string(),
            lang: DEFAULT_OCR_LANG.to_string(),
            output_format: OutputFormat::Markdown,
        }
    }
}

/// Fully resolved backend configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct DoclingOcrConfig {
    /// Raw API key value: literal, `${NAME}` placeholder, or empty.
    pub api_key: String,
    /// Raw base URL value: literal, `${NAME}` placeholder, or empty.
    pub base_url: String,
    /// Payloads at or above this many MiB go to the async endpoint. Default: 5.
    pub sync_threshold_mb: u64,
    pub options: OcrOptions,
    /// Per-request HTTP timeout. Default: 300.
    pub request_timeout_secs: u64,
}

impl Default for DoclingOcrConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            sync_threshold_mb: DEFAULT_SYNC_THRESHOLD_MB,
            options: OcrOptions::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for DoclingOcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoclingOcrConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("sync_threshold_mb", &self.sync_threshold_mb)
            .field("options", &self.options)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl DoclingOcrConfig {
    /// Resolve against the process environment.
    pub fn from_env(settings: Option<&OcrSettings>) -> Result<Self, ConfigError> {
        Self::resolve(settings, |name| std::env::var(name).ok())
    }

    /// Resolve `settings` with `env` as the fallback lookup.
    ///
    /// Empty environment values count as unset.
    pub fn resolve<F>(settings: Option<&OcrSettings>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let empty = OcrSettings::default();
        let s = settings.unwrap_or(&empty);
        let var = |name: &str| env(name).filter(|v| !v.is_empty());
        let flag = |name: &str| var(name).map(|v| v == "true");
        let number = |name: &str| var(name).and_then(|v| v.trim().parse::<u64>().ok());

        let output_format = match s
            .output_format
            .clone()
            .or_else(|| var("DOCLING_OUTPUT_FORMAT"))
        {
            Some(raw) => raw.parse()?,
            None => OutputFormat::default(),
        };

        Ok(Self {
            api_key: s
                .api_key
                .clone()
                .or_else(|| var("DOCLING_API_KEY"))
                .unwrap_or_default(),
            base_url: s
                .base_url
                .clone()
                .or_else(|| var("DOCLING_BASE_URL"))
                .unwrap_or_default(),
            sync_threshold_mb: s
                .sync_threshold_mb
                .or_else(|| number("DOCLING_SYNC_THRESHOLD_MB"))
                .unwrap_or(DEFAULT_SYNC_THRESHOLD_MB),
            options: OcrOptions {
                do_ocr: s.do_ocr.or_else(|| flag("DOCLING_DO_OCR")).unwrap_or(true),
                force_ocr: s
                    .force_ocr
                    .or_else(|| flag("DOCLING_FORCE_OCR"))
                    .unwrap_or(false),
                engine: s
                    .ocr_engine
                    .clone()
                    .or_else(|| var("DOCLING_OCR_ENGINE"))
                    .unwrap_or_else(|| DEFAULT_OCR_ENGINE.to_string()),
                lang: s
                    .ocr_lang
                    .clone()
                    .or_else(|| var("DOCLING_OCR_LANG"))
                    .unwrap_or_else(|| DEFAULT_OCR_LANG.to_string()),
                output_format,
            },
            request_timeout_secs: s
                .request_timeout_secs
                .or_else(|| number("DOCLING_REQUEST_TIMEOUT_SECS"))
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    /// Sync/async cut-over in bytes.
    pub fn sync_threshold_bytes(&self) -> u64 {
        self.sync_threshold_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_configured() {
        let config = DoclingOcrConfig::resolve(None, env_of(&[])).unwrap();
        assert_eq!(config, DoclingOcrConfig::default());
        assert_eq!(config.sync_threshold_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.options.engine, "easyocr");
        assert_eq!(config.options.lang, "en");
        assert!(config.options.do_ocr);
        assert!(!config.options.force_ocr);
    }

    #[test]
    fn environment_fills_unset_settings() {
        let env = env_of(&[
            ("DOCLING_API_KEY", "env-api-key"),
            ("DOCLING_BASE_URL", "https://env.docling.com"),
            ("DOCLING_SYNC_THRESHOLD_MB", "15"),
            ("DOCLING_DO_OCR", "false"),
            ("DOCLING_FORCE_OCR", "true"),
            ("DOCLING_OCR_ENGINE", "paddleocr"),
            ("DOCLING_OCR_LANG", "es"),
            ("DOCLING_OUTPUT_FORMAT", "json"),
            ("DOCLING_REQUEST_TIMEOUT_SECS", "30"),
        ]);
        let config = DoclingOcrConfig::resolve(None, env).unwrap();
        assert_eq!(config.api_key, "env-api-key");
        assert_eq!(config.base_url, "https://env.docling.com");
        assert_eq!(config.sync_threshold_mb, 15);
        assert!(!config.options.do_ocr);
        assert!(config.options.force_ocr);
        assert_eq!(config.options.engine, "paddleocr");
        assert_eq!(config.options.lang, "es");
        assert_eq!(config.options.output_format, OutputFormat::Json);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn settings_win_over_environment() {
        let settings = OcrSettings {
            api_key: Some("config-api-key".into()),
            sync_threshold_mb: Some(25),
            ..Default::default()
        };
        let env = env_of(&[
            ("DOCLING_API_KEY", "env-api-key"),
            ("DOCLING_SYNC_THRESHOLD_MB", "20"),
            ("DOCLING_OCR_LANG", "fr"),
        ]);
        let config = DoclingOcrConfig::resolve(Some(&settings), env).unwrap();
        assert_eq!(config.api_key, "config-api-key");
        assert_eq!(config.sync_threshold_mb, 25);
        assert_eq!(config.options.lang, "fr");
    }

    #[test]
    fn boolean_env_is_true_only_for_exact_true() {
        for (raw, expected) in [("true", true), ("TRUE", false), ("1", false), ("False", false)] {
            let config =
                DoclingOcrConfig::resolve(None, env_of(&[("DOCLING_FORCE_OCR", raw)])).unwrap();
            assert_eq!(config.options.force_ocr, expected, "raw={raw}");
        }
    }

    #[test]
    fn empty_and_invalid_env_fall_back_to_defaults() {
        let env = env_of(&[
            ("DOCLING_DO_OCR", ""),
            ("DOCLING_SYNC_THRESHOLD_MB", "invalid"),
            ("DOCLING_OCR_ENGINE", ""),
        ]);
        let config = DoclingOcrConfig::resolve(None, env).unwrap();
        assert!(config.options.do_ocr);
        assert_eq!(config.sync_threshold_mb, DEFAULT_SYNC_THRESHOLD_MB);
        assert_eq!(config.options.engine, DEFAULT_OCR_ENGINE);
    }

    #[test]
    fn output_format_aliases() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!(matches!(
            "doctags".parse::<OutputFormat>(),
            Err(ConfigError::UnsupportedOutputFormat(_))
        ));
    }

    #[test]
    fn unsupported_format_is_a_config_error() {
        let settings = OcrSettings {
            output_format: Some("pdf".into()),
            ..Default::default()
        };
        assert!(DoclingOcrConfig::resolve(Some(&settings), env_of(&[])).is_err());
    }

    #[test]
    fn settings_parse_from_json() {
        let settings: OcrSettings = serde_json::from_str(
            r#"{"apiKey": "${DOCLING_API_KEY}", "baseURL": "http://localhost:5001", "syncThresholdMB": 10, "ocr_lang": "de"}"#,
        )
        .unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("${DOCLING_API_KEY}"));
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:5001"));
        assert_eq!(settings.sync_threshold_mb, Some(10));
        assert_eq!(settings.ocr_lang.as_deref(), Some("de"));
    }

    #[test]
    fn settings_accept_camel_case_option_keys() {
        let settings: OcrSettings = serde_json::from_str(
            r#"{"doOcr": false, "forceOcr": true, "ocrEngine": "tesseract", "ocrLang": "pt", "outputFormat": "html"}"#,
        )
        .unwrap();
        let config = DoclingOcrConfig::resolve(Some(&settings), env_of(&[])).unwrap();
        assert!(!config.options.do_ocr);
        assert!(config.options.force_ocr);
        assert_eq!(config.options.engine, "tesseract");
        assert_eq!(config.options.lang, "pt");
        assert_eq!(config.options.output_format, OutputFormat::Html);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = DoclingOcrConfig {
            api_key: "secret".into(),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
