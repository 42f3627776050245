//! API key / base URL resolution.
//!
//! A raw config value is either a literal, a `${NAME}` placeholder, or empty.
//! Anything that is not a literal is looked up through a [`SecretLoader`],
//! called at most once per upload, and falls back to a default.

use async_trait::async_trait;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://docling.amendllc.com";
pub const API_KEY_SECRET: &str = "DOCLING_API_KEY";
pub const BASE_URL_SECRET: &str = "DOCLING_BASE_URL";

/// Concrete credentials for one upload. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub api_key: String,
    pub base_url: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Arguments for one secret lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthValuesRequest {
    /// Empty when the upload has no user.
    pub user_id: String,
    pub auth_fields: Vec<String>,
    /// Names that may legitimately be absent.
    pub optional: HashSet<String>,
}

/// Resolves named secrets for a user.
#[async_trait]
pub trait SecretLoader: Send + Sync {
    async fn load_auth_values(
        &self,
        request: AuthValuesRequest,
    ) -> anyhow::Result<HashMap<String, String>>;
}

/// Reads secrets from the process environment, ignoring the user.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretLoader;

#[async_trait]
impl SecretLoader for EnvSecretLoader {
    async fn load_auth_values(
        &self,
        request: AuthValuesRequest,
    ) -> anyhow::Result<HashMap<String, String>> {
        let mut values = HashMap::new();
        for name in request.auth_fields {
            match std::env::var(&name) {
                Ok(value) if !value.is_empty() => {
                    values.insert(name, value);
                }
                _ if request.optional.contains(&name) => {}
                _ => anyhow::bail!("{} not set", name),
            }
        }
        Ok(values)
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\$\{(.+)\}$").expect("static regex"))
}

/// One raw config value, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Literal(String),
    Placeholder(String),
    Unset,
}

impl ConfigValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Unset;
        }
        match placeholder_regex().captures(trimmed) {
            Some(caps) => Self::Placeholder(caps[1].trim().to_string()),
            None => Self::Literal(raw.to_string()),
        }
    }

    pub fn needs_resolution(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }

    /// Secret name to request, if this value needs one.
    fn secret_name<'a>(&'a self, default_name: &'a str) -> Option<&'a str> {
        match self {
            Self::Literal(_) => None,
            Self::Placeholder(name) if !name.is_empty() => Some(name.as_str()),
            _ => Some(default_name),
        }
    }

    /// Literal → loaded secret → default, first hit wins.
    fn resolve(
        &self,
        default_name: &str,
        secrets: &HashMap<String, String>,
        default_value: &str,
    ) -> String {
        let chain: [&dyn Fn() -> Option<String>; 3] = [
            &|| match self {
                Self::Literal(v) => Some(v.clone()),
                _ => None,
            },
            &|| {
                self.secret_name(default_name)
                    .and_then(|name| secrets.get(name))
                    .filter(|v| !v.is_empty())
                    .cloned()
            },
            &|| Some(default_value.to_string()),
        ];
        chain.iter().find_map(|step| step()).unwrap_or_default()
    }
}

/// Resolve the raw `api_key`/`base_url` pair for `user_id`.
///
/// Never fails: a loader error is logged and treated as "nothing loaded", and
/// an empty API key is left for the caller to reject.
pub async fn resolve_auth_config(
    raw_api_key: &str,
    raw_base_url: &str,
    user_id: Option<&str>,
    loader: &dyn SecretLoader,
) -> AuthConfig {
    let api_key = ConfigValue::parse(raw_api_key);
    let base_url = ConfigValue::parse(raw_base_url);

    if !api_key.needs_resolution() && !base_url.needs_resolution() {
        return AuthConfig {
            api_key: api_key.resolve(API_KEY_SECRET, &HashMap::new(), ""),
            base_url: base_url.resolve(BASE_URL_SECRET, &HashMap::new(), DEFAULT_BASE_URL),
        };
    }

    let mut auth_fields = Vec::with_capacity(2);
    let mut optional = HashSet::new();
    if let Some(name) = base_url.secret_name(BASE_URL_SECRET) {
        auth_fields.push(name.to_string());
        optional.insert(name.to_string());
    }
    if let Some(name) = api_key.secret_name(API_KEY_SECRET) {
        auth_fields.push(name.to_string());
    }

    debug!("Loading Docling auth values: {:?}", auth_fields);
    let request = AuthValuesRequest {
        user_id: user_id.unwrap_or_default().to_string(),
        auth_fields,
        optional,
    };
    let secrets = loader.load_auth_values(request).await.unwrap_or_else(|e| {
        warn!("Failed to load Docling auth values: {}", e);
        HashMap::new()
    });

    AuthConfig {
        api_key: api_key.resolve(API_KEY_SECRET, &secrets, ""),
        base_url: base_url.resolve(BASE_URL_SECRET, &secrets, DEFAULT_BASE_URL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StaticSecrets;

    #[test]
    fn classify_values() {
        assert_eq!(ConfigValue::parse(""), ConfigValue::Unset);
        assert_eq!(ConfigValue::parse("   "), ConfigValue::Unset);
        assert_eq!(
            ConfigValue::parse("${MY_KEY}"),
            ConfigValue::Placeholder("MY_KEY".into())
        );
        assert_eq!(
            ConfigValue::parse("sk-123"),
            ConfigValue::Literal("sk-123".into())
        );
        assert!(!ConfigValue::parse("sk-123").needs_resolution());
    }

    #[tokio::test]
    async fn literals_skip_the_loader() {
        let loader = StaticSecrets::default();
        let auth =
            resolve_auth_config("test-api-key", "https://test.docling.com", Some("u1"), &loader)
                .await;
        assert_eq!(auth.api_key, "test-api-key");
        assert_eq!(auth.base_url, "https://test.docling.com");
        assert!(loader.requests().is_empty());
    }

    #[tokio::test]
    async fn placeholders_load_named_secrets_once() {
        let loader = StaticSecrets::with(&[
            ("DOCLING_API_KEY", "env-api-key"),
            ("DOCLING_BASE_URL", "https://env.docling.com"),
        ]);
        let auth = resolve_auth_config(
            "${DOCLING_API_KEY}",
            "${DOCLING_BASE_URL}",
            Some("test-user-id"),
            &loader,
        )
        .await;

        assert_eq!(auth.api_key, "env-api-key");
        assert_eq!(auth.base_url, "https://env.docling.com");
        let calls = loader.requests();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].user_id, "test-user-id");
        assert_eq!(calls[0].auth_fields, vec!["DOCLING_BASE_URL", "DOCLING_API_KEY"]);
        assert_eq!(
            calls[0].optional,
            HashSet::from(["DOCLING_BASE_URL".to_string()])
        );
    }

    #[tokio::test]
    async fn custom_placeholder_names_are_requested() {
        let loader = StaticSecrets::with(&[("TEAM_DOCLING_KEY", "team-key")]);
        let auth = resolve_auth_config("${TEAM_DOCLING_KEY}", "https://x.test", None, &loader).await;
        assert_eq!(auth.api_key, "team-key");
        assert_eq!(auth.base_url, "https://x.test");
        let calls = loader.requests();
        assert_eq!(calls[0].auth_fields, vec!["TEAM_DOCLING_KEY"]);
        assert_eq!(calls[0].user_id, "");
    }

    #[tokio::test]
    async fn empty_base_url_defaults_when_no_secret() {
        let loader = StaticSecrets::default();
        let auth = resolve_auth_config("test-api-key", "", Some("u1"), &loader).await;
        assert_eq!(auth.base_url, DEFAULT_BASE_URL);
        assert_eq!(auth.api_key, "test-api-key");
        assert_eq!(loader.requests()[0].auth_fields, vec!["DOCLING_BASE_URL"]);
    }

    #[tokio::test]
    async fn empty_api_key_loaded_from_default_secret() {
        let loader = StaticSecrets::with(&[("DOCLING_API_KEY", "loaded-key")]);
        let auth = resolve_auth_config("", "https://test.docling.com", Some("u1"), &loader).await;
        assert_eq!(auth.api_key, "loaded-key");
    }

    #[tokio::test]
    async fn loader_failure_leaves_api_key_empty() {
        let loader = StaticSecrets::failing();
        let auth = resolve_auth_config("", "", None, &loader).await;
        assert_eq!(auth.api_key, "");
        assert_eq!(auth.base_url, DEFAULT_BASE_URL);
        assert_eq!(loader.requests().len(), 1);
    }

    #[test]
    fn debug_redacts_api_key() {
        let auth = AuthConfig {
            api_key: "sk-secret".into(),
            base_url: DEFAULT_BASE_URL.into(),
        };
        assert!(!format!("{:?}", auth).contains("sk-secret"));
    }
}
