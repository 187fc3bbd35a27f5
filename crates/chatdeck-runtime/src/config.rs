//! Gateway configuration.

use std::time::Duration;

use thiserror::Error;

pub const ENV_BASE_URL: &str = "CHATDECK_BASE_URL";
pub const ENV_API_KEY: &str = "CHATDECK_API_KEY";
pub const ENV_AGENT_ID: &str = "CHATDECK_AGENT_ID";
pub const ENV_ASSISTANT_ID: &str = "CHATDECK_ASSISTANT_ID";
pub const ENV_ORGANIZATION_ID: &str = "CHATDECK_ORGANIZATION_ID";

const DEFAULT_ASSISTANT_ID: &str = "OpenWorks";
const DEFAULT_ORGANIZATION_ID: &str = "OpenWorks";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),
    #[error("invalid base url {url:?}")]
    InvalidBaseUrl { url: String },
}

/// Connection settings for the hosted chat API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// API root, without trailing slash.
    pub base_url: String,
    /// Sent as `x-api-key`.
    pub api_key: String,
    pub agent_id: String,
    pub assistant_id: String,
    pub organization_id: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Config with default assistant/organization ids and no timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(&base_url.into())?,
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            assistant_id: DEFAULT_ASSISTANT_ID.to_string(),
            organization_id: DEFAULT_ORGANIZATION_ID.to_string(),
            timeout: None,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_assistant_id(mut self, id: impl Into<String>) -> Self {
        self.assistant_id = id.into();
        self
    }

    #[must_use]
    pub fn with_organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = id.into();
        self
    }

    /// Read `CHATDECK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name → value lookup. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let base_url = get(ENV_BASE_URL).ok_or(ConfigError::Missing(ENV_BASE_URL))?;
        let api_key = get(ENV_API_KEY).ok_or(ConfigError::Missing(ENV_API_KEY))?;
        let mut config = Self::new(base_url, api_key, get(ENV_AGENT_ID).unwrap_or_default())?;
        if let Some(id) = get(ENV_ASSISTANT_ID) {
            config.assistant_id = id;
        }
        if let Some(id) = get(ENV_ORGANIZATION_ID) {
            config.organization_id = id;
        }
        Ok(config)
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(url: &str) -> Result<String, ConfigError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Missing(ENV_BASE_URL));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl {
            url: trimmed.to_string(),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn reads_all_values() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://api.example.com/chat/"),
            (ENV_API_KEY, "k"),
            (ENV_AGENT_ID, "agent"),
            (ENV_ORGANIZATION_ID, "org"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url, "https://api.example.com/chat");
        assert_eq!(cfg.agent_id, "agent");
        assert_eq!(cfg.assistant_id, "OpenWorks");
        assert_eq!(cfg.organization_id, "org");
        assert_eq!(cfg.timeout, None);
        assert_eq!(cfg.endpoint("/createchat"), "https://api.example.com/chat/createchat");
    }

    #[test]
    fn missing_key_or_url_is_an_error() {
        assert_eq!(
            GatewayConfig::from_lookup(lookup(&[(ENV_API_KEY, "k")])),
            Err(ConfigError::Missing(ENV_BASE_URL))
        );
        assert_eq!(
            GatewayConfig::from_lookup(lookup(&[
                (ENV_BASE_URL, "https://x"),
                (ENV_API_KEY, "  ")
            ])),
            Err(ConfigError::Missing(ENV_API_KEY))
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            GatewayConfig::new("ftp://x", "k", "a"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }
}
