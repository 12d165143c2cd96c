//! Session configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AttaError, AttaResult};

/// Adapter address used when none is configured.
pub const DEFAULT_ADAPTER_URI: &str = "http://localhost:12345/ATTA";

/// Per-call timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Read-only snapshot of the hosting framework's shared properties.
pub type HarnessProperties = Arc<serde_json::Map<String, serde_json::Value>>;

/// Configuration injected into a [`Session`](crate::session::Session) at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URI of the adapter; `/start`, `/test` and `/end` hang off it
    pub adapter_uri: String,

    /// Timeout applied to every transport call
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,

    /// Properties exposed by the hosting framework, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HarnessProperties>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            adapter_uri: DEFAULT_ADAPTER_URI.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            properties: None,
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> AttaResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> AttaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Builder-style override of the adapter URI
    pub fn with_adapter_uri(mut self, uri: impl Into<String>) -> Self {
        self.adapter_uri = uri.into();
        self
    }

    /// Builder-style override of the transport timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach the hosting framework's properties
    pub fn with_properties(mut self, properties: serde_json::Map<String, serde_json::Value>) -> Self {
        self.properties = Some(Arc::new(properties));
        self
    }

    /// Endpoint for one adapter call, e.g. `endpoint("start")`
    pub fn endpoint(&self, call: &str) -> String {
        format!("{}/{}", self.adapter_uri.trim_end_matches('/'), call)
    }

    pub fn validate(&self) -> AttaResult<()> {
        if self.adapter_uri.is_empty() {
            return Err(AttaError::InvalidConfig("adapter_uri is empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(AttaError::InvalidConfig("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.adapter_uri, "http://localhost:12345/ATTA");
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert!(config.properties.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = SessionConfig::from_toml("timeout_ms = 250\n").unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.adapter_uri, DEFAULT_ADAPTER_URI);
    }

    #[test]
    fn test_parse_properties_table() {
        let toml = r#"
adapter_uri = "http://127.0.0.1:4119/ATTA/"

[properties]
output = true
"#;
        let config = SessionConfig::from_toml(toml).unwrap();
        assert_eq!(config.endpoint("start"), "http://127.0.0.1:4119/ATTA/start");
        let props = config.properties.unwrap();
        assert_eq!(props.get("output"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(matches!(
            SessionConfig::from_toml("timeout_ms = 0"),
            Err(AttaError::InvalidConfig(_))
        ));
    }
}
