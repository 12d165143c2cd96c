//! Test loading from inline data or a test file

use std::path::Path;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use crate::definition::TestDefinition;
use crate::error::{AttaError, AttaResult};
use crate::transport::Transport;

/// Where the test definition comes from
#[derive(Debug, Clone, Default)]
pub struct LoadParams {
    /// Inline definition, either an object or JSON text
    pub test: Option<Value>,
    /// URI or path of a JSON definition; wins over `test` when both are set
    pub test_file: Option<String>,
    /// Name announced to the adapter in `/start`
    pub name: Option<String>,
}

impl LoadParams {
    pub fn inline(test: Value) -> Self {
        Self {
            test: Some(test),
            ..Default::default()
        }
    }

    pub fn file(test_file: impl Into<String>) -> Self {
        Self {
            test_file: Some(test_file.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A loaded test before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedTest {
    Inline(Value),
    Text(String),
}

impl LoadedTest {
    /// Normalize into a definition, parsing text forms first
    pub fn into_definition(self) -> AttaResult<TestDefinition> {
        match self {
            LoadedTest::Text(text) | LoadedTest::Inline(Value::String(text)) => {
                TestDefinition::from_json(&text)
            }
            LoadedTest::Inline(value) => TestDefinition::from_value(&value),
        }
    }
}

/// Resolve the test named by `params`
pub async fn load_test(params: &LoadParams, transport: &Transport) -> AttaResult<LoadedTest> {
    if let Some(test_file) = &params.test_file {
        return load_file(test_file, transport).await.map(LoadedTest::Text);
    }
    match &params.test {
        Some(test) => {
            debug!("Using inline test definition");
            Ok(LoadedTest::Inline(test.clone()))
        }
        None => Err(AttaError::MissingTest),
    }
}

async fn load_file(uri: &str, transport: &Transport) -> AttaResult<String> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        info!("Fetching test from {}", uri);
        let resp = transport
            .request(Method::GET, uri, None, None, false)
            .await
            .map_err(|e| AttaError::Load {
                uri: uri.to_string(),
                reason: e.to_string(),
            })?;
        if resp.timed_out() {
            return Err(AttaError::Load {
                uri: uri.to_string(),
                reason: format!("no response within {:?}", transport.timeout()),
            });
        }
        if resp.is_unanswered() {
            return Err(AttaError::Load {
                uri: uri.to_string(),
                reason: "connection failed".to_string(),
            });
        }
        return Ok(resp.text);
    }

    let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
    info!("Reading test from {}", path.display());
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AttaError::Load {
            uri: uri.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn transport() -> Transport {
        Transport::new(Duration::from_millis(200)).unwrap()
    }

    #[tokio::test]
    async fn test_missing_test_is_config_error() {
        let err = load_test(&LoadParams::default(), &transport()).await.unwrap_err();
        assert!(matches!(err, AttaError::MissingTest));
        assert_eq!(err.to_string(), "Must supply a 'test' or 'testFile' parameter");
    }

    #[tokio::test]
    async fn test_inline_resolves_immediately() {
        let loaded = load_test(&LoadParams::inline(json!({ "title": "t" })), &transport())
            .await
            .unwrap();
        assert_eq!(loaded, LoadedTest::Inline(json!({ "title": "t" })));
    }

    #[tokio::test]
    async fn test_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("button.json");
        std::fs::write(&path, r#"{"title":"from disk","ATK":[]}"#).unwrap();

        let params = LoadParams::file(format!("file://{}", path.display()));
        let def = load_test(&params, &transport())
            .await
            .unwrap()
            .into_definition()
            .unwrap();
        assert_eq!(def.title(), "from disk");
        assert!(def.has_api("ATK"));
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let params = LoadParams::file("/nonexistent/attacomm/test.json");
        let err = load_test(&params, &transport()).await.unwrap_err();
        assert!(matches!(err, AttaError::Load { .. }));
    }

    #[test]
    fn test_inline_string_is_parsed() {
        let def = LoadedTest::Inline(json!(r#"{"title":"text"}"#))
            .into_definition()
            .unwrap();
        assert_eq!(def.title(), "text");
    }

    #[test]
    fn test_bad_text_fails() {
        assert!(LoadedTest::Text("{not json".into()).into_definition().is_err());
    }
}
