//! Declarative test definitions
//!
//! A definition is a JSON object with optional `title` and `description`
//! strings. Every other top-level key whose value is an array names an AT
//! API, and the array holds that API's assertion records in order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AttaError, AttaResult};

/// One unit of test data sent to the adapter as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssertionRecord(pub Value);

impl AssertionRecord {
    /// Text sent as the `/test` request body.
    ///
    /// Records that are already strings go out verbatim.
    pub fn to_wire(&self) -> String {
        match &self.0 {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Parsed test definition, immutable once loaded
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestDefinition {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Assertion sequences keyed by API name
    #[serde(flatten)]
    pub apis: BTreeMap<String, Vec<AssertionRecord>>,
}

impl TestDefinition {
    /// Parse a definition from JSON text
    pub fn from_json(text: &str) -> AttaResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Build a definition from an already-parsed JSON value.
    ///
    /// The input is only read, so the same value can be parsed repeatedly.
    pub fn from_value(value: &Value) -> AttaResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| AttaError::InvalidDefinition(type_name(value).to_string()))?;
        Ok(Self::from_object(object))
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let mut definition = TestDefinition::default();
        for (key, value) in object {
            match (key.as_str(), value) {
                ("title", Value::String(title)) => definition.title = Some(title.clone()),
                ("description", Value::String(text)) => {
                    definition.description = Some(text.clone())
                }
                ("title" | "description", _) => {}
                (api, Value::Array(records)) => {
                    let records = records.iter().cloned().map(AssertionRecord).collect();
                    definition.apis.insert(api.to_string(), records);
                }
                (other, _) => debug!("Ignoring non-API key '{}' in test definition", other),
            }
        }
        definition
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn has_api(&self, api: &str) -> bool {
        self.apis.contains_key(api)
    }

    /// Assertions for an API, in definition order
    pub fn assertions(&self, api: &str) -> Option<&[AssertionRecord]> {
        self.apis.get(api).map(Vec::as_slice)
    }

    pub fn api_names(&self) -> impl Iterator<Item = &str> {
        self.apis.keys().map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for TestDefinition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_object(&object))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "title": "button role",
            "description": "Checks the role exposed for a native button",
            "ATK": [
                ["property", "role", "is", "ROLE_PUSH_BUTTON"],
                ["property", "name", "is", "OK"]
            ],
            "IAccessible2": [
                ["property", "role", "is", "ROLE_SYSTEM_PUSHBUTTON"]
            ]
        })
    }

    #[test]
    fn test_parse_metadata_and_apis() {
        let def = TestDefinition::from_value(&sample()).unwrap();
        assert_eq!(def.title(), "button role");
        assert!(def.description.as_deref().unwrap().contains("native button"));
        assert_eq!(def.api_names().collect::<Vec<_>>(), vec!["ATK", "IAccessible2"]);
        assert_eq!(def.assertions("ATK").unwrap().len(), 2);
        assert!(!def.has_api("UIA"));
    }

    #[test]
    fn test_inline_and_text_forms_match() {
        let value = sample();
        let inline = TestDefinition::from_value(&value).unwrap();
        let from_text = TestDefinition::from_json(&value.to_string()).unwrap();
        assert_eq!(inline, from_text);
    }

    #[test]
    fn test_parse_does_not_mutate_input() {
        let value = sample();
        let before = value.clone();
        let first = TestDefinition::from_value(&value).unwrap();
        let second = TestDefinition::from_value(&value).unwrap();
        assert_eq!(first, second);
        assert_eq!(value, before);
    }

    #[test]
    fn test_non_object_rejected() {
        let err = TestDefinition::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, AttaError::InvalidDefinition(ref t) if t == "array"));
    }

    #[test]
    fn test_non_array_keys_ignored() {
        let def = TestDefinition::from_value(&json!({ "title": "t", "version": 2 })).unwrap();
        assert!(def.apis.is_empty());
    }

    #[test]
    fn test_wire_form() {
        let text = AssertionRecord(json!("raw assertion"));
        assert_eq!(text.to_wire(), "raw assertion");
        let list = AssertionRecord(json!(["property", "role", "is", "button"]));
        assert_eq!(list.to_wire(), r#"["property","role","is","button"]"#);
    }
}
