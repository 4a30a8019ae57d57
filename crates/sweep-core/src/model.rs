use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Named inputs of an example. Keys are unique by construction.
pub type Inputs = serde_json::Map<String, serde_json::Value>;

/// Opaque example identity, as issued by the dataset store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExampleId(String);

impl ExampleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExampleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ExampleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl Dataset {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            created_at: None,
            tenant_id: None,
        }
    }
}

/// One input case of a dataset. Read once from the store, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub id: ExampleId,
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub inputs: Inputs,
    #[serde(default)]
    pub outputs: Option<Inputs>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Example {
    pub fn new(id: impl Into<ExampleId>, inputs: Inputs) -> Self {
        Self {
            id: id.into(),
            dataset_id: None,
            inputs,
            outputs: None,
            created_at: None,
        }
    }
}

/// Recorded result of one predictor invocation.
///
/// Serializes untagged: outputs as the raw value, failures as
/// `{"Error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Error {
        #[serde(rename = "Error")]
        message: String,
    },
    Output(serde_json::Value),
}

impl Outcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn output(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Output(v) => Some(v),
            Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            Self::Output(_) => None,
        }
    }
}

/// Outcomes per example, in repetition order.
pub type ResultMap = HashMap<ExampleId, Vec<Outcome>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_error_serializes_as_envelope() {
        let v = serde_json::to_value(Outcome::error("boom")).unwrap();
        assert_eq!(v, json!({"Error": "boom"}));
    }

    #[test]
    fn outcome_output_serializes_raw() {
        let v = serde_json::to_value(Outcome::Output(json!(10))).unwrap();
        assert_eq!(v, json!(10));
    }

    #[test]
    fn error_envelope_parses_back_as_error() {
        let o: Outcome = serde_json::from_value(json!({"Error": "boom"})).unwrap();
        assert_eq!(o.error_message(), Some("boom"));
        let o: Outcome = serde_json::from_value(json!({"text": "hi"})).unwrap();
        assert!(!o.is_error());
    }

    #[test]
    fn example_from_api_payload() {
        let ex: Example = serde_json::from_value(json!({
            "id": "ex-1",
            "dataset_id": "ds-1",
            "inputs": {"question": "2+2?"},
            "outputs": {"answer": "4"},
            "created_at": "2023-04-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(ex.id.as_str(), "ex-1");
        assert_eq!(ex.inputs["question"], "2+2?");
        assert!(ex.created_at.is_some());
    }

    #[test]
    fn result_map_serializes_with_string_keys() {
        let mut map = ResultMap::new();
        map.insert("a".into(), vec![Outcome::Output(json!(10))]);
        let v = serde_json::to_value(&map).unwrap();
        assert_eq!(v, json!({"a": [10]}));
    }
}
