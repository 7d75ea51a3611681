use serde::{Deserialize, Serialize};

/// The operator driving the workflow.
///
/// Passed in explicitly when the workflow is built; nothing reads an ambient
/// "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
  pub id: String,
  pub label: String,
}

impl Actor {
  pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      label: label.into(),
    }
  }
}

/// A resource the destructive operation can be aimed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
  pub id: String,
  pub display_name: String,
  #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
  pub metadata: serde_json::Value,
}

impl Target {
  pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      display_name: display_name.into(),
      metadata: serde_json::Value::Null,
    }
  }
}
