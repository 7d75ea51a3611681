use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::service::ServiceConfig;
use crate::workflow::WorkflowConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurgeConfig {
  pub service: ServiceConfig,
  pub workflow: WorkflowConfig,
}

impl PurgeConfig {
  /// Read, parse and validate a JSON config file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&content)
  }

  /// Parse and validate a JSON config document.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    let config: PurgeConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    self.service.validate()?;
    self.workflow.validate()
  }
}
