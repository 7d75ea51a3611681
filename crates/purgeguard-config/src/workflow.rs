use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Phrase the operator must type before the destructive call is allowed.
pub const DEFAULT_REQUIRED_PHRASE: &str = "DELETE SCHOOL DATA";

/// How long a successful identity verification stays valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityScope {
  /// Verification belongs to the selected target; selecting another target
  /// requires verifying again.
  #[default]
  PerTarget,
  /// Verification survives target changes until the workflow is reset.
  PerAttempt,
}

/// Policy for the confirmation workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
  /// Compared against the typed phrase after trimming and uppercasing both.
  pub required_phrase: String,
  /// Upper bound on the destructive call before it is reported as failed.
  pub execution_timeout_ms: u64,
  pub identity_scope: IdentityScope,
  /// Clear the typed phrase and final consent after a failed execution, so a
  /// new attempt has to be confirmed again.
  pub reconfirm_after_failure: bool,
}

impl Default for WorkflowConfig {
  fn default() -> Self {
    Self {
      required_phrase: DEFAULT_REQUIRED_PHRASE.to_string(),
      execution_timeout_ms: 120_000,
      identity_scope: IdentityScope::default(),
      reconfirm_after_failure: false,
    }
  }
}

impl WorkflowConfig {
  pub(crate) fn validate(&self) -> Result<(), ConfigError> {
    if self.required_phrase.trim().is_empty() {
      return Err(ConfigError::Invalid {
        field: "workflow.required_phrase",
        message: "must not be blank".to_string(),
      });
    }
    if self.execution_timeout_ms == 0 {
      return Err(ConfigError::Invalid {
        field: "workflow.execution_timeout_ms",
        message: "must be greater than zero".to_string(),
      });
    }
    Ok(())
  }
}
