//! Request and response bodies that only exist on the wire.

use purgeguard_workflow::{DeletedGroup, ResultSummary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyRequest<'a> {
  pub actor_id: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyResponse {
  pub verified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExecuteResponse {
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub deleted_counts: Vec<DeletedGroup>,
  #[serde(default)]
  pub total_deleted: Option<u64>,
  #[serde(default)]
  pub audit_id: Option<String>,
}

impl ExecuteResponse {
  /// `Ok` with the summary when the service reports success, otherwise the
  /// service's message.
  pub fn into_result(self) -> Result<ResultSummary, String> {
    if self.success {
      Ok(ResultSummary::succeeded(
        self.deleted_counts,
        self.total_deleted,
        self.audit_id,
      ))
    } else {
      Err(
        self
          .message
          .unwrap_or_else(|| "operation reported failure".to_string()),
      )
    }
  }
}

/// Common error body shapes: `{"message": ...}` or `{"error": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub error: Option<String>,
}

impl ErrorBody {
  pub fn into_message(self) -> Option<String> {
    self.message.or(self.error).filter(|m| !m.trim().is_empty())
  }
}
