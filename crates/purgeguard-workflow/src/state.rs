use serde::{Deserialize, Serialize};

use crate::impact::ImpactSummary;
use crate::result::ResultSummary;

/// Lifecycle of the destructive call.
///
/// ```text
/// Idle ──execute──▶ InProgress ──ok──▶ Succeeded (terminal)
///                        └────err──▶ Failed ──execute──▶ InProgress
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
  #[default]
  Idle,
  InProgress,
  Succeeded,
  Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
  /// A collaborator call failed; the user may retry.
  Fetch,
  /// The submitted credential was rejected.
  InvalidCredential,
  /// The impact preview contradicted itself.
  Integrity,
  /// The destructive call failed.
  Service,
}

/// A dismissible, user-facing message produced by the last failed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
  pub kind: NoticeKind,
  pub message: String,
}

impl Notice {
  pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
    }
  }
}

/// State of one attempt at the destructive operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
  /// Identifies this attempt in logs and events.
  pub attempt_id: String,
  /// 0-based step index; `RESULT_INDEX` once execution succeeded.
  pub current_step_index: usize,
  pub target_resource_id: Option<String>,
  pub impact_preview: Option<ImpactSummary>,
  /// One flag per warning in `impact_preview`, same order.
  pub acknowledged_warnings: Vec<bool>,
  pub identity_verified: bool,
  /// Raw user input; normalised only when compared.
  pub confirmation_phrase_input: String,
  pub final_consent_checked: bool,
  pub execution_status: ExecutionStatus,
  pub execution_result: Option<ResultSummary>,
  /// The phrase `confirmation_phrase_input` must match.
  pub required_phrase: String,
  /// Cosmetic progress of the destructive call, 0-100.
  pub progress: u8,
  pub notice: Option<Notice>,
}

impl WorkflowState {
  pub fn new(attempt_id: impl Into<String>, required_phrase: impl Into<String>) -> Self {
    Self {
      attempt_id: attempt_id.into(),
      current_step_index: 0,
      target_resource_id: None,
      impact_preview: None,
      acknowledged_warnings: Vec::new(),
      identity_verified: false,
      confirmation_phrase_input: String::new(),
      final_consent_checked: false,
      execution_status: ExecutionStatus::Idle,
      execution_result: None,
      required_phrase: required_phrase.into(),
      progress: 0,
      notice: None,
    }
  }

  /// Install a freshly fetched preview with every warning unacknowledged.
  pub fn install_preview(&mut self, preview: ImpactSummary) {
    self.acknowledged_warnings = vec![false; preview.warnings.len()];
    self.impact_preview = Some(preview);
  }

  /// Drop the preview together with the acknowledgements derived from it.
  pub fn clear_preview(&mut self) {
    self.impact_preview = None;
    self.acknowledged_warnings.clear();
  }

  /// Raise the progress signal; it never goes down within one execution.
  pub fn advance_progress(&mut self, percent: u8) {
    self.progress = self.progress.max(percent.min(100));
  }
}
