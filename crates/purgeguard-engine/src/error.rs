//! Controller error types.

use std::fmt;

use purgeguard_service::ServiceError;
use purgeguard_workflow::{ConsentError, IntegrityError, Step};
use serde::{Deserialize, Serialize};

/// Kind of collaborator request, for the one-in-flight-per-kind rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
  TargetList,
  Preview,
  Identity,
  Execution,
}

impl fmt::Display for RequestKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      RequestKind::TargetList => "target list",
      RequestKind::Preview => "impact preview",
      RequestKind::Identity => "identity verification",
      RequestKind::Execution => "execution",
    })
  }
}

/// Errors returned by [`WorkflowController`](crate::WorkflowController) operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
  /// A request of the same kind has not settled yet.
  #[error("a {kind} request is already in flight")]
  RequestInFlight { kind: RequestKind },

  /// The target can only be chosen on the first step.
  #[error("target is locked while on step {step}")]
  TargetLocked { step: usize },

  #[error("unknown target: {target_id}")]
  UnknownTarget { target_id: String },

  #[error("no target selected")]
  NoTarget,

  /// The workflow was reset or retargeted while the request was in flight;
  /// its response was discarded.
  #[error("{kind} response discarded: workflow changed while it was in flight")]
  Superseded { kind: RequestKind },

  /// Execution already succeeded; only a reset leaves the result state.
  #[error("execution already succeeded; reset the workflow to start again")]
  AlreadySucceeded,

  /// Consent fields are frozen while executing and after success.
  #[error("consent can no longer be changed")]
  ConsentLocked,

  #[error("execution requires being on step '{expected}', currently on step {actual}")]
  WrongStep { expected: Step, actual: usize },

  /// Fail-closed precondition check before the destructive call.
  #[error("gate for step '{step}' is not satisfied")]
  GateNotSatisfied { step: Step },

  #[error(transparent)]
  Consent(#[from] ConsentError),

  #[error("impact preview failed integrity check: {0}")]
  Integrity(#[from] IntegrityError),

  #[error("service call failed: {0}")]
  Service(#[from] ServiceError),
}
