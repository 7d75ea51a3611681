//! Execution coordinator: the single point of no return.

use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

use purgeguard_service::{ExecuteRequest, PurgeService, ServiceError};
use purgeguard_workflow::{
  Actor, ExecutionStatus, ResultSummary, Step, WorkflowState, first_unsatisfied_step,
};
use tracing::{error, info, instrument};

use crate::error::{RequestKind, WorkflowError};
use crate::events::ProgressStage;

/// Fires the destructive request and maps its outcome to a [`ResultSummary`].
///
/// The coordinator never retries. One `dispatch` is at most one request.
pub struct ExecutionCoordinator {
  service: Arc<dyn PurgeService>,
  timeout_ms: u64,
}

impl ExecutionCoordinator {
  pub fn new(service: Arc<dyn PurgeService>, timeout_ms: u64) -> Self {
    Self {
      service,
      timeout_ms,
    }
  }

  /// Re-check every precondition against `state` and build the request.
  ///
  /// The controller only calls this with gates it already checked; the
  /// check is repeated here and fails closed.
  pub fn prepare(&self, state: &WorkflowState, actor: &Actor) -> Result<ExecuteRequest, WorkflowError> {
    match state.execution_status {
      ExecutionStatus::InProgress => {
        return Err(WorkflowError::RequestInFlight {
          kind: RequestKind::Execution,
        });
      }
      ExecutionStatus::Succeeded => return Err(WorkflowError::AlreadySucceeded),
      ExecutionStatus::Idle | ExecutionStatus::Failed => {}
    }

    if state.current_step_index != Step::Execute.index() {
      return Err(WorkflowError::WrongStep {
        expected: Step::Execute,
        actual: state.current_step_index,
      });
    }

    if let Some(step) = first_unsatisfied_step(state, Step::Execute.index()) {
      return Err(WorkflowError::GateNotSatisfied { step });
    }

    let target_id = state
      .target_resource_id
      .clone()
      .ok_or(WorkflowError::NoTarget)?;

    Ok(ExecuteRequest {
      target_id,
      confirmation_phrase: state.confirmation_phrase_input.clone(),
      actor_id: actor.id.clone(),
      actor_label: actor.label.clone(),
    })
  }

  /// Send the request once and wait for exactly one outcome.
  ///
  /// Never fails: service errors, transport errors and the timeout all
  /// become a failed summary. `on_progress` receives lifecycle stages in
  /// order.
  #[instrument(
    name = "execution_dispatch",
    skip(self, request, on_progress),
    fields(
      attempt_id = %attempt_id,
      target_id = %request.target_id,
    )
  )]
  pub async fn dispatch<F>(&self, attempt_id: &str, request: &ExecuteRequest, on_progress: F) -> ResultSummary
  where
    F: Fn(ProgressStage) + Send + Sync,
  {
    info!(actor_id = %request.actor_id, "execution_started");
    on_progress(ProgressStage::Sent);

    let call = tokio::time::timeout(
      Duration::from_millis(self.timeout_ms),
      self.service.execute_destructive_operation(request),
    );
    tokio::pin!(call);

    let outcome = match futures::poll!(call.as_mut()) {
      Poll::Ready(outcome) => outcome,
      Poll::Pending => {
        on_progress(ProgressStage::AwaitingResponse);
        call.await
      }
    };
    on_progress(ProgressStage::Completed);

    let result = match outcome {
      Ok(Ok(summary)) if summary.is_succeeded() => summary,
      Ok(Ok(_)) => ResultSummary::failed("service returned an unsuccessful result"),
      Ok(Err(e)) => ResultSummary::failed(e.user_message()),
      Err(_) => ResultSummary::failed(
        ServiceError::Timeout {
          timeout_ms: self.timeout_ms,
        }
        .user_message(),
      ),
    };

    if result.is_succeeded() {
      info!(
        total_affected = result.total_affected(),
        audit_reference = result.audit_reference().unwrap_or(""),
        "execution_succeeded"
      );
    } else {
      error!(
        error = result.error_message().unwrap_or(""),
        "execution_failed"
      );
    }

    result
  }
}
