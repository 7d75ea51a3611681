//! Workflow controller.
//!
//! The [`WorkflowController`] owns the single live [`WorkflowState`] of an
//! attempt and is the only thing that mutates it. It is a cheap, cloneable
//! handle so a UI and background tasks can share one workflow; every method
//! takes `&self` and the state lock is never held across an await.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use purgeguard_config::{IdentityScope, WorkflowConfig};
use purgeguard_service::{Credential, PurgeService, ServiceError};
use purgeguard_workflow::{
  Actor, ExecutionStatus, Notice, NoticeKind, RESULT_INDEX, ResultSummary, Step, Target,
  WorkflowState, can_proceed_to_step,
};
use tracing::{debug, error, info, instrument, warn};

use crate::coordinator::ExecutionCoordinator;
use crate::error::{RequestKind, WorkflowError};
use crate::events::{NoopNotifier, ProgressStage, ResetReason, WorkflowEvent, WorkflowNotifier};

/// Outstanding collaborator requests, at most one per kind.
#[derive(Debug, Default)]
struct InFlight {
  targets: bool,
  preview: bool,
  identity: bool,
}

struct Inner {
  state: WorkflowState,
  targets: Option<Vec<Target>>,
  in_flight: InFlight,
  /// Bumped on every target selection and reset.
  target_epoch: u64,
  /// Bumped on every reset.
  attempt_epoch: u64,
}

struct Shared {
  service: Arc<dyn PurgeService>,
  notifier: Arc<dyn WorkflowNotifier>,
  coordinator: ExecutionCoordinator,
  actor: Actor,
  config: WorkflowConfig,
  inner: Mutex<Inner>,
}

/// Drives one guarded destructive operation from target selection to result.
#[derive(Clone)]
pub struct WorkflowController {
  shared: Arc<Shared>,
}

impl WorkflowController {
  /// Create a controller that discards events.
  pub fn new(service: Arc<dyn PurgeService>, actor: Actor, config: WorkflowConfig) -> Self {
    Self::with_notifier(service, actor, config, Arc::new(NoopNotifier))
  }

  pub fn with_notifier(
    service: Arc<dyn PurgeService>,
    actor: Actor,
    config: WorkflowConfig,
    notifier: Arc<dyn WorkflowNotifier>,
  ) -> Self {
    let coordinator = ExecutionCoordinator::new(service.clone(), config.execution_timeout_ms);
    let state = WorkflowState::new(new_attempt_id(), config.required_phrase.clone());

    Self {
      shared: Arc::new(Shared {
        service,
        notifier,
        coordinator,
        actor,
        config,
        inner: Mutex::new(Inner {
          state,
          targets: None,
          in_flight: InFlight::default(),
          target_epoch: 0,
          attempt_epoch: 0,
        }),
      }),
    }
  }

  /// A copy of the current state, for rendering.
  pub fn snapshot(&self) -> WorkflowState {
    self.lock().state.clone()
  }

  /// Targets from the last successful [`load_targets`](Self::load_targets).
  pub fn targets(&self) -> Option<Vec<Target>> {
    self.lock().targets.clone()
  }

  /// The current step, or `None` on the result screen.
  pub fn current_step(&self) -> Option<Step> {
    Step::from_index(self.lock().state.current_step_index)
  }

  pub fn actor(&self) -> &Actor {
    &self.shared.actor
  }

  pub fn config(&self) -> &WorkflowConfig {
    &self.shared.config
  }

  pub fn dismiss_notice(&self) {
    self.lock().state.notice = None;
  }

  /// Fetch the list of targets. Called when the workflow is entered and
  /// after every reset.
  #[instrument(name = "load_targets", skip(self))]
  pub async fn load_targets(&self) -> Result<Vec<Target>, WorkflowError> {
    {
      let mut inner = self.lock();
      if inner.in_flight.targets {
        return Err(WorkflowError::RequestInFlight {
          kind: RequestKind::TargetList,
        });
      }
      inner.in_flight.targets = true;
    }

    let result = self.shared.service.list_targets().await;

    let mut inner = self.lock();
    inner.in_flight.targets = false;
    match result {
      Ok(targets) => {
        inner.targets = Some(targets.clone());
        drop(inner);

        info!(count = targets.len(), "targets_loaded");
        self.notify(WorkflowEvent::TargetsLoaded {
          count: targets.len(),
        });
        Ok(targets)
      }
      Err(e) => {
        warn!(error = %e, "targets_load_failed");
        let err = WorkflowError::from(e);
        inner.state.notice = Some(notice_for(&err));
        Err(err)
      }
    }
  }

  /// Choose the target and fetch its impact preview.
  ///
  /// Only allowed on the first step. The previous preview, its
  /// acknowledgements and any execution outcome are cleared before the
  /// fetch starts; under [`IdentityScope::PerTarget`] so is the identity
  /// verification. A preview that fails its integrity check is not
  /// installed, which keeps the workflow on the first step.
  #[instrument(name = "select_target", skip(self), fields(target_id = %target_id))]
  pub async fn select_target(&self, target_id: &str) -> Result<(), WorkflowError> {
    let (epoch, attempt_id) = {
      let mut guard = self.lock();
      let inner = &mut *guard;
      ensure_not_executing(&inner.state)?;

      if inner.state.current_step_index != Step::SelectTarget.index() {
        return Err(WorkflowError::TargetLocked {
          step: inner.state.current_step_index,
        });
      }
      if inner.in_flight.preview {
        return Err(WorkflowError::RequestInFlight {
          kind: RequestKind::Preview,
        });
      }
      if let Some(targets) = &inner.targets
        && !targets.iter().any(|t| t.id == target_id)
      {
        return Err(WorkflowError::UnknownTarget {
          target_id: target_id.to_string(),
        });
      }

      let state = &mut inner.state;
      state.target_resource_id = Some(target_id.to_string());
      state.clear_preview();
      state.execution_status = ExecutionStatus::Idle;
      state.execution_result = None;
      state.progress = 0;
      state.notice = None;

      inner.target_epoch += 1;
      if self.shared.config.identity_scope == IdentityScope::PerTarget {
        inner.state.identity_verified = false;
        inner.in_flight.identity = false;
      }
      inner.in_flight.preview = true;

      (inner.target_epoch, inner.state.attempt_id.clone())
    };

    info!(attempt_id = %attempt_id, "target_selected");
    self.notify(WorkflowEvent::TargetSelected {
      attempt_id: attempt_id.clone(),
      target_id: target_id.to_string(),
    });

    let result = self.shared.service.fetch_impact_preview(target_id).await;

    let mut inner = self.lock();
    if inner.target_epoch != epoch {
      debug!(attempt_id = %attempt_id, "stale impact preview discarded");
      return Err(WorkflowError::Superseded {
        kind: RequestKind::Preview,
      });
    }
    inner.in_flight.preview = false;

    let checked = result
      .map_err(WorkflowError::from)
      .and_then(|preview| preview.validate().map(|_| preview).map_err(WorkflowError::from));

    match checked {
      Ok(preview) => {
        let event = WorkflowEvent::PreviewLoaded {
          attempt_id,
          target_id: target_id.to_string(),
          total_record_count: preview.total_record_count,
          warning_count: preview.warnings.len(),
        };
        inner.state.install_preview(preview);
        drop(inner);

        info!("impact_preview_loaded");
        self.notify(event);
        Ok(())
      }
      Err(err) => {
        if matches!(err, WorkflowError::Integrity(_)) {
          error!(attempt_id = %attempt_id, error = %err, "impact_preview_integrity_failed");
        } else {
          warn!(attempt_id = %attempt_id, error = %err, "impact_preview_failed");
        }
        inner.state.notice = Some(notice_for(&err));
        drop(inner);

        self.notify(WorkflowEvent::PreviewRejected {
          attempt_id,
          target_id: target_id.to_string(),
          error: err.to_string(),
        });
        Err(err)
      }
    }
  }

  /// Re-verify the operator's identity.
  ///
  /// Once verified, further calls return `Ok` without contacting the
  /// service until the verification is invalidated.
  #[instrument(name = "verify_identity", skip(self, credential), fields(actor_id = %self.shared.actor.id))]
  pub async fn verify_identity(&self, credential: &Credential) -> Result<(), WorkflowError> {
    let (epoch, attempt_id) = {
      let mut inner = self.lock();
      ensure_not_executing(&inner.state)?;

      if inner.state.target_resource_id.is_none() {
        return Err(WorkflowError::NoTarget);
      }
      if inner.state.identity_verified {
        debug!("identity already verified");
        return Ok(());
      }
      if inner.in_flight.identity {
        return Err(WorkflowError::RequestInFlight {
          kind: RequestKind::Identity,
        });
      }
      inner.in_flight.identity = true;

      (self.identity_epoch(&inner), inner.state.attempt_id.clone())
    };

    let result = self
      .shared
      .service
      .verify_identity(&self.shared.actor.id, credential)
      .await;

    let mut inner = self.lock();
    if self.identity_epoch(&inner) != epoch {
      debug!(attempt_id = %attempt_id, "stale identity verification discarded");
      return Err(WorkflowError::Superseded {
        kind: RequestKind::Identity,
      });
    }
    inner.in_flight.identity = false;

    match result {
      Ok(()) => {
        inner.state.identity_verified = true;
        inner.state.notice = None;
        drop(inner);

        info!(attempt_id = %attempt_id, "identity_verified");
        self.notify(WorkflowEvent::IdentityVerified { attempt_id });
        Ok(())
      }
      Err(e) => {
        warn!(attempt_id = %attempt_id, error = %e, "identity_rejected");
        let err = WorkflowError::from(e);
        inner.state.notice = Some(notice_for(&err));
        drop(inner);

        self.notify(WorkflowEvent::IdentityRejected {
          attempt_id,
          error: err.to_string(),
        });
        Err(err)
      }
    }
  }

  /// Set or clear the acknowledgement of the warning at `index`.
  pub fn acknowledge_warning(&self, index: usize, acknowledged: bool) -> Result<(), WorkflowError> {
    let mut inner = self.lock();
    ensure_consent_open(&inner.state)?;
    inner.state.acknowledge_warning(index, acknowledged)?;
    Ok(())
  }

  /// Store the typed confirmation phrase as entered.
  pub fn set_confirmation_phrase(&self, input: impl Into<String>) -> Result<(), WorkflowError> {
    let mut inner = self.lock();
    ensure_consent_open(&inner.state)?;
    inner.state.set_confirmation_phrase(input);
    Ok(())
  }

  pub fn set_final_consent(&self, checked: bool) -> Result<(), WorkflowError> {
    let mut inner = self.lock();
    ensure_consent_open(&inner.state)?;
    inner.state.set_final_consent(checked);
    Ok(())
  }

  /// Advance one step if its gate allows. Returns whether the step changed.
  pub fn next(&self) -> bool {
    let target = self.lock().state.current_step_index + 1;
    self.go_to(target)
  }

  /// Go back one step. Collected state is kept.
  pub fn back(&self) -> bool {
    let current = self.lock().state.current_step_index;
    match current.checked_sub(1) {
      Some(target) => self.go_to(target),
      None => false,
    }
  }

  /// Jump to `index`.
  ///
  /// Backwards is always allowed; forwards requires every gate in between
  /// to hold. Nothing moves while executing or after success. Returns
  /// whether the step changed.
  pub fn go_to(&self, index: usize) -> bool {
    let event = {
      let mut inner = self.lock();
      let state = &mut inner.state;

      if matches!(
        state.execution_status,
        ExecutionStatus::InProgress | ExecutionStatus::Succeeded
      ) {
        return false;
      }
      let from = state.current_step_index;
      if index == from {
        return false;
      }
      if index > from && !can_proceed_to_step(state, index) {
        debug!(from, to = index, "navigation blocked by gate");
        return false;
      }

      state.current_step_index = index;
      WorkflowEvent::StepChanged {
        attempt_id: state.attempt_id.clone(),
        from,
        to: index,
      }
    };

    debug!(?event, "step_changed");
    self.notify(event);
    true
  }

  /// Fire the destructive operation.
  ///
  /// Must be on the execute step with every earlier gate satisfied. While a
  /// call is in flight further calls are rejected without reaching the
  /// service. A service failure is not an `Err`: it returns the failed
  /// summary and leaves the workflow in `Failed`, from which `execute` may
  /// be called again as a new attempt.
  #[instrument(name = "execute", skip(self))]
  pub async fn execute(&self) -> Result<ResultSummary, WorkflowError> {
    let (request, attempt_id) = {
      let mut inner = self.lock();
      let request = match self
        .shared
        .coordinator
        .prepare(&inner.state, &self.shared.actor)
      {
        Ok(request) => request,
        Err(err) => {
          warn!(error = %err, "execution_refused");
          return Err(err);
        }
      };

      let state = &mut inner.state;
      state.execution_status = ExecutionStatus::InProgress;
      state.execution_result = None;
      state.progress = 0;
      state.notice = None;
      (request, state.attempt_id.clone())
    };

    let result = self
      .shared
      .coordinator
      .dispatch(&attempt_id, &request, |stage| {
        self.record_progress(&attempt_id, stage)
      })
      .await;

    let mut events = Vec::new();
    {
      let mut guard = self.lock();
      let inner = &mut *guard;
      let state = &mut inner.state;
      state.execution_result = Some(result.clone());

      if result.is_succeeded() {
        state.execution_status = ExecutionStatus::Succeeded;
        let from = state.current_step_index;
        state.current_step_index = RESULT_INDEX;
        events.push(WorkflowEvent::StepChanged {
          attempt_id: attempt_id.clone(),
          from,
          to: RESULT_INDEX,
        });

        if let Some(targets) = inner.targets.as_mut() {
          targets.retain(|t| t.id != request.target_id);
        }
      } else {
        state.execution_status = ExecutionStatus::Failed;
        state.notice = Some(Notice::new(
          NoticeKind::Service,
          result.error_message().unwrap_or("execution failed"),
        ));
        if self.shared.config.reconfirm_after_failure {
          state.clear_confirmation();
        }
      }

      events.push(WorkflowEvent::ExecutionCompleted {
        attempt_id: attempt_id.clone(),
        status: state.execution_status,
      });
    }

    for event in events {
      self.notify(event);
    }
    Ok(result)
  }

  /// Discard all state and start a new attempt on the first step, then
  /// reload the target list.
  pub async fn reset(&self) -> Result<(), WorkflowError> {
    self.restart(ResetReason::Reset).await
  }

  /// Abandon the attempt. Same as [`reset`](Self::reset); nothing has been
  /// sent to the service unless an execution already ran.
  pub async fn cancel(&self) -> Result<(), WorkflowError> {
    self.restart(ResetReason::Cancelled).await
  }

  #[instrument(name = "workflow_restart", skip(self))]
  async fn restart(&self, reason: ResetReason) -> Result<(), WorkflowError> {
    let event = {
      let mut inner = self.lock();
      if inner.state.execution_status == ExecutionStatus::InProgress {
        return Err(WorkflowError::RequestInFlight {
          kind: RequestKind::Execution,
        });
      }

      let previous_attempt_id = inner.state.attempt_id.clone();
      inner.state = WorkflowState::new(new_attempt_id(), self.shared.config.required_phrase.clone());
      inner.target_epoch += 1;
      inner.attempt_epoch += 1;
      inner.in_flight.preview = false;
      inner.in_flight.identity = false;

      WorkflowEvent::WorkflowReset {
        previous_attempt_id,
        attempt_id: inner.state.attempt_id.clone(),
        reason,
      }
    };

    info!(?reason, "workflow_reset");
    self.notify(event);

    match self.load_targets().await {
      Ok(_)
      | Err(WorkflowError::RequestInFlight {
        kind: RequestKind::TargetList,
      }) => Ok(()),
      Err(e) => Err(e),
    }
  }

  fn record_progress(&self, attempt_id: &str, stage: ProgressStage) {
    let percent = {
      let mut inner = self.lock();
      inner.state.advance_progress(stage.percent());
      inner.state.progress
    };
    self.notify(WorkflowEvent::ExecutionProgress {
      attempt_id: attempt_id.to_string(),
      stage,
      percent,
    });
  }

  fn identity_epoch(&self, inner: &Inner) -> u64 {
    match self.shared.config.identity_scope {
      IdentityScope::PerTarget => inner.target_epoch,
      IdentityScope::PerAttempt => inner.attempt_epoch,
    }
  }

  fn notify(&self, event: WorkflowEvent) {
    self.shared.notifier.notify(event);
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self
      .shared
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }
}

fn ensure_not_executing(state: &WorkflowState) -> Result<(), WorkflowError> {
  match state.execution_status {
    ExecutionStatus::InProgress => Err(WorkflowError::RequestInFlight {
      kind: RequestKind::Execution,
    }),
    ExecutionStatus::Succeeded => Err(WorkflowError::AlreadySucceeded),
    ExecutionStatus::Idle | ExecutionStatus::Failed => Ok(()),
  }
}

fn ensure_consent_open(state: &WorkflowState) -> Result<(), WorkflowError> {
  match state.execution_status {
    ExecutionStatus::InProgress | ExecutionStatus::Succeeded => Err(WorkflowError::ConsentLocked),
    ExecutionStatus::Idle | ExecutionStatus::Failed => Ok(()),
  }
}

fn notice_for(err: &WorkflowError) -> Notice {
  match err {
    WorkflowError::Service(ServiceError::InvalidCredential) => {
      Notice::new(NoticeKind::InvalidCredential, err.to_string())
    }
    WorkflowError::Service(e) => Notice::new(NoticeKind::Fetch, e.user_message()),
    WorkflowError::Integrity(e) => Notice::new(NoticeKind::Integrity, e.to_string()),
    other => Notice::new(NoticeKind::Fetch, other.to_string()),
  }
}

fn new_attempt_id() -> String {
  uuid::Uuid::new_v4().to_string()
}
