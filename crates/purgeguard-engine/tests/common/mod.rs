#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use purgeguard_config::WorkflowConfig;
use purgeguard_engine::{ChannelNotifier, WorkflowController, WorkflowEvent};
use purgeguard_service::{
  Credential, ExecuteRequest, InMemoryPurgeService, PurgeService, ServiceError,
};
use purgeguard_workflow::{AffectedGroup, ImpactSummary, ResultSummary, Step, Target};
use tokio::sync::mpsc;

pub const ACTOR_ID: &str = "admin-1";
pub const PASSWORD: &str = "s3cret";
pub const PHRASE: &str = "DELETE SCHOOL DATA";

fn group(name: &str, count: u64) -> AffectedGroup {
  AffectedGroup {
    name: name.to_string(),
    display_name: name.to_string(),
    record_count: count,
    description: String::new(),
  }
}

fn preview(label: &str, groups: Vec<AffectedGroup>, total: u64, warnings: usize) -> ImpactSummary {
  ImpactSummary {
    target_label: label.to_string(),
    affected_groups: groups,
    total_record_count: total,
    warnings: (0..warnings)
      .map(|i| format!("{} warning {}", label, i))
      .collect(),
  }
}

/// Three schools: `s1` (3 warnings, 200 records), `s2` (1 warning, 50
/// records) and `bad`, whose declared total contradicts its groups.
pub fn service() -> InMemoryPurgeService {
  InMemoryPurgeService::new()
    .with_target(
      Target::new("s1", "Hillcrest High"),
      preview(
        "Hillcrest High",
        vec![group("students", 120), group("grades", 80)],
        200,
        3,
      ),
    )
    .with_target(
      Target::new("s2", "Lakeside Primary"),
      preview("Lakeside Primary", vec![group("students", 50)], 50, 1),
    )
    .with_target(
      Target::new("bad", "Corrupt Academy"),
      preview(
        "Corrupt Academy",
        vec![group("students", 100), group("grades", 100)],
        500,
        0,
      ),
    )
    .with_password(ACTOR_ID, PASSWORD)
}

pub fn actor() -> purgeguard_workflow::Actor {
  purgeguard_workflow::Actor::new(ACTOR_ID, "Alex Admin")
}

pub fn controller(service: Arc<dyn PurgeService>, config: WorkflowConfig) -> WorkflowController {
  WorkflowController::new(service, actor(), config)
}

pub fn controller_with_events(
  service: Arc<dyn PurgeService>,
  config: WorkflowConfig,
) -> (WorkflowController, mpsc::UnboundedReceiver<WorkflowEvent>) {
  let (tx, rx) = mpsc::unbounded_channel();
  let controller =
    WorkflowController::with_notifier(service, actor(), config, Arc::new(ChannelNotifier::new(tx)));
  (controller, rx)
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }
  events
}

pub fn credential() -> Credential {
  Credential::new(PASSWORD)
}

/// Walk a fresh controller from the first step to the review step of `target_id`.
pub async fn drive_to_review(controller: &WorkflowController, target_id: &str) {
  controller.load_targets().await.expect("load targets");
  controller.select_target(target_id).await.expect("select target");
  assert!(controller.next(), "leave select step");
  assert_eq!(controller.current_step(), Some(Step::ReviewImpact));
}

/// Walk a fresh controller all the way to the execute step.
pub async fn drive_to_execute(controller: &WorkflowController, target_id: &str) {
  drive_to_review(controller, target_id).await;

  let warnings = controller.snapshot().acknowledged_warnings.len();
  for i in 0..warnings {
    controller.acknowledge_warning(i, true).expect("acknowledge");
  }
  assert!(controller.next(), "leave review step");

  controller
    .verify_identity(&credential())
    .await
    .expect("verify identity");
  assert!(controller.next(), "leave identity step");

  controller.set_confirmation_phrase(PHRASE).expect("phrase");
  controller.set_final_consent(true).expect("consent");
  assert!(controller.next(), "leave confirmation step");
  assert_eq!(controller.current_step(), Some(Step::Execute));
}

/// Wraps an in-memory service and slows down selected calls.
pub struct SlowService {
  pub inner: Arc<InMemoryPurgeService>,
  pub preview_delay: Duration,
  pub identity_delay: Duration,
  pub execute_delay: Duration,
}

impl SlowService {
  pub fn new(inner: Arc<InMemoryPurgeService>) -> Self {
    Self {
      inner,
      preview_delay: Duration::ZERO,
      identity_delay: Duration::ZERO,
      execute_delay: Duration::ZERO,
    }
  }

  pub fn preview(mut self, delay: Duration) -> Self {
    self.preview_delay = delay;
    self
  }

  pub fn identity(mut self, delay: Duration) -> Self {
    self.identity_delay = delay;
    self
  }

  pub fn execute(mut self, delay: Duration) -> Self {
    self.execute_delay = delay;
    self
  }
}

#[async_trait]
impl PurgeService for SlowService {
  async fn list_targets(&self) -> Result<Vec<Target>, ServiceError> {
    self.inner.list_targets().await
  }

  async fn fetch_impact_preview(&self, target_id: &str) -> Result<ImpactSummary, ServiceError> {
    tokio::time::sleep(self.preview_delay).await;
    self.inner.fetch_impact_preview(target_id).await
  }

  async fn verify_identity(&self, actor_id: &str, credential: &Credential) -> Result<(), ServiceError> {
    tokio::time::sleep(self.identity_delay).await;
    self.inner.verify_identity(actor_id, credential).await
  }

  async fn execute_destructive_operation(
    &self,
    request: &ExecuteRequest,
  ) -> Result<ResultSummary, ServiceError> {
    tokio::time::sleep(self.execute_delay).await;
    self.inner.execute_destructive_operation(request).await
  }
}
