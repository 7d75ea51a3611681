use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use purgeguard_workflow::{DeletedGroup, ImpactSummary, ResultSummary, Target};
use tracing::info;

use crate::credential::Credential;
use crate::error::ServiceError;
use crate::{ExecuteRequest, PurgeService};

/// Number of calls received per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
  pub list_targets: usize,
  pub fetch_impact_preview: usize,
  pub verify_identity: usize,
  pub execute: usize,
}

#[derive(Default)]
struct Records {
  targets: Vec<(Target, ImpactSummary)>,
  passwords: HashMap<String, String>,
  execute_failure: Option<String>,
}

/// In-memory [`PurgeService`].
///
/// Holds targets with their impact summaries and per-actor passwords. A
/// successful execution removes the target. Every call is counted.
#[derive(Default)]
pub struct InMemoryPurgeService {
  records: Mutex<Records>,
  calls: Mutex<CallCounts>,
}

impl InMemoryPurgeService {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a target and the preview returned for it. The preview is served
  /// as-is, consistent or not.
  pub fn with_target(self, target: Target, preview: ImpactSummary) -> Self {
    lock(&self.records).targets.push((target, preview));
    self
  }

  pub fn with_password(self, actor_id: impl Into<String>, password: impl Into<String>) -> Self {
    lock(&self.records)
      .passwords
      .insert(actor_id.into(), password.into());
    self
  }

  /// Make every following execution fail with `message`.
  pub fn fail_executions(&self, message: impl Into<String>) {
    lock(&self.records).execute_failure = Some(message.into());
  }

  pub fn clear_execute_failure(&self) {
    lock(&self.records).execute_failure = None;
  }

  pub fn calls(&self) -> CallCounts {
    *lock(&self.calls)
  }

  /// Whether `target_id` is still present.
  pub fn contains(&self, target_id: &str) -> bool {
    lock(&self.records)
      .targets
      .iter()
      .any(|(t, _)| t.id == target_id)
  }
}

#[async_trait]
impl PurgeService for InMemoryPurgeService {
  async fn list_targets(&self) -> Result<Vec<Target>, ServiceError> {
    lock(&self.calls).list_targets += 1;

    Ok(
      lock(&self.records)
        .targets
        .iter()
        .map(|(t, _)| t.clone())
        .collect(),
    )
  }

  async fn fetch_impact_preview(&self, target_id: &str) -> Result<ImpactSummary, ServiceError> {
    lock(&self.calls).fetch_impact_preview += 1;

    lock(&self.records)
      .targets
      .iter()
      .find(|(t, _)| t.id == target_id)
      .map(|(_, preview)| preview.clone())
      .ok_or_else(|| ServiceError::NotFound(target_id.to_string()))
  }

  async fn verify_identity(&self, actor_id: &str, credential: &Credential) -> Result<(), ServiceError> {
    lock(&self.calls).verify_identity += 1;

    match lock(&self.records).passwords.get(actor_id) {
      Some(password) if password == credential.expose() => Ok(()),
      _ => Err(ServiceError::InvalidCredential),
    }
  }

  async fn execute_destructive_operation(
    &self,
    request: &ExecuteRequest,
  ) -> Result<ResultSummary, ServiceError> {
    lock(&self.calls).execute += 1;

    let mut records = lock(&self.records);
    if let Some(message) = &records.execute_failure {
      return Err(ServiceError::Service(message.clone()));
    }

    let position = records
      .targets
      .iter()
      .position(|(t, _)| t.id == request.target_id)
      .ok_or_else(|| ServiceError::NotFound(request.target_id.clone()))?;
    let (_, preview) = records.targets.remove(position);

    let groups: Vec<DeletedGroup> = preview
      .affected_groups
      .iter()
      .map(|g| DeletedGroup {
        name: g.name.clone(),
        deleted_count: g.record_count,
      })
      .collect();
    let audit_reference = format!("audit-{}", uuid::Uuid::new_v4());

    info!(
      target_id = %request.target_id,
      actor_id = %request.actor_id,
      audit_reference = %audit_reference,
      "target purged"
    );

    Ok(ResultSummary::succeeded(groups, None, Some(audit_reference)))
  }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
  use purgeguard_workflow::AffectedGroup;

  use super::*;

  fn service() -> InMemoryPurgeService {
    InMemoryPurgeService::new()
      .with_target(
        Target::new("s1", "Maple Elementary"),
        ImpactSummary {
          target_label: "Maple Elementary".to_string(),
          affected_groups: vec![
            AffectedGroup {
              name: "students".to_string(),
              display_name: "Students".to_string(),
              record_count: 3,
              description: String::new(),
            },
            AffectedGroup {
              name: "invoices".to_string(),
              display_name: "Invoices".to_string(),
              record_count: 4,
              description: String::new(),
            },
          ],
          total_record_count: 7,
          warnings: vec![],
        },
      )
      .with_password("admin", "secret")
  }

  fn request(target_id: &str) -> ExecuteRequest {
    ExecuteRequest {
      target_id: target_id.to_string(),
      confirmation_phrase: "DELETE SCHOOL DATA".to_string(),
      actor_id: "admin".to_string(),
      actor_label: "Admin".to_string(),
    }
  }

  #[tokio::test]
  async fn test_execute_removes_target() {
    let service = service();
    let result = service
      .execute_destructive_operation(&request("s1"))
      .await
      .unwrap();

    assert!(result.is_succeeded());
    assert_eq!(result.total_affected(), 7);
    assert!(result.audit_reference().unwrap().starts_with("audit-"));
    assert!(!service.contains("s1"));
    assert!(service.list_targets().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_forced_failure_keeps_target() {
    let service = service();
    service.fail_executions("lock held");

    let err = service
      .execute_destructive_operation(&request("s1"))
      .await
      .unwrap_err();
    assert_eq!(err.user_message(), "lock held");
    assert!(service.contains("s1"));

    service.clear_execute_failure();
    assert!(
      service
        .execute_destructive_operation(&request("s1"))
        .await
        .is_ok()
    );
    assert_eq!(service.calls().execute, 2);
  }

  #[tokio::test]
  async fn test_verify_identity() {
    let service = service();
    assert!(
      service
        .verify_identity("admin", &Credential::new("secret"))
        .await
        .is_ok()
    );
    assert!(matches!(
      service
        .verify_identity("admin", &Credential::new("nope"))
        .await,
      Err(ServiceError::InvalidCredential)
    ));
    assert!(matches!(
      service
        .verify_identity("ghost", &Credential::new("secret"))
        .await,
      Err(ServiceError::InvalidCredential)
    ));
    assert_eq!(service.calls().verify_identity, 3);
  }

  #[tokio::test]
  async fn test_unknown_preview() {
    let service = service();
    assert!(matches!(
      service.fetch_impact_preview("missing").await,
      Err(ServiceError::NotFound(id)) if id == "missing"
    ));
  }
}
