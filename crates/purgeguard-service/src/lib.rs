//! Purgeguard Service
//!
//! The boundary between the confirmation workflow and the service that owns
//! the data. The [`PurgeService`] trait defines the four calls the workflow
//! makes:
//! - listing the targets an operator may purge
//! - fetching the impact preview of one target
//! - re-verifying the operator's identity
//! - executing the destructive operation
//!
//! Raw payloads are parsed into typed values here, so nothing past this
//! crate sees untyped JSON.

mod credential;
mod error;
mod http;
mod memory;
mod wire;

pub use credential::Credential;
pub use error::ServiceError;
pub use http::HttpPurgeService;
pub use memory::{CallCounts, InMemoryPurgeService};

use async_trait::async_trait;
use purgeguard_workflow::{ImpactSummary, ResultSummary, Target};
use serde::Serialize;

/// Parameters of the destructive call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
  pub target_id: String,
  /// The phrase as the operator typed it.
  pub confirmation_phrase: String,
  pub actor_id: String,
  pub actor_label: String,
}

/// Operations the workflow consumes from the purge service.
#[async_trait]
pub trait PurgeService: Send + Sync {
  /// List the targets available for purging.
  async fn list_targets(&self) -> Result<Vec<Target>, ServiceError>;

  /// Describe what purging `target_id` would remove.
  async fn fetch_impact_preview(&self, target_id: &str) -> Result<ImpactSummary, ServiceError>;

  /// Check the operator's credential. `Ok(())` means verified; a rejected
  /// credential is [`ServiceError::InvalidCredential`].
  async fn verify_identity(&self, actor_id: &str, credential: &Credential) -> Result<(), ServiceError>;

  /// Perform the irreversible operation. Returns a succeeded summary; every
  /// failure is an error.
  async fn execute_destructive_operation(
    &self,
    request: &ExecuteRequest,
  ) -> Result<ResultSummary, ServiceError>;
}
