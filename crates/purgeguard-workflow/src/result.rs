use serde::{Deserialize, Serialize};

/// Records removed from one group by a successful execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedGroup {
  pub name: String,
  pub deleted_count: u64,
}

/// Terminal outcome of one execution attempt.
///
/// Built only through [`ResultSummary::succeeded`] or [`ResultSummary::failed`]
/// so the success-only and failure-only fields never mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
  succeeded: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  affected_groups: Option<Vec<DeletedGroup>>,
  total_affected: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  error_message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  audit_reference: Option<String>,
}

impl ResultSummary {
  /// A successful execution. When `total_affected` is `None` it is the sum
  /// of the group counts.
  pub fn succeeded(
    affected_groups: Vec<DeletedGroup>,
    total_affected: Option<u64>,
    audit_reference: Option<String>,
  ) -> Self {
    let total_affected = total_affected.unwrap_or_else(|| {
      affected_groups
        .iter()
        .fold(0u64, |acc, g| acc.saturating_add(g.deleted_count))
    });
    Self {
      succeeded: true,
      affected_groups: Some(affected_groups),
      total_affected,
      error_message: None,
      audit_reference,
    }
  }

  pub fn failed(error_message: impl Into<String>) -> Self {
    Self {
      succeeded: false,
      affected_groups: None,
      total_affected: 0,
      error_message: Some(error_message.into()),
      audit_reference: None,
    }
  }

  pub fn is_succeeded(&self) -> bool {
    self.succeeded
  }

  pub fn affected_groups(&self) -> Option<&[DeletedGroup]> {
    self.affected_groups.as_deref()
  }

  pub fn total_affected(&self) -> u64 {
    self.total_affected
  }

  pub fn error_message(&self) -> Option<&str> {
    self.error_message.as_deref()
  }

  pub fn audit_reference(&self) -> Option<&str> {
    self.audit_reference.as_deref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_succeeded_sums_groups_when_total_missing() {
    let result = ResultSummary::succeeded(
      vec![
        DeletedGroup {
          name: "students".to_string(),
          deleted_count: 10,
        },
        DeletedGroup {
          name: "fees".to_string(),
          deleted_count: 5,
        },
      ],
      None,
      Some("audit-1".to_string()),
    );
    assert!(result.is_succeeded());
    assert_eq!(result.total_affected(), 15);
    assert_eq!(result.error_message(), None);
    assert_eq!(result.audit_reference(), Some("audit-1"));
  }

  #[test]
  fn test_failed_carries_only_message() {
    let result = ResultSummary::failed("lock held");
    assert!(!result.is_succeeded());
    assert_eq!(result.error_message(), Some("lock held"));
    assert_eq!(result.affected_groups(), None);
    assert_eq!(result.total_affected(), 0);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
      json,
      serde_json::json!({"succeeded": false, "totalAffected": 0, "errorMessage": "lock held"})
    );
  }
}
