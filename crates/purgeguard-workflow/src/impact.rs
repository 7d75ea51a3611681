use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::IntegrityError;

/// One group of records the operation would remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedGroup {
  pub name: String,
  pub display_name: String,
  pub record_count: u64,
  #[serde(default)]
  pub description: String,
}

/// What a destructive operation would affect, as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
  pub target_label: String,
  pub affected_groups: Vec<AffectedGroup>,
  pub total_record_count: u64,
  #[serde(default)]
  pub warnings: Vec<String>,
}

impl ImpactSummary {
  /// Check that the summary is internally consistent.
  ///
  /// `total_record_count` must equal the sum of the group counts and group
  /// names must be unique.
  pub fn validate(&self) -> Result<(), IntegrityError> {
    let mut seen = HashSet::new();
    for group in &self.affected_groups {
      if !seen.insert(group.name.as_str()) {
        return Err(IntegrityError::DuplicateGroup {
          name: group.name.clone(),
        });
      }
    }

    let computed = self
      .affected_groups
      .iter()
      .try_fold(0u64, |acc, g| acc.checked_add(g.record_count))
      .ok_or(IntegrityError::CountOverflow)?;

    if computed != self.total_record_count {
      return Err(IntegrityError::TotalMismatch {
        declared: self.total_record_count,
        computed,
      });
    }

    Ok(())
  }

  pub fn warning_count(&self) -> usize {
    self.warnings.len()
  }
}
