//! Explicit-consent bookkeeping: warning acknowledgements, the typed
//! confirmation phrase and the final checkbox. Pure state mutation.

use crate::error::ConsentError;
use crate::gate::phrase_matches;
use crate::state::WorkflowState;

impl WorkflowState {
  /// Set or clear the acknowledgement of one warning.
  pub fn acknowledge_warning(&mut self, index: usize, acknowledged: bool) -> Result<(), ConsentError> {
    let count = self
      .impact_preview
      .as_ref()
      .map(|p| p.warnings.len())
      .ok_or(ConsentError::NoPreview)?;

    // Keep the flags aligned with the warnings even if a caller replaced
    // the preview directly.
    self.acknowledged_warnings.resize(count, false);

    let flag = self
      .acknowledged_warnings
      .get_mut(index)
      .ok_or(ConsentError::WarningOutOfRange { index, count })?;
    *flag = acknowledged;
    Ok(())
  }

  /// Store the typed phrase exactly as entered.
  pub fn set_confirmation_phrase(&mut self, input: impl Into<String>) {
    self.confirmation_phrase_input = input.into();
  }

  pub fn set_final_consent(&mut self, checked: bool) {
    self.final_consent_checked = checked;
  }

  /// Clear the typed phrase and the final checkbox.
  pub fn clear_confirmation(&mut self) {
    self.confirmation_phrase_input.clear();
    self.final_consent_checked = false;
  }

  pub fn acknowledged_count(&self) -> usize {
    self.acknowledged_warnings.iter().filter(|a| **a).count()
  }

  /// True when the preview has no warnings or every one is acknowledged.
  pub fn warnings_acknowledged(&self) -> bool {
    match &self.impact_preview {
      None => false,
      Some(preview) if preview.warnings.is_empty() => true,
      Some(preview) => {
        self.acknowledged_warnings.len() == preview.warnings.len()
          && self.acknowledged_warnings.iter().all(|a| *a)
      }
    }
  }

  pub fn phrase_confirmed(&self) -> bool {
    phrase_matches(&self.confirmation_phrase_input, &self.required_phrase)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::impact::ImpactSummary;

  fn state_with_warnings(n: usize) -> WorkflowState {
    let mut state = WorkflowState::new("a", "DELETE SCHOOL DATA");
    state.install_preview(ImpactSummary {
      target_label: "Elm".to_string(),
      affected_groups: vec![],
      total_record_count: 0,
      warnings: vec!["w".to_string(); n],
    });
    state
  }

  #[test]
  fn test_install_preview_sizes_flags() {
    let state = state_with_warnings(4);
    assert_eq!(state.acknowledged_warnings, vec![false; 4]);
    assert_eq!(state.acknowledged_count(), 0);
  }

  #[test]
  fn test_acknowledge_without_preview() {
    let mut state = WorkflowState::new("a", "X");
    assert_eq!(
      state.acknowledge_warning(0, true),
      Err(ConsentError::NoPreview)
    );
  }

  #[test]
  fn test_acknowledge_out_of_range() {
    let mut state = state_with_warnings(2);
    assert_eq!(
      state.acknowledge_warning(2, true),
      Err(ConsentError::WarningOutOfRange { index: 2, count: 2 })
    );
  }

  #[test]
  fn test_phrase_stored_raw() {
    let mut state = state_with_warnings(0);
    state.set_confirmation_phrase("  delete school data ");
    assert_eq!(state.confirmation_phrase_input, "  delete school data ");
    assert!(state.phrase_confirmed());
  }

  #[test]
  fn test_clear_preview_drops_flags() {
    let mut state = state_with_warnings(3);
    state.acknowledge_warning(1, true).unwrap();
    state.clear_preview();
    assert!(state.impact_preview.is_none());
    assert!(state.acknowledged_warnings.is_empty());
    assert!(!state.warnings_acknowledged());
  }

  #[test]
  fn test_clear_confirmation() {
    let mut state = state_with_warnings(0);
    state.set_confirmation_phrase("DELETE SCHOOL DATA");
    state.set_final_consent(true);
    state.clear_confirmation();
    assert!(!state.phrase_confirmed());
    assert!(!state.final_consent_checked);
  }
}
