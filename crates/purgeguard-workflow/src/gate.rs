//! Gate evaluation.

use crate::state::WorkflowState;
use crate::step::{RESULT_INDEX, STEPS, Step};

/// Uppercase and trim. Inner whitespace is kept as typed.
pub fn normalize_phrase(input: &str) -> String {
  input.trim().to_uppercase()
}

/// Exact comparison of two phrases after normalisation.
pub fn phrase_matches(input: &str, required: &str) -> bool {
  normalize_phrase(input) == normalize_phrase(required)
}

/// Whether the workflow may move from its current step to `target_index`.
///
/// Moving backwards (or staying put) is always allowed. Moving forwards
/// requires the gate of every step before `target_index` to hold right now,
/// so a satisfiable later gate never lets an unsatisfied earlier one be
/// skipped. Indices past the result screen are never reachable.
pub fn can_proceed_to_step(state: &WorkflowState, target_index: usize) -> bool {
  if target_index <= state.current_step_index {
    return true;
  }
  target_index <= RESULT_INDEX && first_unsatisfied_step(state, target_index).is_none()
}

/// The earliest step before `target_index` whose gate does not hold.
pub fn first_unsatisfied_step(state: &WorkflowState, target_index: usize) -> Option<Step> {
  STEPS
    .iter()
    .take(target_index.min(RESULT_INDEX))
    .find(|s| !s.can_advance(state))
    .map(|s| s.step)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::impact::ImpactSummary;

  const PHRASE: &str = "DELETE SCHOOL DATA";

  fn preview(warnings: usize) -> ImpactSummary {
    ImpactSummary {
      target_label: "Hillcrest".to_string(),
      affected_groups: vec![],
      total_record_count: 0,
      warnings: (0..warnings).map(|i| format!("warning {}", i)).collect(),
    }
  }

  fn ready_for_execute() -> WorkflowState {
    let mut state = WorkflowState::new("a", PHRASE);
    state.target_resource_id = Some("school-1".to_string());
    state.install_preview(preview(0));
    state.identity_verified = true;
    state.set_confirmation_phrase(PHRASE);
    state.set_final_consent(true);
    state
  }

  #[test]
  fn test_phrase_case_insensitive() {
    assert!(phrase_matches("delete school data", PHRASE));
    assert!(phrase_matches("  Delete School Data\n", PHRASE));
  }

  #[test]
  fn test_phrase_rejects_inner_whitespace_and_substrings() {
    assert!(!phrase_matches("DELETE  SCHOOL DATA", PHRASE));
    assert!(!phrase_matches("DELETE SCHOOL", PHRASE));
    assert!(!phrase_matches("DELETE SCHOOL DATA!", PHRASE));
    assert!(!phrase_matches("", PHRASE));
  }

  #[test]
  fn test_backward_always_allowed() {
    let mut state = WorkflowState::new("a", PHRASE);
    state.current_step_index = 3;
    assert!(can_proceed_to_step(&state, 0));
    assert!(can_proceed_to_step(&state, 3));
  }

  #[test]
  fn test_cannot_skip_unsatisfied_gate() {
    let mut state = ready_for_execute();
    state.identity_verified = false;
    state.current_step_index = 1;

    // Final confirmation is satisfied, identity is not.
    assert!(can_proceed_to_step(&state, 2));
    assert!(!can_proceed_to_step(&state, 3));
    assert!(!can_proceed_to_step(&state, 4));
    assert_eq!(
      first_unsatisfied_step(&state, 4),
      Some(Step::VerifyIdentity)
    );
  }

  #[test]
  fn test_all_gates_open_reaches_execute_not_result() {
    let state = ready_for_execute();
    assert!(can_proceed_to_step(&state, 4));
    assert!(!can_proceed_to_step(&state, RESULT_INDEX));
    assert!(!can_proceed_to_step(&state, RESULT_INDEX + 1));
  }

  #[test]
  fn test_three_warnings_need_three_acknowledgements() {
    let mut state = WorkflowState::new("a", PHRASE);
    state.target_resource_id = Some("school-1".to_string());
    state.install_preview(preview(3));
    state.current_step_index = 1;

    state.acknowledge_warning(0, true).unwrap();
    state.acknowledge_warning(2, true).unwrap();
    assert!(!Step::ReviewImpact.can_advance(&state));
    assert!(!can_proceed_to_step(&state, 2));

    state.acknowledge_warning(1, true).unwrap();
    assert!(Step::ReviewImpact.can_advance(&state));
    assert!(can_proceed_to_step(&state, 2));
  }

  #[test]
  fn test_revoked_acknowledgement_closes_later_gates() {
    let mut state = ready_for_execute();
    state.install_preview(preview(1));
    state.acknowledge_warning(0, true).unwrap();
    state.current_step_index = 3;
    assert!(can_proceed_to_step(&state, 4));

    state.acknowledge_warning(0, false).unwrap();
    assert!(!can_proceed_to_step(&state, 4));
  }
}
