use serde::{Deserialize, Serialize};

use crate::state::{ExecutionStatus, WorkflowState};

/// The fixed steps of the workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
  SelectTarget,
  ReviewImpact,
  VerifyIdentity,
  FinalConfirmation,
  Execute,
}

/// Number of real steps.
pub const STEP_COUNT: usize = 5;

/// Virtual index of the result screen, one past the last step.
pub const RESULT_INDEX: usize = STEP_COUNT;

/// Static descriptor of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowStep {
  pub index: usize,
  pub label: &'static str,
  pub step: Step,
}

impl WorkflowStep {
  pub fn can_advance(&self, state: &WorkflowState) -> bool {
    self.step.can_advance(state)
  }
}

/// The step table. Indices are contiguous and match array positions.
pub static STEPS: [WorkflowStep; STEP_COUNT] = [
  WorkflowStep {
    index: 0,
    label: "Select Target",
    step: Step::SelectTarget,
  },
  WorkflowStep {
    index: 1,
    label: "Review Impact",
    step: Step::ReviewImpact,
  },
  WorkflowStep {
    index: 2,
    label: "Verify Identity",
    step: Step::VerifyIdentity,
  },
  WorkflowStep {
    index: 3,
    label: "Final Confirmation",
    step: Step::FinalConfirmation,
  },
  WorkflowStep {
    index: 4,
    label: "Execute",
    step: Step::Execute,
  },
];

impl Step {
  pub fn index(self) -> usize {
    match self {
      Step::SelectTarget => 0,
      Step::ReviewImpact => 1,
      Step::VerifyIdentity => 2,
      Step::FinalConfirmation => 3,
      Step::Execute => 4,
    }
  }

  pub fn from_index(index: usize) -> Option<Step> {
    STEPS.get(index).map(|s| s.step)
  }

  pub fn label(self) -> &'static str {
    STEPS[self.index()].label
  }

  /// Whether the workflow may move past this step.
  ///
  /// Total over any state: a missing preview simply makes the predicates
  /// that depend on it false.
  pub fn can_advance(self, state: &WorkflowState) -> bool {
    match self {
      Step::SelectTarget => state.target_resource_id.is_some() && state.impact_preview.is_some(),
      Step::ReviewImpact => state.warnings_acknowledged(),
      Step::VerifyIdentity => state.identity_verified,
      Step::FinalConfirmation => state.phrase_confirmed() && state.final_consent_checked,
      // Leaving the execute step is the result of execution, never a "next".
      Step::Execute => state.execution_status == ExecutionStatus::Succeeded,
    }
  }
}

impl std::fmt::Display for Step {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_table_is_contiguous() {
    for (i, step) in STEPS.iter().enumerate() {
      assert_eq!(step.index, i);
      assert_eq!(step.step.index(), i);
      assert_eq!(Step::from_index(i), Some(step.step));
    }
    assert_eq!(Step::from_index(RESULT_INDEX), None);
  }

  #[test]
  fn test_fresh_state_satisfies_nothing() {
    let state = WorkflowState::new("attempt", "DELETE SCHOOL DATA");
    for step in &STEPS {
      assert!(!step.can_advance(&state), "{} should be closed", step.label);
    }
  }

  #[test]
  fn test_labels() {
    assert_eq!(Step::VerifyIdentity.to_string(), "Verify Identity");
    assert_eq!(Step::Execute.label(), "Execute");
  }
}
