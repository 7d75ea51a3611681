//! Property tests for the review and confirmation gates.

use proptest::prelude::*;
use purgeguard_workflow::{ImpactSummary, Step, WorkflowState, phrase_matches};

const PHRASE: &str = "DELETE SCHOOL DATA";

fn state_with_warnings(k: usize) -> WorkflowState {
  let mut state = WorkflowState::new("prop", PHRASE);
  state.target_resource_id = Some("school".to_string());
  state.install_preview(ImpactSummary {
    target_label: "School".to_string(),
    affected_groups: vec![],
    total_record_count: 0,
    warnings: (0..k).map(|i| format!("warning {}", i)).collect(),
  });
  state
}

proptest! {
  #[test]
  fn review_gate_closed_until_every_warning_acknowledged(
    (k, acks) in (1usize..=20).prop_flat_map(|k| (Just(k), proptest::collection::vec(any::<bool>(), k)))
  ) {
    let mut state = state_with_warnings(k);
    for (i, ack) in acks.iter().enumerate() {
      state.acknowledge_warning(i, *ack).unwrap();
    }

    let all = acks.iter().all(|a| *a);
    prop_assert_eq!(Step::ReviewImpact.can_advance(&state), all);
    if state.acknowledged_count() < k {
      prop_assert!(!Step::ReviewImpact.can_advance(&state));
    }
  }

  #[test]
  fn review_gate_opens_on_last_acknowledgement(k in 1usize..=20, last in 0usize..20) {
    let last = last % k;
    let mut state = state_with_warnings(k);
    for i in (0..k).filter(|i| *i != last) {
      state.acknowledge_warning(i, true).unwrap();
    }
    prop_assert!(!Step::ReviewImpact.can_advance(&state));

    state.acknowledge_warning(last, true).unwrap();
    prop_assert!(Step::ReviewImpact.can_advance(&state));
  }

  #[test]
  fn phrase_accepts_any_casing(mask in proptest::collection::vec(any::<bool>(), PHRASE.len())) {
    let input: String = PHRASE
      .chars()
      .zip(mask)
      .map(|(c, lower)| if lower { c.to_ascii_lowercase() } else { c })
      .collect();
    prop_assert!(phrase_matches(&input, PHRASE));
  }

  #[test]
  fn phrase_rejects_any_inserted_character(pos in 1usize..PHRASE.len(), c in "[A-Za-z ]") {
    let mut input = PHRASE.to_string();
    input.insert_str(pos, &c);
    prop_assert!(!phrase_matches(&input, PHRASE));
  }

  #[test]
  fn phrase_rejects_proper_prefixes(len in 0usize..PHRASE.len()) {
    prop_assert!(!phrase_matches(&PHRASE[..len], PHRASE));
  }
}
