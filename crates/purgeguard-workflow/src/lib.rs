//! Purgeguard Workflow
//!
//! This crate provides the state model of the guarded destructive-operation
//! workflow: the fixed step table, the gate predicates that decide whether a
//! step may be left, and the consent bookkeeping the operator fills in.
//!
//! Everything here is pure and synchronous. Network calls, in-flight
//! tracking and the execution itself live in `purgeguard-engine`.
//!
//! ```text
//!  0 Select Target ─▶ 1 Review Impact ─▶ 2 Verify Identity ─▶ 3 Final Confirmation ─▶ 4 Execute ─▶ (result)
//! ```

mod actor;
mod consent;
mod error;
mod gate;
mod impact;
mod result;
mod state;
mod step;

pub use actor::{Actor, Target};
pub use error::{ConsentError, IntegrityError};
pub use gate::{can_proceed_to_step, first_unsatisfied_step, normalize_phrase, phrase_matches};
pub use impact::{AffectedGroup, ImpactSummary};
pub use result::{DeletedGroup, ResultSummary};
pub use state::{ExecutionStatus, Notice, NoticeKind, WorkflowState};
pub use step::{RESULT_INDEX, STEP_COUNT, STEPS, Step, WorkflowStep};
