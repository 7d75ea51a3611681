//! Workflow events and notifiers for observability.
//!
//! Events are emitted as the workflow moves, so a UI can render progress
//! and consumers can keep an audit trail.

use purgeguard_workflow::ExecutionStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Stage of the destructive request, taken from its real lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
  /// The request was handed to the service.
  Sent,
  /// The service has not answered on the first poll.
  AwaitingResponse,
  /// An answer (or timeout) arrived.
  Completed,
}

impl ProgressStage {
  /// Cosmetic percentage for progress bars. Never used for decisions.
  pub fn percent(self) -> u8 {
    match self {
      ProgressStage::Sent => 10,
      ProgressStage::AwaitingResponse => 50,
      ProgressStage::Completed => 100,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetReason {
  Cancelled,
  Reset,
}

/// Events emitted during the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkflowEvent {
  /// The current step changed.
  StepChanged {
    attempt_id: String,
    from: usize,
    to: usize,
  },

  /// The list of targets was (re)loaded.
  TargetsLoaded { count: usize },

  /// A target was selected and its preview requested.
  TargetSelected {
    attempt_id: String,
    target_id: String,
  },

  /// A consistent preview arrived.
  PreviewLoaded {
    attempt_id: String,
    target_id: String,
    total_record_count: u64,
    warning_count: usize,
  },

  /// The preview failed to load or failed its integrity check.
  PreviewRejected {
    attempt_id: String,
    target_id: String,
    error: String,
  },

  IdentityVerified { attempt_id: String },

  IdentityRejected { attempt_id: String, error: String },

  /// Progress of the destructive request.
  ExecutionProgress {
    attempt_id: String,
    stage: ProgressStage,
    percent: u8,
  },

  /// The destructive request settled.
  ExecutionCompleted {
    attempt_id: String,
    status: ExecutionStatus,
  },

  /// All state was discarded; a new attempt begins.
  WorkflowReset {
    previous_attempt_id: String,
    attempt_id: String,
    reason: ResetReason,
  },
}

/// Trait for receiving workflow events.
///
/// The controller calls `notify` for each event. Implementations must not
/// block; they are called while the controller is mid-operation.
pub trait WorkflowNotifier: Send + Sync {
  fn notify(&self, event: WorkflowEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl WorkflowNotifier for NoopNotifier {
  fn notify(&self, _event: WorkflowEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded: event volume is a handful per attempt and the controller must
  // never wait on a slow consumer.
  sender: mpsc::UnboundedSender<WorkflowEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<WorkflowEvent>) -> Self {
    Self { sender }
  }
}

impl WorkflowNotifier for ChannelNotifier {
  fn notify(&self, event: WorkflowEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
