//! Purgeguard Engine
//!
//! This crate drives the guarded destructive-operation workflow. It owns
//! the live [`WorkflowState`](purgeguard_workflow::WorkflowState), talks to
//! the [`PurgeService`](purgeguard_service::PurgeService) and fires the
//! destructive call exactly once per attempt.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    WorkflowController                       │
//! │  - select_target / verify_identity / consent setters        │
//! │  - next, back, go_to: gated navigation                      │
//! │  - one request in flight per kind, stale responses dropped  │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ExecutionCoordinator                       │
//! │  - prepare: fail-closed precondition re-check               │
//! │  - dispatch: one request, timeout, progress stages          │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      PurgeService                           │
//! │  - HTTP or in-memory                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let controller = WorkflowController::new(service, actor, config.workflow);
//! controller.load_targets().await?;
//! controller.select_target("school-1").await?;
//! controller.next();
//! ```

mod controller;
mod coordinator;
mod error;
mod events;

pub use controller::WorkflowController;
pub use coordinator::ExecutionCoordinator;
pub use error::{RequestKind, WorkflowError};
pub use events::{
  ChannelNotifier, NoopNotifier, ProgressStage, ResetReason, WorkflowEvent, WorkflowNotifier,
};
