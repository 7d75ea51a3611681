//! Purgeguard Config
//!
//! This crate contains the serializable configuration types for purgeguard.
//! A configuration describes where the purge service lives, how long calls
//! may take, and the policy knobs of the confirmation workflow.
//!
//! Configuration can be loaded from:
//! - JSON files (via CLI with `--config=config.json`)
//! - Defaults, when no file is present
//!
//! Every field has a default, so an empty JSON object is a valid config.

mod config;
mod error;
mod service;
mod workflow;

pub use config::PurgeConfig;
pub use error::ConfigError;
pub use service::{EndpointConfig, ServiceConfig, TARGET_ID_PLACEHOLDER};
pub use workflow::{DEFAULT_REQUIRED_PHRASE, IdentityScope, WorkflowConfig};
