//! Release orchestration
//!
//! - [manager::ReleaseManager]: validates preconditions and drives the publish sequence
//! - [action::ActionManager]: resolves the base version, asks for confirmation and delegates

pub mod action;
pub mod manager;

pub use action::{ActionManager, ReleaseOutcome};
pub use manager::{ReleaseManager, ReleasePlan};
