//! Domain logic - pure release values independent of git operations

pub mod branch;
pub mod message;
pub mod version;

pub use branch::BranchPolicy;
pub use message::CommitMessage;
pub use version::{ReleaseKind, ReleaseVersion};
