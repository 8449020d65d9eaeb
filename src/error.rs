use thiserror::Error;

use crate::domain::ReleaseKind;

/// Unified error type for version-manager operations
#[derive(Error, Debug)]
pub enum VersionManagerError {
    #[error("Invalid version format: '{0}' - expected MAJOR.MINOR.PATCH")]
    InvalidVersionFormat(String),

    #[error("Branch '{branch}' differs from its remote counterpart. Pull or push your changes first")]
    BranchIsNotUpToDate { branch: String },

    #[error("A {kind} release is not allowed from branch '{branch}'. Checkout an authorized branch")]
    ForbiddenBranch { branch: String, kind: ReleaseKind },

    #[error("No version has been released yet and no initial version was provided")]
    NoVersionProvided,

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Version storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in version-manager
pub type Result<T> = std::result::Result<T, VersionManagerError>;

impl VersionManagerError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        VersionManagerError::Config(msg.into())
    }

    /// Create a storage error with context
    pub fn storage(msg: impl Into<String>) -> Self {
        VersionManagerError::Storage(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        VersionManagerError::Remote(msg.into())
    }

    /// Create a branch error with context
    pub fn branch(msg: impl Into<String>) -> Self {
        VersionManagerError::Branch(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        VersionManagerError::Tag(msg.into())
    }
}
