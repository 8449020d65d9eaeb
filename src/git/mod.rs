//! Git operations abstraction layer
//!
//! The release engine never talks to git directly. It depends on the [Vcs] trait, which has two
//! implementations:
//!
//! - [repository::Git2Vcs]: the real implementation using the `git2` crate
//! - [mock::MockVcs]: an in-memory implementation that records every call, for tests
//!
//! ```rust
//! # use version_manager::git::Vcs;
//! # fn example<V: Vcs>(vcs: &V) -> version_manager::Result<()> {
//! if vcs.state_actual()? {
//!     vcs.push()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::{MockVcs, VcsCall};
pub use repository::Git2Vcs;

use crate::domain::ReleaseVersion;
use crate::error::Result;
use std::path::Path;

/// Version-control capability consumed by the release engine.
///
/// Every method is a blocking unit of work: it either succeeds completely or returns the
/// collaborator's error unchanged. Implementations are not expected to retry.
pub trait Vcs {
    /// True iff the integration ("master") line has no divergence from its remote.
    fn master_state_actual(&self) -> Result<bool>;

    /// True iff the current branch has no divergence from its remote counterpart.
    ///
    /// A branch without a remote counterpart (never pushed, or deleted upstream) is not actual.
    fn state_actual(&self) -> Result<bool>;

    /// Name of the checked-out branch
    fn current_branch(&self) -> Result<String>;

    /// Name of the integration line, as configured
    fn master_branch(&self) -> &str;

    /// Create a local branch at HEAD without switching to it
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Switch the working copy to an existing local branch
    fn checkout(&self, name: &str) -> Result<()>;

    /// Commit exactly the file at `path` (relative to the repository root) on HEAD
    fn commit(&self, path: &Path, message: &str) -> Result<()>;

    /// Create an annotated tag on HEAD
    fn add_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push a single tag to the remote
    fn push_tag(&self, name: &str) -> Result<()>;

    /// Push the current branch to the remote
    fn push(&self) -> Result<()>;

    /// All tag names in the repository
    fn tags(&self) -> Result<Vec<String>>;

    /// Release branch name for the major/minor line of `version`
    fn branch_name_for(&self, version: &ReleaseVersion) -> String;
}
