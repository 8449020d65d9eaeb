//! Version storage: where the last released version is read from and the next one written to.
//!
//! Storing only writes the version file and hands back its path. Committing and publishing that
//! artifact is the release engine's job.

pub mod file;
pub mod memory;

pub use file::GitVersionStorage;
pub use memory::MemoryVersionStorage;

use crate::domain::ReleaseVersion;
use crate::error::Result;
use std::path::PathBuf;

pub trait VersionStorage {
    /// Highest version ever released, or `None` before the first release
    fn latest_version(&self) -> Result<Option<ReleaseVersion>>;

    /// Version recorded on the checked-out branch; patch releases bump from this one.
    fn current_version(&self) -> Result<Option<ReleaseVersion>> {
        self.latest_version()
    }

    /// Write `version` to the tracked location and return the repository-relative path to commit
    fn store(&self, version: &ReleaseVersion) -> Result<PathBuf>;
}
