use crate::config::StorageConfig;
use crate::domain::ReleaseVersion;
use crate::error::{Result, VersionManagerError};
use crate::git::Vcs;
use crate::storage::VersionStorage;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Version storage backed by a version file in the working tree and the repository's tags
pub struct GitVersionStorage<'a> {
    vcs: &'a dyn Vcs,
    root: PathBuf,
    options: StorageConfig,
}

impl<'a> GitVersionStorage<'a> {
    /// `root` is the working tree root the configured path is relative to
    pub fn new(vcs: &'a dyn Vcs, root: impl Into<PathBuf>, options: StorageConfig) -> Self {
        GitVersionStorage {
            vcs,
            root: root.into(),
            options,
        }
    }

    /// Absolute path of the version file
    pub fn file_path(&self) -> PathBuf {
        self.root.join(self.options.relative_path())
    }

    /// Version written in the working tree, if the file exists
    fn file_version(&self) -> Result<Option<ReleaseVersion>> {
        let path = self.file_path();
        if !path.exists() {
            debug!(path = %path.display(), "no version file");
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        ReleaseVersion::parse(&content).map(Some).map_err(|e| {
            VersionManagerError::storage(format!("Corrupt version file {}: {}", path.display(), e))
        })
    }

    /// Tags that are release versions; anything else is ignored
    fn tag_versions(&self) -> Result<Vec<ReleaseVersion>> {
        let versions = self
            .vcs
            .tags()?
            .into_iter()
            .filter_map(|tag| match ReleaseVersion::parse(&tag) {
                Ok(version) => Some(version),
                Err(_) => {
                    debug!(%tag, "skipping tag that is not a release version");
                    None
                }
            })
            .collect();
        Ok(versions)
    }
}

impl VersionStorage for GitVersionStorage<'_> {
    fn latest_version(&self) -> Result<Option<ReleaseVersion>> {
        let mut versions = self.tag_versions()?;
        versions.extend(self.file_version()?);
        let latest = versions.into_iter().max();
        debug!(?latest, "resolved latest version");
        Ok(latest)
    }

    fn current_version(&self) -> Result<Option<ReleaseVersion>> {
        match self.file_version()? {
            Some(version) => Ok(Some(version)),
            None => self.latest_version(),
        }
    }

    fn store(&self, version: &ReleaseVersion) -> Result<PathBuf> {
        let path = self.file_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, format!("{}\n", version))?;
        debug!(path = %path.display(), %version, "stored version");
        Ok(self.options.relative_path())
    }
}
