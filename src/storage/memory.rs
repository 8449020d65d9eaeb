use crate::domain::ReleaseVersion;
use crate::error::Result;
use crate::storage::VersionStorage;
use std::cell::RefCell;
use std::path::PathBuf;

/// In-memory storage for exercising the release engine without a working tree
#[derive(Debug, Default)]
pub struct MemoryVersionStorage {
    latest: RefCell<Option<ReleaseVersion>>,
    current: Option<ReleaseVersion>,
    stored: RefCell<Vec<ReleaseVersion>>,
}

impl MemoryVersionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose latest (and current) version is `version`
    pub fn with_version(version: ReleaseVersion) -> Self {
        MemoryVersionStorage {
            latest: RefCell::new(Some(version)),
            ..Self::default()
        }
    }

    /// Version seen on the checked-out branch when it differs from the latest one
    pub fn with_current(mut self, version: ReleaseVersion) -> Self {
        self.current = Some(version);
        self
    }

    /// Every version passed to `store`, in order
    pub fn stored(&self) -> Vec<ReleaseVersion> {
        self.stored.borrow().clone()
    }

    pub fn artifact_path() -> PathBuf {
        PathBuf::from("VERSION")
    }
}

impl VersionStorage for MemoryVersionStorage {
    fn latest_version(&self) -> Result<Option<ReleaseVersion>> {
        Ok(*self.latest.borrow())
    }

    fn current_version(&self) -> Result<Option<ReleaseVersion>> {
        Ok(self.current.or(*self.latest.borrow()))
    }

    fn store(&self, version: &ReleaseVersion) -> Result<PathBuf> {
        self.stored.borrow_mut().push(*version);
        let mut latest = self.latest.borrow_mut();
        if latest.map_or(true, |l| *version > l) {
            *latest = Some(*version);
        }
        Ok(Self::artifact_path())
    }
}
