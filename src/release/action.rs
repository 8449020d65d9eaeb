use crate::config::ReleasePolicy;
use crate::domain::{ReleaseKind, ReleaseVersion};
use crate::error::{Result, VersionManagerError};
use crate::git::Vcs;
use crate::release::{ReleaseManager, ReleasePlan};
use crate::storage::VersionStorage;
use tracing::{debug, info};

/// How a release request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The version was stored, committed, tagged and pushed
    Released(ReleaseVersion),
    /// The confirmation was declined; nothing was changed
    Declined(ReleaseVersion),
}

impl ReleaseOutcome {
    pub fn version(&self) -> ReleaseVersion {
        match self {
            ReleaseOutcome::Released(v) | ReleaseOutcome::Declined(v) => *v,
        }
    }
}

/// Entry point for release use cases.
///
/// Interactive concerns (asking for an initial version, confirming the release) are passed in
/// as closures so this type never touches the terminal.
pub struct ActionManager<'a> {
    vcs: &'a dyn Vcs,
    storage: &'a dyn VersionStorage,
    policy: &'a ReleasePolicy,
}

impl<'a> ActionManager<'a> {
    pub fn new(
        vcs: &'a dyn Vcs,
        storage: &'a dyn VersionStorage,
        policy: &'a ReleasePolicy,
    ) -> Self {
        ActionManager {
            vcs,
            storage,
            policy,
        }
    }

    /// Release the next `kind` version.
    ///
    /// `provide_initial_version` is only called when no version has been released yet; `None`
    /// fails with [`VersionManagerError::NoVersionProvided`]. `confirm` receives the candidate
    /// version once the preconditions hold and before anything is written.
    pub fn release_new_version<C, P>(
        &self,
        kind: ReleaseKind,
        confirm: C,
        provide_initial_version: P,
    ) -> Result<ReleaseOutcome>
    where
        C: FnOnce(&ReleaseVersion) -> bool,
        P: FnOnce() -> Option<ReleaseVersion>,
    {
        let base = self.base_version(kind, provide_initial_version)?;
        let mut manager = ReleaseManager::new(Some(base), self.vcs, self.storage, self.policy);

        let plan = manager.plan(kind)?;
        if !confirm(&plan.version) {
            info!(version = %plan.version, "release declined");
            return Ok(ReleaseOutcome::Declined(plan.version));
        }

        manager.publish(plan).map(ReleaseOutcome::Released)
    }

    /// Resolve the base version and check preconditions, without writing anything.
    pub fn plan_new_version<P>(
        &self,
        kind: ReleaseKind,
        provide_initial_version: P,
    ) -> Result<ReleasePlan>
    where
        P: FnOnce() -> Option<ReleaseVersion>,
    {
        let base = self.base_version(kind, provide_initial_version)?;
        ReleaseManager::new(Some(base), self.vcs, self.storage, self.policy).plan(kind)
    }

    /// Check out the release branch of the latest version; `None` when nothing was released yet.
    pub fn checkout_latest(&self) -> Result<Option<ReleaseVersion>> {
        let Some(latest) = self.storage.latest_version()? else {
            return Ok(None);
        };
        let branch = self.vcs.branch_name_for(&latest);
        info!(version = %latest, %branch, "checking out latest release");
        self.vcs.checkout(&branch)?;
        Ok(Some(latest))
    }

    fn base_version<P>(&self, kind: ReleaseKind, provide_initial_version: P) -> Result<ReleaseVersion>
    where
        P: FnOnce() -> Option<ReleaseVersion>,
    {
        let stored = match kind {
            ReleaseKind::Patch => self.storage.current_version()?,
            ReleaseKind::Major | ReleaseKind::Minor => self.storage.latest_version()?,
        };

        match stored {
            Some(version) => {
                debug!(%version, "bumping from stored version");
                Ok(version)
            }
            None => {
                debug!("no stored version, asking for an initial one");
                provide_initial_version().ok_or(VersionManagerError::NoVersionProvided)
            }
        }
    }
}
