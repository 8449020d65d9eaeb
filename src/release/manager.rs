use crate::config::ReleasePolicy;
use crate::domain::{ReleaseKind, ReleaseVersion};
use crate::error::{Result, VersionManagerError};
use crate::git::Vcs;
use crate::storage::VersionStorage;
use tracing::{debug, info};

/// Everything a release will do, computed before anything is mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    pub kind: ReleaseKind,
    pub previous: ReleaseVersion,
    pub version: ReleaseVersion,
    /// Branch the release opens; `None` publishes on the current branch
    pub branch: Option<String>,
    /// Branch the release is started from
    pub source_branch: String,
    pub tag: String,
    pub message: String,
}

/// Drives one release of a working copy.
///
/// Each entry point (`major`, `minor`, `patch`) checks its preconditions first and fails before
/// any collaborator write when they do not hold:
///
/// - major/minor: the master line must be in sync with its remote, the current branch must match
///   the policy, then a release branch is opened and published.
/// - patch: the current branch must be in sync with its remote and match the policy, then the
///   release is published in place.
///
/// The publish sequence is store, commit, tag, push tag, push branch. A failure inside it is
/// returned as-is: nothing is retried or rolled back, and every step can safely be re-run.
pub struct ReleaseManager<'a> {
    version: Option<ReleaseVersion>,
    vcs: &'a dyn Vcs,
    storage: &'a dyn VersionStorage,
    policy: &'a ReleasePolicy,
}

impl<'a> ReleaseManager<'a> {
    pub fn new(
        version: Option<ReleaseVersion>,
        vcs: &'a dyn Vcs,
        storage: &'a dyn VersionStorage,
        policy: &'a ReleasePolicy,
    ) -> Self {
        ReleaseManager {
            version,
            vcs,
            storage,
            policy,
        }
    }

    /// The version releases bump from; updated after each successful release
    pub fn version(&self) -> Option<ReleaseVersion> {
        self.version
    }

    pub fn next_version(&self, kind: ReleaseKind) -> Result<ReleaseVersion> {
        self.version
            .map(|v| v.bump(kind))
            .ok_or(VersionManagerError::NoVersionProvided)
    }

    pub fn major(&mut self) -> Result<ReleaseVersion> {
        self.release(ReleaseKind::Major)
    }

    pub fn minor(&mut self) -> Result<ReleaseVersion> {
        self.release(ReleaseKind::Minor)
    }

    pub fn patch(&mut self) -> Result<ReleaseVersion> {
        self.release(ReleaseKind::Patch)
    }

    pub fn release(&mut self, kind: ReleaseKind) -> Result<ReleaseVersion> {
        let plan = self.plan(kind)?;
        self.publish(plan)
    }

    /// Check preconditions and compute the release without mutating anything.
    pub fn plan(&self, kind: ReleaseKind) -> Result<ReleasePlan> {
        let source_branch = self.vcs.current_branch()?;
        self.ensure_up_to_date(kind, &source_branch)?;
        self.ensure_authorized(kind, &source_branch)?;

        let previous = self.version.ok_or(VersionManagerError::NoVersionProvided)?;
        let version = previous.bump(kind);
        let branch = kind
            .creates_branch()
            .then(|| self.vcs.branch_name_for(&version));

        Ok(ReleasePlan {
            kind,
            previous,
            version,
            branch,
            source_branch,
            tag: version.to_string(),
            message: self.policy.commit_message.render(&version),
        })
    }

    /// Run the publish sequence for a plan produced by [`ReleaseManager::plan`].
    pub fn publish(&mut self, plan: ReleasePlan) -> Result<ReleaseVersion> {
        info!(kind = %plan.kind, from = %plan.previous, to = %plan.version, "releasing");

        if let Some(branch) = &plan.branch {
            info!(%branch, "creating release branch");
            self.vcs.create_branch(branch)?;
            self.vcs.checkout(branch)?;
        }

        let artifact = self.storage.store(&plan.version)?;
        info!(artifact = %artifact.display(), "committing version");
        self.vcs.commit(&artifact, &plan.message)?;

        info!(tag = %plan.tag, "tagging");
        self.vcs.add_tag(&plan.tag, &plan.message)?;

        // tag before branch: the remote never sees a branch tip without its release tag
        self.vcs.push_tag(&plan.tag)?;
        self.vcs.push()?;

        info!(version = %plan.version, "released");
        self.version = Some(plan.version);
        Ok(plan.version)
    }

    fn ensure_up_to_date(&self, kind: ReleaseKind, current_branch: &str) -> Result<()> {
        let (actual, branch) = match kind {
            ReleaseKind::Major | ReleaseKind::Minor => {
                (self.vcs.master_state_actual()?, self.vcs.master_branch())
            }
            ReleaseKind::Patch => (self.vcs.state_actual()?, current_branch),
        };
        debug!(%kind, branch, actual, "remote sync check");

        if actual {
            Ok(())
        } else {
            Err(VersionManagerError::BranchIsNotUpToDate {
                branch: branch.to_string(),
            })
        }
    }

    fn ensure_authorized(&self, kind: ReleaseKind, branch: &str) -> Result<()> {
        let policy = &self.policy.authorized_branches;
        debug!(%kind, branch, pattern = ?policy.pattern(kind), "branch policy check");

        if policy.allows(kind, branch) {
            Ok(())
        } else {
            Err(VersionManagerError::ForbiddenBranch {
                branch: branch.to_string(),
                kind,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BranchPolicy, CommitMessage};
    use crate::git::{MockVcs, VcsCall};
    use crate::storage::MemoryVersionStorage;
    use std::path::PathBuf;

    fn git_flow_policy() -> ReleasePolicy {
        ReleasePolicy {
            authorized_branches: BranchPolicy::unrestricted()
                .with_pattern(ReleaseKind::Major, "^master$")
                .unwrap()
                .with_pattern(ReleaseKind::Minor, "^master$")
                .unwrap()
                .with_pattern(ReleaseKind::Patch, "^release-")
                .unwrap(),
            commit_message: CommitMessage::default(),
        }
    }

    fn v(text: &str) -> ReleaseVersion {
        ReleaseVersion::parse(text).unwrap()
    }

    #[test]
    fn test_major_runs_branching_sequence_in_order() {
        let vcs = MockVcs::new();
        let storage = MemoryVersionStorage::with_version(v("1.0.0"));
        let policy = git_flow_policy();
        let mut manager = ReleaseManager::new(Some(v("1.0.0")), &vcs, &storage, &policy);

        let released = manager.major().unwrap();

        assert_eq!(released, v("2.0.0"));
        assert_eq!(manager.version(), Some(v("2.0.0")));
        assert_eq!(storage.stored(), vec![v("2.0.0")]);
        assert_eq!(
            vcs.writes(),
            vec![
                VcsCall::CreateBranch("release-2.0".to_string()),
                VcsCall::Checkout("release-2.0".to_string()),
                VcsCall::Commit {
                    path: PathBuf::from("VERSION"),
                    message: "Release 2.0.0".to_string(),
                },
                VcsCall::AddTag {
                    name: "2.0.0".to_string(),
                    message: "Release 2.0.0".to_string(),
                },
                VcsCall::PushTag("2.0.0".to_string()),
                VcsCall::Push("release-2.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_minor_opens_minor_branch() {
        let vcs = MockVcs::new();
        let storage = MemoryVersionStorage::new();
        let policy = git_flow_policy();
        let mut manager = ReleaseManager::new(Some(v("2.0.0")), &vcs, &storage, &policy);

        assert_eq!(manager.minor().unwrap(), v("2.1.0"));
        assert_eq!(vcs.branch(), "release-2.1");
        assert_eq!(vcs.pushed_tags(), vec!["2.1.0".to_string()]);
        assert_eq!(vcs.pushed_branches(), vec!["release-2.1".to_string()]);
    }

    #[test]
    fn test_patch_publishes_in_place() {
        let vcs = MockVcs::new().on_branch("release-2.0");
        let storage = MemoryVersionStorage::with_version(v("2.0.0"));
        let policy = git_flow_policy();
        let mut manager = ReleaseManager::new(Some(v("2.0.0")), &vcs, &storage, &policy);

        assert_eq!(manager.patch().unwrap(), v("2.0.1"));
        assert_eq!(vcs.branch(), "release-2.0");
        assert!(!vcs
            .writes()
            .iter()
            .any(|c| matches!(c, VcsCall::CreateBranch(_) | VcsCall::Checkout(_))));
        assert_eq!(vcs.tag_names(), vec!["2.0.1".to_string()]);
        assert_eq!(vcs.pushed_branches(), vec!["release-2.0".to_string()]);
    }

    #[test]
    fn test_tag_push_precedes_branch_push() {
        for kind in ReleaseKind::ALL {
            let branch = if kind == ReleaseKind::Patch {
                "release-1.4"
            } else {
                "master"
            };
            let vcs = MockVcs::new().on_branch(branch);
            let storage = MemoryVersionStorage::new();
            let policy = git_flow_policy();
            let mut manager = ReleaseManager::new(Some(v("1.4.0")), &vcs, &storage, &policy);
            manager.release(kind).unwrap();

            let calls = vcs.calls();
            let tag_push = calls
                .iter()
                .position(|c| matches!(c, VcsCall::PushTag(_)))
                .unwrap();
            let branch_push = calls
                .iter()
                .position(|c| matches!(c, VcsCall::Push(_)))
                .unwrap();
            assert!(tag_push < branch_push, "{} pushed branch before tag", kind);
        }
    }

    #[test]
    fn test_stale_master_blocks_major_and_minor_without_writes() {
        for kind in [ReleaseKind::Major, ReleaseKind::Minor] {
            let vcs = MockVcs::new().master_out_of_sync();
            let storage = MemoryVersionStorage::new();
            let policy = git_flow_policy();
            let mut manager = ReleaseManager::new(Some(v("1.0.0")), &vcs, &storage, &policy);

            let err = manager.release(kind).unwrap_err();
            assert!(matches!(
                err,
                VersionManagerError::BranchIsNotUpToDate { ref branch } if branch == "master"
            ));
            assert!(vcs.writes().is_empty());
            assert!(storage.stored().is_empty());
            assert_eq!(manager.version(), Some(v("1.0.0")));
        }
    }

    #[test]
    fn test_patch_ignores_master_state() {
        let vcs = MockVcs::new().on_branch("release-1.0").master_out_of_sync();
        let storage = MemoryVersionStorage::new();
        let policy = git_flow_policy();
        let mut manager = ReleaseManager::new(Some(v("1.0.0")), &vcs, &storage, &policy);

        assert_eq!(manager.patch().unwrap(), v("1.0.1"));
        assert!(!vcs.calls().contains(&VcsCall::MasterStateActual));
    }

    #[test]
    fn test_stale_release_branch_blocks_patch() {
        // also covers a release branch whose upstream was deleted
        let vcs = MockVcs::new().on_branch("release-1.0").branch_out_of_sync();
        let storage = MemoryVersionStorage::new();
        let policy = git_flow_policy();
        let mut manager = ReleaseManager::new(Some(v("1.0.0")), &vcs, &storage, &policy);

        let err = manager.patch().unwrap_err();
        assert!(matches!(
            err,
            VersionManagerError::BranchIsNotUpToDate { ref branch } if branch == "release-1.0"
        ));
        assert!(vcs.writes().is_empty());
    }

    #[test]
    fn test_forbidden_branch_for_patch() {
        let vcs = MockVcs::new().on_branch("feature/login");
        let storage = MemoryVersionStorage::new();
        let policy = git_flow_policy();
        let mut manager = ReleaseManager::new(Some(v("1.0.0")), &vcs, &storage, &policy);

        let err = manager.patch().unwrap_err();
        assert!(matches!(
            err,
            VersionManagerError::ForbiddenBranch { kind: ReleaseKind::Patch, .. }
        ));
        assert!(vcs.writes().is_empty());
        assert!(storage.stored().is_empty());
    }

    #[test]
    fn test_forbidden_branch_for_major_outside_master() {
        let vcs = MockVcs::new().on_branch("release-2.0");
        let storage = MemoryVersionStorage::new();
        let policy = git_flow_policy();
        let mut manager = ReleaseManager::new(Some(v("2.0.0")), &vcs, &storage, &policy);

        assert!(matches!(
            manager.major().unwrap_err(),
            VersionManagerError::ForbiddenBranch { kind: ReleaseKind::Major, .. }
        ));
        assert!(vcs.writes().is_empty());
    }

    #[test]
    fn test_sync_is_checked_before_policy() {
        let vcs = MockVcs::new().on_branch("feature/x").master_out_of_sync();
        let storage = MemoryVersionStorage::new();
        let policy = git_flow_policy();
        let manager = ReleaseManager::new(Some(v("1.0.0")), &vcs, &storage, &policy);

        assert!(matches!(
            manager.plan(ReleaseKind::Major).unwrap_err(),
            VersionManagerError::BranchIsNotUpToDate { .. }
        ));
    }

    #[test]
    fn test_missing_version_fails_without_writes() {
        let vcs = MockVcs::new();
        let storage = MemoryVersionStorage::new();
        let policy = ReleasePolicy::default();
        let mut manager = ReleaseManager::new(None, &vcs, &storage, &policy);

        assert!(matches!(
            manager.major().unwrap_err(),
            VersionManagerError::NoVersionProvided
        ));
        assert!(matches!(
            manager.next_version(ReleaseKind::Patch).unwrap_err(),
            VersionManagerError::NoVersionProvided
        ));
        assert!(vcs.writes().is_empty());
    }

    #[test]
    fn test_unrestricted_policy_allows_any_branch() {
        let vcs = MockVcs::new().on_branch("develop");
        let storage = MemoryVersionStorage::new();
        let policy = ReleasePolicy::default();
        let mut manager = ReleaseManager::new(Some(v("0.1.0")), &vcs, &storage, &policy);

        assert_eq!(manager.minor().unwrap(), v("0.2.0"));
    }

    #[test]
    fn test_generator_message_used_for_commit_and_tag() {
        let vcs = MockVcs::new();
        let storage = MemoryVersionStorage::new();
        let policy = ReleasePolicy {
            authorized_branches: BranchPolicy::unrestricted(),
            commit_message: CommitMessage::generator(|v| format!("Version {} [skip ci]", v)),
        };
        let mut manager = ReleaseManager::new(Some(v("1.1.1")), &vcs, &storage, &policy);
        manager.minor().unwrap();

        assert_eq!(
            vcs.commits(),
            vec![(PathBuf::from("VERSION"), "Version 1.2.0 [skip ci]".to_string())]
        );
        assert!(vcs.calls().contains(&VcsCall::AddTag {
            name: "1.2.0".to_string(),
            message: "Version 1.2.0 [skip ci]".to_string(),
        }));
    }

    #[test]
    fn test_push_failure_surfaces_without_cleanup() {
        let vcs = MockVcs::new().fail_on("push_tag");
        let storage = MemoryVersionStorage::new();
        let policy = git_flow_policy();
        let mut manager = ReleaseManager::new(Some(v("1.0.0")), &vcs, &storage, &policy);

        let err = manager.major().unwrap_err();
        assert!(matches!(err, VersionManagerError::Remote(_)));
        // local branch, commit and tag remain; branch was never pushed
        assert_eq!(vcs.branch(), "release-2.0");
        assert_eq!(vcs.tag_names(), vec!["2.0.0".to_string()]);
        assert!(vcs.pushed_branches().is_empty());
        assert_eq!(manager.version(), Some(v("1.0.0")));
    }

    #[test]
    fn test_existing_release_branch_fails_before_storing() {
        let vcs = MockVcs::new().on_branch("release-2.0").on_branch("master");
        let storage = MemoryVersionStorage::new();
        let policy = git_flow_policy();
        let mut manager = ReleaseManager::new(Some(v("1.0.0")), &vcs, &storage, &policy);

        assert!(matches!(
            manager.major().unwrap_err(),
            VersionManagerError::Branch(_)
        ));
        assert!(storage.stored().is_empty());
    }

    #[test]
    fn test_plan_describes_release() {
        let vcs = MockVcs::new();
        let storage = MemoryVersionStorage::new();
        let policy = git_flow_policy();
        let manager = ReleaseManager::new(Some(v("1.2.3")), &vcs, &storage, &policy);

        let plan = manager.plan(ReleaseKind::Minor).unwrap();
        assert_eq!(
            plan,
            ReleasePlan {
                kind: ReleaseKind::Minor,
                previous: v("1.2.3"),
                version: v("1.3.0"),
                branch: Some("release-1.3".to_string()),
                source_branch: "master".to_string(),
                tag: "1.3.0".to_string(),
                message: "Release 1.3.0".to_string(),
            }
        );
        assert!(vcs.writes().is_empty());
    }

    #[test]
    fn test_consecutive_releases_chain() {
        let vcs = MockVcs::new();
        let storage = MemoryVersionStorage::new();
        let policy = ReleasePolicy::default();
        let mut manager = ReleaseManager::new(Some(v("1.0.0")), &vcs, &storage, &policy);

        manager.major().unwrap();
        // now on release-2.0
        assert_eq!(manager.patch().unwrap(), v("2.0.1"));
        assert_eq!(storage.stored(), vec![v("2.0.0"), v("2.0.1")]);
    }
}
