use crate::config::VcsConfig;
use crate::domain::ReleaseVersion;
use crate::error::{Result, VersionManagerError};
use git2::build::CheckoutBuilder;
use git2::{
    AutotagOption, BranchType, ErrorCode, FetchOptions, FetchPrune, Index, IndexEntry, IndexTime,
    ObjectType, PushOptions, RemoteCallbacks,
};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Give up after this many credential callbacks for a single network operation
const MAX_CREDENTIAL_ATTEMPTS: usize = 4;

/// Wrapper around git2::Repository implementing [super::Vcs]
pub struct Git2Vcs {
    repo: git2::Repository,
    options: VcsConfig,
}

impl Git2Vcs {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P, options: VcsConfig) -> Result<Self> {
        let repo = git2::Repository::discover(path)?;
        Ok(Git2Vcs { repo, options })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: git2::Repository, options: VcsConfig) -> Self {
        Git2Vcs { repo, options }
    }

    /// Root of the working tree
    pub fn workdir(&self) -> Result<&Path> {
        self.repo.workdir().ok_or_else(|| {
            VersionManagerError::storage("Bare repositories have no working tree")
        })
    }

    fn find_remote(&self) -> Result<git2::Remote<'_>> {
        self.repo.find_remote(&self.options.remote).map_err(|e| {
            VersionManagerError::remote(format!(
                "Cannot find remote '{}': {}",
                self.options.remote, e
            ))
        })
    }

    /// Update remote-tracking branches, dropping those deleted upstream, then fetch new tags.
    ///
    /// Local tags are never removed or moved: a release tag that failed to push must survive
    /// until the retry.
    fn fetch(&self) -> Result<()> {
        let refspec_heads = format!("+refs/heads/*:refs/remotes/{}/*", self.options.remote);
        self.fetch_refspec(&refspec_heads, FetchPrune::On)?;
        self.fetch_refspec("refs/tags/*:refs/tags/*", FetchPrune::Off)
    }

    fn fetch_refspec(&self, refspec: &str, prune: FetchPrune) -> Result<()> {
        let mut remote = self.find_remote()?;
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks());
        fetch_options.prune(prune);
        // Tags only come from the explicit refspec, so pruning never reaches refs/tags
        fetch_options.download_tags(AutotagOption::None);

        debug!(remote = %self.options.remote, refspec, "fetching");
        remote
            .fetch(&[refspec], Some(&mut fetch_options), None)
            .map_err(|e| {
                VersionManagerError::remote(format!(
                    "Failed to fetch from remote '{}': {}",
                    self.options.remote, e
                ))
            })
    }

    /// Create a local branch from `<remote>/<name>` and make it track that branch
    fn track_remote_branch(&self, name: &str) -> Result<()> {
        let remote_ref = format!("refs/remotes/{}/{}", self.options.remote, name);
        let commit = self
            .repo
            .find_reference(&remote_ref)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| {
                VersionManagerError::branch(format!("Cannot find branch '{}': {}", name, e))
            })?;

        debug!(branch = name, %remote_ref, "creating local branch from remote");
        let mut branch = self.repo.branch(name, &commit, false).map_err(|e| {
            VersionManagerError::branch(format!("Cannot create branch '{}': {}", name, e))
        })?;
        branch.set_upstream(Some(&format!("{}/{}", self.options.remote, name)))?;
        Ok(())
    }

    /// Compare a local branch tip with its remote-tracking ref
    fn branch_in_sync(&self, branch: &str) -> Result<bool> {
        let local_oid = match self.repo.find_branch(branch, BranchType::Local) {
            Ok(local) => local.get().target(),
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!(branch, "no local branch");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let remote_ref = format!("refs/remotes/{}/{}", self.options.remote, branch);
        let remote_oid = match self.repo.find_reference(&remote_ref) {
            Ok(reference) => reference.target(),
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!(branch, "branch has no remote counterpart");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        debug!(branch, ?local_oid, ?remote_oid, "comparing with remote");
        Ok(local_oid.is_some() && local_oid == remote_oid)
    }

    fn push_refspec(&self, refspec: &str) -> Result<()> {
        let mut remote = self.find_remote()?;

        let mut callbacks = remote_callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });
        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&[refspec], Some(&mut push_options))
            .map_err(|e| {
                if e.class() == git2::ErrorClass::Net {
                    VersionManagerError::remote(format!("Network error during push: {}", e))
                } else {
                    VersionManagerError::remote(format!("Failed to push '{}': {}", refspec, e))
                }
            })
    }
}

impl super::Vcs for Git2Vcs {
    fn master_state_actual(&self) -> Result<bool> {
        self.fetch()?;
        self.branch_in_sync(&self.options.master_branch)
    }

    fn state_actual(&self) -> Result<bool> {
        let branch = self.current_branch()?;
        self.fetch()?;
        self.branch_in_sync(&branch)
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(VersionManagerError::branch("HEAD is detached"));
        }
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| VersionManagerError::branch("Current branch name is not valid UTF-8"))
    }

    fn master_branch(&self) -> &str {
        &self.options.master_branch
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.branch(name, &head, false).map_err(|e| {
            VersionManagerError::branch(format!("Cannot create branch '{}': {}", name, e))
        })?;
        Ok(())
    }

    fn checkout(&self, name: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", name);
        match self.repo.find_reference(&refname) {
            Ok(_) => {}
            Err(e) if e.code() == ErrorCode::NotFound => self.track_remote_branch(name)?,
            Err(e) => return Err(e.into()),
        }

        let target = self
            .repo
            .find_reference(&refname)
            .and_then(|r| r.peel(ObjectType::Commit))
            .map_err(|e| {
                VersionManagerError::branch(format!("Cannot find branch '{}': {}", name, e))
            })?;

        self.repo
            .checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&refname)?;
        Ok(())
    }

    fn commit(&self, path: &Path, message: &str) -> Result<()> {
        let entry_path = path
            .to_str()
            .map(|p| p.replace('\\', "/"))
            .ok_or_else(|| {
                VersionManagerError::storage(format!("Path is not valid UTF-8: {}", path.display()))
            })?;
        let content = fs::read(self.workdir()?.join(path))?;
        let blob = self.repo.blob(&content)?;
        let parent = self.repo.head()?.peel_to_commit()?;

        // HEAD's tree plus the artifact only; whatever else the user staged stays out
        let mut index = Index::new()?;
        index.read_tree(&parent.tree()?)?;
        index.add(&IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            file_size: content.len() as u32,
            id: blob,
            flags: 0,
            flags_extended: 0,
            path: entry_path.into_bytes(),
        })?;
        let tree = self.repo.find_tree(index.write_tree_to(&self.repo)?)?;
        let signature = self.repo.signature()?;

        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        // Keep the on-disk index in step with the new HEAD for this path only
        let mut staged = self.repo.index()?;
        staged.add_path(path)?;
        staged.write()?;
        Ok(())
    }

    fn add_tag(&self, name: &str, message: &str) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        let signature = self.repo.signature()?;

        self.repo
            .tag(name, head.as_object(), &signature, message, false)
            .map_err(|e| VersionManagerError::tag(format!("Cannot create tag '{}': {}", name, e)))?;
        Ok(())
    }

    fn push_tag(&self, name: &str) -> Result<()> {
        self.push_refspec(&format!("refs/tags/{}:refs/tags/{}", name, name))
    }

    fn push(&self) -> Result<()> {
        let branch_name = self.current_branch()?;
        self.push_refspec(&format!(
            "refs/heads/{}:refs/heads/{}",
            branch_name, branch_name
        ))?;

        // Recording the upstream is a convenience for later `git pull`s
        let upstream = format!("{}/{}", self.options.remote, branch_name);
        let result = self
            .repo
            .find_branch(&branch_name, BranchType::Local)
            .and_then(|mut branch| branch.set_upstream(Some(&upstream)));
        if let Err(e) = result {
            warn!(branch = %branch_name, %upstream, error = %e, "could not set upstream");
        }
        Ok(())
    }

    fn tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;
        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn branch_name_for(&self, version: &ReleaseVersion) -> String {
        self.options.branch_name_for(version)
    }
}

/// Credential chain: SSH key files in ~/.ssh, the SSH agent, then git's default credentials
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;

    callbacks.credentials(move |_url, username_from_url, allowed_types| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }

        let username = username_from_url.unwrap_or("git");
        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });

    callbacks
}
