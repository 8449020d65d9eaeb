// tests/common/mod.rs
//! A bare "remote" repository plus a local clone wired to it as `origin`.

#![allow(dead_code)]

use git2::{Repository, Signature};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use version_manager::config::Config;

pub struct TestRepos {
    root: TempDir,
    pub remote: PathBuf,
    pub local: PathBuf,
    pub master: String,
}

impl TestRepos {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let remote = root.path().join("remote.git");
        let local = root.path().join("local");
        Repository::init_bare(&remote).unwrap();

        let repo = Repository::init(&local).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        repo.remote("origin", remote.to_str().unwrap()).unwrap();

        commit_file(&repo, "README.md", "# project\n", "Initial commit");
        let master = repo.head().unwrap().shorthand().unwrap().to_string();
        push_branch(&repo, &master);

        TestRepos {
            root,
            remote,
            local,
            master,
        }
    }

    /// Major and minor releases from master only, patches from release branches only
    pub fn config(&self) -> Config {
        let toml = format!(
            r#"
[vcs]
master_branch = "{master}"

[authorized_branches]
major = "^{master}$"
minor = "^{master}$"
patch = "^release-"
"#,
            master = self.master
        );
        Config::from_toml_str(&toml).unwrap()
    }

    pub fn local_repo(&self) -> Repository {
        Repository::open(&self.local).unwrap()
    }

    pub fn remote_repo(&self) -> Repository {
        Repository::open_bare(&self.remote).unwrap()
    }

    pub fn current_branch(&self) -> String {
        self.local_repo()
            .head()
            .unwrap()
            .shorthand()
            .unwrap()
            .to_string()
    }

    pub fn version_file(&self) -> Option<String> {
        fs::read_to_string(self.local.join("VERSION")).ok()
    }

    pub fn local_tags(&self) -> Vec<String> {
        tag_names(&self.local_repo())
    }

    pub fn remote_tags(&self) -> Vec<String> {
        tag_names(&self.remote_repo())
    }

    pub fn remote_has_branch(&self, name: &str) -> bool {
        self.remote_repo()
            .find_reference(&format!("refs/heads/{}", name))
            .is_ok()
    }

    /// Commit id a tag in the remote points at
    pub fn remote_tag_commit(&self, tag: &str) -> git2::Oid {
        self.remote_repo()
            .find_reference(&format!("refs/tags/{}", tag))
            .unwrap()
            .peel_to_commit()
            .unwrap()
            .id()
    }

    pub fn remote_branch_commit(&self, branch: &str) -> git2::Oid {
        self.remote_repo()
            .find_reference(&format!("refs/heads/{}", branch))
            .unwrap()
            .peel_to_commit()
            .unwrap()
            .id()
    }

    /// Add a commit locally without pushing it
    pub fn commit_locally(&self, name: &str, content: &str) {
        commit_file(&self.local_repo(), name, content, "Local change");
    }

    /// Lightweight tag on the local HEAD that the remote never sees
    pub fn tag_locally(&self, name: &str) {
        let repo = self.local_repo();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.tag_lightweight(name, head.as_object(), false).unwrap();
    }

    /// Write and stage a file without committing it
    pub fn stage_file(&self, name: &str, content: &str) {
        let repo = self.local_repo();
        fs::write(self.local.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    /// Top-level entries of the tree a remote tag points at
    pub fn remote_tag_tree(&self, tag: &str) -> Vec<String> {
        let repo = self.remote_repo();
        let tree = repo
            .find_reference(&format!("refs/tags/{}", tag))
            .unwrap()
            .peel_to_tree()
            .unwrap();
        let mut names: Vec<String> = tree
            .iter()
            .filter_map(|entry| entry.name().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// A second working copy cloned from the remote, like a teammate's checkout
    pub fn clone_remote(&self, name: &str) -> PathBuf {
        let path = self.root.path().join(name);
        Repository::clone(self.remote.to_str().unwrap(), &path).unwrap();
        path
    }

    pub fn delete_remote_branch(&self, name: &str) {
        self.remote_repo()
            .find_reference(&format!("refs/heads/{}", name))
            .unwrap()
            .delete()
            .unwrap();
    }
}

pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) {
    let workdir = repo.workdir().unwrap().to_path_buf();
    fs::write(workdir.join(name), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

fn push_branch(repo: &Repository, branch: &str) {
    let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
    repo.find_remote("origin")
        .unwrap()
        .push(&[refspec.as_str()], None)
        .unwrap();
}

fn tag_names(repo: &Repository) -> Vec<String> {
    let mut tags: Vec<String> = repo
        .tag_names(None)
        .unwrap()
        .iter()
        .flatten()
        .map(str::to_string)
        .collect();
    tags.sort();
    tags
}
