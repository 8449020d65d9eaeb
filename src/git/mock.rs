use crate::config::VcsConfig;
use crate::domain::ReleaseVersion;
use crate::error::{Result, VersionManagerError};
use crate::git::Vcs;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// A call observed by [MockVcs], in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    MasterStateActual,
    StateActual,
    CurrentBranch,
    CreateBranch(String),
    Checkout(String),
    Commit { path: PathBuf, message: String },
    AddTag { name: String, message: String },
    PushTag(String),
    Push(String),
    Tags,
}

impl VcsCall {
    /// Operation name, as accepted by [MockVcs::fail_on]
    pub fn operation(&self) -> &'static str {
        match self {
            VcsCall::MasterStateActual => "master_state_actual",
            VcsCall::StateActual => "state_actual",
            VcsCall::CurrentBranch => "current_branch",
            VcsCall::CreateBranch(_) => "create_branch",
            VcsCall::Checkout(_) => "checkout",
            VcsCall::Commit { .. } => "commit",
            VcsCall::AddTag { .. } => "add_tag",
            VcsCall::PushTag(_) => "push_tag",
            VcsCall::Push(_) => "push",
            VcsCall::Tags => "tags",
        }
    }

    /// True for calls that change the repository or the remote
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            VcsCall::CreateBranch(_)
                | VcsCall::Checkout(_)
                | VcsCall::Commit { .. }
                | VcsCall::AddTag { .. }
                | VcsCall::PushTag(_)
                | VcsCall::Push(_)
        )
    }
}

#[derive(Debug, Default)]
struct MockState {
    current_branch: String,
    branches: Vec<String>,
    tags: Vec<String>,
    commits: Vec<(PathBuf, String)>,
    pushed_tags: Vec<String>,
    pushed_branches: Vec<String>,
}

/// Mock repository for testing without actual git operations.
///
/// Starts on `master` with both the master line and the current branch in sync.
pub struct MockVcs {
    options: VcsConfig,
    master_actual: bool,
    branch_actual: bool,
    fail_on: Option<&'static str>,
    state: RefCell<MockState>,
    calls: RefCell<Vec<VcsCall>>,
}

impl MockVcs {
    /// Create a new mock with default options
    pub fn new() -> Self {
        Self::with_options(VcsConfig::default())
    }

    pub fn with_options(options: VcsConfig) -> Self {
        let master = options.master_branch.clone();
        MockVcs {
            options,
            master_actual: true,
            branch_actual: true,
            fail_on: None,
            state: RefCell::new(MockState {
                current_branch: master.clone(),
                branches: vec![master],
                ..MockState::default()
            }),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Check out `branch`, creating it if needed
    pub fn on_branch(self, branch: impl Into<String>) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let branch = branch.into();
            if !state.branches.contains(&branch) {
                state.branches.push(branch.clone());
            }
            state.current_branch = branch;
        }
        self
    }

    /// Add a pre-existing tag
    pub fn with_tag(self, name: impl Into<String>) -> Self {
        self.state.borrow_mut().tags.push(name.into());
        self
    }

    /// Report the master line as diverged from its remote
    pub fn master_out_of_sync(mut self) -> Self {
        self.master_actual = false;
        self
    }

    /// Report the current branch as diverged from its remote
    pub fn branch_out_of_sync(mut self) -> Self {
        self.branch_actual = false;
        self
    }

    /// Make every call of `operation` (see [VcsCall::operation]) fail with a remote error
    pub fn fail_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.borrow().clone()
    }

    /// Calls that mutate the repository or the remote
    pub fn writes(&self) -> Vec<VcsCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.is_write())
            .cloned()
            .collect()
    }

    pub fn branch(&self) -> String {
        self.state.borrow().current_branch.clone()
    }

    pub fn branches(&self) -> Vec<String> {
        self.state.borrow().branches.clone()
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.state.borrow().tags.clone()
    }

    pub fn commits(&self) -> Vec<(PathBuf, String)> {
        self.state.borrow().commits.clone()
    }

    pub fn pushed_tags(&self) -> Vec<String> {
        self.state.borrow().pushed_tags.clone()
    }

    pub fn pushed_branches(&self) -> Vec<String> {
        self.state.borrow().pushed_branches.clone()
    }

    fn record(&self, call: VcsCall) -> Result<()> {
        let operation = call.operation();
        self.calls.borrow_mut().push(call);
        if self.fail_on == Some(operation) {
            return Err(VersionManagerError::remote(format!(
                "simulated {} failure",
                operation
            )));
        }
        Ok(())
    }
}

impl Default for MockVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vcs for MockVcs {
    fn master_state_actual(&self) -> Result<bool> {
        self.record(VcsCall::MasterStateActual)?;
        Ok(self.master_actual)
    }

    fn state_actual(&self) -> Result<bool> {
        self.record(VcsCall::StateActual)?;
        Ok(self.branch_actual)
    }

    fn current_branch(&self) -> Result<String> {
        self.record(VcsCall::CurrentBranch)?;
        Ok(self.branch())
    }

    fn master_branch(&self) -> &str {
        &self.options.master_branch
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.record(VcsCall::CreateBranch(name.to_string()))?;
        let mut state = self.state.borrow_mut();
        if state.branches.iter().any(|b| b == name) {
            return Err(VersionManagerError::branch(format!(
                "Branch '{}' already exists",
                name
            )));
        }
        state.branches.push(name.to_string());
        Ok(())
    }

    fn checkout(&self, name: &str) -> Result<()> {
        self.record(VcsCall::Checkout(name.to_string()))?;
        let mut state = self.state.borrow_mut();
        if !state.branches.iter().any(|b| b == name) {
            return Err(VersionManagerError::branch(format!(
                "Branch not found: {}",
                name
            )));
        }
        state.current_branch = name.to_string();
        Ok(())
    }

    fn commit(&self, path: &Path, message: &str) -> Result<()> {
        self.record(VcsCall::Commit {
            path: path.to_path_buf(),
            message: message.to_string(),
        })?;
        self.state
            .borrow_mut()
            .commits
            .push((path.to_path_buf(), message.to_string()));
        Ok(())
    }

    fn add_tag(&self, name: &str, message: &str) -> Result<()> {
        self.record(VcsCall::AddTag {
            name: name.to_string(),
            message: message.to_string(),
        })?;
        let mut state = self.state.borrow_mut();
        if state.tags.iter().any(|t| t == name) {
            return Err(VersionManagerError::tag(format!(
                "Tag '{}' already exists",
                name
            )));
        }
        state.tags.push(name.to_string());
        Ok(())
    }

    fn push_tag(&self, name: &str) -> Result<()> {
        self.record(VcsCall::PushTag(name.to_string()))?;
        self.state.borrow_mut().pushed_tags.push(name.to_string());
        Ok(())
    }

    fn push(&self) -> Result<()> {
        let branch = self.branch();
        self.record(VcsCall::Push(branch.clone()))?;
        self.state.borrow_mut().pushed_branches.push(branch);
        Ok(())
    }

    fn tags(&self) -> Result<Vec<String>> {
        self.record(VcsCall::Tags)?;
        Ok(self.tag_names())
    }

    fn branch_name_for(&self, version: &ReleaseVersion) -> String {
        self.options.branch_name_for(version)
    }
}
