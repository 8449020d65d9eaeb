use crate::domain::{BranchPolicy, CommitMessage, ReleaseKind, ReleaseVersion};
use crate::error::{Result, VersionManagerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// File name looked up in the current directory
pub const CONFIG_FILE_NAME: &str = "version-manager.toml";

/// Represents the complete configuration for version-manager.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub vcs: VcsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub authorized_branches: AuthorizedBranches,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_master_branch() -> String {
    "master".to_string()
}

fn default_release_branch() -> String {
    "release-{major}.{minor}".to_string()
}

fn default_commit_message() -> String {
    "Release {version}".to_string()
}

/// Settings for the git collaborator.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VcsConfig {
    /// Remote used for fetching state and publishing
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Integration line that must be in sync before a major or minor release
    #[serde(default = "default_master_branch")]
    pub master_branch: String,

    /// Template for release branch names (`{major}`, `{minor}`, `{patch}`, `{version}`)
    #[serde(default = "default_release_branch")]
    pub release_branch: String,

    /// Template for the release commit and tag message
    #[serde(default = "default_commit_message")]
    pub default_commit_message: String,
}

impl VcsConfig {
    /// Release branch name for the major/minor line of `version`
    pub fn branch_name_for(&self, version: &ReleaseVersion) -> String {
        version.render(&self.release_branch)
    }
}

impl Default for VcsConfig {
    fn default() -> Self {
        VcsConfig {
            remote: default_remote(),
            master_branch: default_master_branch(),
            release_branch: default_release_branch(),
            default_commit_message: default_commit_message(),
        }
    }
}

fn default_filepath() -> String {
    ".".to_string()
}

fn default_filename() -> String {
    "VERSION".to_string()
}

/// Location of the tracked version file, relative to the repository root.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_filepath")]
    pub filepath: String,

    #[serde(default = "default_filename")]
    pub filename: String,
}

impl StorageConfig {
    /// Repository-relative path of the version file, without `.` components
    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.filepath)
            .join(&self.filename)
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            filepath: default_filepath(),
            filename: default_filename(),
        }
    }
}

/// Branch patterns per release kind. A missing entry means no restriction.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AuthorizedBranches {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl AuthorizedBranches {
    pub fn get(&self, kind: ReleaseKind) -> Option<&str> {
        match kind {
            ReleaseKind::Major => self.major.as_deref(),
            ReleaseKind::Minor => self.minor.as_deref(),
            ReleaseKind::Patch => self.patch.as_deref(),
        }
    }
}

/// The read-only policy handed to the release engine
#[derive(Debug, Clone, Default)]
pub struct ReleasePolicy {
    pub authorized_branches: BranchPolicy,
    pub commit_message: CommitMessage,
}

impl Config {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| VersionManagerError::config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Compile branch patterns and the commit message into the engine policy
    pub fn release_policy(&self) -> Result<ReleasePolicy> {
        let mut authorized_branches = BranchPolicy::unrestricted();
        for kind in ReleaseKind::ALL {
            if let Some(pattern) = self.authorized_branches.get(kind) {
                authorized_branches = authorized_branches.with_pattern(kind, pattern)?;
            }
        }

        Ok(ReleasePolicy {
            authorized_branches,
            commit_message: CommitMessage::text(self.vcs.default_commit_message.clone()),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.vcs.remote.trim().is_empty() {
            return Err(VersionManagerError::config("vcs.remote must not be empty"));
        }
        if self.vcs.master_branch.trim().is_empty() {
            return Err(VersionManagerError::config(
                "vcs.master_branch must not be empty",
            ));
        }
        if self.storage.filename.trim().is_empty() {
            return Err(VersionManagerError::config(
                "storage.filename must not be empty",
            ));
        }
        if Path::new(&self.storage.filepath).is_absolute() {
            return Err(VersionManagerError::config(
                "storage.filepath must be relative to the repository root",
            ));
        }
        self.release_policy().map(|_| ())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `version-manager.toml` in current directory
/// 3. `version-manager/config.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => match discover_config_file() {
            Some(path) => path,
            None => {
                debug!("no configuration file found, using defaults");
                return Ok(Config::default());
            }
        },
    };

    debug!(path = %path.display(), "loading configuration");
    let content = fs::read_to_string(&path).map_err(|e| {
        VersionManagerError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    Config::from_toml_str(&content)
}

fn discover_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(".").join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    let user = dirs::config_dir()?.join("version-manager").join("config.toml");
    user.exists().then_some(user)
}
