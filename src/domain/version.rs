use crate::error::{Result, VersionManagerError};
use std::fmt;
use std::str::FromStr;

/// A released version: `MAJOR.MINOR.PATCH` with no prefix, pre-release or build metadata.
///
/// Values are only obtained through [`ReleaseVersion::parse`], [`ReleaseVersion::new`] or one of
/// the bump operations, which all return a fresh instance. Ordering is the lexicographic order of
/// `(major, minor, patch)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ReleaseVersion {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        ReleaseVersion {
            major,
            minor,
            patch,
        }
    }

    /// Parse `"M.m.p"`. Surrounding whitespace is ignored, anything else is rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let invalid = || VersionManagerError::InvalidVersionFormat(trimmed.to_string());

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        // u64::from_str accepts a leading '+', so check the digits first
        let component = |part: &str| -> Result<u64> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            // u64::MAX could not be bumped, so it is not a valid version component
            match part.parse::<u64>() {
                Ok(value) if value < u64::MAX => Ok(value),
                _ => Err(invalid()),
            }
        };

        Ok(ReleaseVersion {
            major: component(parts[0])?,
            minor: component(parts[1])?,
            patch: component(parts[2])?,
        })
    }

    /// Components saturate at `u64::MAX`, a value `parse` never accepts
    pub fn bump_major(&self) -> Self {
        ReleaseVersion::new(self.major.saturating_add(1), 0, 0)
    }

    pub fn bump_minor(&self) -> Self {
        ReleaseVersion::new(self.major, self.minor.saturating_add(1), 0)
    }

    pub fn bump_patch(&self) -> Self {
        ReleaseVersion::new(self.major, self.minor, self.patch.saturating_add(1))
    }

    /// Bump according to release kind
    pub fn bump(&self, kind: ReleaseKind) -> Self {
        match kind {
            ReleaseKind::Major => self.bump_major(),
            ReleaseKind::Minor => self.bump_minor(),
            ReleaseKind::Patch => self.bump_patch(),
        }
    }

    /// Name of the long-lived branch for this major/minor line, e.g. `release-2.1`.
    pub fn branch_name(&self) -> String {
        format!("release-{}.{}", self.major, self.minor)
    }

    /// Substitute `{version}`, `{major}`, `{minor}` and `{patch}` in a template.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{version}", &self.to_string())
            .replace("{major}", &self.major.to_string())
            .replace("{minor}", &self.minor.to_string())
            .replace("{patch}", &self.patch.to_string())
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ReleaseVersion {
    type Err = VersionManagerError;

    fn from_str(s: &str) -> Result<Self> {
        ReleaseVersion::parse(s)
    }
}

/// Release kind: selects the bumped component and the branch policy entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseKind {
    Major,
    Minor,
    Patch,
}

impl ReleaseKind {
    pub const ALL: [ReleaseKind; 3] = [ReleaseKind::Major, ReleaseKind::Minor, ReleaseKind::Patch];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseKind::Major => "major",
            ReleaseKind::Minor => "minor",
            ReleaseKind::Patch => "patch",
        }
    }

    /// Major and minor releases open a new release branch; patches publish in place.
    pub fn creates_branch(&self) -> bool {
        !matches!(self, ReleaseKind::Patch)
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseKind {
    type Err = VersionManagerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(ReleaseKind::Major),
            "minor" => Ok(ReleaseKind::Minor),
            "patch" => Ok(ReleaseKind::Patch),
            other => Err(VersionManagerError::config(format!(
                "Unknown release kind '{}' - expected major, minor or patch",
                other
            ))),
        }
    }
}
