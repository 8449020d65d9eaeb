use crate::domain::ReleaseKind;
use crate::error::{Result, VersionManagerError};
use regex::Regex;
use std::collections::HashMap;

/// Which branches may trigger each release kind.
///
/// Patterns are regular expressions searched anywhere in the branch name (anchor them with
/// `^`/`$` when needed). A kind without a pattern is unrestricted.
#[derive(Debug, Clone, Default)]
pub struct BranchPolicy {
    patterns: HashMap<ReleaseKind, Regex>,
}

impl BranchPolicy {
    /// Policy that allows every release kind from every branch
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Restrict `kind` to branches matching `pattern`
    pub fn with_pattern(mut self, kind: ReleaseKind, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            VersionManagerError::config(format!(
                "Invalid branch pattern for {} releases '{}': {}",
                kind, pattern, e
            ))
        })?;
        self.patterns.insert(kind, regex);
        Ok(self)
    }

    /// The configured pattern for `kind`, if any
    pub fn pattern(&self, kind: ReleaseKind) -> Option<&str> {
        self.patterns.get(&kind).map(|re| re.as_str())
    }

    pub fn allows(&self, kind: ReleaseKind, branch: &str) -> bool {
        self.patterns
            .get(&kind)
            .map_or(true, |re| re.is_match(branch))
    }
}
