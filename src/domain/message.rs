use crate::domain::ReleaseVersion;
use std::fmt;
use std::sync::Arc;

/// Message used for the release commit and the annotated tag.
#[derive(Clone)]
pub enum CommitMessage {
    /// Template text; `{version}`, `{major}`, `{minor}` and `{patch}` are substituted.
    Text(String),
    /// Computed from the new version.
    Generator(Arc<dyn Fn(&ReleaseVersion) -> String + Send + Sync>),
}

impl CommitMessage {
    pub fn text(template: impl Into<String>) -> Self {
        CommitMessage::Text(template.into())
    }

    pub fn generator<F>(f: F) -> Self
    where
        F: Fn(&ReleaseVersion) -> String + Send + Sync + 'static,
    {
        CommitMessage::Generator(Arc::new(f))
    }

    pub fn render(&self, version: &ReleaseVersion) -> String {
        match self {
            CommitMessage::Text(template) => version.render(template),
            CommitMessage::Generator(f) => f(version),
        }
    }
}

impl Default for CommitMessage {
    fn default() -> Self {
        CommitMessage::text("Release {version}")
    }
}

impl fmt::Debug for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitMessage::Text(template) => f.debug_tuple("Text").field(template).finish(),
            CommitMessage::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

impl From<String> for CommitMessage {
    fn from(template: String) -> Self {
        CommitMessage::Text(template)
    }
}
