//! Newtype domain identifiers.

use serde::{Deserialize, Serialize};

/// Identifies a GitHub repository in `"owner/repo"` format.
///
/// Both parts must be non-empty and there must be exactly one `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId(String);

impl RepositoryId {
    /// Creates a new identifier, returning `None` unless the value has the
    /// shape `owner/repo`.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        match v.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Some(Self(v))
            }
            _ => None,
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the owner (user or organisation) part.
    pub fn owner(&self) -> &str {
        self.split().0
    }

    /// Returns the repository name part.
    pub fn name(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        // Validated on construction.
        self.0.split_once('/').unwrap_or((&self.0, ""))
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RepositoryId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or_else(|| format!("expected 'owner/repo', got '{s}'"))
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepositoryId> for String {
    fn from(id: RepositoryId) -> Self {
        id.0
    }
}
