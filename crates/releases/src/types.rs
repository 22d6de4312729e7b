//! Value types for the Release Relay domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Release record
// ---------------------------------------------------------------------------

/// One published release of a repository.
///
/// `name` is the display name and the only attribute the acceptance check
/// looks at. The remaining fields are carried through from the upstream for
/// callers that want them; all of them may be absent on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Display name, e.g. `"Micronaut Framework 4.0.0"`.
    pub name: String,

    /// Git tag the release points at, e.g. `"v4.0.0"`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag_name: String,

    /// Browser URL of the release page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,

    /// Whether the upstream marks the release as a pre-release.
    #[serde(default)]
    pub prerelease: bool,

    /// When the release was published. Drafts have no publication time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
}

impl Release {
    /// Creates a release carrying only a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag_name: String::new(),
            html_url: None,
            prerelease: false,
            published_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly. Serialises as RFC 3339, which is also what GitHub emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_name_only_record() {
        let release: Release = serde_json::from_str(r#"{"name":"Micronaut 3.4.0"}"#).unwrap();
        assert_eq!(release, Release::named("Micronaut 3.4.0"));
    }

    #[test]
    fn ignores_unknown_fields_and_keeps_known_ones() {
        let release: Release = serde_json::from_str(
            r#"{
                "id": 1,
                "name": "Micronaut Framework 4.0.0",
                "tag_name": "v4.0.0",
                "prerelease": false,
                "published_at": "2023-07-11T08:15:00Z",
                "assets": []
            }"#,
        )
        .unwrap();
        assert_eq!(release.tag_name, "v4.0.0");
        assert_eq!(
            release.published_at.map(|t| t.to_string()),
            Some("2023-07-11T08:15:00+00:00".to_string())
        );
    }

    #[test]
    fn omits_empty_optional_fields_when_encoding() {
        let json = serde_json::to_value(Release::named("Micronaut 3.4.0")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "Micronaut 3.4.0", "prerelease": false })
        );
    }
}
