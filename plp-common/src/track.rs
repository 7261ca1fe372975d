//! Track value type

use serde::{Deserialize, Serialize};

/// One playable item in a playlist
///
/// Two tracks refer to the same item when their `location` matches; the
/// display `name` does not take part in membership tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Display name
    pub name: String,
    /// Source reference handed to the audio resource (path or URI)
    pub location: String,
}

impl Track {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    /// Build a track whose name is the last path segment of `location`
    ///
    /// Query strings and trailing slashes are ignored when picking the
    /// segment. Falls back to the full location when no segment is found.
    pub fn from_location(location: impl Into<String>) -> Self {
        let location = location.into();
        let without_query = location.split(['?', '#']).next().unwrap_or("");
        let name = without_query
            .trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\'])
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(location.as_str())
            .to_string();

        Self { name, location }
    }

    /// Whether this track has a usable location
    pub fn has_location(&self) -> bool {
        !self.location.trim().is_empty()
    }

    /// Membership identity: same location
    pub fn same_location(&self, other: &Track) -> bool {
        self.location == other.location
    }
}
