//! Identifier types used throughout the deployment engine.
//!
//! Extension ids are derived from the human-readable extension name, so the
//! same extension gets the same id on staging and production. Batch ids use
//! UUID v7 for natural ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a registered extension.
///
/// Always produced by [`make_id`]; two names that normalize to the same
/// string share an id.
///
/// Deserializing normalizes, so a batch file may key extensions by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ExtensionId(String);

impl ExtensionId {
    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the normalized name produced no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExtensionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExtensionId {
    fn from(name: &str) -> Self {
        make_id(name)
    }
}

impl From<String> for ExtensionId {
    fn from(name: String) -> Self {
        make_id(&name)
    }
}

impl From<ExtensionId> for String {
    fn from(id: ExtensionId) -> Self {
        id.0
    }
}

/// Derives an extension id from its declared name.
///
/// Case is folded, and every run of whitespace or punctuation becomes a
/// single `-`. Leading and trailing separators are dropped.
///
/// ```
/// use ramp_types::make_id;
///
/// assert_eq!(make_id("RAMP Plugin Example").as_str(), "ramp-plugin-example");
/// assert_eq!(make_id("  ramp   plugin_example ").as_str(), "ramp-plugin-example");
/// ```
#[must_use]
pub fn make_id(name: &str) -> ExtensionId {
    let mut id = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_separator && !id.is_empty() {
                id.push('-');
            }
            pending_separator = false;
            id.push(ch);
        } else {
            pending_separator = true;
        }
    }

    ExtensionId(id)
}

/// Unique identifier for one deployment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Creates a new batch ID with the current timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a batch ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
