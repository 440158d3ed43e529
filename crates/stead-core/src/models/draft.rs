//! Site draft model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::util::unix_timestamp_now;

/// Identifier of a site being edited.
///
/// Opaque to the sync engine; it only has to be non-empty and stable for
/// the session. The draft is keyed by it in storage and addressed by it on
/// the wire, so the identifier travels alongside the draft rather than
/// inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId(String);

impl SiteId {
    /// Create a site ID from a raw slug, rejecting empty values.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("site ID must not be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the raw slug.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which this site's draft lives in the local store.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("site:{}", self.0)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SiteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// The full editable state for one site.
///
/// `content` is the block document produced by the external editor; the
/// sync engine treats it as an atomic blob and never looks inside it.
/// Serialized in camelCase to match the remote contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// Site title, may be empty
    #[serde(default)]
    pub title: String,
    /// Site description, may be empty
    #[serde(default)]
    pub description: String,
    /// Unix seconds of the most recent local mutation
    #[serde(default)]
    pub last_updated: i64,
    /// Opaque block document
    #[serde(default)]
    pub content: serde_json::Value,
}

impl Draft {
    /// Stamp the draft after a local mutation.
    ///
    /// `last_updated` never decreases, even under clock adjustment or
    /// several edits within the same second.
    pub fn touch(&mut self) {
        self.last_updated = unix_timestamp_now().max(self.last_updated);
    }
}
