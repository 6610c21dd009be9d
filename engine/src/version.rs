//! Version-encoded query names.
//!
//! Several versions of one logical query can live in the allow-list at the
//! same time. Each stored name carries its logical base name, the publish
//! time and a caller-chosen tag:
//!
//! ```text
//! <baseName>___(<epoch-millis>-<versionTag>)
//! ```
//!
//! Names that do not match the pattern are unversioned.

use crate::clock::{Clock, SystemClock};
use crate::{Error, QueryName, Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opens the version suffix.
pub const VERSION_DELIMITER: &str = "___(";

/// Closes the version suffix.
pub const VERSION_CLOSE: char = ')';

/// A validated version tag.
///
/// Tags are opaque text that cannot contain the suffix delimiters, so every
/// encoded name decodes back to the same base name and tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        let reason = if tag.is_empty() {
            Some("must not be empty")
        } else if tag.contains(VERSION_DELIMITER) {
            Some("must not contain '___('")
        } else if tag.contains(VERSION_CLOSE) {
            Some("must not contain ')'")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(Error::InvalidVersionTag { tag, reason }),
            None => Ok(Self(tag)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VersionTag {
    type Error = Error;

    fn try_from(tag: String) -> Result<Self> {
        Self::new(tag)
    }
}

impl From<VersionTag> for String {
    fn from(tag: VersionTag) -> Self {
        tag.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The decoded parts of a versioned name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedName {
    /// Logical query name
    pub base_name: QueryName,
    /// Publish time (milliseconds since epoch)
    pub timestamp: Timestamp,
    /// Caller-supplied version tag
    pub tag: String,
}

impl VersionedName {
    /// Decode a stored name. Returns `None` for unversioned names.
    pub fn parse(name: &str) -> Option<Self> {
        let inner = name.strip_suffix(VERSION_CLOSE)?;
        let start = inner.rfind(VERSION_DELIMITER)?;
        let base_name = &inner[..start];
        let suffix = &inner[start + VERSION_DELIMITER.len()..];

        let (millis, tag) = suffix.split_once('-')?;
        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if base_name.is_empty() || tag.contains(VERSION_CLOSE) {
            return None;
        }
        let timestamp = millis.parse().ok()?;

        Some(Self {
            base_name: base_name.to_string(),
            timestamp,
            tag: tag.to_string(),
        })
    }

    /// The stored name for these parts.
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}-{}{}",
            self.base_name, VERSION_DELIMITER, self.timestamp, self.tag, VERSION_CLOSE
        )
    }
}

/// Encode `base_name` as published now with `tag`.
///
/// Embeds the wall-clock time, so two calls produce different names; encode
/// exactly once per publish.
pub fn encode(base_name: &str, tag: &VersionTag) -> String {
    encode_at(base_name, tag, SystemClock.now_millis())
}

/// Encode `base_name` as published at `timestamp` with `tag`.
pub fn encode_at(base_name: &str, tag: &VersionTag, timestamp: Timestamp) -> String {
    VersionedName {
        base_name: base_name.to_string(),
        timestamp,
        tag: tag.as_str().to_string(),
    }
    .encode()
}

/// Decode a stored name. Returns `None` for unversioned names.
pub fn decode(name: &str) -> Option<VersionedName> {
    VersionedName::parse(name)
}

/// Logical name of a stored name: the base name when versioned, the name
/// itself otherwise.
pub fn base_name(name: &str) -> &str {
    if decode(name).is_none() {
        return name;
    }
    name.rfind(VERSION_DELIMITER)
        .map_or(name, |start| &name[..start])
}
