//! Provenance attached to run summaries.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// `major.minor.patch` version of the mini-tree column layout.
///
/// Serialized as a dotted string. Readers accept any payload with the same
/// major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SchemaVersion {
    /// Bumped when columns are removed or renamed.
    pub major: u32,
    /// Bumped when columns are appended.
    pub minor: u32,
    /// Bumped for documentation-only changes.
    pub patch: u32,
}

impl SchemaVersion {
    /// Builds a version from its parts.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True when a reader built for `self` can consume a payload written as `written`.
    pub fn reads(&self, written: &SchemaVersion) -> bool {
        self.major == written.major
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = text.split('.').collect();
        if parts.len() != 3 {
            return Err(format!("schema version `{text}` is not major.minor.patch"));
        }
        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("schema version `{text}` has a non-numeric part"))?;
        }
        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.to_string()
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = String;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

/// Where a run summary came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProvenance {
    /// Digest of the run configuration.
    pub config_hash: String,
    /// Chain (sample) name.
    pub chain: String,
    /// Raw systematic-shift identifier forwarded to the calculation service.
    pub sys_shift: i32,
    /// Mini-tree column layout version.
    pub schema_version: SchemaVersion,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Crate name to version.
    pub tool_versions: BTreeMap<String, String>,
}
