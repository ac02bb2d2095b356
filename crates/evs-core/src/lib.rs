#![deny(missing_docs)]
#![doc = "Core vocabulary shared by the evshape crates: error surface, analysis levels, systematic-shift selector and four-vectors."]

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod provenance;
pub mod vector;

pub use errors::{ErrorInfo, EvsError};
pub use provenance::{RunProvenance, SchemaVersion};
pub use vector::FourVector;

/// Analysis level a quantity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Level {
    /// Generator (truth) level, available for simulated events only.
    Gen,
    /// Reconstructed (detector) level.
    Rec,
}

impl Level {
    /// Short lowercase label used in logs and error context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Gen => "gen",
            Level::Rec => "rec",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-scoped systematic-shift identifier.
///
/// The pipeline only stores and forwards the value; the calculation service
/// owns the mapping from identifier to variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SysShift(i32);

impl SysShift {
    /// Sentinel selecting the nominal (unshifted) configuration.
    pub const NOMINAL: SysShift = SysShift(-9999);

    /// Creates a selector from its raw identifier.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    pub fn as_raw(&self) -> i32 {
        self.0
    }

    /// True when no systematic variation is selected.
    pub fn is_nominal(&self) -> bool {
        *self == Self::NOMINAL
    }
}

impl Default for SysShift {
    fn default() -> Self {
        Self::NOMINAL
    }
}

impl fmt::Display for SysShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nominal() {
            f.write_str("nominal")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Identifier of a recorded or simulated event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct EventId {
    /// Run number.
    pub run: u32,
    /// Event number within the run.
    pub event: u32,
}

impl EventId {
    /// Creates a new event identifier.
    pub const fn new(run: u32, event: u32) -> Self {
        Self { run, event }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.run, self.event)
    }
}
