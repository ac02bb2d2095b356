//! Calculation service replaying pre-computed per-event values.
//!
//! Input is JSON lines, one [`EventRow`] per line. Rec-level blocks for
//! systematic variations live under `rec_shifted`, keyed by the raw shift
//! identifier.

use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use evs_core::errors::{ErrorInfo, EvsError};
use evs_core::{EventId, FourVector, Level, SysShift};
use serde::{Deserialize, Serialize};

use crate::service::{BeamVectors, CalcService, Conditions, Kinematics, Method, Scalar};

/// Values for one level of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRow {
    /// Event weight.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Scattered lepton.
    pub lepton: FourVector,
    /// Hadronic final state.
    pub hfs: FourVector,
    /// Kinematics keyed by reconstruction method.
    #[serde(default)]
    pub kinematics: BTreeMap<Method, Kinematics>,
    /// Detector scalars (rec level only).
    #[serde(default)]
    pub scalars: BTreeMap<Scalar, f64>,
}

fn default_weight() -> f64 {
    1.0
}

/// One input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    /// Run number.
    pub run: u32,
    /// Event number.
    pub event: u32,
    /// Beam vectors; HERA-II defaults when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beams: Option<BeamVectors>,
    /// Generator level, absent for recorded data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gen: Option<LevelRow>,
    /// Nominal reconstructed level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rec: Option<LevelRow>,
    /// Reconstructed level under systematic variations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rec_shifted: BTreeMap<i32, LevelRow>,
    /// Status answers.
    #[serde(default)]
    pub conditions: Conditions,
}

impl EventRow {
    fn id(&self) -> EventId {
        EventId::new(self.run, self.event)
    }
}

/// Table-backed [`CalcService`].
#[derive(Debug, Clone)]
pub struct TableService {
    pending: VecDeque<EventRow>,
    current: Option<EventRow>,
    shift: SysShift,
}

impl TableService {
    /// Creates a service over an in-memory list of rows.
    pub fn from_rows(rows: Vec<EventRow>) -> Self {
        Self {
            pending: rows.into(),
            current: None,
            shift: SysShift::NOMINAL,
        }
    }

    /// Parses JSON lines from a reader. Blank lines are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, EvsError> {
        let mut rows = Vec::new();
        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line = line.map_err(|err| {
                EvsError::Serde(
                    ErrorInfo::new("table.read", err.to_string())
                        .with_context("line", (index + 1).to_string()),
                )
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let row: EventRow = serde_json::from_str(&line).map_err(|err| {
                EvsError::Serde(
                    ErrorInfo::new("table.parse", err.to_string())
                        .with_context("line", (index + 1).to_string()),
                )
            })?;
            rows.push(row);
        }
        Ok(Self::from_rows(rows))
    }

    /// Opens and parses a JSON-lines file.
    pub fn from_path(path: &Path) -> Result<Self, EvsError> {
        let file = File::open(path).map_err(|err| {
            EvsError::Config(
                ErrorInfo::new("table.open", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_reader(file)
    }

    /// Number of events not yet loaded.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn current(&self) -> Result<&EventRow, EvsError> {
        self.current.as_ref().ok_or_else(|| {
            EvsError::Extraction(
                ErrorInfo::new("table.no_event", "no event loaded")
                    .with_hint("call next_event before querying"),
            )
        })
    }

    fn level_row(&self, level: Level) -> Result<&LevelRow, EvsError> {
        let row = self.current()?;
        let block = match level {
            Level::Gen => row.gen.as_ref(),
            Level::Rec if self.shift.is_nominal() => row.rec.as_ref(),
            Level::Rec => {
                return row.rec_shifted.get(&self.shift.as_raw()).ok_or_else(|| {
                    EvsError::Extraction(
                        ErrorInfo::new(
                            "table.sys_shift",
                            "no rec block for the selected systematic shift",
                        )
                        .with_context("sys_shift", self.shift.as_raw().to_string()),
                    )
                });
            }
        };
        block.ok_or_else(|| {
            EvsError::Extraction(
                ErrorInfo::new("table.level", "level not present in input row")
                    .with_context("level", level.as_str()),
            )
        })
    }
}

impl CalcService for TableService {
    fn set_sys_shift(&mut self, shift: SysShift) -> Result<(), EvsError> {
        self.shift = shift;
        Ok(())
    }

    fn next_event(&mut self) -> Result<Option<EventId>, EvsError> {
        self.current = self.pending.pop_front();
        Ok(self.current.as_ref().map(EventRow::id))
    }

    fn event_id(&self) -> Option<EventId> {
        self.current.as_ref().map(EventRow::id)
    }

    fn beam_vectors(&self) -> Result<BeamVectors, EvsError> {
        Ok(self.current()?.beams.unwrap_or_default())
    }

    fn weight(&self, level: Level) -> Result<f64, EvsError> {
        Ok(self.level_row(level)?.weight)
    }

    fn scattered_lepton(&self, level: Level) -> Result<FourVector, EvsError> {
        Ok(self.level_row(level)?.lepton)
    }

    fn hadronic_final_state(&self, level: Level) -> Result<FourVector, EvsError> {
        Ok(self.level_row(level)?.hfs)
    }

    fn kinematics(&self, level: Level, method: Method) -> Result<Kinematics, EvsError> {
        self.level_row(level)?
            .kinematics
            .get(&method)
            .copied()
            .ok_or_else(|| {
                EvsError::Extraction(
                    ErrorInfo::new("table.kinematics", "method not present in input row")
                        .with_context("level", level.as_str())
                        .with_context("method", method.as_str()),
                )
            })
    }

    fn scalar(&self, scalar: Scalar) -> Result<f64, EvsError> {
        self.level_row(Level::Rec)?
            .scalars
            .get(&scalar)
            .copied()
            .ok_or_else(|| {
                EvsError::Extraction(
                    ErrorInfo::new("table.scalar", "scalar not present in input row")
                        .with_context("scalar", scalar.as_str()),
                )
            })
    }

    fn conditions(&self) -> Result<Conditions, EvsError> {
        Ok(self.current()?.conditions)
    }
}
