use evs_core::errors::{ErrorInfo, EvsError};
use evs_core::Level;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::record::LevelQuantities;
use crate::service::{CalcService, Conditions, Method, Scalar};

/// Closed interval with optional bounds; an absent bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Window {
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Window {
    /// Window with both bounds set.
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Window accepting every value.
    pub const fn open() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// True when `value` lies inside the window.
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn validate(&self, name: &str) -> Result<(), EvsError> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(EvsError::Config(
                    ErrorInfo::new("cuts.window", "window minimum exceeds maximum")
                        .with_context("window", name)
                        .with_context("min", min.to_string())
                        .with_context("max", max.to_string()),
                ));
            }
        }
        Ok(())
    }
}

/// Phase-space window applied to one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PhaseSpace {
    /// Q² window in GeV².
    #[serde(default)]
    pub q2: Window,
    /// Inelasticity window.
    #[serde(default)]
    pub y: Window,
}

/// Framework-wide event-quality cuts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicCutSpec {
    /// Accepted primary vertex z range (cm), rec level.
    #[serde(default = "BasicCutSpec::default_vertex_z")]
    pub vertex_z: Window,
    /// Accepted E − pz range (GeV), rec level.
    #[serde(default = "BasicCutSpec::default_empz")]
    pub empz: Window,
    /// Veto events with a failed detector-status check.
    #[serde(default = "BasicCutSpec::default_require")]
    pub require_detector_status: bool,
    /// Veto runs outside the run list.
    #[serde(default = "BasicCutSpec::default_require")]
    pub require_run_selected: bool,
    /// Veto scattered leptons outside the fiducial volume.
    #[serde(default = "BasicCutSpec::default_require")]
    pub require_fiducial: bool,
    /// Gen-level phase space.
    #[serde(default)]
    pub gen: PhaseSpace,
    /// Rec-level phase space.
    #[serde(default)]
    pub rec: PhaseSpace,
}

impl BasicCutSpec {
    fn default_vertex_z() -> Window {
        Window::between(-35.0, 35.0)
    }
    fn default_empz() -> Window {
        Window::between(35.0, 70.0)
    }
    fn default_require() -> bool {
        true
    }

    /// Rejects inverted windows.
    pub fn validate(&self) -> Result<(), EvsError> {
        self.vertex_z.validate("vertex_z")?;
        self.empz.validate("empz")?;
        self.gen.q2.validate("gen.q2")?;
        self.gen.y.validate("gen.y")?;
        self.rec.q2.validate("rec.q2")?;
        self.rec.y.validate("rec.y")?;
        Ok(())
    }
}

impl Default for BasicCutSpec {
    fn default() -> Self {
        Self {
            vertex_z: Self::default_vertex_z(),
            empz: Self::default_empz(),
            require_detector_status: true,
            require_run_selected: true,
            require_fiducial: true,
            gen: PhaseSpace::default(),
            rec: PhaseSpace::default(),
        }
    }
}

/// Detector-only inputs, present at rec level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorInputs {
    /// Primary vertex z.
    pub vertex_z: f64,
    /// E − pz.
    pub empz: f64,
    /// Status answers.
    pub conditions: Conditions,
}

/// Values the cuts of one level are evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutInputs {
    /// Level the inputs belong to.
    pub level: Level,
    /// Q² (true at gen level, the configured method at rec level).
    pub q2: f64,
    /// y matching `q2`.
    pub y: f64,
    /// Detector inputs, rec level only.
    pub detector: Option<DetectorInputs>,
}

impl CutInputs {
    /// Fetches the cut inputs for a level from the calculation service.
    pub fn gather(
        service: &dyn CalcService,
        level: Level,
        rec_method: Method,
    ) -> Result<Self, EvsError> {
        let tag = |err: EvsError| err.with_context("level", level.as_str());
        match level {
            Level::Gen => {
                let truth = service
                    .kinematics(Level::Gen, Method::True)
                    .map_err(|err| tag(err.with_context("field", "cut.q2")))?;
                Ok(Self {
                    level,
                    q2: truth.q2,
                    y: truth.y,
                    detector: None,
                })
            }
            Level::Rec => {
                let kine = service
                    .kinematics(Level::Rec, rec_method)
                    .map_err(|err| tag(err.with_context("field", "cut.q2")))?;
                let vertex_z = service
                    .scalar(Scalar::VertexZ)
                    .map_err(|err| tag(err.with_context("field", "cut.vertex_z")))?;
                let empz = service
                    .scalar(Scalar::EMinusPz)
                    .map_err(|err| tag(err.with_context("field", "cut.empz")))?;
                let conditions = service
                    .conditions()
                    .map_err(|err| tag(err.with_context("field", "cut.conditions")))?;
                Ok(Self {
                    level,
                    q2: kine.q2,
                    y: kine.y,
                    detector: Some(DetectorInputs {
                        vertex_z,
                        empz,
                        conditions,
                    }),
                })
            }
        }
    }
}

/// Per-predicate outcome of the basic cuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BasicCutDecision {
    /// Q² and y windows.
    pub phase_space: bool,
    /// Vertex window.
    pub vertex: bool,
    /// E − pz window.
    pub empz: bool,
    /// Detector-status veto.
    pub detector: bool,
    /// Run-list selection.
    pub run_list: bool,
    /// Fiducial volume.
    pub fiducial: bool,
}

impl BasicCutDecision {
    /// Returns true when all predicates succeed.
    pub fn passes(&self) -> bool {
        self.phase_space && self.vertex && self.empz && self.detector && self.run_list && self.fiducial
    }
}

/// Cut bookkeeping for one level within one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelCuts {
    /// Basic cut outcome, set once per event.
    pub basic: Option<BasicCutDecision>,
    /// Analysis-specific outcome, set once per event.
    pub analysis: Option<bool>,
}

impl LevelCuts {
    /// Combined verdict once both predicates are known.
    pub fn verdict(&self) -> Option<bool> {
        Some(self.basic?.passes() && self.analysis?)
    }
}

/// Evaluates the basic cuts and writes the per-level verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct CutGate {
    spec: BasicCutSpec,
}

impl CutGate {
    /// Creates a gate for the provided cut specification.
    pub fn new(spec: BasicCutSpec) -> Result<Self, EvsError> {
        spec.validate()?;
        Ok(Self { spec })
    }

    /// Applies the basic cuts to the inputs of one level.
    pub fn evaluate_basic(&self, inputs: &CutInputs) -> BasicCutDecision {
        let phase_space = match inputs.level {
            Level::Gen => &self.spec.gen,
            Level::Rec => &self.spec.rec,
        };
        let mut decision = BasicCutDecision {
            phase_space: phase_space.q2.contains(inputs.q2) && phase_space.y.contains(inputs.y),
            vertex: true,
            empz: true,
            detector: true,
            run_list: true,
            fiducial: true,
        };
        if let Some(detector) = &inputs.detector {
            decision.vertex = self.spec.vertex_z.contains(detector.vertex_z);
            decision.empz = self.spec.empz.contains(detector.empz);
            decision.detector =
                !self.spec.require_detector_status || detector.conditions.detector_ok;
            decision.run_list = !self.spec.require_run_selected || detector.conditions.run_selected;
            decision.fiducial = !self.spec.require_fiducial || detector.conditions.fiducial_ok;
        }
        trace!(level = %inputs.level, ?decision, "basic cuts evaluated");
        decision
    }

    /// Writes `is_good` once both predicates of the level are known.
    ///
    /// Returns the verdict, or `None` (leaving `is_good` untouched) while one
    /// of the predicates is still missing.
    pub fn settle(cuts: &LevelCuts, quantities: &mut LevelQuantities) -> Option<bool> {
        let verdict = cuts.verdict()?;
        quantities.is_good = verdict;
        Some(verdict)
    }
}
