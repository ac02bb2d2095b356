use evs_core::errors::EvsError;
use evs_core::{EventId, FourVector, Level, SysShift};
use serde::{Deserialize, Serialize};

/// Kinematic reconstruction method.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// True (generator) kinematics; only defined at gen level.
    True,
    /// Electron method.
    #[default]
    Electron,
    /// Sigma (Jacquet-Blondel corrected) method.
    Sigma,
    /// Double-angle method.
    DoubleAngle,
    /// e-Sigma method.
    ESigma,
    /// Hadronic method.
    Hadronic,
}

impl Method {
    /// Stable label used in error context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::True => "true",
            Method::Electron => "electron",
            Method::Sigma => "sigma",
            Method::DoubleAngle => "double-angle",
            Method::ESigma => "e-sigma",
            Method::Hadronic => "hadronic",
        }
    }
}

/// Pre-computed (Q², x, y) triple for one method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Kinematics {
    /// Squared momentum transfer in GeV².
    pub q2: f64,
    /// Bjorken x.
    pub x: f64,
    /// Inelasticity.
    pub y: f64,
}

/// Detector-level scalar observables supplied by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scalar {
    /// Primary vertex z position in cm.
    VertexZ,
    /// Longitudinal energy balance E − pz.
    EMinusPz,
    /// Missing transverse momentum.
    PtMiss,
    /// Calorimetric hadronic transverse momentum.
    PtCalo,
    /// Hadronic transverse momentum expected from the double-angle method.
    HadronicPtDa,
    /// Lepton-hadron acoplanarity.
    Acoplanarity,
}

impl Scalar {
    /// Stable label used in error context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scalar::VertexZ => "vertex-z",
            Scalar::EMinusPz => "e-minus-pz",
            Scalar::PtMiss => "pt-miss",
            Scalar::PtCalo => "pt-calo",
            Scalar::HadronicPtDa => "hadronic-pt-da",
            Scalar::Acoplanarity => "acoplanarity",
        }
    }
}

/// Incoming beam four-vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamVectors {
    /// Lepton beam.
    pub lepton: FourVector,
    /// Proton beam.
    pub proton: FourVector,
}

impl BeamVectors {
    /// HERA-II beams: 27.6 GeV leptons along −z, 920 GeV protons along +z.
    pub fn hera() -> Self {
        Self {
            lepton: FourVector::new(0.0, 0.0, -27.6, 27.6),
            proton: FourVector::new(0.0, 0.0, 920.0, 920.000_478),
        }
    }
}

impl Default for BeamVectors {
    fn default() -> Self {
        Self::hera()
    }
}

/// Yes/no answers of the run-status, run-list and fiducial-volume services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    /// Relevant detector components were operational.
    #[serde(default = "default_true")]
    pub detector_ok: bool,
    /// The run is on the selected run list.
    #[serde(default = "default_true")]
    pub run_selected: bool,
    /// The scattered lepton lies in the fiducial volume.
    #[serde(default = "default_true")]
    pub fiducial_ok: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Conditions {
    fn default() -> Self {
        Self {
            detector_ok: true,
            run_selected: true,
            fiducial_ok: true,
        }
    }
}

/// External kinematics calculation service.
///
/// The service is bound to one event at a time; [`CalcService::next_event`]
/// pulls the next one from the underlying input. Every query may fail, and a
/// failure is fatal for the run.
pub trait CalcService {
    /// Selects the systematic variation; invoked once per run.
    fn set_sys_shift(&mut self, shift: SysShift) -> Result<(), EvsError>;

    /// Loads the next event, returning `None` once the input is exhausted.
    fn next_event(&mut self) -> Result<Option<EventId>, EvsError>;

    /// Identifier of the loaded event, if any.
    fn event_id(&self) -> Option<EventId>;

    /// Incoming beam vectors.
    fn beam_vectors(&self) -> Result<BeamVectors, EvsError>;

    /// Event weight for the level.
    fn weight(&self, level: Level) -> Result<f64, EvsError>;

    /// Scattered lepton four-vector.
    fn scattered_lepton(&self, level: Level) -> Result<FourVector, EvsError>;

    /// Hadronic final state (all final-state particles except the lepton).
    fn hadronic_final_state(&self, level: Level) -> Result<FourVector, EvsError>;

    /// Pre-computed kinematics for a reconstruction method.
    fn kinematics(&self, level: Level, method: Method) -> Result<Kinematics, EvsError>;

    /// Detector-level scalar observable.
    fn scalar(&self, scalar: Scalar) -> Result<f64, EvsError>;

    /// Run-status, run-list and fiducial answers for the loaded event.
    fn conditions(&self) -> Result<Conditions, EvsError>;
}
