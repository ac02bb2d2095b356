use std::fs;
use std::path::{Path, PathBuf};

use evs_core::errors::{ErrorInfo, EvsError};
use evs_core::SysShift;
use serde::{Deserialize, Serialize};

use crate::analysis::{Analysis, RunContext};
use crate::canonical::{digest_hex, from_yaml_slice, to_yaml_string};
use crate::cuts::BasicCutSpec;
use crate::event_shapes::{EventShapes, EventShapesConfig};
use crate::service::Method;

fn config_error(code: &str, message: impl Into<String>) -> EvsError {
    EvsError::Config(ErrorInfo::new(code, message))
}

/// Analysis variant selected for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnalysisSpec {
    /// Event-shape analysis.
    EventShapes(EventShapesConfig),
}

impl AnalysisSpec {
    /// Instantiates the configured analysis.
    pub fn build(&self) -> Box<dyn Analysis> {
        match self {
            AnalysisSpec::EventShapes(config) => Box::new(EventShapes::new(config.clone())),
        }
    }

    fn validate(&self) -> Result<(), EvsError> {
        match self {
            AnalysisSpec::EventShapes(config) => config.validate(),
        }
    }
}

impl Default for AnalysisSpec {
    fn default() -> Self {
        AnalysisSpec::EventShapes(EventShapesConfig::default())
    }
}

/// Output switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Emit one mini-tree record per event.
    #[serde(default = "OutputSpec::default_minitree")]
    pub minitree: bool,
    /// Destination of the plot book written at finalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histograms: Option<PathBuf>,
}

impl OutputSpec {
    fn default_minitree() -> bool {
        true
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            minitree: true,
            histograms: None,
        }
    }
}

/// Run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Chain (sample) name.
    pub chain: String,
    /// Simulated input.
    #[serde(default)]
    pub is_mc: bool,
    /// Simulated background sample.
    #[serde(default)]
    pub is_bkg_mc: bool,
    /// Process the generator level only.
    #[serde(default)]
    pub gen_only: bool,
    /// Systematic variation forwarded to the calculation service.
    #[serde(default)]
    pub sys_shift: SysShift,
    /// Reconstruction method defining the rec-level Q².
    #[serde(default)]
    pub rec_method: Method,
    /// Basic cuts.
    #[serde(default)]
    pub cuts: BasicCutSpec,
    /// Analysis variant and its settings.
    #[serde(default)]
    pub analysis: AnalysisSpec,
    /// Output switches.
    #[serde(default)]
    pub output: OutputSpec,
}

impl RunConfig {
    /// Nominal data configuration for `chain` with default cuts.
    pub fn new(chain: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            is_mc: false,
            is_bkg_mc: false,
            gen_only: false,
            sys_shift: SysShift::NOMINAL,
            rec_method: Method::default(),
            cuts: BasicCutSpec::default(),
            analysis: AnalysisSpec::default(),
            output: OutputSpec::default(),
        }
    }

    /// Checks flag combinations, cut windows and analysis settings.
    pub fn validate(&self) -> Result<(), EvsError> {
        if self.chain.trim().is_empty() {
            return Err(config_error("config.chain", "chain name must not be empty"));
        }
        if self.gen_only && !self.is_mc {
            return Err(config_error("config.gen_only", "gen_only requires is_mc")
                .with_context("chain", self.chain.clone()));
        }
        if self.is_bkg_mc && !self.is_mc {
            return Err(config_error("config.is_bkg_mc", "is_bkg_mc requires is_mc")
                .with_context("chain", self.chain.clone()));
        }
        if self.rec_method == Method::True {
            return Err(EvsError::Config(
                ErrorInfo::new("config.rec_method", "true kinematics are not reconstructable")
                    .with_hint("use electron, sigma, double-angle, e-sigma or hadronic"),
            ));
        }
        self.cuts.validate()?;
        self.analysis.validate()?;
        Ok(())
    }

    /// Stable hash over the canonical JSON form.
    pub fn config_hash(&self) -> Result<String, EvsError> {
        digest_hex(self)
    }

    /// Run parameters handed to the analysis.
    pub fn run_context(&self) -> RunContext {
        RunContext {
            chain: self.chain.clone(),
            is_mc: self.is_mc,
            is_bkg_mc: self.is_bkg_mc,
            gen_only: self.gen_only,
            sys_shift: self.sys_shift,
            rec_method: self.rec_method,
        }
    }

    /// Produces a YAML representation of the configuration.
    pub fn to_yaml_string(&self) -> Result<String, EvsError> {
        to_yaml_string(self)
    }
}

/// Loads and validates a YAML run configuration.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, EvsError> {
    let config_path = path.as_ref();
    let bytes = fs::read(config_path).map_err(|err| {
        config_error("config.read", err.to_string())
            .with_context("path", config_path.display().to_string())
    })?;
    let config: RunConfig = from_yaml_slice(&bytes)
        .map_err(|err| err.with_context("path", config_path.display().to_string()))?;
    config.validate()?;
    Ok(config)
}
