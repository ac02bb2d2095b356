//! Event-shape analysis variant.

use evs_core::errors::{ErrorInfo, EvsError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::{Analysis, GenScope, RecScope, RunContext};
use crate::cuts::CutInputs;
use crate::histo::{Histogram, Migration, PlotBook};
use crate::record::{EventRecord, GenColumns, LevelQuantities, RecColumns};

/// Which side of the veto window is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VetoSide {
    /// Reject `q2_min < Q² < q2_max`.
    #[default]
    Inside,
    /// Reject `Q² < q2_min` or `Q² > q2_max`.
    Outside,
}

/// Removes background-sample events whose phase space another sample covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapVeto {
    /// Chain name the veto applies to.
    #[serde(default = "OverlapVeto::default_chain")]
    pub chain: String,
    /// Lower Q² edge of the window.
    #[serde(default = "OverlapVeto::default_q2_min")]
    pub q2_min: f64,
    /// Upper Q² edge of the window.
    #[serde(default = "OverlapVeto::default_q2_max")]
    pub q2_max: f64,
    /// Rejected side.
    #[serde(default)]
    pub reject: VetoSide,
}

impl OverlapVeto {
    fn default_chain() -> String {
        "DjBkg".to_string()
    }
    fn default_q2_min() -> f64 {
        4.0
    }
    fn default_q2_max() -> f64 {
        60.0
    }

    /// True when the veto applies to this run.
    pub fn applies(&self, run: &RunContext) -> bool {
        run.is_bkg_mc && run.chain == self.chain
    }

    /// True when an event with true Q² `q2` survives the veto.
    pub fn keeps(&self, q2: f64) -> bool {
        let inside = q2 > self.q2_min && q2 < self.q2_max;
        match self.reject {
            VetoSide::Inside => !inside,
            VetoSide::Outside => q2 >= self.q2_min && q2 <= self.q2_max,
        }
    }
}

impl Default for OverlapVeto {
    fn default() -> Self {
        Self {
            chain: Self::default_chain(),
            q2_min: Self::default_q2_min(),
            q2_max: Self::default_q2_max(),
            reject: VetoSide::default(),
        }
    }
}

/// Settings of the event-shape analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventShapesConfig {
    /// Optional background-overlap veto at generator level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap_veto: Option<OverlapVeto>,
    /// Q² binning shared by control plots and the migration matrix.
    #[serde(default = "EventShapesConfig::default_q2_edges")]
    pub q2_edges: Vec<f64>,
}

impl EventShapesConfig {
    fn default_q2_edges() -> Vec<f64> {
        vec![150.0, 200.0, 280.0, 440.0, 700.0, 1200.0, 2000.0, 5000.0, 20000.0]
    }

    /// Rejects unusable binning and inverted veto windows.
    pub fn validate(&self) -> Result<(), EvsError> {
        Histogram::from_edges(self.q2_edges.clone())?;
        if let Some(veto) = &self.overlap_veto {
            if veto.q2_min > veto.q2_max {
                return Err(EvsError::Config(
                    ErrorInfo::new("event_shapes.veto", "veto window minimum exceeds maximum")
                        .with_context("q2_min", veto.q2_min.to_string())
                        .with_context("q2_max", veto.q2_max.to_string()),
                ));
            }
        }
        Ok(())
    }
}

impl Default for EventShapesConfig {
    fn default() -> Self {
        Self {
            overlap_veto: None,
            q2_edges: Self::default_q2_edges(),
        }
    }
}

const GEN_Q2: &str = "gen_q2";
const REC_Q2: &str = "rec_q2";
const REC_EMPZ: &str = "rec_empz";
const REC_VERTEX_Z: &str = "rec_vertex_z";
const Q2_RESOLUTION: &str = "q2_resolution";
const Q2_MIGRATION: &str = "q2_migration";

/// Event-shape analysis.
#[derive(Debug, Clone)]
pub struct EventShapes {
    config: EventShapesConfig,
    plots: PlotBook,
}

impl EventShapes {
    /// Creates the analysis; plots are booked in `initial_settings`.
    pub fn new(config: EventShapesConfig) -> Self {
        Self {
            config,
            plots: PlotBook::default(),
        }
    }

    fn fill(&mut self, name: &str, value: f64, weight: f64) {
        if let Some(histogram) = self.plots.histograms.get_mut(name) {
            histogram.fill(value, weight);
        }
    }
}

impl Analysis for EventShapes {
    fn name(&self) -> &str {
        "event-shapes"
    }

    fn initial_settings(&mut self, run: &RunContext) -> Result<(), EvsError> {
        let edges = &self.config.q2_edges;
        let mut plots = PlotBook::default();
        plots
            .histograms
            .insert(GEN_Q2.to_string(), Histogram::from_edges(edges.clone())?);
        plots
            .histograms
            .insert(REC_Q2.to_string(), Histogram::from_edges(edges.clone())?);
        plots
            .histograms
            .insert(REC_EMPZ.to_string(), Histogram::uniform(35, 35.0, 70.0)?);
        plots
            .histograms
            .insert(REC_VERTEX_Z.to_string(), Histogram::uniform(35, -35.0, 35.0)?);
        plots
            .histograms
            .insert(Q2_RESOLUTION.to_string(), Histogram::uniform(40, 0.0, 2.0)?);
        plots
            .migrations
            .insert(Q2_MIGRATION.to_string(), Migration::from_edges(edges.clone())?);
        self.plots = plots;

        let veto = self.config.overlap_veto.as_ref().filter(|veto| veto.applies(run));
        info!(
            chain = %run.chain,
            overlap_veto = veto.is_some(),
            "event-shape analysis configured"
        );
        Ok(())
    }

    fn reset(&mut self) {}

    fn analysis_cuts_gen(&mut self, run: &RunContext, inputs: &CutInputs) -> bool {
        let Some(veto) = self.config.overlap_veto.as_ref() else {
            return true;
        };
        if !veto.applies(run) || veto.keeps(inputs.q2) {
            return true;
        }
        debug!(q2 = inputs.q2, "overlap veto");
        false
    }

    fn analysis_cuts_rec(&mut self, _run: &RunContext, _inputs: &CutInputs) -> bool {
        true
    }

    fn observables_gen(&mut self, mut scope: GenScope<'_>) -> Result<(), EvsError> {
        scope.extract_standard()
    }

    fn observables_rec(&mut self, mut scope: RecScope<'_>) -> Result<(), EvsError> {
        scope.extract_standard()
    }

    fn control_plots_gen(&mut self, gen: &LevelQuantities, _columns: &GenColumns) {
        if gen.is_good {
            self.fill(GEN_Q2, gen.q2, gen.weight);
        }
    }

    fn control_plots_rec(&mut self, rec: &LevelQuantities, columns: &RecColumns) {
        if !rec.is_good {
            return;
        }
        self.fill(REC_Q2, rec.q2, rec.weight);
        self.fill(REC_EMPZ, columns.empz, rec.weight);
        self.fill(REC_VERTEX_Z, columns.vertex_z, rec.weight);
    }

    fn control_plots_gen_rec(&mut self, event: &EventRecord) {
        if event.gen.q2 > 0.0 {
            self.fill(Q2_RESOLUTION, event.rec.q2 / event.gen.q2, event.rec.weight);
        }
    }

    fn cross_sections_gen_rec(&mut self, event: &EventRecord) {
        if let Some(migration) = self.plots.migrations.get_mut(Q2_MIGRATION) {
            migration.fill(event.gen.q2, event.rec.q2, event.gen.weight);
        }
    }

    fn plots(&self) -> PlotBook {
        self.plots.clone()
    }
}
