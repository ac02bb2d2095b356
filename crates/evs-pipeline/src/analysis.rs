use evs_core::errors::EvsError;
use evs_core::SysShift;
use serde::{Deserialize, Serialize};

use crate::cuts::CutInputs;
use crate::extract::ObservableExtractor;
use crate::histo::PlotBook;
use crate::record::{EventRecord, GenColumns, LevelQuantities, RecColumns};
use crate::service::{CalcService, Method};

/// Run parameters visible to the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// Chain (sample) name.
    pub chain: String,
    /// Simulated input; gen level is available.
    pub is_mc: bool,
    /// Simulated background sample.
    pub is_bkg_mc: bool,
    /// Only the generator level is processed.
    pub gen_only: bool,
    /// Systematic variation in effect.
    pub sys_shift: SysShift,
    /// Reconstruction method defining the rec-level Q².
    pub rec_method: Method,
}

/// Gen-level extraction handle.
///
/// Exposes the service read-only and only the generator-level quantities and
/// columns, so gen-level code has no path to rec-level state.
pub struct GenScope<'a> {
    service: &'a dyn CalcService,
    quantities: &'a mut LevelQuantities,
    columns: &'a mut GenColumns,
}

impl<'a> GenScope<'a> {
    pub(crate) fn new(
        service: &'a dyn CalcService,
        quantities: &'a mut LevelQuantities,
        columns: &'a mut GenColumns,
    ) -> Self {
        Self {
            service,
            quantities,
            columns,
        }
    }

    /// Calculation service bound to the current event.
    pub fn service(&self) -> &dyn CalcService {
        self.service
    }

    /// Gen-level quantities.
    pub fn quantities(&mut self) -> &mut LevelQuantities {
        &mut *self.quantities
    }

    /// Gen-level mini-tree columns.
    pub fn columns(&mut self) -> &mut GenColumns {
        &mut *self.columns
    }

    /// Runs the standard gen-level extraction.
    pub fn extract_standard(&mut self) -> Result<(), EvsError> {
        ObservableExtractor::extract_gen(self.service, self.quantities, self.columns)
    }
}

/// Rec-level extraction handle, mirror of [`GenScope`].
pub struct RecScope<'a> {
    service: &'a dyn CalcService,
    rec_method: Method,
    quantities: &'a mut LevelQuantities,
    columns: &'a mut RecColumns,
}

impl<'a> RecScope<'a> {
    pub(crate) fn new(
        service: &'a dyn CalcService,
        rec_method: Method,
        quantities: &'a mut LevelQuantities,
        columns: &'a mut RecColumns,
    ) -> Self {
        Self {
            service,
            rec_method,
            quantities,
            columns,
        }
    }

    /// Calculation service bound to the current event.
    pub fn service(&self) -> &dyn CalcService {
        self.service
    }

    /// Rec-level quantities.
    pub fn quantities(&mut self) -> &mut LevelQuantities {
        &mut *self.quantities
    }

    /// Rec-level mini-tree columns.
    pub fn columns(&mut self) -> &mut RecColumns {
        &mut *self.columns
    }

    /// Runs the standard rec-level extraction.
    pub fn extract_standard(&mut self) -> Result<(), EvsError> {
        ObservableExtractor::extract_rec(self.service, self.rec_method, self.quantities, self.columns)
    }
}

/// Analysis-specific capabilities plugged into the pipeline.
///
/// The pipeline holds exactly one implementation per run and calls the
/// capabilities in a fixed order for every event:
///
/// 1. `reset`
/// 2. `analysis_cuts_gen`, `analysis_cuts_rec`
/// 3. `observables_gen`, `observables_rec`
/// 4. `control_plots_gen`, `control_plots_rec` (every active level)
/// 5. `control_plots_gen_rec`, `cross_sections_gen_rec` (both levels good only)
///
/// `initial_settings` runs once before the first event and `plots` once at
/// finalization. Every capability is mandatory; an intentional no-op must be
/// written out.
pub trait Analysis {
    /// Name used in logs and run summaries.
    fn name(&self) -> &str;

    /// One-time setup before the first event.
    fn initial_settings(&mut self, run: &RunContext) -> Result<(), EvsError>;

    /// Clears any analysis-owned per-event state.
    fn reset(&mut self);

    /// Analysis-specific generator-level cut.
    fn analysis_cuts_gen(&mut self, run: &RunContext, inputs: &CutInputs) -> bool;

    /// Analysis-specific detector-level cut.
    fn analysis_cuts_rec(&mut self, run: &RunContext, inputs: &CutInputs) -> bool;

    /// Fills generator-level observables.
    fn observables_gen(&mut self, scope: GenScope<'_>) -> Result<(), EvsError>;

    /// Fills detector-level observables.
    fn observables_rec(&mut self, scope: RecScope<'_>) -> Result<(), EvsError>;

    /// Generator-level control plots; sees only generator-level columns.
    fn control_plots_gen(&mut self, gen: &LevelQuantities, columns: &GenColumns);

    /// Detector-level control plots; sees only detector-level columns.
    fn control_plots_rec(&mut self, rec: &LevelQuantities, columns: &RecColumns);

    /// Plots needing both levels (resolutions, correlations).
    fn control_plots_gen_rec(&mut self, event: &EventRecord);

    /// Cross-section accumulation needing both levels (migrations).
    fn cross_sections_gen_rec(&mut self, event: &EventRecord);

    /// Snapshot of the accumulated plots.
    fn plots(&self) -> PlotBook;
}
