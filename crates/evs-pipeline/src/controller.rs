//! Per-event pipeline state machine.
//!
//! Every event runs the same fixed sequence of steps:
//!
//! ```text
//! Ready/Emitted -> Loaded -> PerEventReset -> BasicCuts -> AnalysisCuts
//!   -> ObservableExtraction -> ControlPlots -> CombinedAccumulation -> Emitted
//! ```
//!
//! Each step method checks the phase it must follow and rejects any other
//! order. Only `advance` moves to `Loaded`, so an event is processed at most
//! once. Any error poisons the pipeline; later calls fail with a sequence
//! error.

use std::fmt;

use evs_core::errors::{ErrorInfo, EvsError};
use evs_core::{EventId, Level};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::analysis::{Analysis, GenScope, RecScope, RunContext};
use crate::config::RunConfig;
use crate::cuts::{CutGate, CutInputs, LevelCuts};
use crate::histo::PlotBook;
use crate::record::{EventRecord, OutputRecord};
use crate::report::{plot_count, provenance, write_canonical_json, EventCounts, RunSummary};
use crate::service::CalcService;
use crate::sink::RecordSink;

/// Lifecycle phase of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Built, not yet initialized.
    Idle,
    /// Initialized, no event processed yet.
    Ready,
    /// Next event loaded from the service, not yet processed.
    Loaded,
    /// Event state cleared.
    PerEventReset,
    /// Basic cuts evaluated.
    BasicCuts,
    /// Analysis cuts evaluated and verdicts written.
    AnalysisCuts,
    /// Observables extracted.
    ObservableExtraction,
    /// Per-level control plots filled.
    ControlPlots,
    /// Combined gen/rec plots and cross sections accumulated.
    CombinedAccumulation,
    /// Record handed to the sink.
    Emitted,
    /// Run closed.
    Finalized,
    /// A fatal error occurred.
    Failed,
}

impl Phase {
    /// Stable label used in logs and error context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Ready => "ready",
            Phase::Loaded => "loaded",
            Phase::PerEventReset => "per-event-reset",
            Phase::BasicCuts => "basic-cuts",
            Phase::AnalysisCuts => "analysis-cuts",
            Phase::ObservableExtraction => "observable-extraction",
            Phase::ControlPlots => "control-plots",
            Phase::CombinedAccumulation => "combined-accumulation",
            Phase::Emitted => "emitted",
            Phase::Finalized => "finalized",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one processed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Identifier reported by the calculation service.
    pub id: Option<EventId>,
    /// Gen level passed all cuts.
    pub gen_good: bool,
    /// Rec level passed all cuts.
    pub rec_good: bool,
    /// A record was handed to the sink.
    pub emitted: bool,
}

/// Collects the collaborators of a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<RunConfig>,
    analysis: Option<Box<dyn Analysis>>,
    service: Option<Box<dyn CalcService>>,
    sink: Option<Box<dyn RecordSink>>,
}

impl PipelineBuilder {
    /// Starts an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run configuration.
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Analysis variant.
    pub fn analysis(mut self, analysis: Box<dyn Analysis>) -> Self {
        self.analysis = Some(analysis);
        self
    }

    /// Calculation service.
    pub fn service(mut self, service: Box<dyn CalcService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Output sink; required when the mini-tree is enabled.
    pub fn sink(mut self, sink: Box<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validates the configuration and assembles the pipeline.
    pub fn build(self) -> Result<Pipeline, EvsError> {
        let config = self.config.ok_or_else(|| missing_binding("config"))?;
        config.validate()?;
        let analysis = self.analysis.ok_or_else(|| missing_binding("analysis"))?;
        let service = self.service.ok_or_else(|| missing_binding("service"))?;
        if config.output.minitree && self.sink.is_none() {
            return Err(EvsError::Config(
                ErrorInfo::new("pipeline.binding", "pipeline collaborator not bound")
                    .with_context("binding", "sink")
                    .with_hint("set output.minitree to false to run without a sink"),
            ));
        }
        let gate = CutGate::new(config.cuts.clone())?;
        Ok(Pipeline {
            run: config.run_context(),
            config,
            gate,
            analysis,
            service,
            sink: self.sink,
            record: EventRecord::default(),
            gen_cuts: LevelCuts::default(),
            rec_cuts: LevelCuts::default(),
            gen_inputs: None,
            rec_inputs: None,
            counts: EventCounts::default(),
            phase: Phase::Idle,
        })
    }
}

fn missing_binding(binding: &str) -> EvsError {
    EvsError::Config(
        ErrorInfo::new("pipeline.binding", "pipeline collaborator not bound")
            .with_context("binding", binding),
    )
}

/// Owns one run: configuration, collaborators and the current event.
pub struct Pipeline {
    config: RunConfig,
    run: RunContext,
    gate: CutGate,
    analysis: Box<dyn Analysis>,
    service: Box<dyn CalcService>,
    sink: Option<Box<dyn RecordSink>>,
    record: EventRecord,
    gen_cuts: LevelCuts,
    rec_cuts: LevelCuts,
    gen_inputs: Option<CutInputs>,
    rec_inputs: Option<CutInputs>,
    counts: EventCounts,
    phase: Phase,
}

impl Pipeline {
    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// State of the event being processed.
    pub fn record(&self) -> &EventRecord {
        &self.record
    }

    /// Cut bookkeeping for a level of the current event.
    pub fn level_cuts(&self, level: Level) -> &LevelCuts {
        match level {
            Level::Gen => &self.gen_cuts,
            Level::Rec => &self.rec_cuts,
        }
    }

    /// Counters so far.
    pub fn counts(&self) -> EventCounts {
        self.counts
    }

    /// Snapshot of the analysis plot book.
    pub fn plots(&self) -> PlotBook {
        self.analysis.plots()
    }

    /// True when the level takes part in this run.
    pub fn is_active(&self, level: Level) -> bool {
        match level {
            Level::Gen => self.run.is_mc,
            Level::Rec => !self.run.gen_only,
        }
    }

    /// One-time setup: forwards the systematic shift, registers the
    /// mini-tree schema and lets the analysis configure itself.
    pub fn initialize(&mut self) -> Result<(), EvsError> {
        self.expect_phase("initialize", &[Phase::Idle])?;
        let result = self.initialize_inner();
        self.finish_step(result, Phase::Ready)
    }

    fn initialize_inner(&mut self) -> Result<(), EvsError> {
        self.service.set_sys_shift(self.run.sys_shift)?;
        if self.config.output.minitree {
            if let Some(sink) = self.sink.as_mut() {
                sink.register_schema(&OutputRecord::COLUMNS)?;
            }
        }
        self.analysis.initial_settings(&self.run)?;
        info!(
            analysis = self.analysis.name(),
            chain = %self.run.chain,
            is_mc = self.run.is_mc,
            is_bkg_mc = self.run.is_bkg_mc,
            gen_only = self.run.gen_only,
            sys_shift = %self.run.sys_shift,
            rec_method = self.run.rec_method.as_str(),
            "pipeline initialized"
        );
        Ok(())
    }

    /// Loads the next event; `Ok(false)` once the input is exhausted.
    pub fn advance(&mut self) -> Result<bool, EvsError> {
        self.expect_phase("advance", &[Phase::Ready, Phase::Emitted])?;
        match self.service.next_event() {
            Ok(Some(id)) => {
                debug!(event = %id, "event loaded");
                self.phase = Phase::Loaded;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => Err(self.fail(err, "advance")),
        }
    }

    /// Runs every step for the loaded event.
    pub fn process_event(&mut self) -> Result<EventOutcome, EvsError> {
        self.reset_event()?;
        self.apply_basic_cuts()?;
        self.apply_analysis_cuts()?;
        self.extract_observables()?;
        self.control_plots()?;
        self.accumulate()?;
        let emitted = self.emit()?;
        let outcome = EventOutcome {
            id: self.service.event_id(),
            gen_good: self.record.gen.is_good,
            rec_good: self.record.rec.is_good,
            emitted,
        };
        debug!(
            gen_good = outcome.gen_good,
            rec_good = outcome.rec_good,
            emitted,
            "event processed"
        );
        Ok(outcome)
    }

    /// Clears all per-event state of the freshly loaded event.
    pub fn reset_event(&mut self) -> Result<(), EvsError> {
        self.expect_phase("reset_event", &[Phase::Loaded])?;
        self.record.reset();
        self.gen_cuts = LevelCuts::default();
        self.rec_cuts = LevelCuts::default();
        self.gen_inputs = None;
        self.rec_inputs = None;
        self.analysis.reset();
        self.phase = Phase::PerEventReset;
        Ok(())
    }

    /// Gathers cut inputs and evaluates the basic cuts of each active level.
    pub fn apply_basic_cuts(&mut self) -> Result<(), EvsError> {
        self.expect_phase("apply_basic_cuts", &[Phase::PerEventReset])?;
        let result = self.basic_cuts_inner();
        self.finish_step(result, Phase::BasicCuts)
    }

    fn basic_cuts_inner(&mut self) -> Result<(), EvsError> {
        let method = self.run.rec_method;
        if self.is_active(Level::Gen) {
            let inputs = CutInputs::gather(self.service.as_ref(), Level::Gen, method)?;
            self.gen_cuts.basic = Some(self.gate.evaluate_basic(&inputs));
            self.gen_inputs = Some(inputs);
        }
        if self.is_active(Level::Rec) {
            let inputs = CutInputs::gather(self.service.as_ref(), Level::Rec, method)?;
            self.rec_cuts.basic = Some(self.gate.evaluate_basic(&inputs));
            self.rec_inputs = Some(inputs);
        }
        Ok(())
    }

    /// Evaluates the analysis cuts and writes each level's verdict.
    pub fn apply_analysis_cuts(&mut self) -> Result<(), EvsError> {
        self.expect_phase("apply_analysis_cuts", &[Phase::BasicCuts])?;
        if let Some(inputs) = self.gen_inputs {
            self.gen_cuts.analysis = Some(self.analysis.analysis_cuts_gen(&self.run, &inputs));
            CutGate::settle(&self.gen_cuts, &mut self.record.gen);
        }
        if let Some(inputs) = self.rec_inputs {
            self.rec_cuts.analysis = Some(self.analysis.analysis_cuts_rec(&self.run, &inputs));
            CutGate::settle(&self.rec_cuts, &mut self.record.rec);
        }
        self.phase = Phase::AnalysisCuts;
        Ok(())
    }

    /// Extracts observables of each active level, pass or fail.
    pub fn extract_observables(&mut self) -> Result<(), EvsError> {
        self.expect_phase("extract_observables", &[Phase::AnalysisCuts])?;
        let result = self.extract_inner();
        self.finish_step(result, Phase::ObservableExtraction)
    }

    fn extract_inner(&mut self) -> Result<(), EvsError> {
        if self.is_active(Level::Gen) {
            let scope = GenScope::new(
                self.service.as_ref(),
                &mut self.record.gen,
                &mut self.record.output.gen,
            );
            self.analysis
                .observables_gen(scope)
                .map_err(|err| err.with_context("level", Level::Gen.as_str()))?;
        }
        if self.is_active(Level::Rec) {
            let scope = RecScope::new(
                self.service.as_ref(),
                self.run.rec_method,
                &mut self.record.rec,
                &mut self.record.output.rec,
            );
            self.analysis
                .observables_rec(scope)
                .map_err(|err| err.with_context("level", Level::Rec.as_str()))?;
        }
        Ok(())
    }

    /// Per-level control plots for every active level.
    pub fn control_plots(&mut self) -> Result<(), EvsError> {
        self.expect_phase("control_plots", &[Phase::ObservableExtraction])?;
        if self.is_active(Level::Gen) {
            self.analysis
                .control_plots_gen(&self.record.gen, &self.record.output.gen);
        }
        if self.is_active(Level::Rec) {
            self.analysis
                .control_plots_rec(&self.record.rec, &self.record.output.rec);
        }
        self.phase = Phase::ControlPlots;
        Ok(())
    }

    /// Combined plots and cross sections; a no-op unless both levels are good.
    pub fn accumulate(&mut self) -> Result<(), EvsError> {
        self.expect_phase("accumulate", &[Phase::ControlPlots])?;
        if self.record.both_good() {
            self.analysis.control_plots_gen_rec(&self.record);
            self.analysis.cross_sections_gen_rec(&self.record);
        }
        self.phase = Phase::CombinedAccumulation;
        Ok(())
    }

    /// Hands a copy of the mini-tree row to the sink when emission is
    /// enabled. Returns whether a record was written.
    pub fn emit(&mut self) -> Result<bool, EvsError> {
        self.expect_phase("emit", &[Phase::CombinedAccumulation])?;
        let mut emitted = false;
        if self.config.output.minitree {
            if let Some(sink) = self.sink.as_mut() {
                let result = sink.write(self.record.output);
                if let Err(err) = result {
                    return Err(self.fail(err, Phase::Emitted.as_str()));
                }
                emitted = true;
            }
        }
        self.counts.processed += 1;
        self.counts.gen_good += u64::from(self.record.gen.is_good);
        self.counts.rec_good += u64::from(self.record.rec.is_good);
        self.counts.both_good += u64::from(self.record.both_good());
        self.counts.emitted += u64::from(emitted);
        self.phase = Phase::Emitted;
        Ok(emitted)
    }

    /// Closes the sink, writes the plot book and summarizes the run.
    pub fn finalize(&mut self) -> Result<RunSummary, EvsError> {
        self.expect_phase("finalize", &[Phase::Ready, Phase::Emitted])?;
        match self.finalize_inner() {
            Ok(summary) => {
                self.phase = Phase::Finalized;
                info!(
                    processed = summary.counts.processed,
                    both_good = summary.counts.both_good,
                    emitted = summary.counts.emitted,
                    "pipeline finalized"
                );
                Ok(summary)
            }
            Err(err) => Err(self.fail(err, Phase::Finalized.as_str())),
        }
    }

    fn finalize_inner(&mut self) -> Result<RunSummary, EvsError> {
        if let Some(sink) = self.sink.as_mut() {
            sink.close()?;
        }
        let plots = self.analysis.plots();
        if let Some(path) = &self.config.output.histograms {
            write_canonical_json(path, &plots)?;
        }
        Ok(RunSummary {
            analysis: self.analysis.name().to_string(),
            counts: self.counts,
            plots: plot_count(&plots),
            provenance: provenance(&self.config)?,
        })
    }

    /// Initializes, processes every event the service yields and finalizes.
    pub fn run(&mut self) -> Result<RunSummary, EvsError> {
        self.initialize()?;
        while self.advance()? {
            self.process_event()?;
        }
        self.finalize()
    }

    fn expect_phase(&mut self, operation: &str, allowed: &[Phase]) -> Result<(), EvsError> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        let (code, message) = if self.phase == Phase::Failed {
            ("pipeline.failed", "pipeline failed earlier in the run")
        } else {
            ("pipeline.sequence", "step invoked out of order")
        };
        let err = EvsError::Sequence(
            ErrorInfo::new(code, message)
                .with_context("operation", operation)
                .with_context("current", self.phase.as_str()),
        );
        Err(self.fail(err, operation))
    }

    fn finish_step(&mut self, result: Result<(), EvsError>, next: Phase) -> Result<(), EvsError> {
        match result {
            Ok(()) => {
                self.phase = next;
                Ok(())
            }
            Err(err) => Err(self.fail(err, next.as_str())),
        }
    }

    fn fail(&mut self, err: EvsError, phase: &str) -> EvsError {
        let mut err = err.with_context("phase", phase);
        if let Some(id) = self.service.event_id() {
            err = err
                .with_context("run", id.run.to_string())
                .with_context("event", id.event.to_string());
        }
        if self.phase != Phase::Failed {
            error!(error = %err, "pipeline failed");
        }
        self.phase = Phase::Failed;
        err
    }
}
