#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use evs_core::errors::EvsError;
use evs_core::{EventId, FourVector, Level, SysShift};
use evs_pipeline::{
    Analysis, BeamVectors, CalcService, Conditions, CutInputs, EventRecord, EventRow,
    GenColumns, GenScope, Kinematics, LevelQuantities, LevelRow, MemoryHandle, MemorySink,
    Method, Pipeline, PipelineBuilder, PlotBook, RecColumns, RecScope, RunConfig, RunContext,
    Scalar, TableService,
};

pub fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join(relative)
}

pub fn kinematics(q2: f64) -> BTreeMap<Method, Kinematics> {
    let mut map = BTreeMap::new();
    for (idx, method) in [
        Method::True,
        Method::Electron,
        Method::Sigma,
        Method::DoubleAngle,
        Method::ESigma,
        Method::Hadronic,
    ]
    .into_iter()
    .enumerate()
    {
        let shift = idx as f64;
        map.insert(
            method,
            Kinematics {
                q2: q2 + shift,
                x: 0.01 + shift * 0.001,
                y: 0.3 + shift * 0.01,
            },
        );
    }
    map
}

pub fn rec_scalars(vertex_z: f64, empz: f64) -> BTreeMap<Scalar, f64> {
    BTreeMap::from([
        (Scalar::VertexZ, vertex_z),
        (Scalar::EMinusPz, empz),
        (Scalar::PtMiss, 2.5),
        (Scalar::PtCalo, 18.0),
        (Scalar::HadronicPtDa, 20.0),
        (Scalar::Acoplanarity, 0.05),
    ])
}

pub fn gen_level(q2: f64, weight: f64) -> LevelRow {
    LevelRow {
        weight,
        lepton: FourVector::new(10.0, 0.0, -20.0, 22.36),
        hfs: FourVector::new(-10.0, 0.0, 30.0, 31.62),
        kinematics: kinematics(q2),
        scalars: BTreeMap::new(),
    }
}

pub fn rec_level(q2: f64) -> LevelRow {
    LevelRow {
        weight: 1.0,
        lepton: FourVector::new(9.0, 1.0, -19.0, 21.05),
        hfs: FourVector::new(-8.0, -1.0, 28.0, 29.2),
        kinematics: kinematics(q2),
        scalars: rec_scalars(5.0, 55.0),
    }
}

/// Simulated event passing every default basic cut at both levels.
pub fn nominal_row(run: u32, event: u32, q2: f64) -> EventRow {
    EventRow {
        run,
        event,
        beams: None,
        gen: Some(gen_level(q2, 0.8)),
        rec: Some(rec_level(q2 + 10.0)),
        rec_shifted: BTreeMap::new(),
        conditions: Conditions::default(),
    }
}

/// Recorded data event (no generator level).
pub fn data_row(run: u32, event: u32, q2: f64) -> EventRow {
    EventRow {
        gen: None,
        ..nominal_row(run, event, q2)
    }
}

pub fn mc_config(chain: &str) -> RunConfig {
    let mut config = RunConfig::new(chain);
    config.is_mc = true;
    config
}

pub fn pipeline(
    config: RunConfig,
    service: Box<dyn CalcService>,
    analysis: Box<dyn Analysis>,
) -> (Pipeline, MemoryHandle) {
    let sink = MemorySink::new();
    let handle = sink.handle();
    let pipeline = PipelineBuilder::new()
        .config(config)
        .service(service)
        .analysis(analysis)
        .sink(Box::new(sink))
        .build()
        .expect("pipeline builds");
    (pipeline, handle)
}

/// Table service recording every systematic shift it receives.
pub struct RecordingService {
    inner: TableService,
    shifts: Rc<RefCell<Vec<SysShift>>>,
}

impl RecordingService {
    pub fn new(rows: Vec<EventRow>) -> (Self, Rc<RefCell<Vec<SysShift>>>) {
        let shifts = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                inner: TableService::from_rows(rows),
                shifts: Rc::clone(&shifts),
            },
            shifts,
        )
    }
}

impl CalcService for RecordingService {
    fn set_sys_shift(&mut self, shift: SysShift) -> Result<(), EvsError> {
        self.shifts.borrow_mut().push(shift);
        self.inner.set_sys_shift(shift)
    }
    fn next_event(&mut self) -> Result<Option<EventId>, EvsError> {
        self.inner.next_event()
    }
    fn event_id(&self) -> Option<EventId> {
        self.inner.event_id()
    }
    fn beam_vectors(&self) -> Result<BeamVectors, EvsError> {
        self.inner.beam_vectors()
    }
    fn weight(&self, level: Level) -> Result<f64, EvsError> {
        self.inner.weight(level)
    }
    fn scattered_lepton(&self, level: Level) -> Result<FourVector, EvsError> {
        self.inner.scattered_lepton(level)
    }
    fn hadronic_final_state(&self, level: Level) -> Result<FourVector, EvsError> {
        self.inner.hadronic_final_state(level)
    }
    fn kinematics(&self, level: Level, method: Method) -> Result<Kinematics, EvsError> {
        self.inner.kinematics(level, method)
    }
    fn scalar(&self, scalar: Scalar) -> Result<f64, EvsError> {
        self.inner.scalar(scalar)
    }
    fn conditions(&self) -> Result<Conditions, EvsError> {
        self.inner.conditions()
    }
}

/// Calls observed by [`ScriptedAnalysis`].
#[derive(Debug, Default)]
pub struct CallLog {
    pub calls: Vec<&'static str>,
    pub combined: u32,
    pub seen_gen: Vec<LevelQuantities>,
}

/// Analysis with configurable cut verdicts that logs every capability call.
pub struct ScriptedAnalysis {
    pub gen_verdict: bool,
    pub rec_verdict: bool,
    pub log: Rc<RefCell<CallLog>>,
}

impl ScriptedAnalysis {
    pub fn new(gen_verdict: bool, rec_verdict: bool) -> (Self, Rc<RefCell<CallLog>>) {
        let log = Rc::new(RefCell::new(CallLog::default()));
        (
            Self {
                gen_verdict,
                rec_verdict,
                log: Rc::clone(&log),
            },
            log,
        )
    }

    fn push(&self, call: &'static str) {
        self.log.borrow_mut().calls.push(call);
    }
}

impl Analysis for ScriptedAnalysis {
    fn name(&self) -> &str {
        "scripted"
    }
    fn initial_settings(&mut self, _run: &RunContext) -> Result<(), EvsError> {
        self.push("initial_settings");
        Ok(())
    }
    fn reset(&mut self) {
        self.push("reset");
    }
    fn analysis_cuts_gen(&mut self, _run: &RunContext, _inputs: &CutInputs) -> bool {
        self.push("analysis_cuts_gen");
        self.gen_verdict
    }
    fn analysis_cuts_rec(&mut self, _run: &RunContext, _inputs: &CutInputs) -> bool {
        self.push("analysis_cuts_rec");
        self.rec_verdict
    }
    fn observables_gen(&mut self, mut scope: GenScope<'_>) -> Result<(), EvsError> {
        self.push("observables_gen");
        scope.extract_standard()
    }
    fn observables_rec(&mut self, mut scope: RecScope<'_>) -> Result<(), EvsError> {
        self.push("observables_rec");
        scope.extract_standard()
    }
    fn control_plots_gen(&mut self, gen: &LevelQuantities, _columns: &GenColumns) {
        self.push("control_plots_gen");
        self.log.borrow_mut().seen_gen.push(*gen);
    }
    fn control_plots_rec(&mut self, _rec: &LevelQuantities, _columns: &RecColumns) {
        self.push("control_plots_rec");
    }
    fn control_plots_gen_rec(&mut self, _event: &EventRecord) {
        self.push("control_plots_gen_rec");
        self.log.borrow_mut().combined += 1;
    }
    fn cross_sections_gen_rec(&mut self, _event: &EventRecord) {
        self.push("cross_sections_gen_rec");
    }
    fn plots(&self) -> PlotBook {
        PlotBook::default()
    }
}
