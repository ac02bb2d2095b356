#![deny(missing_docs)]
#![doc = "Per-event gen/rec pipeline: cut gate, observable extraction, analysis extension points and mini-tree emission."]

/// Analysis extension trait and level-scoped extraction handles.
pub mod analysis;
/// Canonical JSON, YAML and digest helpers.
pub mod canonical;
/// Pipeline controller and phase state machine.
pub mod controller;
/// Run configuration loading and validation.
pub mod config;
/// Basic cut specification and evaluation.
pub mod cuts;
/// Event-shape analysis variant.
pub mod event_shapes;
/// Standard observable extraction.
pub mod extract;
/// Histograms and migration matrices.
pub mod histo;
/// Per-level quantities and the mini-tree record.
pub mod record;
/// Run summary and provenance helpers.
pub mod report;
/// Calculation service interface.
pub mod service;
/// Output sinks.
pub mod sink;
/// Line-delimited JSON event table service.
pub mod table;

pub use analysis::{Analysis, GenScope, RecScope, RunContext};
pub use config::{load_config, AnalysisSpec, OutputSpec, RunConfig};
pub use controller::{EventOutcome, Phase, Pipeline, PipelineBuilder};
pub use cuts::{BasicCutDecision, BasicCutSpec, CutGate, CutInputs, LevelCuts, PhaseSpace, Window};
pub use event_shapes::{EventShapes, EventShapesConfig, OverlapVeto, VetoSide};
pub use extract::ObservableExtractor;
pub use histo::{Histogram, Migration, PlotBook};
pub use record::{
    Column, EventRecord, GenColumns, GenLevelQuantities, LevelQuantities, OutputRecord,
    RecColumns, RecLevelQuantities, COLUMN_COUNT,
};
pub use report::{EventCounts, RunSummary};
pub use service::{BeamVectors, CalcService, Conditions, Kinematics, Method, Scalar};
pub use sink::{CsvSink, MemoryHandle, MemorySink, RecordSink};
pub use table::{EventRow, LevelRow, TableService};
