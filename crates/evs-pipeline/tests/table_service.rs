mod common;

use std::collections::BTreeMap;

use evs_core::errors::EvsError;
use evs_core::{EventId, Level, SysShift};
use evs_pipeline::{BeamVectors, CalcService, CsvSink, Method, PipelineBuilder, Scalar, TableService};
use evs_pipeline::config::load_config;

use common::{fixture_path, nominal_row, rec_level};

#[test]
fn fixture_events_replay_in_order() {
    let mut service =
        TableService::from_path(&fixture_path("fixtures/events/sim.jsonl")).expect("fixture");
    assert_eq!(service.remaining(), 5);
    assert_eq!(service.event_id(), None);

    let first = service.next_event().expect("next").expect("event");
    assert_eq!(first, EventId::new(1, 1001));
    assert_eq!(service.beam_vectors().expect("beams"), BeamVectors::hera());
    let truth = service.kinematics(Level::Gen, Method::True).expect("truth");
    assert_eq!(truth.q2, 210.0);
    assert_eq!(service.scalar(Scalar::VertexZ).expect("vertex"), 3.2);
    assert_eq!(service.weight(Level::Gen).expect("weight"), 0.85);

    let mut seen = 1;
    while service.next_event().expect("next").is_some() {
        seen += 1;
    }
    assert_eq!(seen, 5);
    assert_eq!(service.event_id(), None);
}

#[test]
fn blank_lines_are_skipped_and_bad_lines_reported() {
    let service =
        TableService::from_path(&fixture_path("fixtures/events/data.jsonl")).expect("fixture");
    assert_eq!(service.remaining(), 3);

    let input = b"{\"run\":1,\"event\":1}\n\nnot json\n";
    let err = TableService::from_reader(&input[..]).expect_err("bad line");
    match err {
        EvsError::Serde(info) => {
            assert_eq!(info.code, "table.parse");
            assert_eq!(info.context["line"], "3");
        }
        other => panic!("expected serde error, got {other}"),
    }
}

#[test]
fn queries_before_first_event_fail() {
    let service = TableService::from_rows(vec![nominal_row(1, 1, 200.0)]);
    let err = service.weight(Level::Rec).expect_err("no event loaded");
    assert_eq!(err.info().code, "table.no_event");
}

#[test]
fn shifted_rec_block_is_selected() {
    let mut row = nominal_row(1, 1, 200.0);
    row.rec_shifted = BTreeMap::from([(7, rec_level(400.0))]);
    let mut service = TableService::from_rows(vec![row.clone(), row]);
    service.set_sys_shift(SysShift::from_raw(7)).expect("shift");
    service.next_event().expect("next");
    let kine = service.kinematics(Level::Rec, Method::Electron).expect("shifted");
    assert_eq!(kine.q2, 401.0);
    let gen = service.kinematics(Level::Gen, Method::True).expect("gen unshifted");
    assert_eq!(gen.q2, 200.0);

    service.set_sys_shift(SysShift::from_raw(8)).expect("shift");
    let err = service.scalar(Scalar::EMinusPz).expect_err("no block for shift 8");
    assert_eq!(err.info().code, "table.sys_shift");
    assert_eq!(err.info().context["sys_shift"], "8");
}

#[test]
fn fixture_run_writes_minitree() {
    let config = load_config(fixture_path("fixtures/runs/nominal.yaml")).expect("config");
    let service =
        TableService::from_path(&fixture_path("fixtures/events/sim.jsonl")).expect("events");
    let temp = tempfile::tempdir().expect("tmp dir");
    let path = temp.path().join("minitree.csv");
    let mut pipeline = PipelineBuilder::new()
        .analysis(config.analysis.build())
        .config(config)
        .service(Box::new(service))
        .sink(Box::new(CsvSink::create(&path).expect("sink")))
        .build()
        .expect("pipeline");
    let summary = pipeline.run().expect("run");

    assert_eq!(summary.counts.processed, 5);
    assert_eq!(summary.counts.emitted, 5);
    assert_eq!(summary.counts.gen_good, 4);
    assert_eq!(summary.counts.rec_good, 3);
    assert_eq!(summary.counts.both_good, 3);
    assert_eq!(summary.provenance.chain, "Django");
    let text = std::fs::read_to_string(&path).expect("csv");
    assert_eq!(text.lines().count(), 6);
}

#[test]
fn overlap_fixture_vetoes_low_q2_background() {
    let config = load_config(fixture_path("fixtures/runs/bkg_overlap.yaml")).expect("config");
    let service =
        TableService::from_path(&fixture_path("fixtures/events/sim.jsonl")).expect("events");
    let mut pipeline = PipelineBuilder::new()
        .analysis(config.analysis.build())
        .config(config)
        .service(Box::new(service))
        .sink(Box::new(evs_pipeline::MemorySink::new()))
        .build()
        .expect("pipeline");
    let summary = pipeline.run().expect("run");
    assert_eq!(summary.counts.gen_good, 4);
    assert_eq!(summary.counts.rec_good, 4);
    assert_eq!(summary.counts.both_good, 3);
}

#[test]
fn data_fixture_runs_rec_only() {
    let config = load_config(fixture_path("fixtures/runs/data.yaml")).expect("config");
    let service =
        TableService::from_path(&fixture_path("fixtures/events/data.jsonl")).expect("events");
    let mut pipeline = PipelineBuilder::new()
        .analysis(config.analysis.build())
        .config(config)
        .service(Box::new(service))
        .sink(Box::new(evs_pipeline::MemorySink::new()))
        .build()
        .expect("pipeline");
    let summary = pipeline.run().expect("run");
    assert_eq!(summary.counts.processed, 3);
    assert_eq!(summary.counts.gen_good, 0);
    assert_eq!(summary.counts.rec_good, 1);
}
