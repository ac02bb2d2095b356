mod common;

use evs_core::Level;
use evs_pipeline::{
    BasicCutSpec, Conditions, CutGate, CutInputs, LevelCuts, LevelQuantities, OutputRecord,
    TableService, Window,
};
use evs_pipeline::cuts::DetectorInputs;
use proptest::prelude::*;

use common::{mc_config, nominal_row, pipeline, ScriptedAnalysis};

fn rec_inputs(q2: f64, vertex_z: f64, empz: f64, conditions: Conditions) -> CutInputs {
    CutInputs {
        level: Level::Rec,
        q2,
        y: 0.4,
        detector: Some(DetectorInputs {
            vertex_z,
            empz,
            conditions,
        }),
    }
}

#[test]
fn default_windows_match_detector_acceptance() {
    let gate = CutGate::new(BasicCutSpec::default()).expect("default spec");
    let pass = gate.evaluate_basic(&rec_inputs(200.0, 0.0, 55.0, Conditions::default()));
    assert!(pass.passes());

    let edge = gate.evaluate_basic(&rec_inputs(200.0, 35.0, 70.0, Conditions::default()));
    assert!(edge.passes());

    let off_vertex = gate.evaluate_basic(&rec_inputs(200.0, -35.5, 55.0, Conditions::default()));
    assert!(!off_vertex.vertex);
    assert!(!off_vertex.passes());

    let bad_run = Conditions {
        run_selected: false,
        ..Conditions::default()
    };
    let decision = gate.evaluate_basic(&rec_inputs(200.0, 0.0, 55.0, bad_run));
    assert!(!decision.run_list);
    assert!(decision.detector && decision.fiducial);
}

#[test]
fn disabled_requirement_ignores_condition() {
    let spec = BasicCutSpec {
        require_fiducial: false,
        ..BasicCutSpec::default()
    };
    let gate = CutGate::new(spec).expect("spec");
    let outside = Conditions {
        fiducial_ok: false,
        ..Conditions::default()
    };
    assert!(gate.evaluate_basic(&rec_inputs(200.0, 0.0, 55.0, outside)).passes());
}

#[test]
fn gen_level_ignores_detector_windows() {
    let mut spec = BasicCutSpec::default();
    spec.gen.q2 = Window::between(100.0, 1000.0);
    let gate = CutGate::new(spec).expect("spec");
    let inputs = CutInputs {
        level: Level::Gen,
        q2: 50.0,
        y: 0.2,
        detector: None,
    };
    let decision = gate.evaluate_basic(&inputs);
    assert!(!decision.phase_space);
    assert!(decision.vertex && decision.empz);
}

#[test]
fn inverted_window_is_rejected() {
    let spec = BasicCutSpec {
        empz: Window::between(70.0, 35.0),
        ..BasicCutSpec::default()
    };
    let err = CutGate::new(spec).expect_err("inverted window");
    assert_eq!(err.info().context["window"], "empz");
}

#[test]
fn settle_waits_for_both_predicates() {
    let gate = CutGate::new(BasicCutSpec::default()).expect("spec");
    let mut quantities = LevelQuantities::default();
    let mut cuts = LevelCuts {
        basic: Some(gate.evaluate_basic(&rec_inputs(200.0, 0.0, 55.0, Conditions::default()))),
        analysis: None,
    };
    assert_eq!(CutGate::settle(&cuts, &mut quantities), None);
    assert!(!quantities.is_good);
    cuts.analysis = Some(true);
    assert_eq!(CutGate::settle(&cuts, &mut quantities), Some(true));
    assert!(quantities.is_good);
}

proptest! {
    #[test]
    fn verdict_is_conjunction_of_basic_and_analysis(
        vertex_z in -60.0f64..60.0,
        empz in 20.0f64..90.0,
        detector_ok in any::<bool>(),
        run_selected in any::<bool>(),
        fiducial_ok in any::<bool>(),
        analysis in any::<bool>(),
    ) {
        let gate = CutGate::new(BasicCutSpec::default()).unwrap();
        let conditions = Conditions { detector_ok, run_selected, fiducial_ok };
        let basic = gate.evaluate_basic(&rec_inputs(200.0, vertex_z, empz, conditions));
        let expected_basic = (-35.0..=35.0).contains(&vertex_z)
            && (35.0..=70.0).contains(&empz)
            && detector_ok
            && run_selected
            && fiducial_ok;
        prop_assert_eq!(basic.passes(), expected_basic);

        let mut quantities = LevelQuantities::default();
        let cuts = LevelCuts { basic: Some(basic), analysis: Some(analysis) };
        let verdict = CutGate::settle(&cuts, &mut quantities);
        prop_assert_eq!(verdict, Some(expected_basic && analysis));
        prop_assert_eq!(quantities.is_good, expected_basic && analysis);
    }

    #[test]
    fn reset_discards_previous_event(q2 in 1.0f64..10_000.0, weight in 0.01f64..5.0) {
        let mut row = nominal_row(1, 1, q2);
        if let Some(gen) = row.gen.as_mut() {
            gen.weight = weight;
        }
        let (analysis, _) = ScriptedAnalysis::new(true, true);
        let (mut pipeline, _) = pipeline(
            mc_config("Django"),
            Box::new(TableService::from_rows(vec![row, nominal_row(1, 2, q2)])),
            Box::new(analysis),
        );
        pipeline.initialize().unwrap();
        prop_assert!(pipeline.advance().unwrap());
        pipeline.process_event().unwrap();
        prop_assert_eq!(pipeline.record().output.gen.event_weight, weight);

        prop_assert!(pipeline.advance().unwrap());
        pipeline.reset_event().unwrap();
        let record = pipeline.record();
        prop_assert_eq!(record.gen, LevelQuantities::default());
        prop_assert_eq!(record.rec, LevelQuantities::default());
        prop_assert_eq!(record.output, OutputRecord::default());
        prop_assert_eq!(record.output.gen.event_weight, 1.0);
        prop_assert_eq!(*pipeline.level_cuts(Level::Gen), LevelCuts::default());
    }
}
