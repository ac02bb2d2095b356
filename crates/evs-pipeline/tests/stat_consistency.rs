use evs_pipeline::{Histogram, Migration, OverlapVeto, VetoSide};

#[test]
fn histogram_routes_values_to_bins() {
    let mut histogram = Histogram::from_edges(vec![0.0, 1.0, 2.0, 4.0]).expect("edges");
    histogram.fill(-0.5, 1.0);
    histogram.fill(0.0, 2.0);
    histogram.fill(1.999, 0.5);
    histogram.fill(3.0, 1.5);
    histogram.fill(4.0, 3.0);

    assert_eq!(histogram.sum_w, vec![2.0, 0.5, 1.5]);
    assert_eq!(histogram.sum_w2, vec![4.0, 0.25, 2.25]);
    assert_eq!(histogram.underflow, 1.0);
    assert_eq!(histogram.overflow, 3.0);
    assert_eq!(histogram.entries, 5);
    assert_eq!(histogram.integral(), 4.0);
}

#[test]
fn uniform_histogram_spans_range() {
    let histogram = Histogram::uniform(4, 0.0, 2.0).expect("uniform");
    assert_eq!(histogram.edges, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    assert!(Histogram::uniform(3, 1.0, 1.0).is_err());
}

#[test]
fn unsorted_edges_are_rejected() {
    let err = Histogram::from_edges(vec![0.0, 2.0, 1.0]).expect_err("unsorted");
    assert_eq!(err.info().code, "histogram.edges");
    assert!(Migration::from_edges(vec![1.0]).is_err());
}

#[test]
fn migration_records_gen_rec_pairs() {
    let mut migration = Migration::from_edges(vec![0.0, 10.0, 20.0]).expect("edges");
    assert!(migration.fill(5.0, 15.0, 0.5));
    assert!(migration.fill(5.0, 5.0, 1.0));
    assert!(!migration.fill(25.0, 5.0, 1.0));
    assert_eq!(migration.cells, vec![vec![1.0, 0.5], vec![0.0, 0.0]]);
    assert_eq!(migration.total(), 1.5);
}

#[test]
fn overlap_veto_sides() {
    let inside = OverlapVeto::default();
    assert!(!inside.keeps(45.0));
    assert!(inside.keeps(60.0));
    assert!(inside.keeps(2.0));
    assert!(inside.keeps(100.0));

    let outside = OverlapVeto {
        reject: VetoSide::Outside,
        ..OverlapVeto::default()
    };
    assert!(outside.keeps(45.0));
    assert!(outside.keeps(4.0));
    assert!(!outside.keeps(3.9));
    assert!(!outside.keeps(60.5));
}
