use evs_core::vector::{FourVector, ETA_SATURATION};

#[test]
fn transverse_momentum_and_magnitude() {
    let v = FourVector::new(3.0, 4.0, 12.0, 13.0);
    assert!((v.pt() - 5.0).abs() < 1e-12);
    assert!((v.p() - 13.0).abs() < 1e-12);
    assert!(v.m2().abs() < 1e-9);
}

#[test]
fn pseudorapidity_is_symmetric() {
    let forward = FourVector::new(1.0, 0.0, 2.0, 3.0);
    let backward = FourVector::new(1.0, 0.0, -2.0, 3.0);
    assert!((forward.eta() + backward.eta()).abs() < 1e-12);
    assert!((forward.eta() - 2.0f64.asinh()).abs() < 1e-12);
}

#[test]
fn pseudorapidity_edge_cases() {
    assert_eq!(FourVector::default().eta(), 0.0);
    assert_eq!(FourVector::new(0.0, 0.0, 5.0, 5.0).eta(), ETA_SATURATION);
    assert_eq!(FourVector::new(0.0, 0.0, -5.0, 5.0).eta(), -ETA_SATURATION);
}

#[test]
fn difference_gives_virtual_photon() {
    let beam = FourVector::new(0.0, 0.0, -27.6, 27.6);
    let lepton = FourVector::new(10.0, 0.0, -20.0, 22.36);
    let photon = beam - lepton;
    assert_eq!(photon.px, -10.0);
    assert!((photon.pz + 7.6).abs() < 1e-12);
    let back = photon + lepton;
    assert!((back.pz - beam.pz).abs() < 1e-12);
    assert!((back.e - beam.e).abs() < 1e-12);
}
