#![warn(clippy::pedantic)]

use approx::assert_relative_eq;
use tricable::{point, Catenary, EquilibriumError, TriCableRig};

/// Anchors from a surveyed research installation: two masts 200 m apart on
/// one line, a third 150 m out from their midpoint, all tops at 10 m.
fn survey_rig() -> TriCableRig {
    TriCableRig::new(
        [
            point(0.0, 0.0, 10.0),
            point(0.0, 200.0, 10.0),
            point(150.0, 100.0, 10.0),
        ],
        0.35,
    )
    .expect("anchor triangle is valid")
}

#[test]
fn cable_passes_through_both_endpoints() {
    let cable = Catenary::solve(5.0, 4.0, 10.0, 0.035, 1.0).expect("cable solves");
    assert_relative_eq!(cable.scale(), 28.571_428_571, epsilon = 1.0e-6);
    assert_relative_eq!(cable.height(0.0), 5.0, epsilon = 1.0e-6);
    assert_relative_eq!(cable.height(10.0), 4.0, epsilon = 1.0e-6);
}

#[test]
fn survey_load_reaches_equilibrium() {
    let rig = survey_rig();
    let equilibrium = rig
        .solve(point(75.0, 100.0, 5.0), 100.0)
        .expect("solve converges");

    let tensions = equilibrium.anchor_tensions();
    assert!(tensions.iter().all(|&t| t > 0.0));

    // The two symmetric cables carry identical tension.
    assert_relative_eq!(tensions[0], tensions[1], epsilon = 1.0e-6);

    // Vertical components of the cable pulls sum to the load weight.
    let vertical: f64 = equilibrium.tension_vectors().iter().map(|f| f.z).sum();
    assert_relative_eq!(vertical, 100.0, epsilon = 1.0e-4);
}

#[test]
fn residual_force_at_load_point_is_negligible() {
    let rig = survey_rig();
    let equilibrium = rig
        .solve(point(60.0, 80.0, 4.0), 250.0)
        .expect("solve converges");

    let mut net = nalgebra::Vector3::new(0.0, 0.0, -250.0);
    for pull in equilibrium.tension_vectors() {
        net += pull.to_vector();
    }
    assert!(net.norm() < 1.0e-4, "net force {net:?} too large");
}

#[test]
fn cable_lengths_exceed_straight_line_distances() {
    let rig = survey_rig();
    let equilibrium = rig
        .solve(point(75.0, 100.0, 5.0), 100.0)
        .expect("solve converges");
    for cable in equilibrium.cables() {
        assert!(cable.length() >= cable.chord_length());
    }
}

#[test]
fn repositioning_gives_fresh_results() {
    let rig = survey_rig();
    let low = rig
        .solve(point(75.0, 100.0, 3.0), 100.0)
        .expect("solve converges");
    let high = rig
        .solve(point(75.0, 100.0, 8.0), 100.0)
        .expect("solve converges");

    // Raising the load toward the anchor plane tightens every cable.
    let low_tensions = low.anchor_tensions();
    let high_tensions = high.anchor_tensions();
    for cable in 0..3 {
        assert!(high_tensions[cable] > low_tensions[cable]);
    }
}

#[test]
fn unsupportable_positions_are_reported_not_defaulted() {
    let rig = survey_rig();

    let above = rig.solve(point(75.0, 100.0, 20.0), 100.0);
    assert!(matches!(
        above,
        Err(EquilibriumError::InfeasibleLoad { .. })
    ));

    let at_anchor = rig.solve(point(0.0, 0.0, 10.0), 100.0);
    assert!(matches!(at_anchor, Err(EquilibriumError::SingularGeometry)));
}
