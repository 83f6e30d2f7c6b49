use super::vector;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::DVector;
use proptest::prelude::*;
use rupture::projector::{
    projector_for_dimension, sign_consistency_correction, zero_small_components, FaultState, ProjectionOutcome,
};
use rupture::FaultError;

const ZERO_TOLERANCE: f64 = 1e-10;

fn state(slip: &[f64], slip_rate: &[f64], traction: &[f64]) -> FaultState<f64> {
    FaultState {
        slip: vector(slip),
        slip_rate: vector(slip_rate),
        traction: vector(traction),
    }
}

/// Coulomb friction without cohesion.
fn coulomb(coefficient: f64) -> impl Fn(f64, f64, f64) -> f64 {
    move |_, _, normal| if normal <= 0.0 { -coefficient * normal } else { 0.0 }
}

#[test]
fn projector_dimension() {
    for dim in 1..=3 {
        let projector = projector_for_dimension(dim, ZERO_TOLERANCE, true).unwrap();
        assert_eq!(projector.space_dim(), dim);
    }
    assert!(matches!(
        projector_for_dimension(0, ZERO_TOLERANCE, true),
        Err(FaultError::Dimension { dim: 0 })
    ));
}

#[test]
fn closed_1d_fault_is_unchanged() {
    let projector = projector_for_dimension(1, ZERO_TOLERANCE, true).unwrap();
    let projection = projector.project(&state(&[0.0], &[0.0], &[-5.0]), &coulomb(0.6), true);
    assert_eq!(projection.outcome, ProjectionOutcome::Locked);
    assert_eq!(projection.traction_change, vector(&[0.0]));
}

#[test]
fn opening_1d_fault_releases_traction() {
    let projector = projector_for_dimension(1, ZERO_TOLERANCE, true).unwrap();
    let projection = projector.project(&state(&[0.1], &[0.0], &[3.0]), &coulomb(0.6), true);
    assert_eq!(projection.outcome, ProjectionOutcome::Open);
    assert_eq!(projection.traction_change, vector(&[-3.0]));
}

#[test]
fn slip_above_tolerance_opens_1d_fault() {
    let projector = projector_for_dimension(1, ZERO_TOLERANCE, true).unwrap();
    let projection = projector.project(&state(&[1e-3], &[0.0], &[2.0]), &coulomb(0.6), false);
    assert_eq!(projection.outcome, ProjectionOutcome::Open);
    assert_eq!(projection.traction_change, vector(&[-2.0]));
}

#[test]
fn opening_is_ignored_when_disallowed() {
    let projector = projector_for_dimension(1, ZERO_TOLERANCE, false).unwrap();
    let projection = projector.project(&state(&[0.1], &[0.0], &[3.0]), &coulomb(0.6), true);
    assert_eq!(projection.outcome, ProjectionOutcome::Locked);
    assert_eq!(projection.traction_change, vector(&[0.0]));
}

#[test]
fn sliding_2d_fault_is_reset_to_bound() {
    let projector = projector_for_dimension(2, ZERO_TOLERANCE, true).unwrap();
    let projection = projector.project(&state(&[0.0, 0.0], &[0.0, 0.0], &[3.0, -10.0]), &coulomb(0.2), false);
    assert_eq!(projection.outcome, ProjectionOutcome::Sliding);
    assert_matrix_eq!(projection.traction_change, vector(&[-1.0, 0.0]), comp = abs, tol = 1e-14);
}

#[test]
fn locked_2d_fault_below_bound_is_unchanged() {
    let projector = projector_for_dimension(2, ZERO_TOLERANCE, true).unwrap();
    let trial = state(&[0.0, 0.0], &[0.0, 0.0], &[1.0, -10.0]);
    let projection = projector.project(&trial, &coulomb(0.2), true);
    assert_eq!(projection.outcome, ProjectionOutcome::Locked);
    assert_eq!(projection.traction_change, DVector::zeros(2));
}

#[test]
fn sliding_vertex_tracks_bound_while_iterating() {
    let projector = projector_for_dimension(2, ZERO_TOLERANCE, true).unwrap();
    let trial = state(&[0.3, 0.0], &[0.5, 0.0], &[1.0, -10.0]);

    let projection = projector.project(&trial, &coulomb(0.2), true);
    assert_eq!(projection.outcome, ProjectionOutcome::Sliding);
    assert_matrix_eq!(projection.traction_change, vector(&[1.0, 0.0]), comp = abs, tol = 1e-14);

    let projection = projector.project(&trial, &coulomb(0.2), false);
    assert_eq!(projection.outcome, ProjectionOutcome::Locked);
}

#[test]
fn zero_shear_traction_aligns_with_slip_rate() {
    let projector = projector_for_dimension(2, ZERO_TOLERANCE, true).unwrap();
    let trial = state(&[0.0, 0.0], &[-0.5, 0.0], &[0.0, -10.0]);
    let projection = projector.project(&trial, &coulomb(0.2), true);
    assert_eq!(projection.outcome, ProjectionOutcome::DegenerateSliding);
    assert_matrix_eq!(projection.traction_change, vector(&[-2.0, 0.0]), comp = abs, tol = 1e-14);
}

#[test]
fn open_2d_fault_releases_all_traction() {
    let projector = projector_for_dimension(2, ZERO_TOLERANCE, true).unwrap();
    let projection = projector.project(&state(&[0.0, 0.2], &[0.0, 0.0], &[1.0, 5.0]), &coulomb(0.2), true);
    assert_eq!(projection.outcome, ProjectionOutcome::Open);
    assert_eq!(projection.traction_change, vector(&[-1.0, -5.0]));
}

#[test]
fn closed_fault_in_tension_applies_friction_when_opening_is_disallowed() {
    let projector = projector_for_dimension(2, ZERO_TOLERANCE, false).unwrap();
    let trial = state(&[0.0, 0.2], &[0.0, 0.0], &[1.0, 5.0]);
    let projection = projector.project(&trial, &coulomb(0.2), false);
    // No shear strength in tension
    assert_eq!(projection.outcome, ProjectionOutcome::Sliding);
    assert_matrix_eq!(projection.traction_change, vector(&[-1.0, 0.0]), comp = abs, tol = 1e-14);
}

#[test]
fn sliding_3d_fault_keeps_shear_direction() {
    let projector = projector_for_dimension(3, ZERO_TOLERANCE, true).unwrap();
    let trial = state(&[0.0; 3], &[0.0; 3], &[3.0, 4.0, -10.0]);
    let projection = projector.project(&trial, &coulomb(0.25), false);
    assert_eq!(projection.outcome, ProjectionOutcome::Sliding);
    assert_matrix_eq!(projection.traction_change, vector(&[-1.5, -2.0, 0.0]), comp = abs, tol = 1e-14);
}

#[test]
fn sign_consistency() {
    // Opening under compression: the smaller of the two is removed
    assert_eq!(sign_consistency_correction(0.1, -5.0), (-0.1, 0.0));
    assert_eq!(sign_consistency_correction(5.0, -0.1), (0.0, 0.1));
    // Interpenetration is always removed
    assert_eq!(sign_consistency_correction(-0.2, 3.0), (0.2, 0.0));
    assert_eq!(sign_consistency_correction(-3.0, 0.1), (3.0, -0.1));
    assert_eq!(sign_consistency_correction(-0.5, -1.0), (0.5, 0.0));
    // Consistent pairs are unchanged
    assert_eq!(sign_consistency_correction(0.1, 2.0), (0.0, 0.0));
    assert_eq!(sign_consistency_correction(0.0, -2.0), (0.0, 0.0));
}

#[test]
fn small_components_are_zeroed() {
    let mut v = vector(&[1e-12, -0.5, -1e-11]);
    zero_small_components(&mut v, ZERO_TOLERANCE);
    assert_eq!(v, vector(&[0.0, -0.5, 0.0]));
}

proptest! {
    #[test]
    fn projected_shear_traction_respects_static_bound(
        shear in prop::array::uniform2(-10.0..10.0f64),
        normal in -10.0..-0.01f64,
        coefficient in 0.0..1.0f64,
    ) {
        let projector = projector_for_dimension(3, ZERO_TOLERANCE, true).unwrap();
        let trial = state(&[0.0; 3], &[0.0; 3], &[shear[0], shear[1], normal]);
        let projection = projector.project(&trial, &coulomb(coefficient), false);

        let projected = &trial.traction + &projection.traction_change;
        let bound = -coefficient * normal;
        let shear_magnitude = projected.rows(0, 2).norm();
        prop_assert!(shear_magnitude <= bound + 1e-12);
        prop_assert_eq!(projection.traction_change[2], 0.0);

        match projection.outcome {
            ProjectionOutcome::Locked => prop_assert_eq!(projection.traction_change, DVector::zeros(3)),
            ProjectionOutcome::Sliding => assert_scalar_eq!(shear_magnitude, bound, comp = abs, tol = 1e-12),
            outcome => prop_assert!(false, "Unexpected outcome {:?}", outcome),
        }
    }
}
