use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;
use rupture_friction::{coulomb_bound, FrictionModel, StaticFriction, StaticFrictionParameters};

#[test]
fn static_bound_in_compression() {
    let friction = StaticFriction::uniform(
        StaticFrictionParameters {
            coefficient: 0.6,
            cohesion: 1.0,
        },
        3,
    );
    assert_eq!(friction.num_vertices(), 3);
    let bound = friction.friction_bound(1, 0.0, 0.0, 0.0, -10.0);
    assert_scalar_eq!(bound, 7.0, comp = float);
}

#[test]
fn static_bound_vanishes_in_tension() {
    let friction = StaticFriction::uniform(
        StaticFrictionParameters {
            coefficient: 0.6,
            cohesion: 1.0,
        },
        1,
    );
    assert_eq!(friction.friction_bound(0, 0.0, 0.0, 0.0, 2.0), 0.0);
}

#[test]
fn static_friction_has_no_state_variables() {
    let friction = StaticFriction::from_vertex_parameters(vec![StaticFrictionParameters {
        coefficient: 0.5,
        cohesion: 0.0,
    }]);
    assert!(friction.state_variable_names().is_empty());
    assert_eq!(friction.state_variable("cumulative_slip"), None);
}

#[test]
#[should_panic]
fn out_of_bounds_vertex_panics() {
    let friction = StaticFriction::uniform(
        StaticFrictionParameters {
            coefficient: 0.5,
            cohesion: 0.0,
        },
        2,
    );
    friction.friction_bound(2, 0.0, 0.0, 0.0, -1.0);
}

#[test]
fn parameters_deserialize_from_json() {
    let parameters: StaticFrictionParameters<f64> =
        serde_json::from_str(r#"{ "coefficient": 0.6, "cohesion": 2.5 }"#).unwrap();
    assert_eq!(
        parameters,
        StaticFrictionParameters {
            coefficient: 0.6,
            cohesion: 2.5
        }
    );
}

proptest! {
    #[test]
    fn coulomb_bound_is_nonnegative_for_nonnegative_parameters(
        mu in 0.0..2.0f64,
        cohesion in 0.0..10.0f64,
        normal in -100.0..100.0f64,
    ) {
        prop_assert!(coulomb_bound(mu, cohesion, normal) >= 0.0);
    }
}
