use matrixcompare::assert_scalar_eq;
use rupture_friction::{FrictionModel, SlipWeakeningFriction, SlipWeakeningParameters};

fn parameters(force_healing: bool) -> SlipWeakeningParameters<f64> {
    SlipWeakeningParameters {
        static_coefficient: 0.6,
        dynamic_coefficient: 0.2,
        weakening_slip: 0.5,
        cohesion: 0.0,
        force_healing,
    }
}

#[test]
fn bound_weakens_linearly_with_trial_slip() {
    let friction = SlipWeakeningFriction::uniform(parameters(false), 1);
    assert_scalar_eq!(friction.friction_bound(0, 0.0, 0.0, 0.0, -10.0), 6.0, comp = abs, tol = 1e-12);
    // Half the weakening slip gives the average coefficient
    assert_scalar_eq!(friction.friction_bound(0, 0.0, 0.25, 0.0, -10.0), 4.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(friction.friction_bound(0, 0.0, 1.0, 0.0, -10.0), 2.0, comp = abs, tol = 1e-12);
}

#[test]
fn update_accumulates_slip_increments() {
    let mut friction = SlipWeakeningFriction::uniform(parameters(false), 2);
    friction.update_state(1, 0.0, 0.1, 1.0, -10.0);
    friction.update_state(1, 0.1, 0.3, 2.0, -10.0);
    // Slip decreasing still accumulates
    friction.update_state(1, 0.2, 0.2, 1.0, -10.0);

    assert_scalar_eq!(friction.cumulative_slip()[1], 0.4, comp = abs, tol = 1e-12);
    assert_scalar_eq!(friction.previous_slip()[1], 0.2, comp = abs, tol = 1e-12);
    assert_eq!(friction.cumulative_slip()[0], 0.0);

    // Trial slip equal to the previous slip does not weaken further
    assert_scalar_eq!(friction.coefficient(1, 0.2), 0.6 - 0.4 * 0.4 / 0.5, comp = abs, tol = 1e-12);
}

#[test]
fn healing_resets_cumulative_slip_when_locked() {
    let mut friction = SlipWeakeningFriction::uniform(parameters(true), 1);
    friction.update_state(0, 0.0, 0.3, 1.0, -10.0);
    assert_scalar_eq!(friction.cumulative_slip()[0], 0.3, comp = abs, tol = 1e-12);
    friction.update_state(0, 0.1, 0.3, 0.0, -10.0);
    assert_eq!(friction.cumulative_slip()[0], 0.0);
    assert_eq!(friction.previous_slip()[0], 0.3);
}

#[test]
fn exposes_state_variables_by_name() {
    let mut friction = SlipWeakeningFriction::uniform(parameters(false), 2);
    friction.update_state(0, 0.0, 0.1, 1.0, -1.0);
    assert_eq!(friction.state_variable_names(), &["cumulative_slip", "previous_slip"]);
    assert_eq!(friction.state_variable("previous_slip"), Some(vec![0.1, 0.0]));
    assert_eq!(friction.state_variable("elapsed_time"), None);
}

#[test]
fn healing_defaults_to_false_when_deserializing() {
    let json = r#"{
        "static_coefficient": 0.6,
        "dynamic_coefficient": 0.2,
        "weakening_slip": 0.5,
        "cohesion": 0.0
    }"#;
    let parsed: SlipWeakeningParameters<f64> = serde_json::from_str(json).unwrap();
    assert_eq!(parsed, parameters(false));
}
