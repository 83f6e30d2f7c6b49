use rupture::{FaultConfig, FaultError, SensitivitySettings};

#[test]
fn defaults_are_valid() {
    let config = FaultConfig::default();
    assert_eq!(config.space_dim, 2);
    assert!(config.allow_opening);
    assert!(!config.use_initial_tractions);
    assert_eq!(config.sensitivity, SensitivitySettings::default());
    config.validate().unwrap();
}

#[test]
fn missing_keys_are_filled_with_defaults() {
    let config: FaultConfig = serde_json::from_str(
        r#"{
            "label": "main",
            "space_dim": 3,
            "zero_tolerance": 1e-8,
            "sensitivity": { "max_iterations": 50 }
        }"#,
    )
    .unwrap();
    assert_eq!(config.label, "main");
    assert_eq!(config.space_dim, 3);
    assert_eq!(config.zero_tolerance, 1e-8);
    assert_eq!(config.up_dir, [0.0, 0.0, 1.0]);
    assert_eq!(config.sensitivity.max_iterations, 50);
    assert_eq!(config.sensitivity.rtol_factor, SensitivitySettings::default().rtol_factor);
    config.validate().unwrap();
}

#[test]
fn config_survives_json() {
    let config = FaultConfig {
        label: String::from("thrust"),
        allow_opening: false,
        ..FaultConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed: FaultConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn unsupported_dimension_is_rejected() {
    let config = FaultConfig {
        space_dim: 4,
        ..FaultConfig::default()
    };
    assert!(matches!(config.validate(), Err(FaultError::Dimension { dim: 4 })));
}

#[test]
fn negative_zero_tolerance_is_rejected() {
    for zero_tolerance in [-1e-10, f64::NAN] {
        let config = FaultConfig {
            zero_tolerance,
            ..FaultConfig::default()
        };
        assert!(matches!(config.validate(), Err(FaultError::Configuration { .. })));
    }
}

#[test]
fn invalid_sensitivity_settings_are_rejected() {
    let no_iterations = FaultConfig {
        sensitivity: SensitivitySettings {
            max_iterations: 0,
            ..SensitivitySettings::default()
        },
        ..FaultConfig::default()
    };
    assert!(matches!(no_iterations.validate(), Err(FaultError::Configuration { .. })));

    let negative_factor = FaultConfig {
        sensitivity: SensitivitySettings {
            atol_factor: -1.0,
            ..SensitivitySettings::default()
        },
        ..FaultConfig::default()
    };
    assert!(matches!(negative_factor.validate(), Err(FaultError::Configuration { .. })));
}

#[test]
fn zero_up_dir_is_only_rejected_in_3d() {
    let config = FaultConfig {
        up_dir: [0.0; 3],
        ..FaultConfig::default()
    };
    config.validate().unwrap();

    let config = FaultConfig { space_dim: 3, ..config };
    assert!(matches!(config.validate(), Err(FaultError::Configuration { .. })));
}
