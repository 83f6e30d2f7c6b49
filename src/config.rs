//! Fault configuration.
use crate::error::FaultError;
use serde::{Deserialize, Serialize};

/// Settings for the linear solver of the sensitivity problem.
///
/// Tolerances are given relative to the zero tolerance of the fault.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivitySettings {
    pub max_iterations: usize,
    pub rtol_factor: f64,
    pub atol_factor: f64,
}

impl Default for SensitivitySettings {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            rtol_factor: 1e-3,
            atol_factor: 1e-5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultConfig {
    /// Identifier of the fault, used in diagnostics.
    pub label: String,
    pub space_dim: usize,
    /// Slip and traction values with smaller magnitude are treated as exactly zero.
    pub zero_tolerance: f64,
    /// Whether the fault may open under tension. When disabled, the friction criterion is
    /// applied regardless of the normal traction.
    pub allow_opening: bool,
    /// Direction used to orient the strike direction of 3D faults.
    pub up_dir: [f64; 3],
    /// Whether initial tractions are read from a spatial database at initialization.
    pub use_initial_tractions: bool,
    pub sensitivity: SensitivitySettings,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            label: String::from("fault"),
            space_dim: 2,
            zero_tolerance: 1e-10,
            allow_opening: true,
            up_dir: [0.0, 0.0, 1.0],
            use_initial_tractions: false,
            sensitivity: SensitivitySettings::default(),
        }
    }
}

impl FaultConfig {
    pub fn validate(&self) -> Result<(), FaultError> {
        if !(1..=3).contains(&self.space_dim) {
            return Err(FaultError::Dimension { dim: self.space_dim });
        }
        if !(self.zero_tolerance >= 0.0) {
            return Err(FaultError::configuration(format!(
                "Zero tolerance ({}) for fault '{}' must be nonnegative.",
                self.zero_tolerance, self.label
            )));
        }
        let settings = &self.sensitivity;
        if settings.max_iterations == 0 {
            return Err(FaultError::configuration(format!(
                "Sensitivity solve for fault '{}' needs at least one iteration.",
                self.label
            )));
        }
        if !(settings.rtol_factor >= 0.0 && settings.atol_factor >= 0.0) {
            return Err(FaultError::configuration(format!(
                "Sensitivity tolerance factors for fault '{}' must be nonnegative.",
                self.label
            )));
        }
        if self.space_dim == 3 && self.up_dir.iter().all(|&x| x == 0.0) {
            return Err(FaultError::configuration(format!(
                "Up direction for fault '{}' must be nonzero.",
                self.label
            )));
        }
        Ok(())
    }
}
