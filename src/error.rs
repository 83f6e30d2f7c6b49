//! Errors reported by fault operations.
use crate::topology::FaultSide;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
#[non_exhaustive]
pub enum FaultError {
    /// Invalid configuration, topology or field request. Detected before any solve.
    Configuration { message: String },
    /// Spatial dimension outside of 1, 2 or 3.
    Dimension { dim: usize },
    /// The sensitivity solve for one side of the fault did not reach its tolerance.
    NumericalNonConvergence {
        side: FaultSide,
        source: Box<dyn Error + Send + Sync>,
    },
    /// A spatial database had no value at a required point.
    DataLookup { database: String, coordinates: Vec<f64> },
}

impl FaultError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl fmt::Display for FaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { message } => write!(f, "Configuration error: {}", message),
            Self::Dimension { dim } => {
                write!(f, "Unsupported spatial dimension {}. Expected 1, 2 or 3.", dim)
            }
            Self::NumericalNonConvergence { side, source } => {
                write!(f, "Sensitivity solve on the {} side of the fault failed: {}", side, source)
            }
            Self::DataLookup { database, coordinates } => {
                write!(
                    f,
                    "Could not find values in spatial database '{}' at coordinates {:?}.",
                    database, coordinates
                )
            }
        }
    }
}

impl Error for FaultError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NumericalNonConvergence { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
