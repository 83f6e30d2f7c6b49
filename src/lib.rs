//! Frictional contact on cohesive finite element faults.
//!
//! A fault is represented by cohesive cells with three vertices per fault vertex: one on the
//! negative side, one on the positive side and one carrying the Lagrange multiplier (the fault
//! traction). [`CohesiveFault`] enforces the contact and friction constraints on the trial
//! solution of an implicit or explicit time step.
//!
//! Vector quantities are stored in global coordinates and rotated into fault coordinates with an
//! [`OrientationFrame`](orientation::OrientationFrame) per fault vertex. In fault coordinates the
//! shear components come first and the normal component is last.
pub mod config;
pub mod error;
pub mod fault;
pub mod fault_cell;
pub mod field;
pub mod initial_traction;
pub mod orientation;
pub mod projector;
pub mod relative_motion;
pub mod sensitivity;
pub mod topology;

pub mod friction {
    pub use rupture_friction::*;
}

pub mod sparse {
    pub use rupture_sparse::*;
}

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate rupture_traits;

pub use config::{FaultConfig, SensitivitySettings};
pub use error::FaultError;
pub use fault::{CohesiveFault, CohesiveFaultBuilder, ConstraintSummary};
pub use field::{FieldStore, VertexField};
pub use rupture_traits::{AllLocal, FrictionModel, Real, SpatialDatabase, VertexOwnership};
pub use topology::{CohesiveCell, FaultSide, FaultTopology, FaultVertex};
