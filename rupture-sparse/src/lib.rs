//! Sparse linear algebra for `rupture`.
//!
//! Contains a preconditioned Conjugate Gradient solver operating on abstract linear operators,
//! and helpers for moving dense element-sized blocks in and out of CSR matrices.
pub mod block;
pub mod cg;
pub mod operator;

pub use nalgebra_sparse::{CooMatrix, CsrMatrix};
