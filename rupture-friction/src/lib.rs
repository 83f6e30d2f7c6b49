//! Friction models for `rupture`.
//!
//! Every model holds one set of parameters and state variables per fault vertex and implements
//! [`FrictionModel`]. The friction bound of all models follows the Coulomb form
//! $$
//! \tau_c = c - \mu \\, \sigma_n \quad \text{for } \sigma_n \leq 0,
//! $$
//! with cohesion $c$ and friction coefficient $\mu$. A fault in tension ($\sigma_n > 0$)
//! supports no shear traction.
use numeric_literals::replace_float_literals;
use rupture_traits::Real;

pub use rupture_traits::FrictionModel;

mod slip_weakening;
mod static_friction;
mod time_weakening;

pub use slip_weakening::*;
pub use static_friction::*;
pub use time_weakening::*;

/// Evaluate the Coulomb bound $c - \mu \sigma_n$, or zero in tension.
#[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
pub fn coulomb_bound<T: Real>(coefficient: T, cohesion: T, normal_traction: T) -> T {
    if normal_traction <= 0.0 {
        cohesion - coefficient * normal_traction
    } else {
        0.0
    }
}

/// Linear interpolation from `start` to `end` as `progress` goes from 0 to `scale`.
///
/// Past `scale` the value stays at `end`.
fn linear_weakening<T: Real>(start: T, end: T, progress: T, scale: T) -> T {
    if progress < scale {
        start - (start - end) * progress / scale
    } else {
        end
    }
}

fn check_vertex<T>(values: &[T], vertex: usize) {
    assert!(
        vertex < values.len(),
        "Vertex index {} out of bounds for friction model with {} vertices",
        vertex,
        values.len()
    );
}
