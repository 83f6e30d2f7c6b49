//! Projection of trial fault states onto the admissible set of the contact and friction law.
//!
//! All quantities are in fault coordinates: the shear components come first and the normal
//! component is last. Positive normal slip is opening, positive normal traction is tension.
use crate::error::FaultError;
use log::warn;
use nalgebra::DVector;
use numeric_literals::replace_float_literals;
use rupture_traits::Real;
use std::fmt::Debug;

/// Trial slip, slip rate and traction at a fault vertex, in fault coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultState<T: Real> {
    pub slip: DVector<T>,
    pub slip_rate: DVector<T>,
    pub traction: DVector<T>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProjectionOutcome {
    /// The traction is admissible and is left unchanged.
    Locked,
    /// The shear traction is reset to the friction bound.
    Sliding,
    /// Sliding with zero trial shear traction. The slip rate gives the direction of the
    /// traction, or the traction stays zero if the slip rate vanishes too.
    DegenerateSliding,
    /// The fault is open and transmits no traction.
    Open,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection<T: Real> {
    /// Change of the traction (Lagrange multiplier) in fault coordinates.
    pub traction_change: DVector<T>,
    pub outcome: ProjectionOutcome,
}

impl<T: Real> Projection<T> {
    fn unchanged(dim: usize) -> Self {
        Self {
            traction_change: DVector::zeros(dim),
            outcome: ProjectionOutcome::Locked,
        }
    }

    fn open(traction: &DVector<T>) -> Self {
        Self {
            traction_change: -traction,
            outcome: ProjectionOutcome::Open,
        }
    }
}

/// Evaluates the friction bound for (slip magnitude, slip-rate magnitude, normal traction).
pub type FrictionBound<'a, T> = &'a dyn Fn(T, T, T) -> T;

/// The complementarity rule of the fault for a fixed spatial dimension.
///
/// The trial state must already be sign consistent along the normal direction, see
/// [`sign_consistency_correction`].
pub trait ConstraintProjector<T: Real>: Debug + Send + Sync {
    fn space_dim(&self) -> usize;

    /// Compute the change in traction required for the state to satisfy the contact and
    /// friction constraints.
    ///
    /// With `iterating` set, a vertex that is sliding (nonzero slip rate) always has its shear
    /// traction reset to the friction bound, so that the bound tracks the slip rate across
    /// nonlinear iterations.
    fn project(&self, state: &FaultState<T>, friction_bound: FrictionBound<T>, iterating: bool) -> Projection<T>;
}

/// Select the projector for the given spatial dimension.
pub fn projector_for_dimension<T: Real>(
    space_dim: usize,
    zero_tolerance: T,
    allow_opening: bool,
) -> Result<Box<dyn ConstraintProjector<T>>, FaultError> {
    match space_dim {
        1 => Ok(Box::new(Projector1d {
            zero_tolerance,
            allow_opening,
        })),
        2 => Ok(Box::new(Projector2d {
            zero_tolerance,
            allow_opening,
        })),
        3 => Ok(Box::new(Projector3d {
            zero_tolerance,
            allow_opening,
        })),
        dim => Err(FaultError::Dimension { dim }),
    }
}

/// A 1D fault only has a normal component: it is either closed or open.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projector1d<T> {
    pub zero_tolerance: T,
    pub allow_opening: bool,
}

impl<T: Real> ConstraintProjector<T> for Projector1d<T> {
    fn space_dim(&self) -> usize {
        1
    }

    fn project(&self, state: &FaultState<T>, _friction_bound: FrictionBound<T>, _iterating: bool) -> Projection<T> {
        debug_assert_eq!(state.traction.len(), 1);
        if self.allow_opening && state.slip[0].abs() >= self.zero_tolerance {
            Projection::open(&state.traction)
        } else {
            Projection::unchanged(1)
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projector2d<T> {
    pub zero_tolerance: T,
    pub allow_opening: bool,
}

impl<T: Real> ConstraintProjector<T> for Projector2d<T> {
    fn space_dim(&self) -> usize {
        2
    }

    fn project(&self, state: &FaultState<T>, friction_bound: FrictionBound<T>, iterating: bool) -> Projection<T> {
        project_frictional(state, 1, self.zero_tolerance, self.allow_opening, friction_bound, iterating)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projector3d<T> {
    pub zero_tolerance: T,
    pub allow_opening: bool,
}

impl<T: Real> ConstraintProjector<T> for Projector3d<T> {
    fn space_dim(&self) -> usize {
        3
    }

    fn project(&self, state: &FaultState<T>, friction_bound: FrictionBound<T>, iterating: bool) -> Projection<T> {
        project_frictional(state, 2, self.zero_tolerance, self.allow_opening, friction_bound, iterating)
    }
}

/// Projection shared by faults with `num_shear` shear components followed by one normal component.
#[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
fn project_frictional<T: Real>(
    state: &FaultState<T>,
    num_shear: usize,
    zero_tolerance: T,
    allow_opening: bool,
    friction_bound: FrictionBound<T>,
    iterating: bool,
) -> Projection<T> {
    let dim = num_shear + 1;
    debug_assert_eq!(state.traction.len(), dim);
    let n = num_shear;

    let slip_normal = state.slip[n];
    let traction_normal = state.traction[n];
    let in_contact = slip_normal.abs() < zero_tolerance && traction_normal < -zero_tolerance;

    if allow_opening && !in_contact {
        return Projection::open(&state.traction);
    }

    let slip_shear = state.slip.rows(0, num_shear);
    let rate_shear = state.slip_rate.rows(0, num_shear);
    let traction_shear = state.traction.rows(0, num_shear);

    let slip_mag = slip_shear.norm();
    let rate_mag = rate_shear.norm();
    let traction_mag = traction_shear.norm();
    let bound = friction_bound(slip_mag, rate_mag, traction_normal);

    if traction_mag > bound || (iterating && rate_mag > 0.0) {
        let mut traction_change = DVector::zeros(dim);
        if traction_mag > 0.0 {
            // Rescale the shear traction to the bound, keeping its direction
            let scale = -(traction_mag - bound) / traction_mag;
            traction_change
                .rows_mut(0, num_shear)
                .copy_from(&(traction_shear * scale));
            Projection {
                traction_change,
                outcome: ProjectionOutcome::Sliding,
            }
        } else {
            // No trial shear traction to scale. Align the traction with the slip rate.
            warn!(
                "Sliding fault vertex with zero shear traction (slip rate magnitude {}, friction bound {}).",
                rate_mag, bound
            );
            if rate_mag > 0.0 {
                traction_change
                    .rows_mut(0, num_shear)
                    .copy_from(&(rate_shear * (bound / rate_mag)));
            }
            Projection {
                traction_change,
                outcome: ProjectionOutcome::DegenerateSliding,
            }
        }
    } else {
        Projection::unchanged(dim)
    }
}

/// Correction of normal slip and normal traction removing physically inconsistent pairs.
///
/// Opening under compression or interpenetration under tension is resolved by zeroing whichever
/// of the two has the smaller magnitude. Remaining interpenetration is removed by zeroing the
/// normal slip. Returns `(slip change, traction change)`.
#[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
pub fn sign_consistency_correction<T: Real>(slip_normal: T, traction_normal: T) -> (T, T) {
    let mut slip_change = 0.0;
    let mut traction_change = 0.0;
    if slip_normal * traction_normal < 0.0 {
        if slip_normal.abs() > traction_normal.abs() {
            traction_change = -traction_normal;
        } else {
            slip_change = -slip_normal;
        }
    }
    if slip_normal < 0.0 {
        slip_change = -slip_normal;
    }
    (slip_change, traction_change)
}

/// Set components with magnitude below the tolerance to exactly zero.
pub fn zero_small_components<T: Real>(v: &mut DVector<T>, zero_tolerance: T) {
    for x in v.iter_mut() {
        if x.abs() < zero_tolerance {
            *x = T::zero();
        }
    }
}
