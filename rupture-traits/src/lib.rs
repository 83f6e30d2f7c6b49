//! Core traits shared by the `rupture` crates.
//!
//! Besides the [`Real`] scalar alias, this crate holds the interfaces through which the fault
//! solver talks to its collaborators: the friction model, the spatial database providing initial
//! values, and the parallel partition deciding which process owns a mesh vertex.
use nalgebra::{DVector, RealField};

pub use nalgebra;

pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

/// A friction law bounding the shear traction on a fault.
///
/// The model owns all per-vertex properties and state variables. Vertices are identified by
/// their fault index, and the state of a vertex is only ever read or written through the
/// methods below, so that callers never hold a (possibly stale) copy of it.
pub trait FrictionModel<T: Real> {
    /// The number of fault vertices the model holds properties for.
    fn num_vertices(&self) -> usize;

    /// Inform the model of the current time step size.
    fn set_time_step(&mut self, _dt: T) {}

    /// Compute the bound on the magnitude of the shear traction at the given vertex.
    ///
    /// `normal_traction` is negative in compression.
    fn friction_bound(&self, vertex: usize, time: T, slip: T, slip_rate: T, normal_traction: T) -> T;

    /// Advance the state variables of the given vertex to the accepted solution.
    fn update_state(&mut self, vertex: usize, time: T, slip: T, slip_rate: T, normal_traction: T);

    /// Names of the per-vertex state variables exposed by the model.
    fn state_variable_names(&self) -> &[&'static str] {
        &[]
    }

    /// Per-vertex values of the named state variable, if the model has one by that name.
    fn state_variable(&self, _name: &str) -> Option<Vec<T>> {
        None
    }
}

impl<'a, T, F> FrictionModel<T> for &'a mut F
where
    T: Real,
    F: ?Sized + FrictionModel<T>,
{
    fn num_vertices(&self) -> usize {
        F::num_vertices(self)
    }

    fn set_time_step(&mut self, dt: T) {
        F::set_time_step(self, dt)
    }

    fn friction_bound(&self, vertex: usize, time: T, slip: T, slip_rate: T, normal_traction: T) -> T {
        F::friction_bound(self, vertex, time, slip, slip_rate, normal_traction)
    }

    fn update_state(&mut self, vertex: usize, time: T, slip: T, slip_rate: T, normal_traction: T) {
        F::update_state(self, vertex, time, slip, slip_rate, normal_traction)
    }

    fn state_variable_names(&self) -> &[&'static str] {
        F::state_variable_names(self)
    }

    fn state_variable(&self, name: &str) -> Option<Vec<T>> {
        F::state_variable(self, name)
    }
}

/// A database of spatially varying values.
pub trait SpatialDatabase<T: Real> {
    /// A human-readable identifier, used in diagnostics.
    fn label(&self) -> &str;

    /// Query the named values at the given physical coordinates.
    ///
    /// Returns `None` if the database has no value for one of the names at this point.
    /// Otherwise the returned vector holds one entry per name, in order.
    fn query(&self, value_names: &[&str], coordinates: &[T]) -> Option<DVector<T>>;
}

/// Decides whether a mesh vertex is owned by the current process.
///
/// Contributions that are not assembled across processes (Lagrange multipliers, relative
/// displacements) must only be written by the owning process.
pub trait VertexOwnership {
    fn is_local(&self, vertex: usize) -> bool;
}

/// Ownership for a serial run: every vertex is local.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AllLocal;

impl VertexOwnership for AllLocal {
    fn is_local(&self, _vertex: usize) -> bool {
        true
    }
}

impl<F> VertexOwnership for F
where
    F: Fn(usize) -> bool,
{
    fn is_local(&self, vertex: usize) -> bool {
        self(vertex)
    }
}
