use crate::{check_vertex, coulomb_bound, linear_weakening};
use numeric_literals::replace_float_literals;
use rupture_traits::{FrictionModel, Real};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeWeakeningParameters<T> {
    pub static_coefficient: T,
    pub dynamic_coefficient: T,
    /// Sliding time over which the coefficient drops from its static to its dynamic value.
    pub weakening_time: T,
    pub cohesion: T,
}

/// Linear time-weakening friction.
///
/// The friction coefficient decreases linearly with the time $t_s$ the vertex has spent
/// sliding, reaching the dynamic coefficient after the weakening time $t_0$.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeWeakeningFriction<T> {
    parameters: Vec<TimeWeakeningParameters<T>>,
    elapsed_time: Vec<T>,
    dt: T,
}

impl<T: Real> TimeWeakeningFriction<T> {
    pub fn uniform(parameters: TimeWeakeningParameters<T>, num_vertices: usize) -> Self {
        Self::from_vertex_parameters(vec![parameters; num_vertices])
    }

    pub fn from_vertex_parameters(parameters: Vec<TimeWeakeningParameters<T>>) -> Self {
        let n = parameters.len();
        Self {
            parameters,
            elapsed_time: vec![T::zero(); n],
            dt: T::zero(),
        }
    }

    pub fn parameters(&self) -> &[TimeWeakeningParameters<T>] {
        &self.parameters
    }

    pub fn elapsed_time(&self) -> &[T] {
        &self.elapsed_time
    }

    pub fn time_step(&self) -> T {
        self.dt
    }
}

impl<T: Real> FrictionModel<T> for TimeWeakeningFriction<T> {
    fn num_vertices(&self) -> usize {
        self.parameters.len()
    }

    fn set_time_step(&mut self, dt: T) {
        self.dt = dt;
    }

    fn friction_bound(&self, vertex: usize, _time: T, _slip: T, _slip_rate: T, normal_traction: T) -> T {
        check_vertex(&self.parameters, vertex);
        let p = &self.parameters[vertex];
        let mu = linear_weakening(
            p.static_coefficient,
            p.dynamic_coefficient,
            self.elapsed_time[vertex],
            p.weakening_time,
        );
        coulomb_bound(mu, p.cohesion, normal_traction)
    }

    #[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
    fn update_state(&mut self, vertex: usize, _time: T, slip: T, _slip_rate: T, _normal_traction: T) {
        check_vertex(&self.parameters, vertex);
        if slip > 0.0 {
            self.elapsed_time[vertex] += self.dt;
        }
    }

    fn state_variable_names(&self) -> &[&'static str] {
        &["elapsed_time"]
    }

    fn state_variable(&self, name: &str) -> Option<Vec<T>> {
        match name {
            "elapsed_time" => Some(self.elapsed_time.clone()),
            _ => None,
        }
    }
}
