use crate::{check_vertex, coulomb_bound, linear_weakening};
use numeric_literals::replace_float_literals;
use rupture_traits::{FrictionModel, Real};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlipWeakeningParameters<T> {
    pub static_coefficient: T,
    pub dynamic_coefficient: T,
    /// Slip over which the coefficient drops from its static to its dynamic value.
    pub weakening_slip: T,
    pub cohesion: T,
    /// Reset the cumulative slip whenever the fault locks.
    #[serde(default)]
    pub force_healing: bool,
}

/// Linear slip-weakening friction.
///
/// The friction coefficient decreases linearly with the cumulative slip $s$:
/// $$
/// \mu(s) = \mu_s - (\mu_s - \mu_d) \frac{s}{d_0} \quad \text{for } s < d_0,
/// $$
/// and equals $\mu_d$ for $s \geq d_0$.
#[derive(Clone, Debug, PartialEq)]
pub struct SlipWeakeningFriction<T> {
    parameters: Vec<SlipWeakeningParameters<T>>,
    cumulative_slip: Vec<T>,
    previous_slip: Vec<T>,
}

impl<T: Real> SlipWeakeningFriction<T> {
    pub fn uniform(parameters: SlipWeakeningParameters<T>, num_vertices: usize) -> Self {
        Self::from_vertex_parameters(vec![parameters; num_vertices])
    }

    pub fn from_vertex_parameters(parameters: Vec<SlipWeakeningParameters<T>>) -> Self {
        let n = parameters.len();
        Self {
            parameters,
            cumulative_slip: vec![T::zero(); n],
            previous_slip: vec![T::zero(); n],
        }
    }

    pub fn parameters(&self) -> &[SlipWeakeningParameters<T>] {
        &self.parameters
    }

    pub fn cumulative_slip(&self) -> &[T] {
        &self.cumulative_slip
    }

    pub fn previous_slip(&self) -> &[T] {
        &self.previous_slip
    }

    /// Friction coefficient at the vertex for a trial slip magnitude.
    pub fn coefficient(&self, vertex: usize, slip: T) -> T {
        check_vertex(&self.parameters, vertex);
        let p = &self.parameters[vertex];
        let cumulative = self.cumulative_slip[vertex] + (slip - self.previous_slip[vertex]).abs();
        linear_weakening(p.static_coefficient, p.dynamic_coefficient, cumulative, p.weakening_slip)
    }
}

impl<T: Real> FrictionModel<T> for SlipWeakeningFriction<T> {
    fn num_vertices(&self) -> usize {
        self.parameters.len()
    }

    fn friction_bound(&self, vertex: usize, _time: T, slip: T, _slip_rate: T, normal_traction: T) -> T {
        let mu = self.coefficient(vertex, slip);
        coulomb_bound(mu, self.parameters[vertex].cohesion, normal_traction)
    }

    #[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
    fn update_state(&mut self, vertex: usize, _time: T, slip: T, slip_rate: T, _normal_traction: T) {
        check_vertex(&self.parameters, vertex);
        if self.parameters[vertex].force_healing && slip_rate == 0.0 {
            self.cumulative_slip[vertex] = 0.0;
        } else {
            self.cumulative_slip[vertex] += (slip - self.previous_slip[vertex]).abs();
        }
        self.previous_slip[vertex] = slip;
    }

    fn state_variable_names(&self) -> &[&'static str] {
        &["cumulative_slip", "previous_slip"]
    }

    fn state_variable(&self, name: &str) -> Option<Vec<T>> {
        match name {
            "cumulative_slip" => Some(self.cumulative_slip.clone()),
            "previous_slip" => Some(self.previous_slip.clone()),
            _ => None,
        }
    }
}
