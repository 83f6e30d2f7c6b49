use crate::{check_vertex, coulomb_bound};
use rupture_traits::{FrictionModel, Real};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticFrictionParameters<T> {
    pub coefficient: T,
    pub cohesion: T,
}

/// Coulomb friction with a constant coefficient. The model has no state.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticFriction<T> {
    parameters: Vec<StaticFrictionParameters<T>>,
}

impl<T: Real> StaticFriction<T> {
    pub fn uniform(parameters: StaticFrictionParameters<T>, num_vertices: usize) -> Self {
        Self {
            parameters: vec![parameters; num_vertices],
        }
    }

    pub fn from_vertex_parameters(parameters: Vec<StaticFrictionParameters<T>>) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &[StaticFrictionParameters<T>] {
        &self.parameters
    }
}

impl<T: Real> FrictionModel<T> for StaticFriction<T> {
    fn num_vertices(&self) -> usize {
        self.parameters.len()
    }

    fn friction_bound(&self, vertex: usize, _time: T, _slip: T, _slip_rate: T, normal_traction: T) -> T {
        check_vertex(&self.parameters, vertex);
        let StaticFrictionParameters { coefficient, cohesion } = self.parameters[vertex];
        coulomb_bound(coefficient, cohesion, normal_traction)
    }

    fn update_state(&mut self, vertex: usize, _time: T, _slip: T, _slip_rate: T, _normal_traction: T) {
        check_vertex(&self.parameters, vertex);
    }
}
