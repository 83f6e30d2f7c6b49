//! Relative displacement and velocity between the two sides of the fault.
use crate::error::FaultError;
use crate::field::{names, FieldStore, VertexField};
use crate::projector::zero_small_components;
use crate::topology::{FaultTopology, FaultVertex};
use nalgebra::DVector;
use rupture_traits::Real;

/// Total displacement `u(t) + du` of a mesh vertex.
pub fn total_displacement<T: Real>(disp: &VertexField<T>, disp_incr: &VertexField<T>, vertex: usize) -> DVector<T> {
    let dim = disp.width();
    disp.get(vertex, dim) + disp_incr.get(vertex, dim)
}

/// Difference `field[positive] - field[negative]` at a fault vertex.
pub fn jump<T: Real>(field: &VertexField<T>, vertex: &FaultVertex) -> DVector<T> {
    let dim = field.width();
    field.get(vertex.positive, dim) - field.get(vertex.negative, dim)
}

/// Computes slip and slip rate, in global coordinates, from the solution fields.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RelativeMotionTracker<T> {
    zero_tolerance: T,
}

impl<T: Real> RelativeMotionTracker<T> {
    pub fn new(zero_tolerance: T) -> Self {
        Self { zero_tolerance }
    }

    /// Relative displacement at the end of the time step for every fault vertex.
    ///
    /// Components smaller than the zero tolerance are set to zero.
    pub fn relative_displacement(
        &self,
        topology: &FaultTopology<T>,
        solution: &FieldStore<T>,
    ) -> Result<VertexField<T>, FaultError> {
        let dim = topology.space_dim();
        let num_mesh_vertices = topology.num_mesh_vertices();
        let disp = solution.get_sized(names::DISP, num_mesh_vertices, dim)?;
        let disp_incr = solution.get_sized(names::DISP_INCR, num_mesh_vertices, dim)?;
        let mut result = VertexField::zeros(names::RELATIVE_DISP, topology.num_vertices(), dim);
        for vertex in topology.vertices() {
            let mut slip = total_displacement(disp, disp_incr, vertex.positive)
                - total_displacement(disp, disp_incr, vertex.negative);
            zero_small_components(&mut slip, self.zero_tolerance);
            result.set(vertex.fault, &slip);
        }
        Ok(result)
    }

    /// Relative velocity for every fault vertex.
    ///
    /// Quasi-static problems have no velocity field. The relative velocity is then zero.
    pub fn relative_velocity(
        &self,
        topology: &FaultTopology<T>,
        solution: &FieldStore<T>,
    ) -> Result<VertexField<T>, FaultError> {
        let dim = topology.space_dim();
        let mut result = VertexField::zeros(names::RELATIVE_VELOCITY, topology.num_vertices(), dim);
        if !solution.contains(names::VELOCITY) {
            return Ok(result);
        }
        let velocity = solution.get_sized(names::VELOCITY, topology.num_mesh_vertices(), dim)?;
        for vertex in topology.vertices() {
            let mut slip_rate = jump(velocity, vertex);
            zero_small_components(&mut slip_rate, self.zero_tolerance);
            result.set(vertex.fault, &slip_rate);
        }
        Ok(result)
    }

    /// Recompute the `relative disp` and `relative velocity` fields of the fault.
    pub fn update(
        &self,
        topology: &FaultTopology<T>,
        solution: &FieldStore<T>,
        fault_fields: &mut FieldStore<T>,
    ) -> Result<(), FaultError> {
        let relative_disp = self.relative_displacement(topology, solution)?;
        let relative_velocity = self.relative_velocity(topology, solution)?;
        fault_fields.insert(relative_disp);
        fault_fields.insert(relative_velocity);
        Ok(())
    }
}
