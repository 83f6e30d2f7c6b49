//! The sensitivity problem: the displacement response of one side of the fault to a change in
//! the Lagrange multipliers.
//!
//! The bulk stiffness is restricted to the degrees of freedom of the fault vertices on one side,
//! giving a small reduced operator `K_f` of size `num_fault_vertices * space_dim`. The scalar
//! unknown `u * space_dim + d` of the reduced system is component `d` of fault vertex `u`.
//! The right-hand side is the change in Lagrange multipliers weighted by the basis products of
//! the fault cells, with opposite signs on the two sides.
use crate::config::SensitivitySettings;
use crate::error::FaultError;
use crate::fault_cell::FaultCellGeometry;
use crate::field::VertexField;
use crate::topology::{FaultSide, FaultTopology};
use itertools::Itertools;
use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use numeric_literals::replace_float_literals;
use rupture_sparse::block::{extract_dense_block, insert_dense_block, reset_to_scaled_identity};
use rupture_sparse::cg::{ConjugateGradient, ResidualToleranceCriterion};
use rupture_sparse::operator::JacobiPreconditioner;
use rupture_traits::{Real, VertexOwnership};

/// Transient data of one sensitivity solve.
#[derive(Debug, Clone)]
pub struct SensitivityState<T: Real> {
    pub side: FaultSide,
    pub operator: CsrMatrix<T>,
    pub rhs: DVector<T>,
    pub solution: DVector<T>,
    pub num_iterations: usize,
}

#[derive(Debug, Clone)]
pub struct SensitivityProblem<T: Real> {
    space_dim: usize,
    num_fault_vertices: usize,
    rtol: T,
    atol: T,
    max_iterations: usize,
    /// Reduced operator with the sparsity of the fault, allocated by `setup`.
    template: Option<CsrMatrix<T>>,
}

/// Sign of the right-hand side for the given side of the fault.
fn residual_sign<T: Real>(side: FaultSide) -> T {
    match side {
        FaultSide::Negative => T::one(),
        FaultSide::Positive => -T::one(),
    }
}

/// Sign with which the solution of the given side enters the relative displacement.
fn commit_sign<T: Real>(side: FaultSide) -> T {
    match side {
        FaultSide::Negative => -T::one(),
        FaultSide::Positive => T::one(),
    }
}

impl<T: Real> SensitivityProblem<T> {
    /// Solver tolerances are `rtol_factor * zero_tolerance` and `atol_factor * zero_tolerance`.
    /// The relative tolerance is kept above a small multiple of machine epsilon.
    #[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
    pub fn new(
        space_dim: usize,
        num_fault_vertices: usize,
        zero_tolerance: T,
        settings: &SensitivitySettings,
    ) -> Self {
        let rtol_factor: T = nalgebra::convert(settings.rtol_factor);
        let atol_factor: T = nalgebra::convert(settings.atol_factor);
        let rtol_floor = 100.0 * T::default_epsilon();
        Self {
            space_dim,
            num_fault_vertices,
            rtol: (rtol_factor * zero_tolerance).max(rtol_floor),
            atol: atol_factor * zero_tolerance,
            max_iterations: settings.max_iterations,
            template: None,
        }
    }

    pub fn rtol(&self) -> T {
        self.rtol
    }

    pub fn atol(&self) -> T {
        self.atol
    }

    pub fn num_unknowns(&self) -> usize {
        self.num_fault_vertices * self.space_dim
    }

    pub fn is_setup(&self) -> bool {
        self.template.is_some()
    }

    /// Allocate the reduced operator. Does nothing if it is already allocated.
    ///
    /// Two fault vertices are coupled if they share a cell. Every diagonal entry is present.
    pub fn setup(&mut self, topology: &FaultTopology<T>) -> Result<(), FaultError> {
        if self.template.is_some() {
            return Ok(());
        }
        assert_eq!(topology.num_vertices(), self.num_fault_vertices);
        let dim = self.space_dim;
        let n = self.num_fault_vertices;

        let mut neighbors = vec![Vec::new(); n];
        for cell in topology.cells() {
            for &u in &cell.vertices {
                neighbors[u].extend(cell.vertices.iter().copied());
            }
        }

        let mut offsets = Vec::with_capacity(n * dim + 1);
        let mut column_indices = Vec::new();
        offsets.push(0);
        for (u, vertex_neighbors) in neighbors.into_iter().enumerate() {
            let vertex_neighbors = vertex_neighbors
                .into_iter()
                .chain(std::iter::once(u))
                .sorted_unstable()
                .dedup()
                .collect_vec();
            for _ in 0..dim {
                for &w in &vertex_neighbors {
                    column_indices.extend(w * dim..(w + 1) * dim);
                }
                offsets.push(column_indices.len());
            }
        }

        let nnz = column_indices.len();
        let pattern = SparsityPattern::try_from_offsets_and_indices(n * dim, n * dim, offsets, column_indices)
            .map_err(|err| FaultError::configuration(format!("Invalid fault sparsity pattern: {}", err)))?;
        let template = CsrMatrix::try_from_pattern_and_values(pattern, vec![T::zero(); nnz])
            .map_err(|err| FaultError::configuration(format!("Invalid fault operator: {}", err)))?;
        debug!(
            "Allocated sensitivity operator with {} unknowns and {} nonzeros.",
            n * dim,
            nnz
        );
        self.template = Some(template);
        Ok(())
    }

    /// Assemble the reduced operator for one side of the fault from the bulk Jacobian.
    ///
    /// For each cohesive cell, the dense block of the Jacobian coupling the cell's vertices on
    /// the given side is inserted into the reduced operator. Degrees of freedom of vertices
    /// owned by another process are replaced by identity rows and columns. Rows of fault vertices
    /// not touched by any block are identity rows.
    pub fn update_operator(
        &self,
        side: FaultSide,
        jacobian: &CsrMatrix<T>,
        topology: &FaultTopology<T>,
        ownership: &dyn VertexOwnership,
    ) -> Result<CsrMatrix<T>, FaultError> {
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| FaultError::configuration("Sensitivity problem has not been set up."))?;
        let num_bulk_dofs = topology.num_bulk_dofs();
        if jacobian.nrows() != num_bulk_dofs || jacobian.ncols() != num_bulk_dofs {
            return Err(FaultError::configuration(format!(
                "Jacobian has dimensions {}x{}, expected {}x{}.",
                jacobian.nrows(),
                jacobian.ncols(),
                num_bulk_dofs,
                num_bulk_dofs
            )));
        }

        let dim = self.space_dim;
        let dof_map = topology.dof_map();
        let mut operator = template.clone();
        reset_to_scaled_identity(&mut operator, T::one());

        let mut bulk_indices = Vec::new();
        let mut reduced_indices = Vec::new();
        for cell in topology.cells() {
            bulk_indices.clear();
            reduced_indices.clear();
            for &u in &cell.vertices {
                let mesh_vertex = topology.vertices()[u].side_vertex(side);
                let is_local = ownership.is_local(mesh_vertex);
                for (d, dof) in dof_map.vertex_dofs(mesh_vertex).enumerate() {
                    bulk_indices.push(is_local.then_some(dof));
                    reduced_indices.push(u * dim + d);
                }
            }
            let block = extract_dense_block(jacobian, &bulk_indices);
            insert_dense_block(&mut operator, &reduced_indices, &block);
        }
        Ok(operator)
    }

    /// Compute the right-hand side for one side of the fault.
    ///
    /// `d_lagrange` holds the change in Lagrange multipliers (global coordinates) per fault vertex.
    pub fn reform_residual(
        &self,
        side: FaultSide,
        d_lagrange: &VertexField<T>,
        topology: &FaultTopology<T>,
        cell_geometry: &[FaultCellGeometry<T>],
    ) -> DVector<T> {
        let dim = self.space_dim;
        let sign = residual_sign::<T>(side);
        let mut rhs = DVector::zeros(self.num_unknowns());
        for (cell, geometry) in topology.cells().iter().zip(cell_geometry) {
            let m = &geometry.basis_products;
            for (i, &u_i) in cell.vertices.iter().enumerate() {
                for (j, &u_j) in cell.vertices.iter().enumerate() {
                    let d_lagrange_j = d_lagrange.get(u_j, dim);
                    for d in 0..dim {
                        rhs[u_i * dim + d] += sign * m[(i, j)] * d_lagrange_j[d];
                    }
                }
            }
        }
        rhs
    }

    /// Solve the reduced system with preconditioned Conjugate Gradient, starting from zero.
    pub fn solve(
        &self,
        side: FaultSide,
        operator: CsrMatrix<T>,
        rhs: DVector<T>,
    ) -> Result<SensitivityState<T>, FaultError> {
        let mut solution = DVector::zeros(rhs.len());
        let output = ConjugateGradient::new()
            .with_operator(&operator)
            .with_preconditioner(JacobiPreconditioner::from_csr(&operator))
            .with_stopping_criterion(ResidualToleranceCriterion::new(self.rtol, self.atol))
            .with_max_iter(self.max_iterations)
            .solve_with_guess(&rhs, &mut solution)
            .map_err(|err| FaultError::NumericalNonConvergence {
                side,
                source: Box::new(err),
            })?;
        debug!(
            "Sensitivity solve on {} side converged in {} iterations.",
            side, output.num_iterations
        );
        Ok(SensitivityState {
            side,
            operator,
            rhs,
            solution,
            num_iterations: output.num_iterations,
        })
    }

    /// Assemble, solve and return the sensitivity state for one side of the fault.
    pub fn run(
        &self,
        side: FaultSide,
        jacobian: &CsrMatrix<T>,
        d_lagrange: &VertexField<T>,
        topology: &FaultTopology<T>,
        cell_geometry: &[FaultCellGeometry<T>],
        ownership: &dyn VertexOwnership,
    ) -> Result<SensitivityState<T>, FaultError> {
        let operator = self.update_operator(side, jacobian, topology, ownership)?;
        let rhs = self.reform_residual(side, d_lagrange, topology, cell_geometry);
        self.solve(side, operator, rhs)
    }

    /// Add the solution of a side to the relative displacement correction, with sign -1 for
    /// the negative and +1 for the positive side.
    pub fn commit(&self, state: &SensitivityState<T>, relative_disp: &mut VertexField<T>) {
        assert_eq!(relative_disp.values().len(), state.solution.len());
        let sign = commit_sign::<T>(state.side);
        relative_disp
            .values_mut()
            .axpy(sign, &state.solution, T::one());
    }
}
