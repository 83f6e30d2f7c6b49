//! The cohesive fault: initialization and the per-step operations enforcing the fault constraints.
//!
//! Solution fields (`disp(t)`, `dispIncr(t->t+dt)`, `velocity(t)`, `residual`, `dispIncr adjust`)
//! are indexed by mesh vertex and owned by the caller. Fault fields (`area`, `relative disp`, ...)
//! are indexed by fault vertex and owned by the fault. Both hold vectors of width `space_dim`,
//! except for `area` which has width one.
use crate::config::FaultConfig;
use crate::error::FaultError;
use crate::fault_cell::{compute_cell_geometry, FaultCellGeometry, FaultCellShape};
use crate::field::{check_size, names, FieldStore, VertexField};
use crate::initial_traction::query_initial_tractions;
use crate::orientation::{compute_orientations, OrientationFrame};
use crate::projector::{
    projector_for_dimension, sign_consistency_correction, zero_small_components, ConstraintProjector, FaultState,
    ProjectionOutcome,
};
use crate::relative_motion::{jump, total_displacement, RelativeMotionTracker};
use crate::sensitivity::SensitivityProblem;
use crate::topology::{FaultSide, FaultTopology, FaultVertex};
use log::{debug, info, trace, warn};
use nalgebra::{DVector, Vector3};
use nalgebra_sparse::CsrMatrix;
use numeric_literals::replace_float_literals;
use rayon::prelude::*;
use rupture_traits::{AllLocal, FrictionModel, Real, SpatialDatabase, VertexOwnership};

/// Counts of what happened to the fault vertices during one constraint pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSummary {
    pub num_locked: usize,
    pub num_sliding: usize,
    pub num_open: usize,
    /// Vertices whose normal slip or traction was modified to restore sign consistency.
    pub num_sign_corrections: usize,
    /// Iterations of the sensitivity solves, for the negative and positive side.
    pub sensitivity_iterations: [usize; 2],
}

impl ConstraintSummary {
    fn record(&mut self, outcome: ProjectionOutcome) {
        match outcome {
            ProjectionOutcome::Locked => self.num_locked += 1,
            ProjectionOutcome::Sliding | ProjectionOutcome::DegenerateSliding => self.num_sliding += 1,
            ProjectionOutcome::Open => self.num_open += 1,
        }
    }
}

/// Collects everything needed to initialize a [`CohesiveFault`].
pub struct CohesiveFaultBuilder<T: Real, F> {
    config: FaultConfig,
    topology: FaultTopology<T>,
    friction: F,
    ownership: Box<dyn VertexOwnership + Send + Sync>,
    traction_database: Option<Box<dyn SpatialDatabase<T> + Send + Sync>>,
}

impl<T: Real, F: FrictionModel<T>> CohesiveFaultBuilder<T, F> {
    /// Decide which mesh vertices belong to this process. Defaults to all vertices.
    pub fn with_ownership(self, ownership: impl VertexOwnership + Send + Sync + 'static) -> Self {
        Self {
            ownership: Box::new(ownership),
            ..self
        }
    }

    /// Database providing initial tractions, used when `use_initial_tractions` is enabled.
    pub fn with_traction_database(self, database: impl SpatialDatabase<T> + Send + Sync + 'static) -> Self {
        Self {
            traction_database: Some(Box::new(database)),
            ..self
        }
    }

    /// Compute the fault geometry, orientations, vertex areas and initial tractions.
    pub fn initialize(self) -> Result<CohesiveFault<T, F>, FaultError> {
        let Self {
            config,
            topology,
            friction,
            ownership,
            traction_database,
        } = self;
        config.validate()?;

        let dim = topology.space_dim();
        if config.space_dim != dim {
            return Err(FaultError::configuration(format!(
                "Fault '{}' is configured for {} dimensions, but its topology has dimension {}.",
                config.label, config.space_dim, dim
            )));
        }
        let num_vertices = topology.num_vertices();
        if friction.num_vertices() != num_vertices {
            return Err(FaultError::configuration(format!(
                "Friction model of fault '{}' has {} vertices, but the fault has {}.",
                config.label,
                friction.num_vertices(),
                num_vertices
            )));
        }

        let zero_tolerance: T = nalgebra::convert(config.zero_tolerance);
        let projector = projector_for_dimension(dim, zero_tolerance, config.allow_opening)?;

        let coordinates = topology.coordinates();
        let cell_geometry = topology
            .cells()
            .iter()
            .map(|cell| {
                let shape = FaultCellShape::from_num_vertices(dim, cell.vertices.len())?;
                let vertex_coords: Vec<DVector<T>> = cell
                    .vertices
                    .iter()
                    .map(|&v| coordinates.get(v, dim).clone_owned())
                    .collect();
                compute_cell_geometry(shape, &vertex_coords)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let up_dir = Vector3::from(config.up_dir).map(nalgebra::convert::<f64, T>);
        let orientations = compute_orientations(&topology, &cell_geometry, &up_dir)?;

        let mut fields = FieldStore::new();
        let area = fields.add(names::AREA, num_vertices, 1);
        for (cell, geometry) in topology.cells().iter().zip(&cell_geometry) {
            let vertex_areas = geometry.vertex_areas();
            for (&v, &a) in cell.vertices.iter().zip(vertex_areas.iter()) {
                area.vertex_mut(v)[0] += a;
            }
        }
        fields.add(names::RELATIVE_DISP, num_vertices, dim);
        fields.add(names::RELATIVE_VELOCITY, num_vertices, dim);
        fields.add(names::SENSITIVITY_RELATIVE_DISP, num_vertices, dim);
        fields.add(names::SENSITIVITY_DLAGRANGE, num_vertices, dim);

        if config.use_initial_tractions {
            let database = traction_database.as_deref().ok_or_else(|| {
                FaultError::configuration(format!(
                    "Fault '{}' requests initial tractions, but no spatial database was given.",
                    config.label
                ))
            })?;
            fields.insert(query_initial_tractions(database, &topology, &orientations)?);
        } else if let Some(database) = &traction_database {
            warn!(
                "Spatial database '{}' for fault '{}' is ignored, since initial tractions are disabled.",
                database.label(),
                config.label
            );
        }

        let sensitivity = SensitivityProblem::new(dim, num_vertices, zero_tolerance, &config.sensitivity);
        info!(
            "Initialized fault '{}' with {} vertices and {} cells in {} dimensions.",
            config.label,
            num_vertices,
            topology.cells().len(),
            dim
        );

        Ok(CohesiveFault {
            config,
            zero_tolerance,
            topology,
            friction,
            ownership,
            projector,
            cell_geometry,
            orientations,
            sensitivity,
            tracker: RelativeMotionTracker::new(zero_tolerance),
            fields,
            dt: T::zero(),
        })
    }
}

/// A fault with frictional contact, enforced with Lagrange multipliers.
pub struct CohesiveFault<T: Real, F> {
    config: FaultConfig,
    zero_tolerance: T,
    topology: FaultTopology<T>,
    friction: F,
    ownership: Box<dyn VertexOwnership + Send + Sync>,
    projector: Box<dyn ConstraintProjector<T>>,
    cell_geometry: Vec<FaultCellGeometry<T>>,
    orientations: Vec<OrientationFrame<T>>,
    sensitivity: SensitivityProblem<T>,
    tracker: RelativeMotionTracker<T>,
    fields: FieldStore<T>,
    dt: T,
}

/// Read access to the displacement fields of the solution.
struct Displacements<'a, T: Real> {
    disp: &'a VertexField<T>,
    disp_incr: &'a VertexField<T>,
}

impl<'a, T: Real> Displacements<'a, T> {
    fn new(solution: &'a FieldStore<T>, topology: &FaultTopology<T>) -> Result<Self, FaultError> {
        let disp = solution_field(solution, names::DISP, topology)?;
        let disp_incr = solution_field(solution, names::DISP_INCR, topology)?;
        Ok(Self { disp, disp_incr })
    }

    fn total(&self, mesh_vertex: usize) -> DVector<T> {
        total_displacement(self.disp, self.disp_incr, mesh_vertex)
    }

    /// Relative displacement at the end of the time step, in global coordinates.
    fn slip(&self, vertex: &FaultVertex) -> DVector<T> {
        self.total(vertex.positive) - self.total(vertex.negative)
    }

    /// Lagrange multiplier at the end of the time step, in global coordinates.
    fn lagrange(&self, vertex: &FaultVertex) -> DVector<T> {
        self.total(vertex.lagrange)
    }
}

/// A solution field, checked to cover every mesh vertex of the topology.
fn solution_field<'a, T: Real>(
    solution: &'a FieldStore<T>,
    name: &str,
    topology: &FaultTopology<T>,
) -> Result<&'a VertexField<T>, FaultError> {
    solution.get_sized(name, topology.num_mesh_vertices(), topology.space_dim())
}

/// Unit vector along the normal axis of the fault coordinates, scaled by `value`.
fn normal_component<T: Real>(dim: usize, value: T) -> DVector<T> {
    let mut v = DVector::zeros(dim);
    v[dim - 1] = value;
    v
}

/// Corrections of the trial state computed in the first phase of a constraint pass.
struct TrialCorrection<T: Real> {
    vertex: FaultVertex,
    /// Change in Lagrange multiplier, global coordinates.
    d_lagrange: DVector<T>,
    /// Change in relative displacement from the sign consistency correction, global coordinates.
    d_slip: Option<DVector<T>>,
    outcome: ProjectionOutcome,
    sign_corrected: bool,
}

/// Final corrections of a constraint pass, after the sensitivity solve.
struct CommittedCorrection<T: Real> {
    vertex: FaultVertex,
    relative_disp: DVector<T>,
    d_lagrange: DVector<T>,
    d_slip: DVector<T>,
    sign_corrected: bool,
}

/// Output of the lumped adjustment at one vertex.
struct LumpedCorrection<T: Real> {
    vertex: FaultVertex,
    lagrange_incr: DVector<T>,
    d_negative: DVector<T>,
    d_positive: DVector<T>,
    d_relative_disp: DVector<T>,
    outcome: ProjectionOutcome,
}

impl<T: Real, F> CohesiveFault<T, F> {
    pub fn builder(config: FaultConfig, topology: FaultTopology<T>, friction: F) -> CohesiveFaultBuilder<T, F> {
        CohesiveFaultBuilder {
            config,
            topology,
            friction,
            ownership: Box::new(AllLocal),
            traction_database: None,
        }
    }

    pub fn config(&self) -> &FaultConfig {
        &self.config
    }

    pub fn zero_tolerance(&self) -> T {
        self.zero_tolerance
    }

    pub fn topology(&self) -> &FaultTopology<T> {
        &self.topology
    }

    pub fn friction(&self) -> &F {
        &self.friction
    }

    pub fn friction_mut(&mut self) -> &mut F {
        &mut self.friction
    }

    pub fn orientations(&self) -> &[OrientationFrame<T>] {
        &self.orientations
    }

    pub fn cell_geometry(&self) -> &[FaultCellGeometry<T>] {
        &self.cell_geometry
    }

    pub fn sensitivity(&self) -> &SensitivityProblem<T> {
        &self.sensitivity
    }

    /// Fields owned by the fault, indexed by fault vertex.
    pub fn fields(&self) -> &FieldStore<T> {
        &self.fields
    }

    pub fn time_step(&self) -> T {
        self.dt
    }

    fn space_dim(&self) -> usize {
        self.topology.space_dim()
    }
}

impl<T, F> CohesiveFault<T, F>
where
    T: Real,
    F: FrictionModel<T> + Send + Sync,
{
    /// Set the time step size, used for slip rates and forwarded to the friction model.
    pub fn set_time_step(&mut self, dt: T) -> Result<(), FaultError> {
        if !(dt > T::zero()) {
            return Err(FaultError::configuration(format!(
                "Time step for fault '{}' must be positive, got {}.",
                self.config.label, dt
            )));
        }
        self.dt = dt;
        self.friction.set_time_step(dt);
        Ok(())
    }

    /// Add the contribution of the fault tractions to the residual.
    ///
    /// At every closed vertex with a local Lagrange multiplier, the negative side receives
    /// `area * (λ - λ_initial)` and the positive side the negation. The relative motion fields
    /// are recomputed from the solution first.
    pub fn integrate_residual(&mut self, solution: &mut FieldStore<T>) -> Result<(), FaultError> {
        self.tracker.update(&self.topology, solution, &mut self.fields)?;

        let dim = self.space_dim();
        let n = dim - 1;
        let zero_tolerance = self.zero_tolerance;
        let allow_opening = self.config.allow_opening;
        let displacements = Displacements::new(solution, &self.topology)?;
        let relative_disp = self.fields.get(names::RELATIVE_DISP)?;
        let area = self.fields.get(names::AREA)?;
        let initial_traction = self.initial_tractions();
        let ownership = &*self.ownership;

        let contributions: Vec<(FaultVertex, DVector<T>)> = self
            .topology
            .vertices()
            .par_iter()
            .filter(|vertex| ownership.is_local(vertex.lagrange))
            .filter_map(|vertex| {
                let v = vertex.fault;
                let frame = &self.orientations[v];
                let slip = frame.to_fault(&relative_disp.get(v, dim).clone_owned());
                if allow_opening && slip[n] >= zero_tolerance {
                    return None;
                }
                let mut traction = displacements.lagrange(vertex);
                if let Some(initial) = initial_traction {
                    traction -= initial.get(v, dim);
                }
                Some((*vertex, traction * area.get(v, 1)[0]))
            })
            .collect();

        let residual = solution.get_sized_mut(names::RESIDUAL, self.topology.num_mesh_vertices(), dim)?;
        for (vertex, r) in &contributions {
            residual.add(vertex.negative, r);
            residual.add(vertex.positive, &-r);
        }
        trace!(
            "Fault '{}' added residual contributions at {} vertices.",
            self.config.label,
            contributions.len()
        );
        Ok(())
    }

    /// Advance the friction state variables to the current solution.
    pub fn update_state_vars(&mut self, time: T, solution: &FieldStore<T>) -> Result<(), FaultError> {
        self.tracker.update(&self.topology, solution, &mut self.fields)?;

        let dim = self.space_dim();
        let displacements = Displacements::new(solution, &self.topology)?;
        let relative_disp = self.fields.get(names::RELATIVE_DISP)?;
        let relative_velocity = self.fields.get(names::RELATIVE_VELOCITY)?;

        // (slip magnitude, slip rate magnitude, normal traction) per vertex
        let inputs: Vec<(T, T, T)> = self
            .topology
            .vertices()
            .par_iter()
            .map(|vertex| {
                let v = vertex.fault;
                let frame = &self.orientations[v];
                let slip = frame.to_fault(&relative_disp.get(v, dim).clone_owned());
                let slip_rate = frame.to_fault(&relative_velocity.get(v, dim).clone_owned());
                let traction = frame.to_fault(&displacements.lagrange(vertex));
                (
                    slip.rows(0, dim - 1).norm(),
                    slip_rate.rows(0, dim - 1).norm(),
                    traction[dim - 1],
                )
            })
            .collect();

        for (v, (slip, slip_rate, normal_traction)) in inputs.into_iter().enumerate() {
            self.friction
                .update_state(v, time, slip, slip_rate, normal_traction);
        }
        Ok(())
    }

    /// Constrain the trial solution to the contact and friction law, using the fully assembled
    /// Jacobian to couple the change in tractions back into the displacements.
    ///
    /// The pass sanitizes and projects the trial state of every vertex, solves the sensitivity
    /// problem on both sides of the fault and commits the corrected slip and tractions into
    /// `dispIncr(t->t+dt)` and the `relative disp` fault field.
    #[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
    pub fn constrain_soln_space(
        &mut self,
        time: T,
        jacobian: &CsrMatrix<T>,
        solution: &mut FieldStore<T>,
    ) -> Result<ConstraintSummary, FaultError> {
        if !(self.dt > 0.0) {
            return Err(FaultError::configuration(format!(
                "Time step for fault '{}' must be set before constraining the solution.",
                self.config.label
            )));
        }
        self.sensitivity.setup(&self.topology)?;

        let dim = self.space_dim();
        let n = dim - 1;
        let zero_tolerance = self.zero_tolerance;
        let mut summary = ConstraintSummary::default();

        // Sanitize and project the trial state
        let trial_corrections = {
            let displacements = Displacements::new(solution, &self.topology)?;
            let dt = self.dt;
            let friction = &self.friction;
            let projector = &*self.projector;
            self.topology
                .vertices()
                .par_iter()
                .map(|vertex| {
                    let v = vertex.fault;
                    let frame = &self.orientations[v];
                    let mut slip = frame.to_fault(&displacements.slip(vertex));
                    let increment = jump(displacements.disp_incr, vertex);
                    let mut slip_rate = frame.to_fault(&increment) / dt;
                    let mut traction = frame.to_fault(&displacements.lagrange(vertex));

                    zero_small_components(&mut slip_rate, zero_tolerance);
                    if slip[n].abs() < zero_tolerance {
                        slip[n] = 0.0;
                    }

                    let (d_slip_normal, d_traction_normal) = sign_consistency_correction(slip[n], traction[n]);
                    slip[n] += d_slip_normal;
                    traction[n] += d_traction_normal;

                    let state = FaultState {
                        slip,
                        slip_rate,
                        traction,
                    };
                    let bound = |slip, slip_rate, normal| friction.friction_bound(v, time, slip, slip_rate, normal);
                    let projection = projector.project(&state, &bound, true);
                    let mut d_traction = projection.traction_change;
                    d_traction[n] += d_traction_normal;

                    let sign_corrected = d_slip_normal != 0.0 || d_traction_normal != 0.0;
                    let d_slip = (d_slip_normal != 0.0)
                        .then(|| frame.to_global(&normal_component(dim, d_slip_normal)));
                    trace!(
                        "Fault vertex {}: {:?}, traction change {:?}.",
                        v,
                        projection.outcome,
                        d_traction.as_slice()
                    );
                    TrialCorrection {
                        vertex: *vertex,
                        d_lagrange: frame.to_global(&d_traction),
                        d_slip,
                        outcome: projection.outcome,
                        sign_corrected,
                    }
                })
                .collect::<Vec<_>>()
        };

        {
            let d_lagrange = self.fields.get_mut(names::SENSITIVITY_DLAGRANGE)?;
            for correction in &trial_corrections {
                d_lagrange.set(correction.vertex.fault, &correction.d_lagrange);
            }
            let disp_incr = solution.get_mut(names::DISP_INCR)?;
            for correction in &trial_corrections {
                summary.record(correction.outcome);
                if correction.sign_corrected {
                    summary.num_sign_corrections += 1;
                }
                if let Some(d_slip) = &correction.d_slip {
                    disp_incr.add(correction.vertex.negative, &(d_slip * -0.5));
                    disp_incr.add(correction.vertex.positive, &(d_slip * 0.5));
                }
            }
        }

        // Displacement response of both sides to the change in Lagrange multipliers
        let (negative, positive) = {
            let d_lagrange = self.fields.get(names::SENSITIVITY_DLAGRANGE)?;
            let sensitivity = &self.sensitivity;
            let topology = &self.topology;
            let cell_geometry = &self.cell_geometry;
            let ownership: &(dyn VertexOwnership + Send + Sync) = &*self.ownership;
            let run = |side| sensitivity.run(side, jacobian, d_lagrange, topology, cell_geometry, ownership);
            let (negative, positive) = rayon::join(|| run(FaultSide::Negative), || run(FaultSide::Positive));
            (negative?, positive?)
        };
        summary.sensitivity_iterations = [negative.num_iterations, positive.num_iterations];
        {
            let sensitivity_disp = self.fields.get_mut(names::SENSITIVITY_RELATIVE_DISP)?;
            sensitivity_disp.fill_zero();
            self.sensitivity.commit(&negative, sensitivity_disp);
            self.sensitivity.commit(&positive, sensitivity_disp);
        }

        // Combine the corrections and restore sign consistency
        let committed = {
            let displacements = Displacements::new(solution, &self.topology)?;
            let sensitivity_disp = self.fields.get(names::SENSITIVITY_RELATIVE_DISP)?;
            let d_lagrange = self.fields.get(names::SENSITIVITY_DLAGRANGE)?;
            self.topology
                .vertices()
                .par_iter()
                .map(|vertex| {
                    let v = vertex.fault;
                    let frame = &self.orientations[v];
                    let mut d_slip = frame.to_fault(&sensitivity_disp.get(v, dim).clone_owned());
                    let mut slip = frame.to_fault(&displacements.slip(vertex));
                    let traction = frame.to_fault(&displacements.lagrange(vertex));
                    let mut d_traction = frame.to_fault(&d_lagrange.get(v, dim).clone_owned());

                    if slip[n].abs() < zero_tolerance {
                        slip[n] = 0.0;
                    }
                    if d_slip[n].abs() < zero_tolerance {
                        d_slip[n] = 0.0;
                    }

                    let mut sign_corrected = false;
                    let slip_normal = slip[n] + d_slip[n];
                    let traction_normal = traction[n] + d_traction[n];
                    if slip_normal * traction_normal < 0.0 {
                        if slip_normal.abs() > traction_normal.abs() {
                            d_traction[n] = -traction[n];
                        } else {
                            d_slip[n] = -slip[n];
                        }
                        sign_corrected = true;
                    }
                    if slip[n] + d_slip[n] < 0.0 {
                        d_slip[n] = -slip[n];
                        sign_corrected = true;
                    }

                    CommittedCorrection {
                        vertex: *vertex,
                        relative_disp: frame.to_global(&(&slip + &d_slip)),
                        d_lagrange: frame.to_global(&d_traction),
                        d_slip: frame.to_global(&d_slip),
                        sign_corrected,
                    }
                })
                .collect::<Vec<_>>()
        };

        {
            let relative_disp = self.fields.get_mut(names::RELATIVE_DISP)?;
            for correction in &committed {
                relative_disp.set(correction.vertex.fault, &correction.relative_disp);
            }
            let disp_incr = solution.get_mut(names::DISP_INCR)?;
            for correction in &committed {
                let vertex = &correction.vertex;
                if correction.sign_corrected {
                    summary.num_sign_corrections += 1;
                }
                if self.ownership.is_local(vertex.lagrange) {
                    disp_incr.add(vertex.lagrange, &correction.d_lagrange);
                }
                disp_incr.add(vertex.negative, &(&correction.d_slip * -0.5));
                disp_incr.add(vertex.positive, &(&correction.d_slip * 0.5));
            }
        }

        debug!(
            "Fault '{}' constraint pass: {} locked, {} sliding, {} open, {} sign corrections, \
             sensitivity iterations {:?}.",
            self.config.label,
            summary.num_locked,
            summary.num_sliding,
            summary.num_open,
            summary.num_sign_corrections,
            summary.sensitivity_iterations
        );
        Ok(summary)
    }

    /// Adjust the solution increment for a lumped (diagonal) Jacobian.
    ///
    /// `jacobian` holds the diagonal of the Jacobian per mesh vertex. The Lagrange multiplier
    /// increment is recomputed from the residual, projected onto the friction law and the
    /// resulting displacement adjustments are added to `dispIncr adjust`.
    ///
    /// The projected traction change `dλ` updates the relative displacement by
    /// `-(1/J_N + 1/J_P) * dλ * area` per component, the jump in the side adjustments caused by
    /// `dλ`. This differs from the `-2 * area * dλ / (J_N + J_P)` form whenever `J_N != J_P`.
    #[allow(non_snake_case)]
    pub fn adjust_soln_lumped(
        &mut self,
        time: T,
        jacobian: &VertexField<T>,
        solution: &mut FieldStore<T>,
    ) -> Result<ConstraintSummary, FaultError> {
        let dim = self.space_dim();
        let num_mesh_vertices = self.topology.num_mesh_vertices();
        check_size(jacobian, num_mesh_vertices, dim)?;
        if solution.contains(names::DISP_INCR_ADJUST) {
            solution_field(solution, names::DISP_INCR_ADJUST, &self.topology)?;
        } else {
            solution.add(names::DISP_INCR_ADJUST, num_mesh_vertices, dim);
        }

        let corrections = {
            let displacements = Displacements::new(solution, &self.topology)?;
            let residual = solution_field(solution, names::RESIDUAL, &self.topology)?;
            let area = self.fields.get(names::AREA)?;
            let relative_disp = self.fields.get(names::RELATIVE_DISP)?;
            let relative_velocity = self.fields.get(names::RELATIVE_VELOCITY)?;
            let friction = &self.friction;
            let projector = &*self.projector;

            self.topology
                .vertices()
                .par_iter()
                .map(|vertex| {
                    let v = vertex.fault;
                    let frame = &self.orientations[v];
                    let area = area.get(v, 1)[0];
                    let J_N = jacobian.get(vertex.negative, dim);
                    let J_P = jacobian.get(vertex.positive, dim);
                    if J_N.iter().chain(J_P.iter()).any(|&j| !(j > T::zero())) {
                        return Err(FaultError::configuration(format!(
                            "Lumped Jacobian must be positive at fault vertex {}.",
                            v
                        )));
                    }
                    let J_N_inv = J_N.map(|j| j.recip());
                    let J_P_inv = J_P.map(|j| j.recip());

                    let residual_L = residual.get(vertex.lagrange, dim);
                    let du_N = displacements.disp_incr.get(vertex.negative, dim);
                    let du_P = displacements.disp_incr.get(vertex.positive, dim);

                    let mut lagrange_incr = DVector::zeros(dim);
                    for d in 0..dim {
                        let s = area * area * (J_N_inv[d] + J_P_inv[d]);
                        lagrange_incr[d] = (-residual_L[d] + area * (du_P[d] - du_N[d])) / s;
                    }
                    let mut d_negative = J_N_inv.component_mul(&lagrange_incr) * area;
                    let mut d_positive = -J_P_inv.component_mul(&lagrange_incr) * area;

                    let state = FaultState {
                        slip: frame.to_fault(&relative_disp.get(v, dim).clone_owned()),
                        slip_rate: frame.to_fault(&relative_velocity.get(v, dim).clone_owned()),
                        traction: frame.to_fault(&(displacements.disp.get(vertex.lagrange, dim) + &lagrange_incr)),
                    };
                    let bound = |slip, slip_rate, normal| friction.friction_bound(v, time, slip, slip_rate, normal);
                    let projection = projector.project(&state, &bound, false);
                    let d_lagrange = frame.to_global(&projection.traction_change);

                    d_negative += J_N_inv.component_mul(&d_lagrange) * area;
                    d_positive -= J_P_inv.component_mul(&d_lagrange) * area;
                    let d_relative_disp = -(&J_N_inv + &J_P_inv).component_mul(&d_lagrange) * area;
                    lagrange_incr += &d_lagrange;

                    Ok(LumpedCorrection {
                        vertex: *vertex,
                        lagrange_incr,
                        d_negative,
                        d_positive,
                        d_relative_disp,
                        outcome: projection.outcome,
                    })
                })
                .collect::<Result<Vec<_>, FaultError>>()?
        };

        let mut summary = ConstraintSummary::default();
        {
            let adjust = solution.get_mut(names::DISP_INCR_ADJUST)?;
            for correction in &corrections {
                summary.record(correction.outcome);
                let vertex = &correction.vertex;
                if self.ownership.is_local(vertex.lagrange) {
                    adjust.add(vertex.negative, &correction.d_negative);
                    adjust.add(vertex.positive, &correction.d_positive);
                }
            }
        }
        {
            let disp_incr = solution.get_mut(names::DISP_INCR)?;
            for correction in &corrections {
                let vertex = &correction.vertex;
                if self.ownership.is_local(vertex.lagrange) {
                    disp_incr.set(vertex.lagrange, &correction.lagrange_incr);
                }
            }
        }
        {
            let relative_disp = self.fields.get_mut(names::RELATIVE_DISP)?;
            for correction in &corrections {
                relative_disp.add(correction.vertex.fault, &correction.d_relative_disp);
            }
        }

        debug!(
            "Fault '{}' lumped adjustment: {} locked, {} sliding, {} open.",
            self.config.label, summary.num_locked, summary.num_sliding, summary.num_open
        );
        Ok(summary)
    }

    /// Tractions in fault coordinates at the end of the time step.
    ///
    /// Uses `disp(t)` plus `dispIncr(t->t+dt)` at the Lagrange vertices, or only `disp(t)` if
    /// the solution has no increment field.
    pub fn calc_tractions(&self, solution: &FieldStore<T>) -> Result<VertexField<T>, FaultError> {
        let dim = self.space_dim();
        let disp = solution_field(solution, names::DISP, &self.topology)?;
        let disp_incr = if solution.contains(names::DISP_INCR) {
            Some(solution_field(solution, names::DISP_INCR, &self.topology)?)
        } else {
            None
        };
        let tractions: Vec<DVector<T>> = self
            .topology
            .vertices()
            .iter()
            .map(|vertex| {
                let mut lagrange = disp.get(vertex.lagrange, dim).clone_owned();
                if let Some(disp_incr) = disp_incr {
                    lagrange += disp_incr.get(vertex.lagrange, dim);
                }
                self.orientations[vertex.fault].to_fault(&lagrange)
            })
            .collect();
        Ok(VertexField::from_vertex_values("traction", dim, &tractions))
    }

    /// Output field of the fault by name, in fault coordinates where applicable.
    ///
    /// Available fields are `slip`, `slip_rate`, `traction` (requires the solution),
    /// `initial_traction` (if enabled), `area`, `strike_dir`, `dip_dir` (3D only), `normal_dir`
    /// and the state variables of the friction model.
    pub fn vertex_field(&self, name: &str, solution: Option<&FieldStore<T>>) -> Result<VertexField<T>, FaultError> {
        let dim = self.space_dim();
        let rotated = |field: &VertexField<T>| -> VertexField<T> {
            let values: Vec<DVector<T>> = self
                .orientations
                .iter()
                .enumerate()
                .map(|(v, frame)| frame.to_fault(&field.get(v, dim).clone_owned()))
                .collect();
            VertexField::from_vertex_values(name, dim, &values)
        };
        let directions = |direction: &dyn Fn(&OrientationFrame<T>) -> Option<DVector<T>>| {
            let values: Option<Vec<DVector<T>>> = self.orientations.iter().map(direction).collect();
            values.map(|values| VertexField::from_vertex_values(name, dim, &values))
        };
        let unknown = || {
            FaultError::configuration(format!(
                "Unknown vertex field '{}' for fault '{}'.",
                name, self.config.label
            ))
        };

        match name {
            "slip" => Ok(rotated(self.fields.get(names::RELATIVE_DISP)?)),
            "slip_rate" => Ok(rotated(self.fields.get(names::RELATIVE_VELOCITY)?)),
            "traction" => {
                let solution = solution.ok_or_else(|| {
                    FaultError::configuration("Computing tractions requires the solution fields.")
                })?;
                self.calc_tractions(solution)
            }
            "initial_traction" => self
                .initial_tractions()
                .map(rotated)
                .ok_or_else(|| {
                    FaultError::configuration(format!(
                        "Fault '{}' has no initial tractions.",
                        self.config.label
                    ))
                }),
            "area" => {
                let area = self.fields.get(names::AREA)?;
                Ok(VertexField::from_values(name, 1, area.values().clone()))
            }
            "strike_dir" => directions(&|frame: &OrientationFrame<T>| frame.strike_dir()).ok_or_else(unknown),
            "dip_dir" => directions(&|frame: &OrientationFrame<T>| frame.dip_dir()).ok_or_else(unknown),
            "normal_dir" => directions(&|frame: &OrientationFrame<T>| Some(frame.normal_dir())).ok_or_else(unknown),
            _ => match self.friction.state_variable(name) {
                Some(values) => Ok(VertexField::from_values(name, 1, DVector::from_vec(values))),
                None => Err(unknown()),
            },
        }
    }

    fn initial_tractions(&self) -> Option<&VertexField<T>> {
        self.fields.get(names::INITIAL_TRACTION).ok()
    }
}
