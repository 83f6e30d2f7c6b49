//! Quasi-static loading of a vertical strike-slip fault with slip-weakening friction.
//!
//! The two sides of the fault are pulled in opposite directions along the fault, and the
//! stiffness of the surrounding medium is represented by springs between neighboring vertices.
use eyre::eyre;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rupture::field::names;
use rupture::friction::{SlipWeakeningFriction, SlipWeakeningParameters};
use rupture::initial_traction::UniformSpatialDatabase;
use rupture::{CohesiveCell, CohesiveFault, FaultConfig, FaultTopology, FaultVertex, FieldStore, VertexField};

const NUM_FAULT_VERTICES: usize = 11;
const STIFFNESS: f64 = 40.0;
const LOAD_INCREMENT: f64 = 0.02;

fn fault_topology() -> eyre::Result<FaultTopology<f64>> {
    let n = NUM_FAULT_VERTICES;
    let h = 1.0 / (n - 1) as f64;
    let vertices = (0..n)
        .map(|i| FaultVertex {
            lagrange: 2 * n + i,
            fault: i,
            negative: i,
            positive: n + i,
        })
        .collect();
    let cells = (0..n - 1).map(|i| CohesiveCell::new(vec![i, i + 1])).collect();
    let coordinates: Vec<f64> = (0..n).flat_map(|i| [0.0, i as f64 * h]).collect();
    let coordinates = VertexField::from_values("coordinates", 2, DVector::from_vec(coordinates));
    Ok(FaultTopology::new(2, 3 * n, vertices, cells, coordinates)?)
}

/// Springs along each side of the fault plus a spring to the (fixed) far field.
fn bulk_jacobian() -> CsrMatrix<f64> {
    let n = NUM_FAULT_VERTICES;
    let num_dofs = 3 * n * 2;
    let mut coo = CooMatrix::new(num_dofs, num_dofs);
    for side_offset in [0, n] {
        for i in 0..n {
            for d in 0..2 {
                let dof = 2 * (side_offset + i) + d;
                coo.push(dof, dof, 2.0 * STIFFNESS + 1.0);
                if i + 1 < n {
                    let neighbor = dof + 2;
                    coo.push(dof, neighbor, -STIFFNESS);
                    coo.push(neighbor, dof, -STIFFNESS);
                }
            }
        }
    }
    for dof in 4 * n..num_dofs {
        coo.push(dof, dof, 1.0);
    }
    CsrMatrix::from(&coo)
}

fn main() -> eyre::Result<()> {
    let n = NUM_FAULT_VERTICES;
    let config = FaultConfig {
        label: String::from("strike-slip"),
        space_dim: 2,
        use_initial_tractions: true,
        ..FaultConfig::default()
    };
    let friction = SlipWeakeningFriction::uniform(
        SlipWeakeningParameters {
            static_coefficient: 0.6,
            dynamic_coefficient: 0.4,
            weakening_slip: 0.05,
            cohesion: 0.0,
            force_healing: false,
        },
        n,
    );
    let database = UniformSpatialDatabase::new("initial tractions")
        .with_value("traction-shear", 0.0)
        .with_value("traction-normal", -1.0);

    let mut fault = CohesiveFault::builder(config, fault_topology()?, friction)
        .with_traction_database(database)
        .initialize()?;
    let dt = 1.0;
    fault.set_time_step(dt)?;

    let jacobian = bulk_jacobian();
    let mut solution = FieldStore::new();
    solution.add(names::DISP, 3 * n, 2);
    solution.add(names::DISP_INCR, 3 * n, 2);
    solution.add(names::RESIDUAL, 3 * n, 2);

    // Start from the initial tractions
    let initial = fault.vertex_field("initial_traction", None)?;
    let disp = solution.get_mut(names::DISP)?;
    for (vertex, frame) in fault.topology().vertices().iter().zip(fault.orientations()) {
        let traction = frame.to_global(&initial.vertex(vertex.fault).clone_owned());
        disp.set(vertex.lagrange, &traction);
    }

    for step in 1..=10 {
        let time = step as f64 * dt;

        // Trial increment: the sides move rigidly in opposite directions along the fault, while
        // the traction follows the elastic load
        let disp_incr = solution.get_mut(names::DISP_INCR)?;
        disp_incr.fill_zero();
        for vertex in fault.topology().vertices() {
            disp_incr.set(vertex.negative, &DVector::from_vec(vec![0.0, -0.5 * LOAD_INCREMENT]));
            disp_incr.set(vertex.positive, &DVector::from_vec(vec![0.0, 0.5 * LOAD_INCREMENT]));
            disp_incr.set(vertex.lagrange, &DVector::from_vec(vec![0.0, STIFFNESS * LOAD_INCREMENT]));
        }

        solution.get_mut(names::RESIDUAL)?.fill_zero();
        fault.integrate_residual(&mut solution)?;
        let summary = fault.constrain_soln_space(time, &jacobian, &mut solution)?;
        fault.update_state_vars(time, &solution)?;

        let slip = fault.vertex_field("slip", None)?;
        let traction = fault.vertex_field("traction", Some(&solution))?;
        let cumulative_slip = fault.vertex_field("cumulative_slip", None)?;
        let mid = n / 2;
        println!(
            "step {:2}: {} locked, {} sliding, slip {:.4}, shear traction {:.4}, cumulative slip {:.4}",
            step,
            summary.num_locked,
            summary.num_sliding,
            slip.vertex(mid)[0],
            traction.vertex(mid)[0],
            cumulative_slip.values()[mid]
        );

        // Accept the step
        let increment = solution.get(names::DISP_INCR)?.values().clone();
        *solution.get_mut(names::DISP)?.values_mut() += increment;
    }

    let slip = fault.vertex_field("slip", None)?;
    if slip.values().iter().any(|s| !s.is_finite()) {
        return Err(eyre!("Slip diverged"));
    }
    Ok(())
}
