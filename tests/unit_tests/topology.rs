use super::{segment_topology, vector};
use nalgebra::DVector;
use rupture::topology::DofMap;
use rupture::{CohesiveCell, FaultError, FaultSide, FaultTopology, FaultVertex, VertexField};

fn fault_vertex(fault: usize) -> FaultVertex {
    FaultVertex {
        lagrange: 4 + fault,
        fault,
        negative: fault,
        positive: 2 + fault,
    }
}

fn coordinates_2d() -> VertexField<f64> {
    VertexField::from_values("coordinates", 2, vector(&[0.0, 0.0, 0.0, 1.0]))
}

#[test]
fn vertices_are_sorted_by_fault_index() {
    let topology = FaultTopology::new(
        2,
        6,
        vec![fault_vertex(1), fault_vertex(0)],
        vec![CohesiveCell::new(vec![0, 1])],
        coordinates_2d(),
    )
    .unwrap();
    assert_eq!(topology.vertices(), &[fault_vertex(0), fault_vertex(1)]);
    assert_eq!(topology.num_vertices(), 2);
    assert_eq!(topology.num_mesh_vertices(), 6);
    assert_eq!(topology.num_bulk_dofs(), 12);
    assert_eq!(topology.vertex_cells(1), &[0]);
}

#[test]
fn side_vertex_and_dof_map() {
    let topology = segment_topology();
    let vertex = topology.vertices()[1];
    assert_eq!(vertex.side_vertex(FaultSide::Negative), 1);
    assert_eq!(vertex.side_vertex(FaultSide::Positive), 3);

    let dof_map = DofMap::new(2);
    assert_eq!(dof_map.vertex_dofs(3), 6..8);
    assert_eq!(FaultSide::BOTH.map(|side| side.to_string()), ["negative", "positive"]);
}

#[test]
fn repeated_fault_index_is_rejected() {
    let result = FaultTopology::new(
        2,
        6,
        vec![fault_vertex(0), fault_vertex(0)],
        vec![CohesiveCell::new(vec![0, 1])],
        coordinates_2d(),
    );
    assert!(matches!(result, Err(FaultError::Configuration { .. })));
}

#[test]
fn mesh_vertex_out_of_bounds_is_rejected() {
    let result = FaultTopology::new(
        2,
        5,
        vec![fault_vertex(0), fault_vertex(1)],
        vec![CohesiveCell::new(vec![0, 1])],
        coordinates_2d(),
    );
    assert!(matches!(result, Err(FaultError::Configuration { .. })));
}

#[test]
fn unsupported_cells_are_rejected() {
    let triangle_in_2d = FaultTopology::new(
        2,
        6,
        vec![fault_vertex(0), fault_vertex(1)],
        vec![CohesiveCell::new(vec![0, 1, 0])],
        coordinates_2d(),
    );
    assert!(matches!(triangle_in_2d, Err(FaultError::Configuration { .. })));

    let unknown_vertex = FaultTopology::new(
        2,
        6,
        vec![fault_vertex(0), fault_vertex(1)],
        vec![CohesiveCell::new(vec![0, 2])],
        coordinates_2d(),
    );
    assert!(matches!(unknown_vertex, Err(FaultError::Configuration { .. })));
}

#[test]
fn vertex_outside_cells_is_rejected() {
    let coordinates = VertexField::<f64>::from_values("coordinates", 2, DVector::zeros(6));
    let result = FaultTopology::new(
        2,
        9,
        vec![
            fault_vertex(0),
            fault_vertex(1),
            FaultVertex {
                lagrange: 8,
                fault: 2,
                negative: 6,
                positive: 7,
            },
        ],
        vec![CohesiveCell::new(vec![0, 1])],
        coordinates,
    );
    assert!(matches!(result, Err(FaultError::Configuration { .. })));
}

#[test]
fn coordinates_must_match_vertices() {
    let coordinates = VertexField::<f64>::from_values("coordinates", 3, DVector::zeros(6));
    let result = FaultTopology::new(
        2,
        6,
        vec![fault_vertex(0), fault_vertex(1)],
        vec![CohesiveCell::new(vec![0, 1])],
        coordinates,
    );
    assert!(matches!(result, Err(FaultError::Configuration { .. })));
}

#[test]
fn unsupported_dimension_is_rejected() {
    let result = FaultTopology::<f64>::new(
        4,
        6,
        vec![fault_vertex(0)],
        vec![],
        VertexField::zeros("coordinates", 1, 4),
    );
    assert!(matches!(result, Err(FaultError::Dimension { dim: 4 })));
}
