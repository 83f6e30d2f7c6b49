//! Connectivity of the fault and its embedding in the bulk mesh.
use crate::error::FaultError;
use crate::field::VertexField;
use rupture_traits::Real;
use std::fmt;
use std::ops::Range;

/// Mesh vertices associated with one vertex of the fault.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FaultVertex {
    /// Mesh vertex holding the Lagrange multiplier (traction) degrees of freedom.
    pub lagrange: usize,
    /// Index of the vertex on the fault, in `0 .. num_vertices`.
    pub fault: usize,
    pub negative: usize,
    pub positive: usize,
}

impl FaultVertex {
    pub fn side_vertex(&self, side: FaultSide) -> usize {
        match side {
            FaultSide::Negative => self.negative,
            FaultSide::Positive => self.positive,
        }
    }
}

/// One face of a cohesive cell, given by the fault indices of its vertices.
///
/// The orientation of the vertices determines the fault normal, which points from the negative
/// towards the positive side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohesiveCell {
    pub vertices: Vec<usize>,
}

impl CohesiveCell {
    pub fn new(vertices: Vec<usize>) -> Self {
        Self { vertices }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FaultSide {
    Negative,
    Positive,
}

impl FaultSide {
    pub const BOTH: [FaultSide; 2] = [FaultSide::Negative, FaultSide::Positive];
}

impl fmt::Display for FaultSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "negative"),
            Self::Positive => write!(f, "positive"),
        }
    }
}

/// Maps mesh vertices to their (scalar) degrees of freedom in the bulk system.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DofMap {
    space_dim: usize,
}

impl DofMap {
    pub fn new(space_dim: usize) -> Self {
        Self { space_dim }
    }

    pub fn vertex_dofs(&self, mesh_vertex: usize) -> Range<usize> {
        let begin = mesh_vertex * self.space_dim;
        begin..begin + self.space_dim
    }
}

/// Validated fault connectivity together with the coordinates of the fault vertices.
#[derive(Debug, Clone)]
pub struct FaultTopology<T: Real> {
    space_dim: usize,
    num_mesh_vertices: usize,
    vertices: Vec<FaultVertex>,
    cells: Vec<CohesiveCell>,
    coordinates: VertexField<T>,
    vertex_cells: Vec<Vec<usize>>,
}

fn expected_cell_sizes(space_dim: usize) -> &'static [usize] {
    match space_dim {
        1 => &[1],
        2 => &[2],
        _ => &[3, 4],
    }
}

impl<T: Real> FaultTopology<T> {
    /// Validate and assemble the fault topology.
    ///
    /// The fault vertices may be given in any order, but their fault indices must be a
    /// permutation of `0 .. vertices.len()`. All mesh vertex indices must be smaller than
    /// `num_mesh_vertices`. The coordinates are indexed by fault index.
    pub fn new(
        space_dim: usize,
        num_mesh_vertices: usize,
        mut vertices: Vec<FaultVertex>,
        cells: Vec<CohesiveCell>,
        coordinates: VertexField<T>,
    ) -> Result<Self, FaultError> {
        if !(1..=3).contains(&space_dim) {
            return Err(FaultError::Dimension { dim: space_dim });
        }

        vertices.sort_by_key(|v| v.fault);
        for (i, v) in vertices.iter().enumerate() {
            if v.fault != i {
                return Err(FaultError::configuration(format!(
                    "Fault vertex indices must be a permutation of 0..{}, but index {} is missing or repeated.",
                    vertices.len(),
                    i
                )));
            }
            for mesh_vertex in [v.lagrange, v.negative, v.positive] {
                if mesh_vertex >= num_mesh_vertices {
                    return Err(FaultError::configuration(format!(
                        "Fault vertex {} references mesh vertex {}, but the mesh has {} vertices.",
                        v.fault, mesh_vertex, num_mesh_vertices
                    )));
                }
            }
        }

        let num_vertices = vertices.len();
        let mut vertex_cells = vec![Vec::new(); num_vertices];
        for (cell_index, cell) in cells.iter().enumerate() {
            if !expected_cell_sizes(space_dim).contains(&cell.vertices.len()) {
                return Err(FaultError::configuration(format!(
                    "Cohesive cell {} has {} vertices, which is not a supported fault cell in {} dimensions.",
                    cell_index,
                    cell.vertices.len(),
                    space_dim
                )));
            }
            for &v in &cell.vertices {
                if v >= num_vertices {
                    return Err(FaultError::configuration(format!(
                        "Cohesive cell {} references unknown fault vertex {}.",
                        cell_index, v
                    )));
                }
                vertex_cells[v].push(cell_index);
            }
        }

        if let Some(v) = vertex_cells.iter().position(|cells| cells.is_empty()) {
            return Err(FaultError::configuration(format!(
                "Fault vertex {} does not belong to any cohesive cell.",
                v
            )));
        }

        if coordinates.width() != space_dim || coordinates.num_vertices() != num_vertices {
            return Err(FaultError::configuration(format!(
                "Expected coordinates for {} fault vertices of dimension {}, got {} of dimension {}.",
                num_vertices,
                space_dim,
                coordinates.num_vertices(),
                coordinates.width()
            )));
        }

        Ok(Self {
            space_dim,
            num_mesh_vertices,
            vertices,
            cells,
            coordinates,
            vertex_cells,
        })
    }

    pub fn space_dim(&self) -> usize {
        self.space_dim
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_mesh_vertices(&self) -> usize {
        self.num_mesh_vertices
    }

    /// Fault vertices, ordered by fault index.
    pub fn vertices(&self) -> &[FaultVertex] {
        &self.vertices
    }

    pub fn cells(&self) -> &[CohesiveCell] {
        &self.cells
    }

    pub fn coordinates(&self) -> &VertexField<T> {
        &self.coordinates
    }

    /// Indices of the cells containing the given fault vertex.
    pub fn vertex_cells(&self, fault_vertex: usize) -> &[usize] {
        &self.vertex_cells[fault_vertex]
    }

    pub fn dof_map(&self) -> DofMap {
        DofMap::new(self.space_dim)
    }

    /// Number of scalar unknowns in the bulk system.
    pub fn num_bulk_dofs(&self) -> usize {
        self.num_mesh_vertices * self.space_dim
    }
}
