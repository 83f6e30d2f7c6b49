//! Local coordinate frames of the fault vertices.
use crate::error::FaultError;
use crate::fault_cell::FaultCellGeometry;
use crate::topology::FaultTopology;
use itertools::Itertools;
use nalgebra::{DMatrix, DVector, Vector3};
use numeric_literals::replace_float_literals;
use rupture_traits::Real;

/// Rotation from global coordinates to fault coordinates at a fault vertex.
///
/// The rows of the matrix are the unit strike, dip and normal directions (strike and normal in
/// 2D, normal only in 1D). The last row is always the fault normal.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationFrame<T: Real> {
    matrix: DMatrix<T>,
}

impl<T: Real> OrientationFrame<T> {
    /// Construct a frame from a matrix with orthonormal rows.
    pub fn from_matrix(matrix: DMatrix<T>) -> Self {
        assert!(matrix.is_square(), "Orientation matrix must be square");
        Self { matrix }
    }

    /// Construct the frame for the given unit normal.
    ///
    /// In 3D the strike direction is horizontal with respect to `up_dir`, i.e. `up_dir x normal`.
    /// If the normal is (nearly) parallel to `up_dir`, the y and x axes are tried in turn instead.
    #[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
    pub fn from_normal(normal: &DVector<T>, up_dir: &Vector3<T>) -> Result<Self, FaultError> {
        let matrix = match normal.len() {
            1 => DMatrix::from_element(1, 1, 1.0),
            2 => {
                let (nx, ny) = (normal[0], normal[1]);
                DMatrix::from_row_slice(2, 2, &[-ny, nx, nx, ny])
            }
            3 => {
                let n = Vector3::new(normal[0], normal[1], normal[2]);
                let candidates = [*up_dir, Vector3::y(), Vector3::x()];
                let strike = candidates
                    .iter()
                    .filter(|dir| dir.norm() > 0.0)
                    .map(|dir| dir.normalize().cross(&n))
                    .find(|s| s.norm() > 1e-3)
                    .ok_or_else(|| FaultError::configuration("Could not determine strike direction for fault normal."))?
                    .normalize();
                let dip = n.cross(&strike);
                #[rustfmt::skip]
                let rows = [strike.x, strike.y, strike.z,
                            dip.x, dip.y, dip.z,
                            n.x, n.y, n.z];
                DMatrix::from_row_slice(3, 3, &rows)
            }
            dim => return Err(FaultError::Dimension { dim }),
        };
        Ok(Self { matrix })
    }

    pub fn space_dim(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> &DMatrix<T> {
        &self.matrix
    }

    /// Rotate a global vector into fault coordinates.
    pub fn to_fault(&self, global: &DVector<T>) -> DVector<T> {
        &self.matrix * global
    }

    /// Rotate a vector in fault coordinates back to global coordinates.
    pub fn to_global(&self, local: &DVector<T>) -> DVector<T> {
        self.matrix.tr_mul(local)
    }

    pub fn normal_dir(&self) -> DVector<T> {
        self.direction(self.space_dim() - 1)
    }

    /// The strike direction, or `None` for 1D faults.
    pub fn strike_dir(&self) -> Option<DVector<T>> {
        (self.space_dim() > 1).then(|| self.direction(0))
    }

    /// The dip direction, only available for 3D faults.
    pub fn dip_dir(&self) -> Option<DVector<T>> {
        (self.space_dim() == 3).then(|| self.direction(1))
    }

    fn direction(&self, row: usize) -> DVector<T> {
        self.matrix.row(row).transpose()
    }
}

/// Compute the orientation of every fault vertex.
///
/// The normal at a vertex is the average of the normals of its cells, weighted by the area each
/// cell contributes to the vertex.
pub fn compute_orientations<T: Real>(
    topology: &FaultTopology<T>,
    cell_geometry: &[FaultCellGeometry<T>],
    up_dir: &Vector3<T>,
) -> Result<Vec<OrientationFrame<T>>, FaultError> {
    let dim = topology.space_dim();
    (0..topology.num_vertices())
        .map(|v| {
            let mut normal = DVector::zeros(dim);
            for &c in topology.vertex_cells(v) {
                let geometry = &cell_geometry[c];
                let local_indices = topology.cells()[c].vertices.iter().positions(|&u| u == v);
                for local_index in local_indices {
                    let weight = geometry.basis_products.row(local_index).sum();
                    normal += &geometry.normal * weight;
                }
            }
            let norm = normal.norm();
            if norm <= T::zero() {
                return Err(FaultError::configuration(format!(
                    "Cell normals around fault vertex {} cancel out.",
                    v
                )));
            }
            OrientationFrame::from_normal(&(normal / norm), up_dir)
        })
        .collect()
}
