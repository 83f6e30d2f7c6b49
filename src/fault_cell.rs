//! Geometry of the lower-dimensional cells making up the fault surface.
//!
//! A fault in `d` spatial dimensions is discretized by cells of reference dimension `d - 1`:
//! points in 1D, linear segments in 2D and linear triangles or bilinear quadrilaterals in 3D.
use crate::error::FaultError;
use fenris_quadrature::{polyquad, tensor, univariate};
use nalgebra::{convert, DMatrix, DVector, Point2, Vector2, Vector3};
use numeric_literals::replace_float_literals;
use rupture_traits::Real;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FaultCellShape {
    Point,
    Segment2,
    Tri3,
    Quad4,
}

impl FaultCellShape {
    pub fn from_num_vertices(space_dim: usize, num_vertices: usize) -> Result<Self, FaultError> {
        match (space_dim, num_vertices) {
            (1, 1) => Ok(Self::Point),
            (2, 2) => Ok(Self::Segment2),
            (3, 3) => Ok(Self::Tri3),
            (3, 4) => Ok(Self::Quad4),
            (1..=3, n) => Err(FaultError::configuration(format!(
                "No fault cell with {} vertices in {} dimensions.",
                n, space_dim
            ))),
            (dim, _) => Err(FaultError::Dimension { dim }),
        }
    }

    pub fn num_vertices(&self) -> usize {
        match self {
            Self::Point => 1,
            Self::Segment2 => 2,
            Self::Tri3 => 3,
            Self::Quad4 => 4,
        }
    }

    pub fn reference_dim(&self) -> usize {
        match self {
            Self::Point => 0,
            Self::Segment2 => 1,
            Self::Tri3 | Self::Quad4 => 2,
        }
    }

    /// Quadrature weights and points in the reference cell.
    ///
    /// The rules integrate products of two basis functions exactly. Only the first
    /// `reference_dim` coordinates of each point are meaningful. Segments and quadrilaterals
    /// use Gauss rules on `[-1, 1]^d`, triangles a polyquad rule on the triangle with vertices
    /// `(-1, -1)`, `(1, -1)` and `(-1, 1)`.
    pub fn quadrature<T: Real>(&self) -> Result<(Vec<T>, Vec<Point2<T>>), FaultError> {
        let (weights, points): fenris_quadrature::Rule<2> = match self {
            Self::Point => (vec![1.0], vec![[0.0, 0.0]]),
            Self::Segment2 => {
                let (weights, points) = univariate::gauss(2);
                (weights, points.into_iter().map(|[x]| [x, 0.0]).collect())
            }
            Self::Tri3 => polyquad::triangle(2).map_err(|err| {
                FaultError::configuration(format!("No quadrature rule for {:?} fault cells: {}", self, err))
            })?,
            Self::Quad4 => tensor::quadrilateral_gauss(2),
        };
        let weights = weights.into_iter().map(convert).collect();
        let points = points.into_iter().map(Point2::from).map(convert).collect();
        Ok((weights, points))
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
    pub fn evaluate_basis<T: Real>(&self, xi: &Point2<T>) -> DVector<T> {
        match self {
            Self::Point => DVector::from_element(1, 1.0),
            Self::Segment2 => DVector::from_vec(vec![(1.0 - xi[0]) / 2.0, (1.0 + xi[0]) / 2.0]),
            Self::Tri3 => DVector::from_vec(vec![-(xi[0] + xi[1]) / 2.0, (1.0 + xi[0]) / 2.0, (1.0 + xi[1]) / 2.0]),
            Self::Quad4 => {
                let phi = |alpha: T, beta: T| (1.0 + alpha * xi[0]) * (1.0 + beta * xi[1]) / 4.0;
                DVector::from_vec(vec![
                    phi(-1.0, -1.0),
                    phi( 1.0, -1.0),
                    phi( 1.0,  1.0),
                    phi(-1.0,  1.0),
                ])
            }
        }
    }

    /// Gradients of the basis functions with respect to reference coordinates.
    ///
    /// Column `i` holds the gradient of basis function `i`. The matrix has `reference_dim` rows.
    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("literal must fit in T"))]
    pub fn gradients<T: Real>(&self, xi: &Point2<T>) -> DMatrix<T> {
        match self {
            Self::Point => DMatrix::zeros(0, 1),
            Self::Segment2 => DMatrix::from_row_slice(1, 2, &[-0.5, 0.5]),
            Self::Tri3 => DMatrix::from_row_slice(2, 3, &[-0.5, 0.5, 0.0,
                                                          -0.5, 0.0, 0.5]),
            Self::Quad4 => {
                let phi_grad = |alpha: T, beta: T| {
                    DVector::from_vec(vec![
                        alpha * (1.0 + beta * xi[1]) / 4.0,
                        beta * (1.0 + alpha * xi[0]) / 4.0,
                    ])
                };
                DMatrix::from_columns(&[
                    phi_grad(-1.0, -1.0),
                    phi_grad( 1.0, -1.0),
                    phi_grad( 1.0,  1.0),
                    phi_grad(-1.0,  1.0),
                ])
            }
        }
    }
}

/// Geometric quantities of a single fault cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultCellGeometry<T: Real> {
    pub shape: FaultCellShape,
    /// Length, area or (for point cells) unit measure.
    pub measure: T,
    /// Unit normal pointing from the negative towards the positive side.
    pub normal: DVector<T>,
    /// The matrix of basis products $M_{ij} = \int N_i N_j \\, dS$.
    pub basis_products: DMatrix<T>,
}

impl<T: Real> FaultCellGeometry<T> {
    /// Lumped area associated with each vertex of the cell, i.e. the row sums of the basis
    /// product matrix.
    pub fn vertex_areas(&self) -> DVector<T> {
        let n = self.basis_products.nrows();
        DVector::from_fn(n, |i, _| self.basis_products.row(i).sum())
    }
}

/// Scaled normal whose magnitude is the surface Jacobian determinant.
fn scaled_normal<T: Real>(space_dim: usize, jacobian: &DMatrix<T>) -> DVector<T> {
    match space_dim {
        2 => {
            let t = Vector2::new(jacobian[(0, 0)], jacobian[(1, 0)]);
            DVector::from_vec(vec![t.y, -t.x])
        }
        3 => {
            let a = Vector3::new(jacobian[(0, 0)], jacobian[(1, 0)], jacobian[(2, 0)]);
            let b = Vector3::new(jacobian[(0, 1)], jacobian[(1, 1)], jacobian[(2, 1)]);
            let n = a.cross(&b);
            DVector::from_vec(vec![n.x, n.y, n.z])
        }
        _ => DVector::from_element(1, T::one()),
    }
}

/// Compute measure, normal and basis products of a fault cell.
///
/// `vertices` holds the coordinates of the cell vertices, in the order given by the cell.
#[allow(non_snake_case)]
pub fn compute_cell_geometry<T: Real>(
    shape: FaultCellShape,
    vertices: &[DVector<T>],
) -> Result<FaultCellGeometry<T>, FaultError> {
    let n = shape.num_vertices();
    assert_eq!(vertices.len(), n, "Number of vertex coordinates must match cell shape");
    let space_dim = vertices[0].len();

    if shape == FaultCellShape::Point {
        return Ok(FaultCellGeometry {
            shape,
            measure: T::one(),
            normal: DVector::from_element(1, T::one()),
            basis_products: DMatrix::identity(1, 1),
        });
    }

    let X = DMatrix::from_fn(space_dim, n, |i, j| vertices[j][i]);
    let (weights, points) = shape.quadrature::<T>()?;

    let mut measure = T::zero();
    let mut normal = DVector::zeros(space_dim);
    let mut basis_products = DMatrix::zeros(n, n);
    for (&w, xi) in weights.iter().zip(&points) {
        let G = shape.gradients(xi);
        let J = &X * G.transpose();
        let n_scaled = scaled_normal(space_dim, &J);
        let det = n_scaled.norm();
        let phi = shape.evaluate_basis(xi);

        measure += w * det;
        normal += &n_scaled * w;
        basis_products += &phi * phi.transpose() * (w * det);
    }

    let normal_norm = normal.norm();
    if measure <= T::zero() || normal_norm <= T::zero() {
        return Err(FaultError::configuration(format!(
            "Degenerate {:?} fault cell with vertices {:?}.",
            shape,
            vertices.iter().map(|x| x.as_slice().to_vec()).collect::<Vec<_>>()
        )));
    }

    Ok(FaultCellGeometry {
        shape,
        measure,
        normal: normal / normal_norm,
        basis_products,
    })
}
