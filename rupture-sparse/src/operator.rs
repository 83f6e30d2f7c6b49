//! Linear operators consumed by the iterative solvers.
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut, Scalar};
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::CsrMatrix;
use rupture_traits::Real;
use std::error::Error;
use std::fmt;

/// An operator computing `y = A x`.
pub trait LinearOperator<T: Scalar> {
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error + Send + Sync>>;
}

impl<'a, T, A> LinearOperator<T> for &'a A
where
    T: Scalar,
    A: ?Sized + LinearOperator<T>,
{
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error + Send + Sync>> {
        <A as LinearOperator<T>>::apply(self, y, x)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionMismatch {
    pub operator_dims: (usize, usize),
    pub input_len: usize,
    pub output_len: usize,
}

impl fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Operator of size {}x{} applied to input of length {} with output of length {}",
            self.operator_dims.0, self.operator_dims.1, self.input_len, self.output_len
        )
    }
}

impl Error for DimensionMismatch {}

fn check_dims(nrows: usize, ncols: usize, y_len: usize, x_len: usize) -> Result<(), Box<dyn Error + Send + Sync>> {
    if nrows != y_len || ncols != x_len {
        Err(Box::new(DimensionMismatch {
            operator_dims: (nrows, ncols),
            input_len: x_len,
            output_len: y_len,
        }))
    } else {
        Ok(())
    }
}

impl<T: Real> LinearOperator<T> for DMatrix<T> {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error + Send + Sync>> {
        check_dims(self.nrows(), self.ncols(), y.len(), x.len())?;
        y.gemv(T::one(), self, &x, T::zero());
        Ok(())
    }
}

impl<T: Real> LinearOperator<T> for CsrMatrix<T> {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error + Send + Sync>> {
        check_dims(self.nrows(), self.ncols(), y.len(), x.len())?;
        spmm_csr_dense(T::zero(), &mut y, T::one(), Op::NoOp(self), Op::NoOp(&x));
        Ok(())
    }
}

pub struct IdentityOperator;

impl<T: Scalar> LinearOperator<T> for IdentityOperator {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error + Send + Sync>> {
        y.copy_from(&x);
        Ok(())
    }
}

/// Diagonal (Jacobi) preconditioner `P = diag(A)^{-1}`.
///
/// Zero diagonal entries are replaced by one, so that the preconditioner is always defined.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobiPreconditioner<T: Scalar> {
    inverse_diagonal: DVector<T>,
}

impl<T: Real> JacobiPreconditioner<T> {
    pub fn from_diagonal(diagonal: &DVector<T>) -> Self {
        let inverse_diagonal = diagonal.map(|d_i| if d_i == T::zero() { T::one() } else { d_i.recip() });
        Self { inverse_diagonal }
    }

    pub fn from_csr(matrix: &CsrMatrix<T>) -> Self {
        assert_eq!(matrix.nrows(), matrix.ncols(), "Jacobi preconditioner requires a square matrix");
        let mut diagonal = DVector::zeros(matrix.nrows());
        for (i, j, &v) in matrix.triplet_iter() {
            if i == j {
                diagonal[i] += v;
            }
        }
        Self::from_diagonal(&diagonal)
    }

    pub fn inverse_diagonal(&self) -> &DVector<T> {
        &self.inverse_diagonal
    }
}

impl<T: Real> LinearOperator<T> for JacobiPreconditioner<T> {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error + Send + Sync>> {
        let n = self.inverse_diagonal.len();
        check_dims(n, n, y.len(), x.len())?;
        for i in 0..n {
            y[i] = self.inverse_diagonal[i] * x[i];
        }
        Ok(())
    }
}
