//! Dense block access for CSR matrices.
//!
//! A block is addressed by a list of (scalar) global indices. The same indices are used for rows
//! and columns, so blocks are always square and symmetric in their addressing.
use nalgebra::DMatrix;
use nalgebra_sparse::{CsrMatrix, SparseEntry, SparseEntryMut};
use rupture_traits::Real;

/// Extracts the dense block `A[indices, indices]`.
///
/// Indices given as `None` are treated as detached degrees of freedom: their row and column
/// in the block are those of the identity matrix.
/// Entries outside the sparsity pattern are zero.
pub fn extract_dense_block<T: Real>(matrix: &CsrMatrix<T>, indices: &[Option<usize>]) -> DMatrix<T> {
    let n = indices.len();
    DMatrix::from_fn(n, n, |i, j| match (indices[i], indices[j]) {
        (Some(row), Some(col)) => match matrix.get_entry(row, col) {
            Some(SparseEntry::NonZero(value)) => *value,
            _ => T::zero(),
        },
        _ if i == j => T::one(),
        _ => T::zero(),
    })
}

/// Writes the dense block into `A[indices, indices]`, overwriting the current values.
///
/// # Panics
///
/// Panics if the block does not fit in the sparsity pattern, or if the block dimensions do not
/// match the number of indices.
pub fn insert_dense_block<T: Real>(matrix: &mut CsrMatrix<T>, indices: &[usize], block: &DMatrix<T>) {
    assert_eq!(block.nrows(), indices.len(), "Block row count must match index count");
    assert_eq!(block.ncols(), indices.len(), "Block column count must match index count");
    for (i, &row) in indices.iter().enumerate() {
        for (j, &col) in indices.iter().enumerate() {
            match matrix.get_entry_mut(row, col) {
                Some(SparseEntryMut::NonZero(value)) => *value = block[(i, j)],
                _ => panic!("Entry ({}, {}) is not part of the sparsity pattern", row, col),
            }
        }
    }
}

/// Sets every explicitly stored diagonal entry to `value` and every off-diagonal entry to zero.
pub fn reset_to_scaled_identity<T: Real>(matrix: &mut CsrMatrix<T>, value: T) {
    let nrows = matrix.nrows();
    for i in 0..nrows {
        let mut row = matrix.row_mut(i);
        let (cols, values) = row.cols_and_values_mut();
        for (&j, v) in cols.iter().zip(values.iter_mut()) {
            *v = if i == j { value } else { T::zero() };
        }
    }
}
