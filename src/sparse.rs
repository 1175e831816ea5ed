//! Sparse matrix utilities.
//!
//! Helper functions for working with nalgebra-sparse matrices.

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Create a CSC matrix from (row, col, value) triplets.
///
/// Duplicates are summed together. Out-of-range entries are dropped.
pub fn csc_from_triplets(
    nrows: usize,
    ncols: usize,
    triplets: impl IntoIterator<Item = (usize, usize, f64)>,
) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(nrows, ncols);
    for (row, col, val) in triplets {
        if row < nrows && col < ncols {
            coo.push(row, col, val);
        }
    }
    CscMatrix::from(&coo)
}

/// Convert CSC to dense matrix.
pub fn csc_to_dense(sparse: &CscMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(sparse.nrows(), sparse.ncols());
    for (row, col, val) in sparse.triplet_iter() {
        dense[(row, col)] += *val;
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csc_from_triplets() {
        let m = csc_from_triplets(3, 3, vec![(0, 0, 1.0), (1, 1, 2.0), (2, 2, 3.0)]);
        assert_eq!((m.nrows(), m.ncols()), (3, 3));
        assert_eq!(m.nnz(), 3);
    }

    #[test]
    fn test_duplicates_are_summed() {
        let m = csc_from_triplets(2, 2, vec![(0, 1, 1.0), (0, 1, 2.5)]);
        assert_eq!(csc_to_dense(&m)[(0, 1)], 3.5);
    }

    #[test]
    fn test_out_of_range_dropped() {
        let m = csc_from_triplets(2, 2, vec![(5, 0, 1.0), (1, 0, 4.0)]);
        let d = csc_to_dense(&m);
        assert_eq!(d.sum(), 4.0);
    }

    #[test]
    fn test_empty() {
        let m = csc_from_triplets(4, 2, Vec::new());
        assert_eq!(m.nnz(), 0);
        assert_eq!(csc_to_dense(&m), DMatrix::zeros(4, 2));
    }
}
